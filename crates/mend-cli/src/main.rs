//! jsonmend CLI - keep a JSON file valid while it is being edited.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use colored::Colorize;
use mend_core::{MendConfig, EXIT_SETUP};
use mend_daemon::Watcher;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "jsonmend", version)]
#[command(about = "Watch a JSON file and repair it whenever it changes", long_about = None)]
struct Cli {
    /// JSON file to watch
    path: PathBuf,

    /// TOML file overriding timing and retry budgets
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Map a failure to the process exit status.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<mend_core::Error>()
        .map(mend_core::Error::exit_code)
        .unwrap_or(EXIT_SETUP)
}

async fn run(cli: Cli) -> Result<()> {
    let config = MendConfig::load_or_default(cli.config.as_deref())?;

    let mut watcher = Watcher::new(&cli.path, config.watch_config(), config.repair_config())?;
    let shutdown = watcher.shutdown_handle();

    println!("{}", "Starting jsonmend...".green());
    println!("  Watching: {}", watcher.target().display());
    println!("  Press Ctrl+C to stop");
    println!();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n{}", "Shutting down...".yellow());
            shutdown.shutdown().await;
        }
    });

    watcher
        .run()
        .await
        .with_context(|| format!("while watching {}", cli.path.display()))?;

    println!("{}", "✓ Watcher stopped".green());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_SETUP),
            };
        }
    };

    init_tracing(cli.verbose);
    info!("jsonmend starting");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_core::EXIT_REPAIR_FAILED;

    #[test]
    fn test_single_path_argument() {
        let cli = Cli::try_parse_from(["jsonmend", "settings.json"]).unwrap();
        assert_eq!(cli.path, PathBuf::from("settings.json"));
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_options() {
        let cli =
            Cli::try_parse_from(["jsonmend", "-v", "--config", "mend.toml", "a.json"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("mend.toml")));
    }

    #[test]
    fn test_wrong_arity_is_rejected() {
        assert!(Cli::try_parse_from(["jsonmend"]).is_err());
        assert!(Cli::try_parse_from(["jsonmend", "a.json", "b.json"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let missing = anyhow::Error::new(mend_core::Error::TargetMissing(PathBuf::from("x.json")));
        assert_eq!(exit_code_for(&missing), EXIT_SETUP);

        let exhausted = anyhow::Error::new(mend_core::Error::RetriesExhausted {
            attempts: 5,
            last_error: "EOF while parsing a value".to_string(),
        })
        .context("while watching x.json");
        assert_eq!(exit_code_for(&exhausted), EXIT_REPAIR_FAILED);

        let other = anyhow::anyhow!("something unexpected");
        assert_eq!(exit_code_for(&other), EXIT_SETUP);
    }
}
