//! Repair engine: parse, correct, re-serialize, write back.
//!
//! One call to [`RepairEngine::repair`] runs a whole repair chain as an
//! explicit loop. Positional syntax errors are corrected in memory by
//! deleting the offending character; every other failure is retried verbatim
//! from a fresh read after a delay. Each budget is bounded separately.

use crate::config::RepairConfig;
use crate::cooldown::Cooldown;
use crate::document::{self, ParseErrorKind};
use crate::store::DocumentStore;
use crate::{Error, Result};
use colored::Colorize;
use tracing::{debug, error, info, instrument, warn};

/// Result of a successful repair chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    /// Single-character corrections applied before the document parsed.
    pub edits: u32,

    /// Verbatim retries performed after non-positional failures.
    pub retries: u32,

    /// Normalized text that was written.
    pub text: String,
}

/// What one pass through the loop produced.
enum Attempt {
    /// Parsed and written.
    Written(String),
    /// Positional error corrected in memory; parse the new text next.
    Corrected(String),
    /// Anything else: retry verbatim or give up.
    Failed(Error),
}

/// Turns possibly malformed documents into normalized ones.
pub struct RepairEngine<S: DocumentStore> {
    store: S,
    cooldown: Cooldown,
    config: RepairConfig,
}

impl<S: DocumentStore> RepairEngine<S> {
    /// Create an engine writing through `store` and stamping `cooldown`.
    pub fn new(store: S, cooldown: Cooldown, config: RepairConfig) -> Self {
        Self {
            store,
            cooldown,
            config,
        }
    }

    /// The store this engine reads and writes.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle to the cooldown timestamp this engine stamps.
    pub fn cooldown(&self) -> &Cooldown {
        &self.cooldown
    }

    /// Run one repair chain.
    ///
    /// With `content` set, the first pass parses that text instead of reading
    /// the store. Returns once the normalized document is written, or fails
    /// with [`Error::RetriesExhausted`] / [`Error::EditBudgetExhausted`].
    #[instrument(skip(self, content), fields(path = %self.store.path().display()))]
    pub async fn repair(&self, content: Option<String>) -> Result<RepairOutcome> {
        let mut content = content;
        let mut retries = 0u32;
        let mut edits = 0u32;

        loop {
            // Stamp before any I/O so our own write is never read as external.
            self.cooldown.mark().await;

            let failure = match self.attempt(content.take()).await {
                Attempt::Written(text) => {
                    info!(
                        "{} {} ({} edits, {} retries)",
                        "✓ Fixed file".green().bold(),
                        self.store.path().display(),
                        edits,
                        retries
                    );
                    return Ok(RepairOutcome {
                        edits,
                        retries,
                        text,
                    });
                }
                Attempt::Corrected(next) => {
                    if edits >= self.config.max_edits {
                        error!(
                            "{}",
                            format!(
                                "Giving up on {}: still malformed after {} corrective edits",
                                self.store.path().display(),
                                edits
                            )
                            .red()
                            .bold()
                        );
                        return Err(Error::EditBudgetExhausted { edits });
                    }
                    edits += 1;
                    content = Some(next);
                    continue;
                }
                Attempt::Failed(err) => err,
            };

            error!(
                "{}",
                format!("Failed to repair {}: {}", self.store.path().display(), failure).red()
            );

            if retries >= self.config.max_retries {
                error!(
                    "{}",
                    format!(
                        "Giving up on {} after {} retries",
                        self.store.path().display(),
                        retries
                    )
                    .red()
                    .bold()
                );
                return Err(Error::RetriesExhausted {
                    attempts: retries,
                    last_error: failure.to_string(),
                });
            }

            retries += 1;
            warn!(
                "{}",
                format!(
                    "Retrying in {:?} ({}/{})",
                    self.config.retry_delay, retries, self.config.max_retries
                )
                .yellow()
            );
            tokio::time::sleep(self.config.retry_delay).await;
            // content stays None: the next pass reads the file again
        }
    }

    /// Read (unless given text), parse, and either write or correct.
    async fn attempt(&self, content: Option<String>) -> Attempt {
        let text = match content {
            Some(text) => text,
            None => match self.store.read().await {
                Ok(text) => text,
                Err(e) => return Attempt::Failed(e),
            },
        };

        let err = match document::parse(&text) {
            Ok(doc) => return self.write_normalized(&doc).await,
            Err(err) => err,
        };

        match err.kind {
            ParseErrorKind::Syntax => {
                if let Some(next) = document::remove_char_at(&text, err.line, err.column) {
                    self.report_positional(&text, &err);
                    return Attempt::Corrected(next);
                }
                debug!(
                    "Position {}:{} addresses no character, not correctable",
                    err.line, err.column
                );
            }
            ParseErrorKind::Unrepresentable => {
                debug!(
                    "Character at {}:{} is well-formed, leaving the text untouched",
                    err.line, err.column
                );
            }
            ParseErrorKind::Eof => {}
        }

        Attempt::Failed(err.into())
    }

    async fn write_normalized(&self, doc: &serde_json::Value) -> Attempt {
        let text = match document::normalize(doc) {
            Ok(text) => text,
            Err(e) => return Attempt::Failed(e),
        };
        if let Err(e) = self.store.write(&text).await {
            return Attempt::Failed(e);
        }
        self.cooldown.mark().await;
        Attempt::Written(text)
    }

    fn report_positional(&self, text: &str, err: &document::ParseError) {
        let snippet = document::caret_snippet(text, err.line, err.column).unwrap_or_default();
        let (source_row, caret_row) = snippet.split_once('\n').unwrap_or((snippet.as_str(), ""));
        warn!(
            "{}\n{}\n{}",
            err.message.red(),
            source_row,
            caret_row.yellow().bold()
        );
    }
}
