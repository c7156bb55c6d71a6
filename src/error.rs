// src/error.rs

use std::io;

use thiserror::Error;

/// Failure taxonomy for a harvesting run.
///
/// `Integrity` means the scraping heuristics no longer match what the site
/// actually returns; it aborts the run rather than silently recovering.
/// `PageParse` is recoverable at label granularity: the batch driver logs a
/// warning and moves on to the next label.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("integrity violation for label `{label}`: {detail}")]
    Integrity { label: String, detail: String },

    #[error("no parseable result table at {url}")]
    PageParse { url: String },

    #[error("unknown chain `{0}` (expected one of: ethereum, optimism, arbitrum, polygon, gnosis)")]
    UnknownChain(String),

    #[error("no credentials configured for chain `{0}`")]
    MissingCredentials(String),

    #[error("invalid base URL `{0}`")]
    InvalidBaseUrl(String),

    #[error("browser error: {0}")]
    Browser(anyhow::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl From<anyhow::Error> for HarvestError {
    fn from(err: anyhow::Error) -> Self {
        HarvestError::Browser(err)
    }
}

impl HarvestError {
    pub fn integrity(label: impl Into<String>, detail: impl Into<String>) -> Self {
        HarvestError::Integrity {
            label: label.into(),
            detail: detail.into(),
        }
    }

    /// Faults that skip the current label instead of aborting the run.
    pub fn is_label_skip(&self) -> bool {
        matches!(self, HarvestError::PageParse { .. })
    }
}
