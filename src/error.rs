// src/error.rs
// =============================================================================
// Fatal errors for an audit run.
//
// Only configuration-level problems end up here: a seed URL we cannot parse,
// a zero concurrency or page budget, or an HTTP client that cannot be built.
// Everything that goes wrong for a single page (timeouts, 404s, broken HTML,
// malformed JSON-LD) is recorded as data inside the report instead.
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// The seed is not a well-formed absolute http(s) URL
    #[error("Invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("Concurrency must be greater than 0")]
    InvalidConcurrency,

    #[error("Page budget must be greater than 0")]
    InvalidPageBudget,

    /// The shared HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
