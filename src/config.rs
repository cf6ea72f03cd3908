// src/config.rs
// =============================================================================
// Tunables for one audit run.
//
// The CLI builds an AuditConfig from its flags; tests build one with
// `AuditConfig::default()` and override the fields they care about.
// =============================================================================

use std::time::Duration;

use crate::error::AuditError;

// Sent with every request so site owners can identify the crawler
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_PAGE_BUDGET: usize = 50;
pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

// Size caps that keep a single page from bloating the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisLimits {
    /// How many src URLs of images without alt text are kept per page
    pub max_missing_alt_sources: usize,
    /// Characters kept from a JSON-LD block that failed to parse
    pub raw_block_chars: usize,
    /// Longest canonical chain followed before it is treated as a cycle
    pub max_canonical_chain: usize,
}

impl Default for AnalysisLimits {
    fn default() -> Self {
        Self {
            max_missing_alt_sources: 50,
            raw_block_chars: 500,
            max_canonical_chain: 20,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Upper bound on the number of URLs ever queued (and therefore fetched)
    pub page_budget: usize,
    /// Number of crawl workers, and of fetches allowed in flight at once
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub limits: AnalysisLimits,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            page_budget: DEFAULT_PAGE_BUDGET,
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
            limits: AnalysisLimits::default(),
        }
    }
}

impl AuditConfig {
    // Rejects settings that would make a crawl meaningless
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.concurrency == 0 {
            return Err(AuditError::InvalidConcurrency);
        }
        if self.page_budget == 0 {
            return Err(AuditError::InvalidPageBudget);
        }
        Ok(())
    }
}
