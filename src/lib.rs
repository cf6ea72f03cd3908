// src/lib.rs
// =============================================================================
// seo-audit: crawl a website, extract on-page SEO signals from every page,
// score each page and look for site-wide problems.
//
// The pipeline lives here so any front end (the CLI in main.rs, a report
// renderer, a web service) can call `audit::run_audit` and read the Report.
//
// Modules:
// - crawl: concurrent same-origin crawler (normalize, fetch, frontier, workers)
// - analyze: per-document signal extraction
// - audit: scoring, cross-page checks, the Report
// - config / error: shared settings and fatal errors
// =============================================================================

pub mod analyze;
pub mod audit;
pub mod config;
pub mod crawl;
pub mod error;

pub use audit::{run_audit, Report};
pub use config::AuditConfig;
pub use error::AuditError;
