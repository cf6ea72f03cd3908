// src/audit/mod.rs
// =============================================================================
// This module turns crawled pages into an audit report.
//
// Submodules:
// - score: the 0-100 health score of a single page
// - cross_page: canonical chains and JSON-LD problems across the whole site
// - report: the Report type and run_audit, the entry point of the pipeline
// =============================================================================

mod cross_page;
mod report;
mod score;

pub use crate::config::{AnalysisLimits, AuditConfig};
pub use cross_page::{canonical_chains, structured_data_issues, CanonicalChain, StructuredDataIssue};
pub use report::{run_audit, PageRecord, Report, ReportSummary};
pub use score::{score_page, PageScore};
