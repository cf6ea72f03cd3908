// src/audit/report.rs
// =============================================================================
// The audit report and the pipeline that builds it.
//
// run_audit sequences the three stages:
// 1. crawl the site (fetch + analyze every reachable page)
// 2. score each page
// 3. run the cross-page checks over all analyses
//
// The resulting Report is built once and only read afterwards (JSON output,
// terminal summary, any other renderer). External audit data, such as a
// lighthouse export, can be attached with `with_external_audits`.
// =============================================================================

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::cross_page::{
    canonical_chains, structured_data_issues, CanonicalChain, StructuredDataIssue,
};
use super::score::{score_page, PageScore};
use crate::analyze::PageAnalysis;
use crate::config::AuditConfig;
use crate::crawl::{crawl_site_with_cancellation, parse_seed, CrawledPage, FetchResult};
use crate::error::AuditError;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub fetch: FetchResult,
    pub analysis: Option<PageAnalysis>,
    pub score: Option<PageScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub site: String,
    pub generated_at: String,
    /// Keyed by normalized URL; no ordering guarantee
    pub pages: HashMap<String, PageRecord>,
    pub canonical_chains: Vec<CanonicalChain>,
    pub structured_data_issues: BTreeMap<String, Vec<StructuredDataIssue>>,
    /// Per-URL results from an outside auditing tool, merged after the crawl
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_audits: Option<HashMap<String, Value>>,
}

// Headline numbers for terminal output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub pages_crawled: usize,
    /// Pages that never produced a response
    pub pages_failed: usize,
    pub pages_with_issues: usize,
    pub average_score: f64,
    /// Lowest page score, None for an empty report
    pub lowest_score: Option<u8>,
}

// Crawls, scores and cross-checks a site
//
// Fails fast (before any request) if the seed or the configuration is invalid.
// Pass a cancellation token to stop the crawl early; the report then covers
// the pages fetched so far.
pub async fn run_audit(
    seed: &str,
    config: &AuditConfig,
    cancel: Option<CancellationToken>,
) -> Result<Report, AuditError> {
    config.validate()?;
    let site = parse_seed(seed)?;

    let cancel = cancel.unwrap_or_else(CancellationToken::new);
    let crawled = crawl_site_with_cancellation(site.as_str(), config, cancel).await?;

    let report = Report::build(site.to_string(), crawled, config);

    info!(
        pages = report.pages.len(),
        canonical_chains = report.canonical_chains.len(),
        structured_data_issues = report.structured_data_issues.len(),
        "Audit complete"
    );

    Ok(report)
}

impl Report {
    // Scores every crawled page and runs the cross-page checks
    //
    // Pages without an analysis (transport failure, empty body) are scored
    // against an empty analysis, so every record carries a score.
    pub fn build(site: String, crawled: HashMap<String, CrawledPage>, config: &AuditConfig) -> Self {
        let empty = PageAnalysis::default();

        let pages: HashMap<String, PageRecord> = crawled
            .into_iter()
            .map(|(url, page)| {
                let score = score_page(page.analysis.as_ref().unwrap_or(&empty), &page.fetch);
                let record = PageRecord {
                    fetch: page.fetch,
                    analysis: page.analysis,
                    score: Some(score),
                };
                (url, record)
            })
            .collect();

        let analyses: BTreeMap<&str, &PageAnalysis> = pages
            .iter()
            .filter_map(|(url, record)| Some((url.as_str(), record.analysis.as_ref()?)))
            .collect();

        let canonical_chains = canonical_chains(&analyses, config.limits.max_canonical_chain);
        let structured_data_issues = structured_data_issues(&analyses);

        Self {
            site,
            generated_at: Utc::now().format(TIMESTAMP_FORMAT).to_string(),
            pages,
            canonical_chains,
            structured_data_issues,
            external_audits: None,
        }
    }

    // Attaches per-URL results of an external audit (e.g. lighthouse)
    //
    // Entries are merged into anything attached earlier; a later entry for
    // the same URL replaces the earlier one.
    pub fn with_external_audits(mut self, audits: HashMap<String, Value>) -> Self {
        self.external_audits
            .get_or_insert_with(HashMap::new)
            .extend(audits);
        self
    }

    // Pages that lost points with their reasons, sorted by URL
    pub fn pages_with_issues(&self) -> Vec<(&str, &[String])> {
        let mut pages: Vec<(&str, &[String])> = self
            .pages
            .iter()
            .filter_map(|(url, record)| {
                let reasons = record.score.as_ref()?.reasons.as_slice();
                (!reasons.is_empty()).then_some((url.as_str(), reasons))
            })
            .collect();
        pages.sort_by(|a, b| a.0.cmp(b.0));
        pages
    }

    pub fn summary(&self) -> ReportSummary {
        let scores: Vec<u8> = self
            .pages
            .values()
            .filter_map(|record| record.score.as_ref().map(|s| s.score))
            .collect();

        let average_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64
        };

        ReportSummary {
            pages_crawled: self.pages.len(),
            pages_failed: self
                .pages
                .values()
                .filter(|record| record.fetch.http_status.is_none())
                .count(),
            pages_with_issues: self.pages_with_issues().len(),
            average_score,
            lowest_score: scores.iter().copied().min(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use std::time::Duration;

    const HEALTHY_BODY: &str = r#"<html><head>
        <title>Home</title>
        <meta name="description" content="A healthy page">
        <link rel="canonical" href="/">
        </head><body><h1>Welcome</h1>
        <p>__WORDS__</p>
        <a href="/thin">Thin</a>
        <a href="/gone">Gone</a>
        </body></html>"#;

    fn healthy_body() -> String {
        HEALTHY_BODY.replace("__WORDS__", &"word ".repeat(120))
    }

    fn config() -> AuditConfig {
        AuditConfig {
            page_budget: 10,
            concurrency: 3,
            request_timeout: Duration::from_secs(5),
            ..AuditConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_audit_builds_full_report() {
        let site = MockServer::start_async().await;
        site.mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body(healthy_body());
        })
        .await;
        site.mock_async(|when, then| {
            when.method(GET).path("/thin");
            then.status(200).body(
                r#"<html><head><link rel="canonical" href="/old"></head><body>
                   <script type="application/ld+json">{"@type":"Article"}</script>
                   <p>only a few words</p></body></html>"#,
            );
        })
        .await;
        site.mock_async(|when, then| {
            when.method(GET).path("/gone");
            then.status(410).body("<html><body>gone</body></html>");
        })
        .await;

        let report = run_audit(&site.url("/"), &config(), None).await.unwrap();

        assert_eq!(report.site, site.url("/"));
        assert_eq!(report.pages.len(), 3);

        let home = report.pages[&site.url("/")].score.as_ref().unwrap();
        assert_eq!(home.score, 100);
        assert!(home.reasons.is_empty());

        let thin = report.pages[&site.url("/thin")].score.as_ref().unwrap();
        assert_eq!(thin.score, 55);

        let gone = report.pages[&site.url("/gone")].score.as_ref().unwrap();
        assert_eq!(gone.score, 0);
        assert_eq!(gone.reasons.last().map(String::as_str), Some("HTTP error: 410"));

        // /thin -> /old (never crawled)
        assert_eq!(report.canonical_chains.len(), 1);
        assert_eq!(
            report.canonical_chains[0].urls,
            vec![site.url("/thin"), site.url("/old")]
        );

        assert_eq!(
            report.structured_data_issues[&site.url("/thin")],
            vec![StructuredDataIssue::MissingContext]
        );

        let summary = report.summary();
        assert_eq!(summary.pages_crawled, 3);
        assert_eq!(summary.pages_failed, 0);
        assert_eq!(summary.pages_with_issues, 2);
        assert_eq!(summary.lowest_score, Some(0));

        let with_issues = report.pages_with_issues();
        let urls: Vec<&str> = with_issues.iter().map(|(url, _)| *url).collect();
        let gone_url = site.url("/gone");
        let thin_url = site.url("/thin");
        assert_eq!(urls, vec![gone_url.as_str(), thin_url.as_str()]);
        assert_eq!(with_issues[0].1.last().map(String::as_str), Some("HTTP error: 410"));
        assert_eq!(with_issues[1].1, thin.reasons.as_slice());
        assert!((summary.average_score - 155.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_invalid_seed_fails_before_crawling() {
        let result = run_audit("not a url", &config(), None).await;
        assert!(matches!(result, Err(AuditError::InvalidSeed { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_pages_score_zero() {
        let report = run_audit("http://127.0.0.1:1/", &config(), None).await.unwrap();

        let record = &report.pages["http://127.0.0.1:1/"];
        assert!(record.analysis.is_none());
        let score = record.score.as_ref().unwrap();
        assert_eq!(score.score, 0);
        assert_eq!(score.reasons.last().map(String::as_str), Some("HTTP error: none"));
        assert_eq!(report.summary().pages_failed, 1);
    }

    #[test]
    fn test_external_audits_are_merged() {
        let report = Report::build("https://a.com/".to_string(), HashMap::new(), &config());
        assert!(report.external_audits.is_none());

        let first = HashMap::from([(
            "https://a.com/".to_string(),
            serde_json::json!({"performance": 0.9}),
        )]);
        let second = HashMap::from([(
            "https://a.com/blog".to_string(),
            serde_json::json!({"performance": 0.4}),
        )]);

        let report = report.with_external_audits(first).with_external_audits(second);
        let audits = report.external_audits.as_ref().unwrap();

        assert_eq!(audits.len(), 2);
        assert_eq!(audits["https://a.com/"]["performance"], 0.9);
    }

    #[test]
    fn test_report_json_omits_bodies() {
        let crawled = HashMap::from([(
            "https://a.com/".to_string(),
            CrawledPage {
                fetch: FetchResult::success(
                    "https://a.com/".to_string(),
                    200,
                    "<html>secret body</html>".to_string(),
                    Duration::from_millis(3),
                ),
                analysis: Some(PageAnalysis::default()),
            },
        )]);

        let report = Report::build("https://a.com/".to_string(), crawled, &config());
        let json = serde_json::to_string(&report).unwrap();

        assert!(!json.contains("secret body"));
        assert!(json.contains("\"generated_at\""));
        assert!(!json.contains("external_audits"));
    }

    #[test]
    fn test_empty_report_summary() {
        let report = Report::build("https://a.com/".to_string(), HashMap::new(), &config());
        let summary = report.summary();

        assert_eq!(summary.pages_crawled, 0);
        assert_eq!(summary.average_score, 0.0);
        assert_eq!(summary.lowest_score, None);
    }
}
