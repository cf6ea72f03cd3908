// src/crawl/queue.rs
// =============================================================================
// This module crawls a website with a fixed pool of concurrent workers.
//
// How it works:
// 1. Validate the seed URL and put it in the shared Frontier
// 2. Start `concurrency` workers that all pull from the same Frontier
// 3. Each worker: take a URL, fetch it (at most `concurrency` fetches in
//    flight, enforced by a semaphore), analyze the body, and hand the
//    page's same-origin links back to the Frontier
// 4. The crawl ends when the queue is empty and no page is in flight
//
// Every URL ends in one of two states:
// - analyzed: a response with a non-empty body; its links feed the crawl
// - fetch failed / empty: recorded, but nothing is discovered from it
//
// The page budget is enforced by the Frontier at enqueue time, so the result
// never holds more than `page_budget` pages.
// =============================================================================

use futures::future::join_all;
use scraper::Html;
use std::collections::HashMap;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::fetch::{FetchResult, Fetcher};
use super::frontier::Frontier;
use super::normalize::normalize_against;
use crate::analyze::{analyze_document, outbound_hrefs, PageAnalysis};
use crate::config::{AnalysisLimits, AuditConfig};
use crate::error::AuditError;

// What the crawl knows about one URL
#[derive(Debug, Clone)]
pub struct CrawledPage {
    pub fetch: FetchResult,
    /// None when the fetch failed or returned an empty body
    pub analysis: Option<PageAnalysis>,
}

// Shared, read-only context handed to every worker
struct CrawlContext<'a> {
    frontier: &'a Frontier,
    fetcher: &'a Fetcher,
    in_flight: &'a Semaphore,
    limits: &'a AnalysisLimits,
    cancel: &'a CancellationToken,
}

// Crawls a website starting from `seed`
//
// Returns a map of normalized URL -> CrawledPage for every URL that was fetched.
// Fails only on configuration problems (bad seed, zero concurrency or budget).
pub async fn crawl_site(
    seed: &str,
    config: &AuditConfig,
) -> Result<HashMap<String, CrawledPage>, AuditError> {
    crawl_site_with_cancellation(seed, config, CancellationToken::new()).await
}

// Same as `crawl_site`, but stops early once `cancel` fires
//
// After cancellation no new URL is dequeued; fetches already running finish
// and are included in the (partial) result.
pub async fn crawl_site_with_cancellation(
    seed: &str,
    config: &AuditConfig,
    cancel: CancellationToken,
) -> Result<HashMap<String, CrawledPage>, AuditError> {
    config.validate()?;
    let seed = parse_seed(seed)?;
    let fetcher = Fetcher::new(&config.user_agent, config.request_timeout)?;

    info!(
        seed = %seed,
        budget = config.page_budget,
        concurrency = config.concurrency,
        "Starting crawl"
    );

    let frontier = Frontier::new(seed, config.page_budget);
    let in_flight = Semaphore::new(config.concurrency);
    let context = CrawlContext {
        frontier: &frontier,
        fetcher: &fetcher,
        in_flight: &in_flight,
        limits: &config.limits,
        cancel: &cancel,
    };

    let workers = (0..config.concurrency).map(|id| worker(id, &context));
    let pages: HashMap<String, CrawledPage> = join_all(workers).await.into_iter().flatten().collect();

    if cancel.is_cancelled() {
        warn!(pages = pages.len(), "Crawl cancelled, returning partial results");
    } else {
        info!(pages = pages.len(), "Crawl finished");
    }

    Ok(pages)
}

// Parses and validates the starting URL
//
// The seed must be an absolute http(s) URL with a host. Its fragment is
// stripped so it matches the form every discovered link is stored in.
pub fn parse_seed(seed: &str) -> Result<Url, AuditError> {
    let invalid = |reason: String| AuditError::InvalidSeed {
        url: seed.to_string(),
        reason,
    };

    let mut url = Url::parse(seed.trim()).map_err(|e| invalid(e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("URL has no host".to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}

// One crawl worker: loops until the frontier runs dry
//
// Results are collected locally and merged once all workers are done, so no
// lock is needed around the result map.
async fn worker(id: usize, context: &CrawlContext<'_>) -> Vec<(String, CrawledPage)> {
    let mut pages = Vec::new();

    while let Some(url) = context.frontier.next(context.cancel).await {
        let fetch = {
            // The semaphore is never closed, so acquire can't fail in practice
            let Ok(_permit) = context.in_flight.acquire().await else {
                context.frontier.complete(Vec::new()).await;
                break;
            };
            context.fetcher.fetch(&url).await
        };

        match (&fetch.http_status, &fetch.error_message) {
            (Some(status), _) => debug!(
                worker = id,
                url = %url,
                status,
                elapsed = fetch.elapsed_seconds.unwrap_or_default(),
                "Fetched page"
            ),
            (None, error) => warn!(
                worker = id,
                url = %url,
                error = error.as_deref().unwrap_or("unknown error"),
                "Fetch failed"
            ),
        }

        let (analysis, discovered) = match fetch.body.as_deref() {
            Some(body) if fetch.has_document() => {
                inspect(fetch.document_url(), body, context.limits)
            }
            _ => (None, Vec::new()),
        };

        let queued = context.frontier.complete(discovered).await;
        if queued > 0 {
            debug!(worker = id, url = %url, queued, "Queued new links");
        }

        pages.push((url, CrawledPage { fetch, analysis }));
    }

    pages
}

// Analyzes a fetched body and resolves its links against `url`, the URL the
// body was actually served from
//
// Parsing happens once here and the tree is dropped before the worker awaits
// again (scraper's Html is not Send).
fn inspect(url: &str, body: &str, limits: &AnalysisLimits) -> (Option<PageAnalysis>, Vec<Url>) {
    let document = Html::parse_document(body);
    let analysis = analyze_document(&document, limits);

    let links = match Url::parse(url) {
        Ok(base) => outbound_hrefs(&document)
            .iter()
            .filter_map(|href| normalize_against(&base, href))
            .collect(),
        Err(_) => Vec::new(),
    };

    (Some(analysis), links)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why join_all instead of tokio::spawn?
//    - join_all polls all worker futures on the current task
//    - The workers can borrow the frontier, fetcher and semaphore directly
//      (no Arc needed), since they all finish before this function returns
//
// 2. What does the Semaphore do here?
//    - acquire() waits until one of `concurrency` permits is free
//    - The permit (_permit) is released when it goes out of scope, right
//      after the fetch completes
//
// 3. What is CancellationToken?
//    - A cloneable flag from tokio-util; cancel() on any clone fires all of them
//    - cancelled() is a future that resolves once the flag fires
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::GET, MockServer};
    use std::time::Duration;

    fn config(page_budget: usize, concurrency: usize) -> AuditConfig {
        AuditConfig {
            page_budget,
            concurrency,
            request_timeout: Duration::from_secs(5),
            ..AuditConfig::default()
        }
    }

    #[test]
    fn test_parse_seed_strips_fragment() {
        let url = parse_seed("https://example.com/start#intro").unwrap();
        assert_eq!(url.as_str(), "https://example.com/start");
    }

    #[test]
    fn test_parse_seed_rejects_bad_input() {
        assert!(matches!(
            parse_seed("example.com"),
            Err(AuditError::InvalidSeed { .. })
        ));
        assert!(matches!(
            parse_seed("ftp://example.com/"),
            Err(AuditError::InvalidSeed { .. })
        ));
        assert!(matches!(
            parse_seed("mailto:someone@example.com"),
            Err(AuditError::InvalidSeed { .. })
        ));
    }

    #[tokio::test]
    async fn test_crawl_follows_same_origin_links_only() {
        let site = MockServer::start_async().await;
        let foreign = MockServer::start_async().await;

        let foreign_mock = foreign
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).body("<html></html>");
            })
            .await;

        let home = format!(
            r##"<html><body>
                <a href="/about">About</a>
                <a href="/about#team">Team</a>
                <a href="/missing">Missing</a>
                <a href="#top">Top</a>
                <a href="mailto:hi@example.com">Mail</a>
                <a href="{}">Elsewhere</a>
            </body></html>"##,
            foreign.url("/page")
        );
        site.mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body(home);
        })
        .await;
        site.mock_async(|when, then| {
            when.method(GET).path("/about");
            then.status(200)
                .body(r#"<html><body><a href="/">Home</a><a href="/about">Self</a></body></html>"#);
        })
        .await;
        site.mock_async(|when, then| {
            when.method(GET).path("/missing");
            then.status(404).body("gone");
        })
        .await;

        let pages = crawl_site(&site.url("/"), &config(50, 4)).await.unwrap();

        let mut urls: Vec<_> = pages.keys().cloned().collect();
        urls.sort();
        assert_eq!(
            urls,
            vec![site.url("/"), site.url("/about"), site.url("/missing")]
        );
        assert_eq!(foreign_mock.hits_async().await, 0);

        let about = &pages[&site.url("/about")];
        assert_eq!(about.fetch.http_status, Some(200));
        assert!(about.analysis.is_some());

        let missing = &pages[&site.url("/missing")];
        assert_eq!(missing.fetch.http_status, Some(404));
    }

    #[tokio::test]
    async fn test_redirects_never_leave_the_seed_origin() {
        let site = MockServer::start_async().await;
        let foreign = MockServer::start_async().await;

        let landing = foreign
            .mock_async(|when, then| {
                when.method(GET).path("/landing");
                then.status(200).body(r#"<a href="/secret">secret</a>"#);
            })
            .await;

        site.mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .body(r#"<a href="/go">go</a><a href="/docs">docs</a>"#);
        })
        .await;
        let target = foreign.url("/landing");
        site.mock_async(|when, then| {
            when.method(GET).path("/go");
            then.status(302).header("location", target);
        })
        .await;
        site.mock_async(|when, then| {
            when.method(GET).path("/docs");
            then.status(301).header("location", "/docs/");
        })
        .await;
        site.mock_async(|when, then| {
            when.method(GET).path("/docs/");
            then.status(200).body(r#"<a href="intro">intro</a>"#);
        })
        .await;
        site.mock_async(|when, then| {
            when.method(GET).path("/docs/intro");
            then.status(200).body("<p>intro</p>");
        })
        .await;

        let pages = crawl_site(&site.url("/"), &config(50, 4)).await.unwrap();

        let mut urls: Vec<_> = pages.keys().cloned().collect();
        urls.sort();
        assert_eq!(
            urls,
            vec![
                site.url("/"),
                site.url("/docs"),
                site.url("/docs/intro"),
                site.url("/go"),
            ]
        );
        assert_eq!(landing.hits_async().await, 0);
        assert_eq!(pages[&site.url("/go")].fetch.http_status, Some(302));
    }

    #[tokio::test]
    async fn test_crawl_respects_page_budget() {
        let site = MockServer::start_async().await;

        let home: String = (0..20)
            .map(|i| format!(r#"<a href="/page/{}">{}</a>"#, i, i))
            .collect();
        site.mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body(home);
        })
        .await;
        site.mock_async(|when, then| {
            when.method(GET).path_contains("/page/");
            then.status(200)
                .body(r#"<a href="/page/100">deeper</a><a href="/page/101">deeper</a>"#);
        })
        .await;

        for concurrency in [1, 8] {
            let pages = crawl_site(&site.url("/"), &config(5, concurrency)).await.unwrap();
            assert_eq!(pages.len(), 5);
            assert!(pages.contains_key(&site.url("/")));
        }
    }

    #[tokio::test]
    async fn test_visited_set_does_not_depend_on_concurrency() {
        let site = MockServer::start_async().await;

        site.mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200)
                .body(r#"<a href="/a">a</a><a href="/b">b</a>"#);
        })
        .await;
        site.mock_async(|when, then| {
            when.method(GET).path("/a");
            then.status(200)
                .body(r#"<a href="/c">c</a><a href="/b">b</a>"#);
        })
        .await;
        site.mock_async(|when, then| {
            when.method(GET).path("/b");
            then.status(200).body(r#"<a href="/c">c</a>"#);
        })
        .await;
        site.mock_async(|when, then| {
            when.method(GET).path("/c");
            then.status(200).body(r#"<a href="/">home</a>"#);
        })
        .await;

        let mut visited = Vec::new();
        for concurrency in [1, 3, 8] {
            let pages = crawl_site(&site.url("/"), &config(50, concurrency)).await.unwrap();
            let mut urls: Vec<_> = pages.into_keys().collect();
            urls.sort();
            visited.push(urls);
        }

        assert_eq!(visited[0].len(), 4);
        assert_eq!(visited[0], visited[1]);
        assert_eq!(visited[1], visited[2]);
    }

    #[tokio::test]
    async fn test_unreachable_seed_is_recorded_not_fatal() {
        let pages = crawl_site("http://127.0.0.1:1/", &config(10, 2)).await.unwrap();

        assert_eq!(pages.len(), 1);
        let page = &pages["http://127.0.0.1:1/"];
        assert!(page.fetch.error_message.is_some());
        assert!(page.analysis.is_none());
    }

    #[tokio::test]
    async fn test_cancelled_crawl_returns_without_fetching() {
        let site = MockServer::start_async().await;
        let mock = site
            .mock_async(|when, then| {
                when.method(GET);
                then.status(200).body("<html></html>");
            })
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let pages = crawl_site_with_cancellation(&site.url("/"), &config(10, 2), cancel)
            .await
            .unwrap();

        assert!(pages.is_empty());
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_crawl_drains_in_flight_fetches() {
        let site = MockServer::start_async().await;

        site.mock_async(|when, then| {
            when.method(GET).path("/");
            then.status(200).body(
                r#"<a href="/a">a</a><a href="/b">b</a><a href="/c">c</a><a href="/d">d</a>"#,
            );
        })
        .await;
        for path in ["/a", "/b"] {
            site.mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200)
                    .delay(Duration::from_millis(800))
                    .body(r#"<a href="/e">e</a>"#);
            })
            .await;
        }
        let mut never_fetched = Vec::new();
        for path in ["/c", "/d", "/e"] {
            let mock = site
                .mock_async(|when, then| {
                    when.method(GET).path(path);
                    then.status(200).body("<p>late</p>");
                })
                .await;
            never_fetched.push(mock);
        }

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });

        // Two workers: after the seed, /a and /b are in flight when the token fires
        let pages = tokio::time::timeout(
            Duration::from_secs(10),
            crawl_site_with_cancellation(&site.url("/"), &config(50, 2), cancel),
        )
        .await
        .expect("cancelled crawl should return")
        .unwrap();

        let mut urls: Vec<_> = pages.keys().cloned().collect();
        urls.sort();
        assert_eq!(urls, vec![site.url("/"), site.url("/a"), site.url("/b")]);
        assert_eq!(pages[&site.url("/a")].fetch.http_status, Some(200));
        for mock in &never_fetched {
            assert_eq!(mock.hits_async().await, 0);
        }
    }

    #[tokio::test]
    async fn test_invalid_configuration_is_fatal() {
        let result = crawl_site("https://example.com/", &config(10, 0)).await;
        assert!(matches!(result, Err(AuditError::InvalidConcurrency)));
    }
}
