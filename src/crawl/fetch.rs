// src/crawl/fetch.rs
// =============================================================================
// This module performs the single HTTP GET behind every crawled page.
//
// Key functionality:
// - One shared reqwest Client (connection pooling) with a fixed User-Agent
//   and a per-request timeout
// - Every outcome becomes a FetchResult: either (status + body) or an error
//   message, never both
// - Transport failures are categorized into readable messages and returned
//   as data; nothing is propagated past `fetch`
// - Redirects are followed only within the origin of the requested URL; a
//   hop to another origin stops the chain and the 3xx itself is returned
// =============================================================================

use reqwest::redirect::{Attempt, Policy};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::AuditError;

const MAX_REDIRECTS: usize = 10;

// The outcome of fetching one URL
//
// Exactly one of (http_status + body) or error_message is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    /// Where the response actually came from after same-origin redirects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub http_status: Option<u16>,
    /// Raw HTML; kept in memory for analysis but left out of reports
    #[serde(skip)]
    pub body: Option<String>,
    pub elapsed_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl FetchResult {
    pub fn success(url: String, status: u16, body: String, elapsed: Duration) -> Self {
        Self {
            final_url: Some(url.clone()),
            url,
            http_status: Some(status),
            body: Some(body),
            elapsed_seconds: Some(elapsed.as_secs_f64()),
            error_message: None,
        }
    }

    pub fn failure(url: String, message: String) -> Self {
        Self {
            url,
            final_url: None,
            http_status: None,
            body: None,
            elapsed_seconds: None,
            error_message: Some(message),
        }
    }

    /// Records the URL the response was served from
    pub fn served_from(mut self, final_url: String) -> Self {
        self.final_url = Some(final_url);
        self
    }

    /// Base for resolving the document's relative links
    pub fn document_url(&self) -> &str {
        self.final_url.as_deref().unwrap_or(&self.url)
    }

    /// A response arrived and carried a non-empty body worth analyzing
    pub fn has_document(&self) -> bool {
        self.http_status.is_some() && self.body.as_deref().is_some_and(|b| !b.is_empty())
    }
}

// Thin wrapper around a configured reqwest client
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    // Builds the shared client
    //
    // Fails only if reqwest can't initialise its TLS backend.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, AuditError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(Policy::custom(same_origin_redirects))
            .build()?;

        Ok(Self { client })
    }

    // Fetches one URL and reports the outcome as data
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let started = Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return FetchResult::failure(url.to_string(), categorize_error(&e)),
        };

        let status = response.status().as_u16();
        let final_url = response.url().to_string();

        // Invalid UTF-8 is replaced rather than rejected, like a browser would
        match response.text().await {
            Ok(body) => FetchResult::success(url.to_string(), status, body, started.elapsed())
                .served_from(final_url),
            Err(e) => FetchResult::failure(url.to_string(), categorize_error(&e)),
        }
    }
}

// Redirect policy: follow up to MAX_REDIRECTS hops, never leave the origin
// of the URL that was originally requested
fn same_origin_redirects(attempt: Attempt) -> reqwest::redirect::Action {
    let Some(first) = attempt.previous().first() else {
        return attempt.follow();
    };

    if attempt.url().origin() != first.origin() {
        attempt.stop()
    } else if attempt.previous().len() > MAX_REDIRECTS {
        attempt.error("too many redirects")
    } else {
        attempt.follow()
    }
}

// Turns a reqwest error into a short human-readable message
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure
// - Connection refused / reset
// - Too many redirects
fn categorize_error(error: &reqwest::Error) -> String {
    let error_string = error.to_string();

    if error.is_timeout() {
        "Request timed out".to_string()
    } else if error.is_redirect() {
        "Too many redirects".to_string()
    } else if error.is_connect() {
        if error_string.to_lowercase().contains("dns") {
            "Could not resolve hostname".to_string()
        } else {
            "Connection failed".to_string()
        }
    } else {
        error_string
    }
}
