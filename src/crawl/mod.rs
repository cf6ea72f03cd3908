// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Concurrent crawling with a fixed worker pool sharing one frontier
// - Same-origin restriction (links to other sites are seen, never fetched)
// - A page budget that caps how many URLs are ever queued
// - Optional cancellation that drains in-flight fetches and returns early
//
// Submodules:
// - normalize: resolving and de-fragmenting discovered links
// - fetch: the HTTP GET behind every page
// - frontier: the shared queue + seen-set
// - queue: the worker pool driving it all
// =============================================================================

mod fetch;
mod frontier;
mod normalize;
mod queue;

pub use fetch::{FetchResult, Fetcher};
pub use frontier::Frontier;
pub use normalize::{normalize, normalize_against, same_origin};
pub use queue::{crawl_site, crawl_site_with_cancellation, parse_seed, CrawledPage};
