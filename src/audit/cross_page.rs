// src/audit/cross_page.rs
// =============================================================================
// Checks that need every analyzed page at once.
//
// - canonical_chains: follows <link rel="canonical"> from page to page and
//   reports every path longer than one hop (indirection or loops)
// - structured_data_issues: flags JSON-LD blocks lacking @context/@type or
//   that aren't JSON objects at all
//
// Both take the analyses keyed by normalized URL in a BTreeMap, so the output
// order is stable no matter in which order the crawl finished.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::analyze::{PageAnalysis, StructuredData};
use crate::crawl::normalize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalChain {
    /// Starting page first, then each canonical target in turn
    pub urls: Vec<String>,
    /// The chain hit the length cap without ending, almost always a loop
    pub unterminated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructuredDataIssue {
    #[serde(rename = "missing @context")]
    MissingContext,
    #[serde(rename = "missing @type")]
    MissingType,
    #[serde(rename = "not a dict")]
    NotADict,
}

impl fmt::Display for StructuredDataIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StructuredDataIssue::MissingContext => "missing @context",
            StructuredDataIssue::MissingType => "missing @type",
            StructuredDataIssue::NotADict => "not a dict",
        };
        f.write_str(text)
    }
}

// Follows canonical references from every page that declares one
//
// A chain stops when a page is canonical to itself, when the next target
// wasn't crawled, or when it reaches `max_len` URLs. Only chains with more
// than one URL are returned.
pub fn canonical_chains(
    analyses: &BTreeMap<&str, &PageAnalysis>,
    max_len: usize,
) -> Vec<CanonicalChain> {
    let mut chains = Vec::new();

    for (&start, analysis) in analyses {
        if analysis.canonical_url.is_empty() {
            continue;
        }

        let mut urls = vec![start.to_string()];
        let mut current = start.to_string();

        while urls.len() < max_len {
            let Some(page) = analyses.get(current.as_str()) else {
                break;
            };
            let Some(next) = canonical_target(&current, &page.canonical_url) else {
                break;
            };
            if next == current {
                break;
            }
            urls.push(next.clone());
            current = next;
        }

        if urls.len() > 1 {
            chains.push(CanonicalChain {
                unterminated: urls.len() >= max_len,
                urls,
            });
        }
    }

    chains
}

// Resolves a canonical value the same way crawled links are normalized
//
// Values the normalizer rejects (`#main`, `javascript:`, ...) end the chain.
fn canonical_target(page_url: &str, canonical: &str) -> Option<String> {
    normalize(page_url, canonical)
}

// Lists the JSON-LD problems of every page that has any
pub fn structured_data_issues(
    analyses: &BTreeMap<&str, &PageAnalysis>,
) -> BTreeMap<String, Vec<StructuredDataIssue>> {
    analyses
        .iter()
        .filter_map(|(&url, analysis)| {
            let issues: Vec<StructuredDataIssue> = analysis
                .structured_data
                .iter()
                .flat_map(block_issues)
                .collect();
            (!issues.is_empty()).then(|| (url.to_string(), issues))
        })
        .collect()
}

fn block_issues(block: &StructuredData) -> Vec<StructuredDataIssue> {
    let Some(object) = block.as_object() else {
        return vec![StructuredDataIssue::NotADict];
    };

    let has_graph = object.contains_key("@graph");
    let mut issues = Vec::new();
    if !has_graph && !object.contains_key("@context") {
        issues.push(StructuredDataIssue::MissingContext);
    }
    if !has_graph && !object.contains_key("@type") {
        issues.push(StructuredDataIssue::MissingType);
    }
    issues
}
