// src/analyze/document.rs
// =============================================================================
// This module turns one fetched HTML body into a PageAnalysis.
//
// We use the `scraper` crate, which is built on html5ever. html5ever never
// rejects input: unclosed tags, stray attributes and truncated documents all
// still produce a tree. Whatever can't be found in that tree simply falls
// back to an empty default (empty string, zero count, empty list).
//
// Attribute values are matched case-insensitively (rel="Canonical",
// name="Description"), element and attribute names are already lowercased
// by the parser.
// =============================================================================

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::structured_data::StructuredData;
use crate::config::AnalysisLimits;

// Elements whose text never shows up on the rendered page
const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextField {
    pub text: String,
    pub length: usize,
}

impl TextField {
    fn new(text: String) -> Self {
        let length = text.chars().count();
        Self { text, length }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Headings {
    pub count: usize,
    pub texts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Images {
    pub total: usize,
    pub missing_alt_count: usize,
    /// Capped by `AnalysisLimits::max_missing_alt_sources`
    pub missing_alt_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HreflangEntry {
    pub lang: String,
    pub href: String,
}

// Every on-page signal we extract from a single document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub title: TextField,
    pub meta_description: TextField,
    pub h1: Headings,
    pub canonical_url: String,
    pub meta_robots: String,
    pub viewport: String,
    pub structured_data: Vec<StructuredData>,
    pub images: Images,
    pub outbound_link_count: usize,
    pub word_count: usize,
    pub hreflang: Vec<HreflangEntry>,
}

// Analyzes one document
//
// Parameters:
//   url: the page the body came from (only used for logging)
//   body: the raw HTML
//   limits: output size caps
pub fn analyze(url: &str, body: &str, limits: &AnalysisLimits) -> PageAnalysis {
    let document = Html::parse_document(body);
    let analysis = analyze_document(&document, limits);

    debug!(
        url,
        words = analysis.word_count,
        links = analysis.outbound_link_count,
        "Analyzed page"
    );

    analysis
}

// Analyzes an already-parsed document
//
// The crawler parses each body once and uses the same tree for both the
// analysis and `outbound_hrefs`.
pub fn analyze_document(document: &Html, limits: &AnalysisLimits) -> PageAnalysis {
    let h1_texts: Vec<String> = select(document, "h1").map(element_text).collect();

    PageAnalysis {
        title: TextField::new(
            select(document, "title")
                .next()
                .map(element_text)
                .unwrap_or_default(),
        ),
        meta_description: TextField::new(meta_content(document, "description")),
        h1: Headings {
            count: h1_texts.len(),
            texts: h1_texts,
        },
        canonical_url: canonical_href(document),
        meta_robots: meta_content(document, "robots"),
        viewport: meta_content(document, "viewport"),
        structured_data: structured_data(document, limits.raw_block_chars),
        images: images(document, limits.max_missing_alt_sources),
        outbound_link_count: outbound_hrefs(document).len(),
        word_count: word_count(document),
        hreflang: hreflang(document),
    }
}

// All href values of <a href> elements, in document order, unresolved
pub fn outbound_hrefs(document: &Html) -> Vec<String> {
    select(document, "a[href]")
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

// Runs a CSS selector, yielding nothing if the selector can't be parsed
fn select<'a>(document: &'a Html, css: &str) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    let elements: Vec<ElementRef<'a>> = match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    };
    elements.into_iter()
}

// Concatenated, trimmed text of an element
fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

// Case-insensitive "contains" match on an attribute value
fn attr_matches(element: &ElementRef, attr: &str, pattern: &str) -> bool {
    element
        .value()
        .attr(attr)
        .is_some_and(|value| value.to_lowercase().contains(pattern))
}

// Content of the first <meta> whose name contains `pattern`
fn meta_content(document: &Html, pattern: &str) -> String {
    select(document, "meta[name]")
        .find(|meta| attr_matches(meta, "name", pattern))
        .and_then(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

// href of the first <link rel="canonical">
fn canonical_href(document: &Html) -> String {
    select(document, "link[rel]")
        .find(|link| attr_matches(link, "rel", "canonical"))
        .and_then(|link| link.value().attr("href"))
        .map(|href| href.trim().to_string())
        .unwrap_or_default()
}

fn structured_data(document: &Html, max_raw_chars: usize) -> Vec<StructuredData> {
    select(document, "script[type]")
        .filter(|script| {
            script
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
        })
        .map(|script| StructuredData::parse(&script.text().collect::<String>(), max_raw_chars))
        .collect()
}

fn images(document: &Html, max_sources: usize) -> Images {
    let mut images = Images::default();

    for img in select(document, "img") {
        images.total += 1;

        if img.value().attr("alt").is_none() {
            images.missing_alt_count += 1;
            if images.missing_alt_sources.len() < max_sources {
                let src = img.value().attr("src").unwrap_or_default();
                images.missing_alt_sources.push(src.to_string());
            }
        }
    }

    images
}

// Number of word tokens in the visible text of <body>
//
// A token is a run of alphanumeric or underscore characters.
fn word_count(document: &Html) -> usize {
    let Some(body) = select(document, "body").next() else {
        return 0;
    };

    let mut visible = String::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            visible.push_str(text);
        }
    }

    count_words(&visible)
}

fn count_words(text: &str) -> usize {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .count()
}

fn hreflang(document: &Html) -> Vec<HreflangEntry> {
    select(document, "link[rel][hreflang][href]")
        .filter(|link| attr_matches(link, "rel", "alternate"))
        .filter_map(|link| {
            let element = link.value();
            Some(HreflangEntry {
                lang: element.attr("hreflang")?.trim().to_string(),
                href: element.attr("href")?.trim().to_string(),
            })
        })
        .collect()
}
