// src/analyze/mod.rs
// =============================================================================
// This module extracts on-page SEO signals from HTML documents.
//
// Submodules:
// - document: title, meta tags, headings, images, links, word count, hreflang
// - structured_data: JSON-LD blocks, parsed or kept as raw stubs
// =============================================================================

mod document;
mod structured_data;

pub use document::{
    analyze, analyze_document, outbound_hrefs, Headings, HreflangEntry, Images, PageAnalysis,
    TextField,
};
pub use structured_data::StructuredData;
