// src/crawl/normalize.rs
// =============================================================================
// URL normalization for the crawl frontier.
//
// Every href we discover goes through `normalize` before it is compared with
// the seen-set, so two links that only differ by their #fragment collapse to
// the same frontier entry.
//
// Rules:
// - empty hrefs, javascript:, mailto:, tel: and pure "#anchor" links are dropped
// - relative links are resolved against the page they were found on
// - the fragment is stripped from the result
// =============================================================================

use url::Url;

// Link prefixes that never point at another document
const SKIPPED_PREFIXES: [&str; 4] = ["#", "javascript:", "mailto:", "tel:"];

// Resolves `href` against `base` and strips the fragment
//
// Returns None for links that can't be navigated to.
//
// Examples:
//   normalize("https://a.com/x", "/y")   -> Some("https://a.com/y")
//   normalize("https://a.com/x", "#top") -> None
pub fn normalize(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    normalize_against(&base, href).map(|url| url.to_string())
}

// Same as `normalize`, but with an already-parsed base and a parsed result
//
// The crawler uses this form so each page URL is parsed once, not once per link.
pub fn normalize_against(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return None;
    }

    let mut joined = base.join(href).ok()?;
    joined.set_fragment(None);
    Some(joined)
}

// True iff both URLs share scheme, host and port
//
// url's Origin already applies default ports (http://a.com == http://a.com:80)
// and never considers two opaque origins (data:, file:) equal.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
