// src/fetcher/html.rs
// =============================================================================
// This module extracts links from HTML pages and normalizes URLs.
//
// We use the `scraper` crate to parse the HTML and find every <a href>,
// and the `url` crate to turn relative hrefs into absolute URLs.
//
// Normalization rules (two URLs are the same page iff these agree):
// - Relative hrefs are resolved against the page they were found on
// - The #fragment is dropped (it never changes what the server returns)
// - Only http:// and https:// URLs are kept
// =============================================================================

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

const DEFAULT_SCHEME: &str = "https://";

// Extracts every link in `html`, resolved against `base`
//
// Parameters:
//   base: the URL of the page the HTML came from
//   html: the HTML content to parse
//
// Returns: the set of absolute, normalized URLs (as strings)
//
// Example:
//   base = "https://example.com/page/"
//   html = "<a href='../docs#intro'>Docs</a>"
//   result = {"https://example.com/docs"}
pub fn extract_links(base: &Url, html: &str) -> HashSet<String> {
    let document = Html::parse_document(html);

    // "a[href]" is a constant, valid selector
    let selector = Selector::parse("a[href]").unwrap();

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(base, href))
        .map(String::from)
        .collect()
}

// Resolves a (possibly relative) link into a normalized absolute URL
//
// Returns None for links we never crawl:
// - pure anchors ("#section")
// - javascript:, mailto:, tel:, data: links
// - anything that does not end up as http/https
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|prefix| lower.starts_with(prefix))
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

// Turns whatever the user typed into a crawlable seed URL
//
// "example.com" has no host when parsed on its own, so we prepend https://
// the same way a browser address bar would.
pub fn normalize_seed(raw: &str) -> Result<Url, url::ParseError> {
    let raw = raw.trim();
    let mut url = match Url::parse(raw) {
        Ok(url) if url.host().is_some() => url,
        // "example.com" or "localhost:8080" (parsed as a scheme)
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
            Url::parse(&format!("{DEFAULT_SCHEME}{raw}"))?
        }
        Err(e) => return Err(e),
    };

    url.set_fragment(None);
    Ok(url)
}
