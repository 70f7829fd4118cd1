//! Polymarket URL parsing
//!
//! Recognized paths:
//! - `/event/{slug}`
//! - `/market/{slug}`
//! - `/sports/{league}/.../{slug}` (treated as an event)
//!
//! Anything else, including links to other hosts, is a free-text query.

use url::Url;

const POLYMARKET_HOST: &str = "polymarket.com";

/// Kind of object a URL slug refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugKind {
    Event,
    Market,
}

/// Parsed user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketInput {
    /// Polymarket link
    Url { kind: SlugKind, slug: String },
    /// Free-text match description
    Query(String),
}

/// Classify input as a Polymarket link or a free-text query
pub fn parse_input(text: &str) -> MarketInput {
    let text = text.trim();
    extract_slug(text)
        .map(|(kind, slug)| MarketInput::Url { kind, slug })
        .unwrap_or_else(|| MarketInput::Query(text.to_string()))
}

fn extract_slug(text: &str) -> Option<(SlugKind, String)> {
    let parsed = Url::parse(text).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") || !is_polymarket_host(parsed.host_str()?) {
        return None;
    }

    let parts: Vec<&str> = parsed.path_segments()?.filter(|p| !p.is_empty()).collect();

    match parts.as_slice() {
        ["event", slug, ..] => Some((SlugKind::Event, slug.to_string())),
        ["market", slug, ..] => Some((SlugKind::Market, slug.to_string())),
        ["sports", _, .., slug] => Some((SlugKind::Event, slug.to_string())),
        _ => None,
    }
}

fn is_polymarket_host(host: &str) -> bool {
    host == POLYMARKET_HOST || host.ends_with(&format!(".{POLYMARKET_HOST}"))
}
