//! Best-seller grid parsing.
//!
//! Operates on raw HTML with `regex`; there is no DOM. Each grid item is the
//! slice between one `gridItemRoot` marker and the next. When a page carries
//! no grid markers at all, product links (`/dp/<ASIN>`) are used directly.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use trendscout_core::{RawListing, RegionSource};

/// Names shorter than this are navigation or badge text, not products.
const MIN_NAME_CHARS: usize = 5;
const MAX_NAME_CHARS: usize = 200;
/// Upper bound on links considered by the link fallback.
const MAX_FALLBACK_LINKS: usize = 60;

static GRID_ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<div[^>]*\bid\s*=\s*["']gridItemRoot"#).expect("valid grid item regex")
});
static IMG_ALT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\balt\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid img alt regex")
});
static TITLE_DIV_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<(?:div|span)[^>]*class\s*=\s*["'][^"']*(?:p13n-sc-truncate|line-clamp)[^"']*["'][^>]*>(.*?)</(?:div|span)>"#,
    )
    .expect("valid title div regex")
});
static DP_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']([^"']*?/dp/([A-Z0-9]{10})[^"']*)["']"#)
        .expect("valid dp href regex")
});
static ANY_HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\b[^>]*?\bhref\s*=\s*["']([^"'#]+)["']"#).expect("valid href regex")
});
static DP_ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["'][^"']*?/dp/([A-Z0-9]{10})[^"']*["'][^>]*>(.*?)</a>"#)
        .expect("valid dp anchor regex")
});
static RANK_BADGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)zg-bdg-text[^>]*>\s*#\s*(\d{1,5})").expect("valid rank badge regex")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag regex"));
static NUMERIC_ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&#(?:x([0-9a-fA-F]+)|([0-9]+));").expect("valid numeric entity regex")
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Parses one best-seller page into listings for `category`.
///
/// `position_offset` is the number of items on earlier pages of the same
/// category; it seeds the positional rank used when an item has no `#N`
/// badge.
#[must_use]
pub fn parse_bestseller_page(
    html: &str,
    source: &RegionSource,
    category: &str,
    position_offset: usize,
) -> Vec<RawListing> {
    let blocks = split_grid_items(html);
    if blocks.is_empty() {
        return parse_product_links(html, source, category, position_offset);
    }

    let price_re = price_regex(source.currency_symbol());
    blocks
        .iter()
        .enumerate()
        .filter_map(|(idx, block)| {
            parse_grid_item(
                block,
                source,
                category,
                position_offset + idx + 1,
                price_re.as_ref(),
            )
        })
        .collect()
}

fn split_grid_items(html: &str) -> Vec<&str> {
    let starts: Vec<usize> = GRID_ITEM_RE.find_iter(html).map(|m| m.start()).collect();
    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = starts.get(i + 1).copied().unwrap_or(html.len());
            &html[start..end]
        })
        .collect()
}

fn parse_grid_item(
    block: &str,
    source: &RegionSource,
    category: &str,
    position: usize,
    price_re: Option<&Regex>,
) -> Option<RawListing> {
    let name = extract_name(block)?;
    let url = extract_url(block, &source.base_url)?;
    let rank = extract_rank(block).or_else(|| u32::try_from(position).ok());
    let price = price_re.and_then(|re| extract_price(block, re));

    Some(RawListing {
        name,
        category: category.to_string(),
        url,
        price,
        rank,
    })
}

fn extract_name(block: &str) -> Option<String> {
    let from_alt = IMG_ALT_RE.captures_iter(block).find_map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| clean_name(m.as_str()))
    });
    from_alt.or_else(|| {
        TITLE_DIV_RE
            .captures_iter(block)
            .find_map(|caps| caps.get(1).and_then(|m| clean_name(m.as_str())))
    })
}

fn extract_url(block: &str, base_url: &str) -> Option<String> {
    let base = base_url.trim_end_matches('/');
    if let Some(caps) = DP_HREF_RE.captures(block) {
        let asin = caps.get(2)?.as_str();
        return Some(format!("{base}/dp/{asin}"));
    }

    let href = ANY_HREF_RE.captures(block)?.get(1)?.as_str();
    let href = decode_entities(href);
    let href = href.split('?').next().unwrap_or_default();
    if href.starts_with("http") {
        Some(href.to_string())
    } else if href.starts_with('/') {
        Some(format!("{base}{href}"))
    } else {
        None
    }
}

fn extract_rank(block: &str) -> Option<u32> {
    RANK_BADGE_RE
        .captures(block)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|r| *r > 0)
}

fn price_regex(currency: &str) -> Option<Regex> {
    let symbol = currency.trim();
    if symbol.is_empty() {
        return None;
    }
    Regex::new(&format!(
        r"{}\s*([0-9][0-9,]*(?:\.[0-9]+)?)",
        regex::escape(symbol)
    ))
    .ok()
}

/// First amount after the currency symbol. A price range yields its lower bound.
fn extract_price(block: &str, price_re: &Regex) -> Option<f64> {
    let text = decode_entities(block);
    let caps = price_re.captures(&text)?;
    let amount = caps.get(1)?.as_str().replace(',', "");
    amount
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
}

/// Link-only fallback for pages without grid markers. Ranks are positional
/// and prices are unknown.
fn parse_product_links(
    html: &str,
    source: &RegionSource,
    category: &str,
    position_offset: usize,
) -> Vec<RawListing> {
    let base = source.base_url.trim_end_matches('/');
    let mut seen = HashSet::new();
    let mut listings = Vec::new();

    for caps in DP_ANCHOR_RE.captures_iter(html).take(MAX_FALLBACK_LINKS) {
        let (Some(asin), Some(inner)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if !seen.insert(asin.as_str().to_string()) {
            continue;
        }
        let Some(name) = clean_name(inner.as_str()) else {
            continue;
        };
        listings.push(RawListing {
            name,
            category: category.to_string(),
            url: format!("{base}/dp/{}", asin.as_str()),
            price: None,
            rank: u32::try_from(position_offset + listings.len() + 1).ok(),
        });
    }

    tracing::debug!(
        category,
        count = listings.len(),
        "no grid items on page; used product-link fallback"
    );
    listings
}

fn clean_name(raw: &str) -> Option<String> {
    let stripped = TAG_RE.replace_all(raw, " ");
    let decoded = decode_entities(&stripped);
    let collapsed = WHITESPACE_RE.replace_all(decoded.trim(), " ");
    if collapsed.chars().count() < MIN_NAME_CHARS {
        return None;
    }
    Some(collapsed.chars().take(MAX_NAME_CHARS).collect())
}

pub(crate) fn decode_entities(input: &str) -> String {
    let named = input
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&pound;", "£")
        .replace("&euro;", "€");

    let numeric = NUMERIC_ENTITY_RE.replace_all(&named, |caps: &regex::Captures<'_>| {
        let code = match (caps.get(1), caps.get(2)) {
            (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
            (None, Some(dec)) => dec.as_str().parse::<u32>().ok(),
            (None, None) => None,
        };
        code.and_then(char::from_u32)
            .map_or_else(|| caps[0].to_string(), |c| c.to_string())
    });

    // Last so that "&amp;lt;" decodes to "&lt;" rather than "<".
    numeric.replace("&amp;", "&")
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
