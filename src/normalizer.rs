use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::models::{Listing, Platform, RawCandidate, PRICE_UNAVAILABLE};

static EBAY_ITEM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/itm/(?:[^/?#]+/)?(\d+)").expect("valid eBay item regex"));

static DEPOP_PRODUCT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/products/([\w-]+)").expect("valid Depop product regex"));

/// Promo tiles eBay mixes into search results.
const EBAY_PLACEHOLDER_TITLES: &[&str] = &["Shop on eBay", "Daily Deals"];

/// Depop thumbnail suffixes and the full-size suffix they are upgraded to.
const DEPOP_THUMBNAIL_SUFFIXES: &[&str] = &["/P2.jpg", "/P4.jpg", "/P5.jpg", "/P6.jpg"];
const DEPOP_FULL_SIZE_SUFFIX: &str = "/P1.jpg";

pub fn normalize(raw: RawCandidate, platform: Platform, search_phrase: &str) -> Option<Listing> {
    let raw_url = raw.url.trim();
    let resolved_url = if raw_url.is_empty() {
        None
    } else {
        resolve_against(platform.base_url(), raw_url)
    };

    let native_id = raw
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .or_else(|| resolved_url.as_deref().and_then(|u| extract_native_id(platform, u)));

    let Some(native_id) = native_id else {
        tracing::trace!(platform = %platform, url = raw_url, "Skipping candidate without identifier");
        return None;
    };

    let title = [raw.title.as_deref(), raw.slug.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| match platform {
            Platform::Depop => Some(native_id.clone()),
            Platform::Ebay => None,
        })
        .map(|t| if looks_like_slug(&t) { slug_to_title(&t) } else { t });

    let Some(title) = title else {
        tracing::trace!(platform = %platform, id = %native_id, "Skipping candidate without title");
        return None;
    };

    if platform == Platform::Ebay && EBAY_PLACEHOLDER_TITLES.iter().any(|p| title.contains(p)) {
        return None;
    }

    let price = raw
        .price
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(PRICE_UNAVAILABLE)
        .to_string();

    let url = resolved_url.unwrap_or_else(|| canonical_url(platform, &native_id));
    let image_url = raw
        .image_url
        .as_deref()
        .and_then(|src| resolve_image_url(platform, src));

    Some(Listing::new(
        platform,
        &native_id,
        title,
        price,
        url,
        image_url,
        search_phrase,
    ))
}

/// Pull the platform-native id out of a listing URL.
pub fn extract_native_id(platform: Platform, url: &str) -> Option<String> {
    let pattern = match platform {
        Platform::Ebay => &*EBAY_ITEM_ID,
        Platform::Depop => &*DEPOP_PRODUCT_ID,
    };
    pattern
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Make an image URL absolute and, for Depop, request the full-size rendition.
pub fn resolve_image_url(platform: Platform, src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return None;
    }

    let absolute = if let Some(rest) = src.strip_prefix("//") {
        format!("https://{}", rest)
    } else if src.starts_with('/') {
        resolve_against(platform.image_host(), src)?
    } else {
        Url::parse(src).ok()?.to_string()
    };

    if platform == Platform::Depop {
        for suffix in DEPOP_THUMBNAIL_SUFFIXES {
            if let Some(stem) = absolute.strip_suffix(suffix) {
                return Some(format!("{}{}", stem, DEPOP_FULL_SIZE_SUFFIX));
            }
        }
    }

    Some(absolute)
}

fn resolve_against(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

fn canonical_url(platform: Platform, native_id: &str) -> String {
    match platform {
        Platform::Ebay => format!("{}/itm/{}", platform.base_url(), native_id),
        Platform::Depop => format!("{}/products/{}/", platform.base_url(), native_id),
    }
}

fn looks_like_slug(text: &str) -> bool {
    !text.contains(char::is_whitespace) && text.contains('-')
}

/// `vintage-champion-reverse-weave` -> `Vintage Champion Reverse Weave`
fn slug_to_title(slug: &str) -> String {
    slug.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
