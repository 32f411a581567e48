use serde::{Deserialize, Serialize};

use crate::models::Platform;

/// A canonical marketplace listing.
///
/// Fields are only reachable through accessors so a listing cannot change
/// after the normalizer builds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    listing_id: String,
    platform: Platform,
    title: String,
    price: String,
    url: String,
    image_url: Option<String>,
    search_term: String,
}

impl Listing {
    /// Build a listing from an already-cleaned native identifier.
    ///
    /// The stored `listing_id` is namespaced by platform (`ebay:1234`) so that
    /// uniqueness of the id column implies uniqueness of the platform/id pair.
    pub fn new(
        platform: Platform,
        native_id: &str,
        title: impl Into<String>,
        price: impl Into<String>,
        url: impl Into<String>,
        image_url: Option<String>,
        search_term: impl Into<String>,
    ) -> Self {
        Self {
            listing_id: Self::key(platform, native_id),
            platform,
            title: title.into(),
            price: price.into(),
            url: url.into(),
            image_url,
            search_term: search_term.into(),
        }
    }

    /// Store key for a platform-native identifier.
    pub fn key(platform: Platform, native_id: &str) -> String {
        format!("{}:{}", platform.as_str(), native_id)
    }

    pub fn listing_id(&self) -> &str {
        &self.listing_id
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }
}
