use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod listing;
pub mod raw_candidate;
pub mod seen_record;

// Re-exports for convenience
pub use listing::*;
pub use raw_candidate::*;
pub use seen_record::*;

/// Price text stored when a source does not expose a price.
pub const PRICE_UNAVAILABLE: &str = "Price not available";

/// One tag per integrated marketplace.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum Platform {
    Ebay,
    Depop,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ebay => "ebay",
            Platform::Depop => "depop",
        }
    }

    /// Human readable name used in digests.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Ebay => "eBay",
            Platform::Depop => "Depop",
        }
    }

    /// Base URL that relative listing links are resolved against.
    pub fn base_url(&self) -> &'static str {
        match self {
            Platform::Ebay => "https://www.ebay.com",
            Platform::Depop => "https://www.depop.com",
        }
    }

    /// Host serving listing images for root-relative image paths.
    pub fn image_host(&self) -> &'static str {
        match self {
            Platform::Ebay => "https://i.ebayimg.com",
            Platform::Depop => "https://media-photos.depop.com",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ebay" => Ok(Platform::Ebay),
            "depop" => Ok(Platform::Depop),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}
