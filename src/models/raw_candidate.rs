use serde::{Deserialize, Serialize};

/// Unvalidated record returned by a source adapter for one search hit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawCandidate {
    #[serde(default)]
    pub title: Option<String>,
    /// URL slug, used as the title when the source exposes no title text.
    #[serde(default, alias = "tag")]
    pub slug: Option<String>,
    /// Opaque platform identifier.
    #[serde(default, alias = "listing_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub url: String,
}

impl RawCandidate {
    pub fn new(title: impl Into<String>, id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            slug: None,
            id: Some(id.into()),
            price: None,
            image_url: None,
            url: url.into(),
        }
    }

    pub fn with_price(mut self, price: impl Into<String>) -> Self {
        self.price = Some(price.into());
        self
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}
