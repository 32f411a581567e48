use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::Platform;

/// Row of the `seen_listings` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct SeenRecord {
    pub listing_id: String,
    pub platform: Platform,
    pub title: String,
    pub price: String,
    pub url: String,
    pub image_url: Option<String>,
    pub search_term: String,
    pub first_seen: DateTime<Utc>,
}

/// Result of an insert-if-absent against the seen-listing store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted)
    }
}
