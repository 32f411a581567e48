use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::models::{InsertOutcome, Listing, SeenRecord};
use crate::utils::error::StoreError;

/// Persistent record of every listing that has already been reported.
///
/// `mark_seen` must be a single atomic insert-or-detect-duplicate so that
/// overlapping cycles can never both observe `Inserted` for one id.
#[async_trait]
pub trait SeenListingStore: Send + Sync {
    async fn has_seen(&self, listing_id: &str) -> Result<bool, StoreError>;
    async fn mark_seen(&self, listing: &Listing) -> Result<InsertOutcome, StoreError>;
    async fn count(&self) -> Result<u64, StoreError>;
    async fn recent(&self, limit: u32) -> Result<Vec<SeenRecord>, StoreError>;

    async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.count().await? == 0)
    }
}

pub struct SqliteSeenStore {
    pool: SqlitePool,
}

impl SqliteSeenStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let in_memory = config.url.contains(":memory:");

        let connection_string = if config.url.starts_with("sqlite:") {
            config.url.clone()
        } else {
            // Plain filesystem path
            if let Some(parent) = Path::new(&config.url).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            format!("sqlite://{}?mode=rwc", config.url)
        };

        let mut options = SqlitePoolOptions::new().max_connections(config.max_connections);
        if in_memory {
            // Every connection to an in-memory database sees its own empty
            // database, so the single connection must never be recycled.
            options = options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }

        let pool = options.connect(&connection_string).await?;

        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    pub async fn initialize_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_listings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                listing_id TEXT NOT NULL UNIQUE,
                platform TEXT NOT NULL,
                title TEXT NOT NULL,
                price TEXT NOT NULL,
                url TEXT NOT NULL,
                image_url TEXT,
                search_term TEXT NOT NULL,
                first_seen DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_seen_listings_first_seen
            ON seen_listings(first_seen DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        tracing::debug!("Seen-listing schema initialized");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SeenListingStore for SqliteSeenStore {
    async fn has_seen(&self, listing_id: &str) -> Result<bool, StoreError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM seen_listings WHERE listing_id = ?")
            .bind(listing_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn mark_seen(&self, listing: &Listing) -> Result<InsertOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO seen_listings (
                listing_id, platform, title, price, url, image_url, search_term, first_seen
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(listing_id) DO NOTHING
            "#,
        )
        .bind(listing.listing_id())
        .bind(listing.platform())
        .bind(listing.title())
        .bind(listing.price())
        .bind(listing.url())
        .bind(listing.image_url())
        .bind(listing.search_term())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(listing_id = listing.listing_id(), "Listing already recorded");
            Ok(InsertOutcome::AlreadyExists)
        } else {
            tracing::debug!(listing_id = listing.listing_id(), "Marked listing as seen");
            Ok(InsertOutcome::Inserted)
        }
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM seen_listings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<SeenRecord>, StoreError> {
        let records = sqlx::query_as::<_, SeenRecord>(
            r#"
            SELECT listing_id, platform, title, price, url, image_url, search_term, first_seen
            FROM seen_listings
            ORDER BY first_seen DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}
