use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::config::SourceConfig;
use crate::models::{Platform, RawCandidate};
use crate::plugins::traits::SourceAdapter;
use crate::utils::error::{AdapterError, AppError};

/// Body returned by the scraping service, either a bare list or wrapped.
/// Records are kept as raw JSON so one bad entry cannot sink the rest.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchPayload {
    List(Vec<Value>),
    Wrapped { results: Vec<Value> },
}

impl SearchPayload {
    fn into_records(self) -> Vec<Value> {
        match self {
            SearchPayload::List(records) => records,
            SearchPayload::Wrapped { results } => results,
        }
    }
}

/// Source backed by an external scraping service that answers
/// `GET <endpoint>?q=<phrase>&limit=<n>` with raw candidates as JSON.
pub struct HttpJsonSource {
    name: String,
    platform: Platform,
    endpoint: Url,
    client: Client,
    limit: usize,
    timeout_secs: u64,
}

impl HttpJsonSource {
    pub fn new(config: &SourceConfig, limit: usize) -> Result<Self, AppError> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            AppError::Validation(format!("Invalid endpoint for source '{}': {}", config.name, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .user_agent(concat!("thrift-watcher/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            name: config.name.clone(),
            platform: config.platform,
            endpoint,
            client,
            limit,
            timeout_secs: config.request_timeout,
        })
    }

    fn search_url(&self, phrase: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", phrase)
            .append_pair("limit", &self.limit.to_string());
        url
    }
}

#[async_trait]
impl SourceAdapter for HttpJsonSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    async fn search(&self, phrase: &str) -> Result<Vec<RawCandidate>, AdapterError> {
        let url = self.search_url(phrase);
        tracing::debug!(source = %self.name, %url, "Requesting search results");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AdapterError::Timeout(self.timeout_secs)
            } else {
                AdapterError::from(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let payload: SearchPayload =
            serde_json::from_str(&body).map_err(|e| AdapterError::Parse(e.to_string()))?;

        let candidates: Vec<RawCandidate> = payload
            .into_records()
            .into_iter()
            .filter_map(|record| match serde_json::from_value(record) {
                Ok(candidate) => Some(candidate),
                Err(e) => {
                    tracing::trace!(source = %self.name, error = %e, "Skipping malformed record");
                    None
                }
            })
            .collect();
        tracing::debug!(source = %self.name, phrase, count = candidates.len(), "Received candidates");
        Ok(candidates)
    }
}
