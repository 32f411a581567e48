// Source adapter implementations
pub mod http_json;
pub mod retrying;

pub use http_json::HttpJsonSource;
pub use retrying::{RetryPolicy, RetryingSource};

use crate::config::AppConfig;
use crate::plugins::traits::SourceAdapter;
use crate::utils::error::AppError;

/// Build every enabled source from configuration, each wrapped with retries.
pub fn build_sources(config: &AppConfig) -> Result<Vec<Box<dyn SourceAdapter>>, AppError> {
    let policy = RetryPolicy::from(&config.retry);
    let mut sources: Vec<Box<dyn SourceAdapter>> = Vec::new();

    for source_config in config.sources.iter().filter(|s| s.enabled) {
        let source = HttpJsonSource::new(source_config, config.search.per_source_limit)?;
        tracing::info!(
            source = %source_config.name,
            platform = %source_config.platform,
            endpoint = %source_config.endpoint,
            "Registered source"
        );
        sources.push(Box::new(RetryingSource::new(source, policy.clone())));
    }

    Ok(sources)
}
