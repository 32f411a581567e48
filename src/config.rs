use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;
use validator::Validate;

use crate::matcher::MatcherConfig;
use crate::models::Platform;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub retry: RetryConfig,
    pub digest: DigestConfig,
    pub notifications: NotificationsConfig,
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Phrases in the order they are searched.
    pub phrases: Vec<String>,
    /// Maximum raw candidates taken from one source for one phrase.
    pub per_source_limit: usize,
    /// Record current listings without notifying when the store is empty.
    #[serde(default = "default_true")]
    pub seed_on_empty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub platform: Platform,
    /// Search endpoint of the scraping service backing this source.
    pub endpoint: String,
    #[serde(default = "default_source_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    pub max_per_batch: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SmtpConfig {
    #[validate(length(min = 1))]
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    #[validate(email)]
    pub from_address: Option<String>,
    pub from_name: String,
    #[validate(email)]
    pub to_address: Option<String>,
    pub use_tls: bool,
}

impl SmtpConfig {
    /// Credentials and both addresses are present.
    pub fn is_complete(&self) -> bool {
        self.username.is_some()
            && self.password.is_some()
            && self.from_address.is_some()
            && self.to_address.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Six-field cron expression (seconds first) used by `watch`.
    pub cron: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily rolling log files; stdout only when unset.
    pub directory: Option<String>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "thrift_watcher=info".to_string(),
            directory: None,
            file_prefix: "thrift-watcher.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9001,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_source_timeout() -> u64 {
    30
}

impl AppConfig {
    /// Layered load: `<dir>/default`, `<dir>/<RUN_MODE>`, `<dir>/local`, then
    /// `THRIFT__*` environment variables.
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name(&format!("{}/default", config_dir)))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            .add_source(File::with_name(&format!("{}/local", config_dir)).required(false))
            .add_source(Environment::with_prefix("THRIFT").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.apply_legacy_email_env();
        config.validate()?;
        Ok(config)
    }

    /// Fill SMTP settings from the plain `EMAIL_*` / `SMTP_*` variables when unset.
    fn apply_legacy_email_env(&mut self) {
        let smtp = &mut self.notifications.smtp;

        if let Ok(host) = env::var("SMTP_SERVER") {
            smtp.host = host;
        }
        if let Some(port) = env::var("SMTP_PORT").ok().and_then(|p| p.parse().ok()) {
            smtp.port = port;
        }
        if smtp.username.is_none() {
            smtp.username = env::var("EMAIL_USER").ok();
        }
        if smtp.password.is_none() {
            smtp.password = env::var("EMAIL_PASSWORD").ok();
        }
        if smtp.from_address.is_none() {
            smtp.from_address = smtp.username.clone();
        }
        if smtp.to_address.is_none() {
            smtp.to_address = env::var("RECIPIENT_EMAIL").ok();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Message("Database url must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message("Database max_connections must be greater than 0".into()));
        }

        if self.search.phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(ConfigError::Message("At least one search phrase is required".into()));
        }

        if self.search.per_source_limit == 0 {
            return Err(ConfigError::Message("Search per_source_limit must be greater than 0".into()));
        }

        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Message("Source name must not be empty".into()));
            }
            if Url::parse(&source.endpoint).is_err() {
                return Err(ConfigError::Message(format!(
                    "Invalid endpoint URL for source '{}'",
                    source.name
                )));
            }
            if source.request_timeout == 0 {
                return Err(ConfigError::Message(format!(
                    "Request timeout for source '{}' must be greater than 0",
                    source.name
                )));
            }
        }

        if self.retry.attempts == 0 {
            return Err(ConfigError::Message("Retry attempts must be greater than 0".into()));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Message("Retry base_delay_ms cannot exceed max_delay_ms".into()));
        }

        if self.digest.max_per_batch == 0 {
            return Err(ConfigError::Message("Digest max_per_batch must be greater than 0".into()));
        }

        if self.notifications.smtp.port == 0 {
            return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
        }

        if let Err(e) = self.notifications.smtp.validate() {
            return Err(ConfigError::Message(format!("Invalid SMTP configuration: {}", e)));
        }

        if !Self::is_valid_cron(&self.scheduler.cron) {
            return Err(ConfigError::Message("Invalid cron expression in scheduler.cron".into()));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::Message("Metrics port must be greater than 0".into()));
        }

        Ok(())
    }

    /// Phrases with blank entries removed, in configured order.
    pub fn phrases(&self) -> Vec<String> {
        self.search
            .phrases
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn is_valid_cron(cron_expr: &str) -> bool {
        // sec min hour day-of-month month day-of-week [year]
        let parts: Vec<&str> = cron_expr.split_whitespace().collect();
        if parts.len() != 6 && parts.len() != 7 {
            return false;
        }

        parts.iter().all(|part| {
            part.chars().all(|c| {
                c.is_ascii_alphanumeric() || matches!(c, '*' | '-' | ',' | '/' | '?' | '#')
            })
        })
    }
}
