use std::{path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub pagespeed: PageSpeedSettings,
    pub api_keys: ApiKeySettings,
    pub rate_limit: RateLimitSettings,
    pub report: ReportSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationSettings {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub url_column: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageSpeedSettings {
    pub endpoint: String,
    pub strategy: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySettings {
    pub pagespeed: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub requests_per_window: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub window_seconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    #[serde(default)]
    pub passthrough_columns: Vec<PassthroughColumn>,
}

/// Maps an input column onto an output field of the report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PassthroughColumn {
    pub column: String,
    pub field: String,
    pub title: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid pagespeed endpoint '{endpoint}': {source}")]
    Endpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("could not build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("rate_limit.batch_size must be greater than zero")]
    ZeroBatchSize,
    #[error("rate_limit.requests_per_window must be greater than zero")]
    ZeroRequestRate,
}

impl PageSpeedSettings {
    pub fn endpoint_url(&self) -> Result<Url, ConfigurationError> {
        Url::parse(&self.endpoint).map_err(|source| ConfigurationError::Endpoint {
            endpoint: self.endpoint.clone(),
            source,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl RateLimitSettings {
    /// Pause between two batches that keeps the sustained rate at or below
    /// `requests_per_window` per `window_seconds`.
    pub fn inter_batch_delay(&self) -> Duration {
        if self.requests_per_window == 0 {
            return Duration::ZERO;
        }
        // Rounded up so the sustained rate stays at or below the ceiling
        let window_ms = self.window_seconds.saturating_mul(1000);
        let millis = window_ms
            .saturating_mul(self.batch_size as u64)
            .div_ceil(self.requests_per_window);
        Duration::from_millis(millis)
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.rate_limit.batch_size == 0 {
            return Err(ConfigurationError::ZeroBatchSize);
        }
        if self.rate_limit.requests_per_window == 0 {
            return Err(ConfigurationError::ZeroRequestRate);
        }
        self.pagespeed.endpoint_url()?;
        Ok(())
    }
}

pub fn get_configuration() -> Result<Settings, ConfigurationError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no working directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    load_configuration(configuration_directory.join("base.yaml"))
}

/// Reads `file` and layers `APP_*` environment variables on top,
/// e.g. `APP_API_KEYS__PAGESPEED` or `APP_RATE_LIMIT__BATCH_SIZE`.
pub fn load_configuration(file: PathBuf) -> Result<Settings, ConfigurationError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(file))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}
