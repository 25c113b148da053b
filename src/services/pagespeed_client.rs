use std::future::Future;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::{
    configuration::{ConfigurationError, Settings},
    domain::{extract_metrics, normalize_url, MetricRecord},
};

/// Anything that can turn a URL into a complete [`MetricRecord`].
pub trait MetricSource {
    /// Must not fail: problems end up as unavailable fields on the record.
    fn fetch_metrics(&self, url: &str) -> impl Future<Output = MetricRecord>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("pagespeed api answered {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("response is not valid json: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct PageSpeedClient {
    client: Client,
    endpoint: Url,
    strategy: String,
    api_key: String,
}

#[derive(Serialize)]
struct RunPagespeedQuery<'a> {
    url: &'a str,
    strategy: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    key: &'a str,
}

impl PageSpeedClient {
    pub fn new(client: Client, endpoint: Url, strategy: String, api_key: String) -> Self {
        PageSpeedClient {
            client,
            endpoint,
            strategy,
            api_key,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigurationError> {
        let client = Client::builder()
            .timeout(settings.pagespeed.timeout())
            .build()?;

        if settings.api_keys.pagespeed.is_empty() {
            log::warn!("No pagespeed api key configured, requests will be heavily rate limited");
        }

        Ok(PageSpeedClient::new(
            client,
            settings.pagespeed.endpoint_url()?,
            settings.pagespeed.strategy.clone(),
            settings.api_keys.pagespeed.clone(),
        ))
    }

    /// Runs one audit and returns the raw JSON body.
    pub async fn run_pagespeed(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&RunPagespeedQuery {
                url,
                strategy: &self.strategy,
                key: &self.api_key,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                message: error_message(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl MetricSource for PageSpeedClient {
    async fn fetch_metrics(&self, url: &str) -> MetricRecord {
        let url = normalize_url(url);

        match self.run_pagespeed(&url).await {
            Ok(json) => extract_metrics(&url, &json),
            Err(e) => {
                log::error!("Error fetching {}: {}", url, e);
                MetricRecord::unavailable(url)
            }
        }
    }
}

// Google APIs wrap failures as {"error": {"code": .., "message": ..}}
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}
