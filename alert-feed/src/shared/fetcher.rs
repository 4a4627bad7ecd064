//! Alert snapshot polling over HTTP with cache fallback.

use crate::error::FetchError;
use crate::shared::cache::AlertCache;
use crate::shared::config::FeedConfig;
use crate::shared::types::AlertRecord;
use serde_json::Value;
use tracing::{debug, warn};

/// Requests the current alert snapshot and keeps the cache in step with it
#[derive(Debug, Clone)]
pub struct PollingFetcher {
    client: reqwest::Client,
    url: String,
    cache: AlertCache,
}

impl PollingFetcher {
    pub fn new(config: &FeedConfig, cache: AlertCache) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.api_url.clone(),
            cache,
        })
    }

    pub fn cache(&self) -> &AlertCache {
        &self.cache
    }

    /// Fetch the snapshot, degrading to the cached list (or nothing) on failure
    ///
    /// Cache I/O runs on the blocking pool so the poller never stalls the runtime.
    pub async fn fetch_snapshot(&self) -> Vec<AlertRecord> {
        match self.try_fetch().await {
            Ok(alerts) => {
                let cache = self.cache.clone();
                let records = alerts.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || cache.save(&records)).await {
                    warn!("Alert cache write task failed: {}", e);
                }
                alerts
            }
            Err(e) => {
                warn!("Alert snapshot unavailable, using cache: {}", e);
                let cache = self.cache.clone();
                tokio::task::spawn_blocking(move || cache.load())
                    .await
                    .unwrap_or_else(|e| {
                        warn!("Alert cache read task failed: {}", e);
                        Vec::new()
                    })
            }
        }
    }

    /// Single request with every failure made explicit
    pub async fn try_fetch(&self) -> Result<Vec<AlertRecord>, FetchError> {
        debug!("Fetching alert snapshot from {}", self.url);

        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        let alerts = extract_alerts(body);
        debug!("Alert snapshot returned {} records", alerts.len());
        Ok(alerts)
    }
}

/// Pull the alert array out of either `{success, data: [...]}` or a bare array
///
/// Any other shape, including `success: false`, yields an empty list.
/// Elements that are not JSON objects are skipped.
pub fn extract_alerts(body: Value) -> Vec<AlertRecord> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut envelope) => {
            let success = envelope.get("success").and_then(Value::as_bool).unwrap_or(false);
            match envelope.remove("data") {
                Some(Value::Array(items)) if success => items,
                _ => Vec::new(),
            }
        }
        _ => Vec::new(),
    };

    items.into_iter().filter_map(AlertRecord::from_value).collect()
}
