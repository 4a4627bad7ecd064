/// Alert feed configuration
///
/// Defaults mirror the landing page: realtime push from a local alert
/// server, a 10 second snapshot poll, and a fixed 5 second reconnect delay.

use crate::error::ConfigError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Realtime alert server
pub const DEFAULT_WS_URL: &str = "ws://localhost:3001";
/// Snapshot endpoint
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/alerts";
/// Directory holding the cache slot
pub const DEFAULT_CACHE_DIR: &str = ".alert-cache";
/// Most alerts kept after realtime pushes
pub const DEFAULT_BUFFER_CAPACITY: usize = 10;
/// Most alerts kept from a poll snapshot
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 7;

/// Alert feed configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// WebSocket URL of the alert server
    pub ws_url: String,
    /// HTTP URL of the snapshot endpoint
    pub api_url: String,
    /// Directory for the durable cache slot
    pub cache_dir: PathBuf,
    /// Interval between snapshot polls
    pub poll_interval: Duration,
    /// Fixed delay before each reconnect attempt
    pub reconnect_delay: Duration,
    /// Timeout for a single snapshot request
    pub request_timeout: Duration,
    /// Buffer size for realtime pushes
    pub buffer_capacity: usize,
    /// Buffer size for poll snapshots
    pub snapshot_limit: usize,
    /// Channel capacity between the background tasks and the buffer owner
    pub channel_buffer_size: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            poll_interval: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            snapshot_limit: DEFAULT_SNAPSHOT_LIMIT,
            channel_buffer_size: 256,
        }
    }
}

impl FeedConfig {
    /// Create a new configuration with custom endpoints
    pub fn new(ws_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    /// Build from process environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    ///
    /// Recognised keys: `ALERT_WS_URL`, `ALERT_API_URL`, `ALERT_CACHE_DIR`,
    /// `ALERT_POLL_INTERVAL_SECS`, `ALERT_RECONNECT_DELAY_SECS`,
    /// `ALERT_REQUEST_TIMEOUT_SECS`, `ALERT_BUFFER_CAPACITY`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("ALERT_WS_URL") {
            config.ws_url = url;
        }
        if let Some(url) = lookup("ALERT_API_URL") {
            config.api_url = url;
        }
        if let Some(dir) = lookup("ALERT_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse_var(&lookup, "ALERT_POLL_INTERVAL_SECS")? {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "ALERT_RECONNECT_DELAY_SECS")? {
            config.reconnect_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "ALERT_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(capacity) = parse_var(&lookup, "ALERT_BUFFER_CAPACITY")? {
            config.buffer_capacity = capacity as usize;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check both endpoints parse as URLs with the expected schemes, and that
    /// no interval, timeout or capacity is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("ALERT_WS_URL", &self.ws_url, &["ws", "wss"])?;
        check_url("ALERT_API_URL", &self.api_url, &["http", "https"])?;

        check_duration("ALERT_POLL_INTERVAL_SECS", self.poll_interval)?;
        check_duration("ALERT_RECONNECT_DELAY_SECS", self.reconnect_delay)?;
        check_duration("ALERT_REQUEST_TIMEOUT_SECS", self.request_timeout)?;
        check_count("ALERT_BUFFER_CAPACITY", self.buffer_capacity)?;
        check_count("snapshot_limit", self.snapshot_limit)?;
        check_count("channel_buffer_size", self.channel_buffer_size)?;
        Ok(())
    }

    /// Set cache directory
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Set poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set reconnect delay
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Set snapshot request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set realtime buffer capacity
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Set snapshot limit
    pub fn with_snapshot_limit(mut self, limit: usize) -> Self {
        self.snapshot_limit = limit;
        self
    }

    /// Set channel buffer size
    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }
}

fn parse_var<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(parsed) if parsed > 0 => Ok(Some(parsed)),
            _ => Err(ConfigError::InvalidValue { key, value }),
        },
    }
}

fn check_duration(key: &'static str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::InvalidValue {
            key,
            value: format!("{value:?}"),
        });
    }
    Ok(())
}

fn check_count(key: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn check_url(key: &'static str, raw: &str, schemes: &[&str]) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        key,
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !schemes.contains(&url.scheme()) {
        return Err(ConfigError::InvalidUrl {
            key,
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    Ok(())
}
