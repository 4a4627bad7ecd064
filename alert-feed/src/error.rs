use thiserror::Error;

/// Why an inbound alert record was dropped before reaching the buffer.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Error)]
pub enum RejectReason {
    #[error("alert record has no symbol")]
    MissingSymbol,

    #[error("alert record has no message")]
    MissingMessage,

    #[error("alert symbol {0} is not a tracked instrument")]
    UntrackedSymbol(String),
}

/// All errors generated while requesting an alert snapshot over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("alert snapshot request failed: {0}")]
    Transport(String),

    #[error("alert snapshot endpoint returned HTTP {0}")]
    Status(u16),

    #[error("alert snapshot body could not be decoded: {0}")]
    Decode(String),
}

impl FetchError {
    /// Determine if the endpoint could not be reached at all (as opposed to answering badly).
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_transport(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => Self::Status(status.as_u16()),
            None if value.is_decode() => Self::Decode(value.to_string()),
            None => Self::Transport(value.to_string()),
        }
    }
}

/// Errors from the durable key-value slot backing the alert cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache content is not a valid alert list: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Invalid configuration supplied through the environment.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid url for {key}: {url:?} ({reason})")]
    InvalidUrl {
        key: &'static str,
        url: String,
        reason: String,
    },
}

/// Errors raised while assembling an alert feed, before any task runs.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid feed configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_is_transport() {
        struct TestCase {
            input: FetchError,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: connection refused is a transport failure
                input: FetchError::Transport("error sending request: connection refused".to_string()),
                expected: true,
            },
            TestCase {
                // TC1: server answered with a 500
                input: FetchError::Status(500),
                expected: false,
            },
            TestCase {
                // TC2: server answered with garbage
                input: FetchError::Decode("expected value at line 1 column 1".to_string()),
                expected: false,
            },
            TestCase {
                // TC3: client could not be built
                input: FetchError::Client("no tls backend".to_string()),
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.is_transport();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_reject_reason_display() {
        assert_eq!(
            RejectReason::UntrackedSymbol("SOLUSDT".to_string()).to_string(),
            "alert symbol SOLUSDT is not a tracked instrument"
        );
        assert_eq!(RejectReason::MissingMessage.to_string(), "alert record has no message");
    }

    #[test]
    fn test_cache_error_from_serde() {
        let err = serde_json::from_str::<Vec<u8>>("not json").unwrap_err();
        let cache_err = CacheError::from(err);
        assert!(matches!(cache_err, CacheError::Serde(_)));
    }

    #[test]
    fn test_feed_error_from_config() {
        let err = FeedError::from(ConfigError::InvalidValue {
            key: "ALERT_POLL_INTERVAL_SECS",
            value: "0".to_string(),
        });
        assert!(matches!(err, FeedError::Config(ConfigError::InvalidValue { .. })));
        assert_eq!(
            err.to_string(),
            "invalid feed configuration: invalid value for ALERT_POLL_INTERVAL_SECS: \"0\""
        );
    }
}
