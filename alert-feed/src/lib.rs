/// Alert Feed - Live Market Alert Client
///
/// Keeps a best-effort realtime connection to a local alert server, falls
/// back to periodic snapshot polling and a durable local cache, and exposes a
/// bounded most-recent-first alert list to a display layer.
///
/// The library includes:
/// - Alert types and validation against the tracked instrument allow-set
/// - WebSocket connector with fixed-delay reconnect
/// - Snapshot poller with cache fallback
/// - Feed lifecycle with explicit start/stop
pub mod error;
pub mod logging;
pub mod shared;

// Re-export commonly used types for convenience
pub use error::{CacheError, ConfigError, FeedError, FetchError, RejectReason};

pub use shared::types::{
    Alert, AlertKind, AlertRecord, ConnectionState, FeedSnapshot, FeedUpdate, TrackedSymbol,
};

pub use shared::buffer::AlertBuffer;
pub use shared::cache::{AlertCache, FileStore, KeyValueStore, MemoryStore, CACHE_KEY};
pub use shared::config::FeedConfig;
pub use shared::feed::{AlertFeed, AlertFeedHandle};
pub use shared::fetcher::PollingFetcher;
pub use shared::validate::{validate, validate_all};
pub use shared::websocket::{ConnectionMachine, ConnectorAction, ConnectorEvent, RealtimeConnector};
