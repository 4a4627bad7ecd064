/// Core data types for market alerts
///
/// These types match the JSON alert format pushed by the alert server over
/// WebSocket and returned by the `/api/alerts` snapshot endpoint.

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Alert record as it appears on the wire and in the local cache
///
/// Every field is optional: records come from an external producer and are
/// only trusted after validation. Non-string values are read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AlertRecord {
    /// Instrument code (e.g., "BTCUSDT", "ethusdt")
    #[serde(default, deserialize_with = "de_lenient_string", skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Alert category tag (e.g., "price_jump", "whale_transfer")
    #[serde(
        rename = "type",
        default,
        deserialize_with = "de_lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,
    /// Human-readable description
    #[serde(default, deserialize_with = "de_lenient_string", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Generation time as a sortable string
    #[serde(default, deserialize_with = "de_lenient_string", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl AlertRecord {
    /// Read a record out of an arbitrary JSON value
    ///
    /// Returns `None` for anything that is not a JSON object.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}

fn de_lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(text)) => Some(text),
        _ => None,
    })
}

/// Instruments eligible for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedSymbol {
    BtcUsdt,
    EthUsdt,
}

impl TrackedSymbol {
    /// The complete allow-set
    pub const ALL: [TrackedSymbol; 2] = [TrackedSymbol::BtcUsdt, TrackedSymbol::EthUsdt];

    /// Match a raw symbol against the allow-set, ignoring case
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.to_uppercase().as_str() {
            "BTCUSDT" => Some(TrackedSymbol::BtcUsdt),
            "ETHUSDT" => Some(TrackedSymbol::EthUsdt),
            _ => None,
        }
    }

    /// Canonical uppercase exchange code
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedSymbol::BtcUsdt => "BTCUSDT",
            TrackedSymbol::EthUsdt => "ETHUSDT",
        }
    }

    /// Base/quote pair for display (e.g., "BTC/USDT")
    pub fn display_pair(&self) -> &'static str {
        match self {
            TrackedSymbol::BtcUsdt => "BTC/USDT",
            TrackedSymbol::EthUsdt => "ETH/USDT",
        }
    }
}

impl std::fmt::Display for TrackedSymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Alert category, selects presentation style downstream
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum AlertKind {
    #[default]
    PriceJump,
    WhaleTransfer,
    FundingSpike,
    /// Any tag the producer sends that we have no style for
    Other(String),
}

impl AlertKind {
    /// Wire tag (e.g., "price_jump")
    pub fn as_str(&self) -> &str {
        match self {
            AlertKind::PriceJump => "price_jump",
            AlertKind::WhaleTransfer => "whale_transfer",
            AlertKind::FundingSpike => "funding_spike",
            AlertKind::Other(tag) => tag,
        }
    }

    /// Command-line style label (e.g., "price-jump")
    pub fn label(&self) -> String {
        self.as_str().replace('_', "-")
    }
}

impl From<String> for AlertKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "price_jump" => AlertKind::PriceJump,
            "whale_transfer" => AlertKind::WhaleTransfer,
            "funding_spike" => AlertKind::FundingSpike,
            _ => AlertKind::Other(tag),
        }
    }
}

impl From<AlertKind> for String {
    fn from(kind: AlertKind) -> Self {
        match kind {
            AlertKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated market-signal notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Symbol exactly as the producer sent it
    pub symbol: String,
    /// Allow-set member the symbol matched
    #[serde(skip)]
    pub instrument: TrackedSymbol,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: String,
}

impl Alert {
    /// Pair shown to the user (e.g., "BTC/USDT")
    pub fn display_symbol(&self) -> &'static str {
        self.instrument.display_pair()
    }
}

impl From<&Alert> for AlertRecord {
    fn from(alert: &Alert) -> Self {
        Self {
            symbol: Some(alert.symbol.clone()),
            kind: Some(alert.kind.as_str().to_string()),
            message: Some(alert.message.clone()),
            timestamp: Some(alert.timestamp.clone()),
        }
    }
}

/// Realtime connection lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting => "reconnecting",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only view handed to the display layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSnapshot {
    /// Most-recent-first alerts
    pub alerts: Arc<[Alert]>,
    /// True while a poll cycle is in flight
    pub loading: bool,
    pub connection: ConnectionState,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self {
            alerts: Arc::from(Vec::new()),
            loading: true,
            connection: ConnectionState::Disconnected,
        }
    }
}

/// Messages sent from the connector and poller tasks to the buffer owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedUpdate {
    /// Single alert pushed over the realtime connection
    Pushed(Alert),
    /// Validated poll result, replaces the buffer wholesale
    Snapshot(Vec<Alert>),
    /// A poll cycle started
    Loading,
    State(ConnectionState),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_value_ignores_non_string_fields() {
        let record = AlertRecord::from_value(json!({
            "symbol": "BTCUSDT",
            "type": 42,
            "message": "Price up 5.2%",
            "timestamp": null,
            "exchange": "binance"
        }))
        .unwrap();

        assert_eq!(record.symbol.as_deref(), Some("BTCUSDT"));
        assert_eq!(record.kind, None);
        assert_eq!(record.message.as_deref(), Some("Price up 5.2%"));
        assert_eq!(record.timestamp, None);
    }

    #[test]
    fn test_record_from_value_rejects_non_objects() {
        assert!(AlertRecord::from_value(json!("BTCUSDT")).is_none());
        assert!(AlertRecord::from_value(json!([1, 2, 3])).is_none());
        assert!(AlertRecord::from_value(serde_json::Value::Null).is_none());
    }

    #[test]
    fn test_record_serializes_type_field() {
        let record = AlertRecord {
            symbol: Some("ETHUSDT".to_string()),
            kind: Some("whale_transfer".to_string()),
            message: Some("Moved $1,200,000".to_string()),
            timestamp: None,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"symbol": "ETHUSDT", "type": "whale_transfer", "message": "Moved $1,200,000"})
        );
    }

    #[test]
    fn test_tracked_symbol_case_insensitive() {
        assert_eq!(TrackedSymbol::from_symbol("btcusdt"), Some(TrackedSymbol::BtcUsdt));
        assert_eq!(TrackedSymbol::from_symbol("EthUsdt"), Some(TrackedSymbol::EthUsdt));
        assert_eq!(TrackedSymbol::from_symbol("SOLUSDT"), None);
        assert_eq!(TrackedSymbol::from_symbol(""), None);
        assert_eq!(TrackedSymbol::BtcUsdt.display_pair(), "BTC/USDT");
    }

    #[test]
    fn test_alert_kind_round_trips_unknown_tags() {
        assert_eq!(AlertKind::from("funding_spike".to_string()), AlertKind::FundingSpike);
        assert_eq!(
            AlertKind::from("liquidation_wave".to_string()),
            AlertKind::Other("liquidation_wave".to_string())
        );
        assert_eq!(String::from(AlertKind::Other("oi_surge".to_string())), "oi_surge");
        assert_eq!(AlertKind::WhaleTransfer.label(), "whale-transfer");
        assert_eq!(AlertKind::default(), AlertKind::PriceJump);
    }

    #[test]
    fn test_alert_serializes_as_record() {
        let alert = Alert {
            symbol: "btcusdt".to_string(),
            instrument: TrackedSymbol::BtcUsdt,
            kind: AlertKind::PriceJump,
            message: "Price up 5.2%".to_string(),
            timestamp: "2026-10-17T09:30:00".to_string(),
        };

        let record: AlertRecord = serde_json::from_value(serde_json::to_value(&alert).unwrap()).unwrap();
        assert_eq!(record, AlertRecord::from(&alert));
        assert_eq!(alert.display_symbol(), "BTC/USDT");
    }

    #[test]
    fn test_default_snapshot_is_loading_and_empty() {
        let snapshot = FeedSnapshot::default();
        assert!(snapshot.alerts.is_empty());
        assert!(snapshot.loading);
        assert_eq!(snapshot.connection, ConnectionState::Disconnected);
        assert!(!snapshot.connection.is_connected());
    }
}
