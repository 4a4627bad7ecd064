//! Alert validation and normalization.
//!
//! Every alert, whether pushed over the socket or returned by a poll, passes
//! through [`validate`] before it can reach the buffer.

use crate::error::RejectReason;
use crate::shared::types::{Alert, AlertKind, AlertRecord, TrackedSymbol};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Timestamp layout used when the producer omits one (second precision, UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Validate a raw record, defaulting missing fields against the current time
pub fn validate(record: &AlertRecord) -> Result<Alert, RejectReason> {
    validate_at(record, Utc::now())
}

/// Validate a raw record, using `now` for a missing timestamp
pub fn validate_at(record: &AlertRecord, now: DateTime<Utc>) -> Result<Alert, RejectReason> {
    let symbol = non_empty(&record.symbol).ok_or(RejectReason::MissingSymbol)?;
    let message = non_empty(&record.message).ok_or(RejectReason::MissingMessage)?;

    let instrument = TrackedSymbol::from_symbol(symbol)
        .ok_or_else(|| RejectReason::UntrackedSymbol(symbol.to_uppercase()))?;

    let kind = non_empty(&record.kind)
        .map(|tag| AlertKind::from(tag.to_string()))
        .unwrap_or_default();

    let timestamp = non_empty(&record.timestamp)
        .map(str::to_string)
        .unwrap_or_else(|| now.format(TIMESTAMP_FORMAT).to_string());

    Ok(Alert {
        symbol: symbol.to_string(),
        instrument,
        kind,
        message: message.to_string(),
        timestamp,
    })
}

/// Validate a batch, dropping rejected records
pub fn validate_all(records: &[AlertRecord]) -> Vec<Alert> {
    let now = Utc::now();
    records
        .iter()
        .filter_map(|record| match validate_at(record, now) {
            Ok(alert) => Some(alert),
            Err(reason) => {
                debug!(%reason, "Dropping alert record");
                None
            }
        })
        .collect()
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}
