//! Bounded, most-recent-first alert buffer.
//!
//! Every mutation builds a fresh `Arc<[Alert]>`, so a snapshot handed out
//! earlier never changes underneath its reader.

use crate::shared::types::Alert;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AlertBuffer {
    alerts: Arc<[Alert]>,
    capacity: usize,
    snapshot_limit: usize,
}

impl AlertBuffer {
    /// `capacity` bounds realtime pushes, `snapshot_limit` bounds poll replacements
    pub fn new(capacity: usize, snapshot_limit: usize) -> Self {
        Self {
            alerts: Arc::from(Vec::new()),
            capacity,
            snapshot_limit,
        }
    }

    /// Insert at the front, evicting the oldest entries beyond capacity
    pub fn prepend(&mut self, alert: Alert) {
        let next: Vec<Alert> = std::iter::once(alert)
            .chain(self.alerts.iter().cloned())
            .take(self.capacity)
            .collect();
        self.alerts = Arc::from(next);
    }

    /// Swap in a poll snapshot, keeping only the first `snapshot_limit` entries
    pub fn replace(&mut self, alerts: Vec<Alert>) {
        let limit = self.snapshot_limit.min(self.capacity);
        self.alerts = alerts.into_iter().take(limit).collect();
    }

    pub fn snapshot(&self) -> Arc<[Alert]> {
        Arc::clone(&self.alerts)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
