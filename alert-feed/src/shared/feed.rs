//! Alert feed lifecycle.
//!
//! [`AlertFeed::start`] spawns three tasks:
//! - the realtime connector, pushing single alerts
//! - the snapshot poller, replacing the list every poll interval
//! - the buffer owner, the only task that touches the [`AlertBuffer`]
//!
//! The first two talk to the buffer owner over one mpsc channel, and the
//! buffer owner publishes immutable [`FeedSnapshot`]s on a watch channel.
//! [`AlertFeedHandle::stop`] signals all of them and waits for them to exit.

use crate::error::FeedError;
use crate::shared::buffer::AlertBuffer;
use crate::shared::cache::{AlertCache, FileStore, KeyValueStore};
use crate::shared::config::FeedConfig;
use crate::shared::fetcher::PollingFetcher;
use crate::shared::types::{Alert, ConnectionState, FeedSnapshot, FeedUpdate};
use crate::shared::validate::validate_all;
use crate::shared::websocket::RealtimeConnector;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Configured but not yet running alert feed
#[derive(Debug)]
pub struct AlertFeed {
    config: FeedConfig,
    fetcher: PollingFetcher,
}

impl AlertFeed {
    /// Feed with its cache persisted under `config.cache_dir`
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let store = FileStore::new(config.cache_dir.clone());
        Self::with_store(config, store)
    }

    /// Feed with a caller-supplied cache store
    ///
    /// Rejects configurations the background tasks cannot run with.
    pub fn with_store(
        config: FeedConfig,
        store: impl KeyValueStore + 'static,
    ) -> Result<Self, FeedError> {
        config.validate()?;
        let fetcher = PollingFetcher::new(&config, AlertCache::new(store))?;
        Ok(Self { config, fetcher })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Spawn the background tasks on the current runtime
    pub fn start(self) -> AlertFeedHandle {
        let Self { config, fetcher } = self;
        info!(
            "Starting alert feed (ws: {}, api: {})",
            config.ws_url, config.api_url
        );

        let (update_tx, update_rx) = mpsc::channel(config.channel_buffer_size);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (snapshot_tx, snapshot_rx) = watch::channel(FeedSnapshot::default());

        let connector = RealtimeConnector::new(&config, update_tx.clone(), shutdown_rx.clone());
        let poller = SnapshotPoller {
            fetcher,
            interval: config.poll_interval,
            limit: config.snapshot_limit,
            update_tx,
            shutdown_rx,
        };
        let buffer = AlertBuffer::new(config.buffer_capacity, config.snapshot_limit);

        let tasks = vec![
            tokio::spawn(connector.run()),
            tokio::spawn(poller.run()),
            tokio::spawn(run_buffer_owner(buffer, update_rx, snapshot_tx)),
        ];

        AlertFeedHandle {
            shutdown_tx,
            snapshot_rx,
            tasks,
        }
    }
}

/// Running alert feed
///
/// Dropping the handle signals shutdown without waiting; call
/// [`stop`](Self::stop) to wait until every task has exited.
#[derive(Debug)]
pub struct AlertFeedHandle {
    shutdown_tx: watch::Sender<bool>,
    snapshot_rx: watch::Receiver<FeedSnapshot>,
    tasks: Vec<JoinHandle<()>>,
}

impl AlertFeedHandle {
    /// Receiver notified on every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Latest snapshot
    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Close the socket, cancel the reconnect timer and poll interval, and wait
    pub async fn stop(mut self) {
        self.shutdown_tx.send_replace(true);

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                error!("Alert feed task failed: {}", e);
            }
        }
        info!("Alert feed stopped");
    }
}

impl Drop for AlertFeedHandle {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// Resolves once shutdown is signalled or the signalling side is gone
pub(crate) async fn wait_for_shutdown(shutdown_rx: &mut watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}

struct SnapshotPoller {
    fetcher: PollingFetcher,
    interval: Duration,
    limit: usize,
    update_tx: mpsc::Sender<FeedUpdate>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SnapshotPoller {
    /// Poll immediately, then every interval, until shutdown
    async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = wait_for_shutdown(&mut self.shutdown_rx) => break,
            }

            if self.update_tx.send(FeedUpdate::Loading).await.is_err() {
                break;
            }

            let records = tokio::select! {
                records = self.fetcher.fetch_snapshot() => records,
                _ = wait_for_shutdown(&mut self.shutdown_rx) => break,
            };

            let alerts: Vec<Alert> = validate_all(&records).into_iter().take(self.limit).collect();
            debug!("Snapshot poll kept {} of {} alerts", alerts.len(), records.len());

            if self.update_tx.send(FeedUpdate::Snapshot(alerts)).await.is_err() {
                break;
            }
        }

        debug!("Alert snapshot poller stopped");
    }
}

/// Apply updates to the buffer and publish a snapshot after each change
///
/// Ends once both producers have dropped their senders.
async fn run_buffer_owner(
    mut buffer: AlertBuffer,
    mut update_rx: mpsc::Receiver<FeedUpdate>,
    snapshot_tx: watch::Sender<FeedSnapshot>,
) {
    let mut loading = true;
    let mut connection = ConnectionState::Disconnected;

    while let Some(update) = update_rx.recv().await {
        match update {
            FeedUpdate::Pushed(alert) => buffer.prepend(alert),
            FeedUpdate::Snapshot(alerts) => {
                buffer.replace(alerts);
                loading = false;
            }
            FeedUpdate::Loading => loading = true,
            FeedUpdate::State(state) => connection = state,
        }

        let next = FeedSnapshot {
            alerts: buffer.snapshot(),
            loading,
            connection,
        };
        snapshot_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
