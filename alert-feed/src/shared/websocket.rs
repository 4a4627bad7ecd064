/// WebSocket connector for the realtime alert push channel
///
/// Provides a pure connection state machine, frame decoding, and the async
/// driver that runs both against a live socket with fixed-delay reconnects.

use crate::shared::config::FeedConfig;
use crate::shared::feed::wait_for_shutdown;
use crate::shared::types::{AlertRecord, ConnectionState, FeedUpdate};
use crate::shared::validate::validate;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Inputs to the connection state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorEvent {
    /// Open attempt requested
    Connect,
    /// Handshake completed
    Opened,
    /// Socket reported an error (always followed by `Closed`)
    Error,
    Closed,
    /// Reconnect delay elapsed
    ReconnectFired,
    /// Subsystem teardown
    Stop,
}

/// Side effects the driver must perform after a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorAction {
    OpenConnection,
    CancelReconnect,
    ScheduleReconnect,
    Teardown,
}

/// Connection lifecycle with at most one pending reconnect timer
#[derive(Debug, Clone, Default)]
pub struct ConnectionMachine {
    state: ConnectionState,
    reconnect_pending: bool,
    stopped: bool,
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Apply one event, returning the action the driver must take (if any)
    ///
    /// Once stopped, every event is ignored.
    pub fn handle(&mut self, event: ConnectorEvent) -> Option<ConnectorAction> {
        if self.stopped {
            return None;
        }

        match event {
            ConnectorEvent::Connect => {
                self.state = ConnectionState::Connecting;
                Some(ConnectorAction::OpenConnection)
            }
            ConnectorEvent::Opened => {
                self.state = ConnectionState::Connected;
                std::mem::take(&mut self.reconnect_pending).then_some(ConnectorAction::CancelReconnect)
            }
            ConnectorEvent::Error => None,
            ConnectorEvent::Closed => {
                self.state = ConnectionState::Reconnecting;
                if self.reconnect_pending {
                    None
                } else {
                    self.reconnect_pending = true;
                    Some(ConnectorAction::ScheduleReconnect)
                }
            }
            ConnectorEvent::ReconnectFired => {
                if !std::mem::take(&mut self.reconnect_pending) {
                    return None;
                }
                self.state = ConnectionState::Connecting;
                Some(ConnectorAction::OpenConnection)
            }
            ConnectorEvent::Stop => {
                self.stopped = true;
                self.reconnect_pending = false;
                self.state = ConnectionState::Disconnected;
                Some(ConnectorAction::Teardown)
            }
        }
    }
}

/// Decoded text frame from the alert server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Alert(AlertRecord),
    Welcome(Option<String>),
    /// Any other frame type, or an alert frame without a usable payload
    Ignored(Option<String>),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

/// Decode a text frame of shape `{type, data?, message?}`
pub fn decode_frame(text: &str) -> Result<Frame, serde_json::Error> {
    let envelope: Envelope = serde_json::from_str(text)?;

    let frame = match envelope.kind.as_deref() {
        Some("alert") => match envelope.data.and_then(AlertRecord::from_value) {
            Some(record) => Frame::Alert(record),
            None => Frame::Ignored(envelope.kind),
        },
        Some("welcome") => Frame::Welcome(
            envelope
                .message
                .as_ref()
                .and_then(Value::as_str)
                .map(str::to_string),
        ),
        _ => Frame::Ignored(envelope.kind),
    };
    Ok(frame)
}

/// Drives a [`ConnectionMachine`] against the alert server socket
pub struct RealtimeConnector {
    url: String,
    reconnect_delay: Duration,
    machine: ConnectionMachine,
    update_tx: mpsc::Sender<FeedUpdate>,
    shutdown_rx: watch::Receiver<bool>,
}

impl RealtimeConnector {
    pub fn new(
        config: &FeedConfig,
        update_tx: mpsc::Sender<FeedUpdate>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            url: config.ws_url.clone(),
            reconnect_delay: config.reconnect_delay,
            machine: ConnectionMachine::new(),
            update_tx,
            shutdown_rx,
        }
    }

    /// Connect and keep reconnecting until shutdown is signalled
    pub async fn run(mut self) {
        info!("Starting alert feed connector for {}", self.url);

        let mut action = self.transition(ConnectorEvent::Connect).await;
        loop {
            action = match action {
                Some(ConnectorAction::OpenConnection) => self.connect_once().await,
                Some(ConnectorAction::ScheduleReconnect) => {
                    self.after_delay(ConnectorEvent::ReconnectFired).await
                }
                Some(ConnectorAction::Teardown) => break,
                Some(ConnectorAction::CancelReconnect) | None => {
                    if self.machine.is_stopped() {
                        break;
                    }
                    // Every live path should end in a connect or a reconnect
                    error!(
                        "Alert feed connector left {} without a follow-up, forcing reconnect",
                        self.machine.state()
                    );
                    self.after_delay(ConnectorEvent::Connect).await
                }
            };
        }

        info!("Alert feed connector stopped");
    }

    /// Wait out the reconnect delay, then feed `event` to the machine
    async fn after_delay(&mut self, event: ConnectorEvent) -> Option<ConnectorAction> {
        debug!("Waiting {:?} before reconnecting...", self.reconnect_delay);
        tokio::select! {
            _ = tokio::time::sleep(self.reconnect_delay) => self.transition(event).await,
            _ = wait_for_shutdown(&mut self.shutdown_rx) => {
                self.transition(ConnectorEvent::Stop).await
            }
        }
    }

    /// One connection attempt and its read loop; returns the follow-up action
    async fn connect_once(&mut self) -> Option<ConnectorAction> {
        let connected = tokio::select! {
            result = connect_async(self.url.as_str()) => result,
            _ = wait_for_shutdown(&mut self.shutdown_rx) => {
                return self.transition(ConnectorEvent::Stop).await;
            }
        };

        let mut ws_stream = match connected {
            Ok((ws_stream, _)) => ws_stream,
            Err(e) => {
                // Expected while the alert server is down, keep it quiet
                debug!("Failed to connect to {}: {}", self.url, e);
                self.transition(ConnectorEvent::Error).await;
                return self.transition(ConnectorEvent::Closed).await;
            }
        };

        info!("Connected to alert server at {}", self.url);
        if let Some(ConnectorAction::CancelReconnect) = self.transition(ConnectorEvent::Opened).await {
            debug!("Cancelled pending reconnect");
        }

        loop {
            let msg = tokio::select! {
                msg = ws_stream.next() => msg,
                _ = wait_for_shutdown(&mut self.shutdown_rx) => {
                    let _ = ws_stream.close(None).await;
                    return self.transition(ConnectorEvent::Stop).await;
                }
            };

            match msg {
                Some(Ok(Message::Text(text))) => {
                    if !self.handle_text(&text).await {
                        warn!("Alert receiver dropped, stopping connector");
                        let _ = ws_stream.close(None).await;
                        return self.transition(ConnectorEvent::Stop).await;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    warn!("Alert server closed connection, will reconnect...");
                    break;
                }
                Some(Ok(_)) => {
                    // Ping/Pong handled by tungstenite, binary frames unused
                }
                Some(Err(e)) => {
                    warn!("Alert feed socket error: {}", e);
                    self.transition(ConnectorEvent::Error).await;
                    break;
                }
            }
        }

        self.transition(ConnectorEvent::Closed).await
    }

    /// Returns false once the buffer owner has gone away
    async fn handle_text(&self, text: &str) -> bool {
        match decode_frame(text) {
            Ok(Frame::Alert(record)) => match validate(&record) {
                Ok(alert) => {
                    debug!("Received {} alert for {}", alert.kind, alert.instrument);
                    return self.update_tx.send(FeedUpdate::Pushed(alert)).await.is_ok();
                }
                Err(reason) => debug!(%reason, "Dropping pushed alert"),
            },
            Ok(Frame::Welcome(message)) => {
                info!("Welcome message from alert server: {}", message.unwrap_or_default());
            }
            Ok(Frame::Ignored(kind)) => {
                debug!("Ignoring {} frame", kind.as_deref().unwrap_or("untyped"));
            }
            Err(e) => {
                warn!("Failed to parse alert feed message: {}", e);
                debug!("Raw message: {}", text.chars().take(200).collect::<String>());
            }
        }
        true
    }

    async fn transition(&mut self, event: ConnectorEvent) -> Option<ConnectorAction> {
        let before = self.machine.state();
        let action = self.machine.handle(event);
        let after = self.machine.state();

        if before != after {
            debug!("Alert feed connection {} -> {}", before, after);
            let _ = self.update_tx.send(FeedUpdate::State(after)).await;
        }
        action
    }
}
