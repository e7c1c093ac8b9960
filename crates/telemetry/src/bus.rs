use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tracing::trace;

use crate::{events::TelemetryEvent, sinks::TelemetryPort};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("telemetry bus has no subscribers")]
    NoSubscribers,
}

/// Broadcast channel carrying [`TelemetryEvent`]s to any number of listeners.
pub struct TelemetryBus {
    sender: broadcast::Sender<TelemetryEvent>,
}

impl TelemetryBus {
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    pub fn publish(&self, event: TelemetryEvent) -> Result<usize, BusError> {
        self.sender.send(event).map_err(|_| BusError::NoSubscribers)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TelemetryEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl TelemetryPort for TelemetryBus {
    async fn emit(&self, event: TelemetryEvent) {
        // Nobody listening is not a failure for the action being reported.
        if let Err(err) = self.publish(event) {
            trace!(%err, "telemetry event dropped");
        }
    }
}

/// Bridges a bus subscription onto an mpsc receiver so callers can simply
/// `recv().await` without handling lag.
pub fn to_mpsc(bus: &TelemetryBus, capacity: usize) -> mpsc::Receiver<TelemetryEvent> {
    let mut rx = bus.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    trace!(skipped, "telemetry subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    out_rx
}
