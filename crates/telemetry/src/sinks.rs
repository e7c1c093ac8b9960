use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::events::{EventCategory, EventLevel, TelemetryEvent};

/// Port the executor and recovery engine report through.
#[async_trait]
pub trait TelemetryPort: Send + Sync {
    async fn emit(&self, event: TelemetryEvent);
}

/// Default sink; drops everything.
#[derive(Clone, Debug, Default)]
pub struct NoopTelemetry;

#[async_trait]
impl TelemetryPort for NoopTelemetry {
    async fn emit(&self, _event: TelemetryEvent) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }

    pub fn categories(&self) -> Vec<EventCategory> {
        self.events.lock().iter().map(|e| e.category).collect()
    }

    pub fn of_category(&self, category: EventCategory) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.category == category)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl TelemetryPort for RecordingTelemetry {
    async fn emit(&self, event: TelemetryEvent) {
        self.events.lock().push(event);
    }
}

/// Writes events as `tracing` records at the matching level.
#[derive(Clone, Debug, Default)]
pub struct TracingTelemetry;

#[async_trait]
impl TelemetryPort for TracingTelemetry {
    async fn emit(&self, event: TelemetryEvent) {
        let category = event.category.as_str();
        let action = event.action_id.0.as_str();
        match event.level {
            EventLevel::Debug => debug!(category, action, intent = %event.intent, "{}", event.message),
            EventLevel::Info => info!(category, action, intent = %event.intent, "{}", event.message),
            EventLevel::Warn => warn!(category, action, intent = %event.intent, "{}", event.message),
            EventLevel::Error => error!(category, action, intent = %event.intent, "{}", event.message),
        }
    }
}

/// Forwards each event to several sinks in order.
#[derive(Clone, Default)]
pub struct FanoutTelemetry {
    sinks: Vec<Arc<dyn TelemetryPort>>,
}

impl FanoutTelemetry {
    pub fn new(sinks: Vec<Arc<dyn TelemetryPort>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn TelemetryPort>) {
        self.sinks.push(sink);
    }
}

#[async_trait]
impl TelemetryPort for FanoutTelemetry {
    async fn emit(&self, event: TelemetryEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfheal_core_types::ActionId;

    #[tokio::test]
    async fn recording_keeps_order() {
        let sink = RecordingTelemetry::new();
        let id = ActionId::new();
        sink.emit(TelemetryEvent::intent_declared(&id, "Submit")).await;
        sink.emit(TelemetryEvent::primary_failed(&id, "Submit", "css:#x", "gone"))
            .await;
        assert_eq!(
            sink.categories(),
            vec![EventCategory::Intent, EventCategory::Recovery]
        );
        assert_eq!(sink.of_category(EventCategory::Recovery).len(), 1);
        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[tokio::test]
    async fn fanout_reaches_every_sink() {
        let first = RecordingTelemetry::new();
        let second = RecordingTelemetry::new();
        let sinks: Vec<Arc<dyn TelemetryPort>> = vec![
            first.clone(),
            second.clone(),
            Arc::new(TracingTelemetry),
            Arc::new(NoopTelemetry),
        ];
        let fanout = FanoutTelemetry::new(sinks);
        fanout
            .emit(TelemetryEvent::intent_declared(&ActionId::new(), "Go"))
            .await;
        assert_eq!(first.events().len(), 1);
        assert_eq!(second.events().len(), 1);
    }
}
