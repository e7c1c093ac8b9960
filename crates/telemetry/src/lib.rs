//! Telemetry for selfheal actions
//!
//! Every executed action reports its intent, recovery steps and final outcome
//! as [`TelemetryEvent`]s through a [`TelemetryPort`]. Sinks here cover the
//! common cases: drop, record for assertions, forward to `tracing`, fan out,
//! or broadcast on a [`TelemetryBus`].

mod bus;
pub mod events;
mod sinks;

pub use bus::{to_mpsc, BusError, TelemetryBus};
pub use events::{AttemptReport, EventCategory, EventDetail, EventLevel, TelemetryEvent};
pub use sinks::{FanoutTelemetry, NoopTelemetry, RecordingTelemetry, TelemetryPort, TracingTelemetry};
