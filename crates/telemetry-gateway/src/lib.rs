//! Network edge of the pitwall telemetry gateway.
//!
//! Two symmetric UDP [`listener`]s (one per wire format) feed decoded
//! samples into the shared [`TelemetryContext`]; the [`broadcast`] loop fans
//! the latest sample out to every registered [`sink`] at a fixed cadence,
//! dropping subscribers whose writes fail or stall.
//!
//! [`TelemetryContext`]: pitwall_telemetry_store::TelemetryContext

pub mod broadcast;
pub mod listener;
pub mod sink;

pub use broadcast::{Broadcaster, FanoutConfig, SubscriberHandle, SubscriberRegistry};
pub use listener::{spawn_udp_listener, ListenerConfig};
pub use sink::{serve_subscribers, SubscriberSink, TcpLineSink};
