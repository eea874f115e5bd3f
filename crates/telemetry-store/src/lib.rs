//! Shared mutable telemetry state for the pitwall gateway.
//!
//! Everything here is written by the ingestion listeners and read by the
//! broadcast loop and the local status consumer, so each piece is guarded:
//! mutex-protected collections with copy-out reads, and atomic counters.
//! The whole set is bundled into a [`TelemetryContext`] that `main`
//! constructs once and threads into every task; no ambient globals.

pub mod context;
pub mod counters;
pub mod history;
pub mod latest;

pub use context::TelemetryContext;
pub use counters::{CountersSnapshot, IngestCounters};
pub use history::{HistoryConfig, HistorySnapshot, SampleHistory};
pub use latest::LatestSample;
