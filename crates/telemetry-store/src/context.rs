//! Process-wide telemetry state bundle.

use crate::counters::IngestCounters;
use crate::history::{HistoryConfig, SampleHistory};
use crate::latest::LatestSample;
use pitwall_telemetry_wire::{MonotonicClock, TelemetrySample};
use std::sync::Arc;

/// Everything the listener, broadcast, and status tasks share.
///
/// Built once at startup and handed to each task as an `Arc`; lives for the
/// process lifetime.
pub struct TelemetryContext {
    pub clock: MonotonicClock,
    pub history: SampleHistory,
    pub latest: LatestSample,
    pub counters: IngestCounters,
}

impl TelemetryContext {
    pub fn new(history_config: HistoryConfig) -> Arc<Self> {
        Arc::new(Self {
            clock: MonotonicClock::start(),
            history: SampleHistory::new(history_config),
            latest: LatestSample::new(),
            counters: IngestCounters::new(),
        })
    }

    /// Publish one successfully decoded sample: stamp the receive time,
    /// store it, cache it, and count it.
    pub fn publish(&self, mut sample: TelemetrySample) {
        sample.timestamp = self.clock.now_secs();
        self.history.record(&sample);
        self.latest.set(sample);
        self.counters.record_ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_stamps_stores_and_counts() {
        let ctx = TelemetryContext::new(HistoryConfig::default());
        ctx.publish(TelemetrySample {
            rpm: 4200.0,
            ..Default::default()
        });

        assert_eq!(ctx.history.len(), 1);
        assert_eq!(ctx.counters.snapshot().decode_ok, 1);

        let latest = ctx.latest.snapshot();
        assert_eq!(latest.as_ref().map(|s| s.rpm), Some(4200.0));
        assert!(
            latest.is_some_and(|s| s.timestamp >= 0.0),
            "timestamp must come from the shared clock"
        );
    }

    #[test]
    fn published_timestamps_are_non_decreasing() {
        let ctx = TelemetryContext::new(HistoryConfig {
            sample_hz: 1.0e9,
            max_points: 64,
        });
        for _ in 0..10 {
            ctx.publish(TelemetrySample::default());
        }
        let snap = ctx.history.snapshot();
        for pair in snap.time.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }
}
