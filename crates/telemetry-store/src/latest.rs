//! Latest-value cache.

use parking_lot::Mutex;
use pitwall_telemetry_wire::TelemetrySample;

/// Single most-recent sample, overwritten on every successful decode.
///
/// One writer at a time (whichever listener last decoded) and any number of
/// readers; the whole value is replaced or cloned under the lock so readers
/// never observe a partially updated sample.
#[derive(Default)]
pub struct LatestSample {
    inner: Mutex<Option<TelemetrySample>>,
}

impl LatestSample {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached sample.
    pub fn set(&self, sample: TelemetrySample) {
        *self.inner.lock() = Some(sample);
    }

    /// Clone the cached sample out, if any packet has arrived yet.
    pub fn snapshot(&self) -> Option<TelemetrySample> {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        assert!(LatestSample::new().snapshot().is_none());
    }

    #[test]
    fn set_replaces_the_whole_value() {
        let latest = LatestSample::new();
        latest.set(TelemetrySample {
            rpm: 100.0,
            ..Default::default()
        });
        latest.set(TelemetrySample {
            rpm: 200.0,
            ..Default::default()
        });

        let snap = latest.snapshot();
        assert_eq!(snap.map(|s| s.rpm), Some(200.0));
    }

    #[test]
    fn snapshot_is_an_independent_clone() {
        let latest = LatestSample::new();
        latest.set(TelemetrySample {
            rpm: 100.0,
            ..Default::default()
        });
        let before = latest.snapshot();
        latest.set(TelemetrySample {
            rpm: 300.0,
            ..Default::default()
        });
        assert_eq!(before.map(|s| s.rpm), Some(100.0));
    }
}
