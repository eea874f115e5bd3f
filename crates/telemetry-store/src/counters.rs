//! Monotonic ingest counters for status display.

use std::sync::atomic::{AtomicU64, Ordering};

/// Packets received / decoded / dropped, shared across all listeners.
///
/// Plain relaxed atomics: the counters only feed the status line, so no
/// ordering is required beyond each counter being individually consistent.
#[derive(Debug, Default)]
pub struct IngestCounters {
    packets_rx: AtomicU64,
    decode_ok: AtomicU64,
    decode_failed: AtomicU64,
}

impl IngestCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_packet(&self) {
        self.packets_rx.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ok(&self) {
        self.decode_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.decode_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            packets_rx: self.packets_rx.load(Ordering::Relaxed),
            decode_ok: self.decode_ok.load(Ordering::Relaxed),
            decode_failed: self.decode_failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountersSnapshot {
    pub packets_rx: u64,
    pub decode_ok: u64,
    pub decode_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn counters_increment_independently() {
        let counters = IngestCounters::new();
        counters.record_packet();
        counters.record_packet();
        counters.record_ok();
        counters.record_failure();

        let snap = counters.snapshot();
        assert_eq!(snap.packets_rx, 2);
        assert_eq!(snap.decode_ok, 1);
        assert_eq!(snap.decode_failed, 1);
    }

    #[test]
    fn concurrent_increments_are_not_lost() {
        let counters = Arc::new(IngestCounters::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let counters = Arc::clone(&counters);
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    counters.record_packet();
                }
            }));
        }
        for handle in handles {
            let _ = handle.join();
        }
        assert_eq!(counters.snapshot().packets_rx, 4000);
    }
}
