//! Broadcast fan-out loop and subscriber registry.

use crate::sink::SubscriberSink;
use parking_lot::Mutex;
use pitwall_telemetry_store::TelemetryContext;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Default broadcast cadence.
pub const DEFAULT_BROADCAST_HZ: f64 = 20.0;

/// Default per-sink write timeout; one stalled subscriber must not stall the
/// tick for everyone else.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(250);

/// Fan-out cadence and hardening parameters.
#[derive(Debug, Clone, Copy)]
pub struct FanoutConfig {
    pub broadcast_hz: f64,
    pub write_timeout: Duration,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            broadcast_hz: DEFAULT_BROADCAST_HZ,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// Opaque subscription identity returned by [`SubscriberRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriberHandle(u64);

impl SubscriberHandle {
    /// Numeric id, for log correlation only.
    pub fn id(&self) -> u64 {
        self.0
    }
}

struct SinkSlot {
    /// Cleared by deregistration before the slot is dropped from the map,
    /// so an in-flight tick holding a snapshot will not start a new write.
    alive: AtomicBool,
    io: tokio::sync::Mutex<Box<dyn SubscriberSink>>,
}

/// Guarded collection of live subscriber sinks.
///
/// The structural lock is held only for map mutation or for taking a
/// snapshot; subscriber I/O happens outside it, serialized per sink by the
/// slot's own async mutex. Safe to register/deregister concurrently with an
/// in-progress broadcast tick: a sink added mid-tick receives the next tick.
#[derive(Default)]
pub struct SubscriberRegistry {
    slots: Mutex<HashMap<u64, Arc<SinkSlot>>>,
    next_id: AtomicU64,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink; it will be written to starting with the next tick.
    pub fn register(&self, sink: Box<dyn SubscriberSink>) -> SubscriberHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(SinkSlot {
            alive: AtomicBool::new(true),
            io: tokio::sync::Mutex::new(sink),
        });
        self.slots.lock().insert(id, slot);
        SubscriberHandle(id)
    }

    /// Remove a sink. Idempotent; unknown handles are ignored.
    pub fn deregister(&self, handle: &SubscriberHandle) {
        let removed = self.slots.lock().remove(&handle.0);
        if let Some(slot) = removed {
            slot.alive.store(false, Ordering::Release);
        }
    }

    /// Number of registered sinks.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    fn snapshot(&self) -> Vec<(u64, Arc<SinkSlot>)> {
        self.slots
            .lock()
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(slot)))
            .collect()
    }

    fn remove_dead(&self, ids: &[u64]) {
        let mut slots = self.slots.lock();
        for id in ids {
            if let Some(slot) = slots.remove(id) {
                slot.alive.store(false, Ordering::Release);
            }
        }
    }
}

/// Timer-driven fan-out of the latest sample to every registered sink.
pub struct Broadcaster {
    ctx: Arc<TelemetryContext>,
    registry: Arc<SubscriberRegistry>,
    config: FanoutConfig,
}

impl Broadcaster {
    pub fn new(
        ctx: Arc<TelemetryContext>,
        registry: Arc<SubscriberRegistry>,
        config: FanoutConfig,
    ) -> Self {
        Self {
            ctx,
            registry,
            config,
        }
    }

    /// Run the broadcast loop forever.
    ///
    /// Best-effort cadence: when a tick overruns the period the next one is
    /// scheduled immediately instead of queueing a backlog.
    pub async fn run(self) {
        let period = Duration::from_secs_f64(1.0 / self.config.broadcast_hz.max(0.001));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        debug!(
            broadcast_hz = self.config.broadcast_hz,
            "broadcast fan-out running"
        );

        loop {
            interval.tick().await;
            self.broadcast_tick().await;
        }
    }

    /// One fan-out pass; returns the number of sinks successfully written.
    ///
    /// No cached sample yet means silence for the tick, not an empty
    /// message. A failed or timed-out write deregisters that sink and never
    /// aborts delivery to the others.
    pub async fn broadcast_tick(&self) -> usize {
        let Some(sample) = self.ctx.latest.snapshot() else {
            return 0;
        };
        let line = match serde_json::to_string(&sample) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to serialize broadcast payload");
                return 0;
            }
        };

        let sinks = self.registry.snapshot();
        let mut dead = Vec::new();
        let mut delivered = 0usize;

        for (id, slot) in sinks {
            let write = async {
                let mut io = slot.io.lock().await;
                if !slot.alive.load(Ordering::Acquire) {
                    return Ok(false);
                }
                io.send_line(&line).await.map(|()| true)
            };

            match tokio::time::timeout(self.config.write_timeout, write).await {
                Ok(Ok(true)) => delivered += 1,
                Ok(Ok(false)) => {} // deregistered while we held the snapshot
                Ok(Err(e)) => {
                    warn!(subscriber = id, error = %e, "subscriber write failed; dropping");
                    dead.push(id);
                }
                Err(_) => {
                    warn!(subscriber = id, "subscriber write timed out; dropping");
                    dead.push(id);
                }
            }
        }

        if !dead.is_empty() {
            self.registry.remove_dead(&dead);
        }
        delivered
    }
}
