//! Periodic status line for operators watching the daemon logs.

use pitwall_telemetry_store::TelemetryContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Samples older than this are reported with their age instead of LIVE.
const LIVE_WINDOW_SECS: f64 = 2.0;

/// One rendered status report, split out from the loop so it can be tested.
#[derive(Debug, PartialEq)]
pub struct StatusReport {
    pub line: String,
    pub points: usize,
    pub packets_rx: u64,
    pub decode_failed: u64,
}

pub fn build_report(ctx: &TelemetryContext) -> StatusReport {
    let counters = ctx.counters.snapshot();
    let points = ctx.history.len();
    let line = match ctx.latest.snapshot() {
        Some(sample) => {
            let age = ctx.clock.now_secs() - sample.timestamp;
            let feed = if age < LIVE_WINDOW_SECS {
                "LIVE".to_owned()
            } else {
                format!("stale {age:.1}s")
            };
            format!(
                "car={} gear={} rpm={:.0} kmh={:.1} psi={:.2} [{feed}]",
                sample.car_id,
                sample.gear_label(),
                sample.rpm,
                sample.speed_kmh,
                sample.boost_psi,
            )
        }
        None => "waiting for data".to_owned(),
    };
    StatusReport {
        line,
        points,
        packets_rx: counters.packets_rx,
        decode_failed: counters.decode_failed,
    }
}

/// Log a status line at a fixed interval until the process exits.
pub async fn run_status_loop(ctx: Arc<TelemetryContext>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let report = build_report(&ctx);
        tracing::info!(
            points = report.points,
            packets_rx = report.packets_rx,
            decode_failed = report.decode_failed,
            "{}",
            report.line
        );
    }
}
