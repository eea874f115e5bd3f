//! Command-line configuration for the gateway daemon.

use clap::Parser;
use pitwall_telemetry_gateway::FanoutConfig;
use pitwall_telemetry_store::HistoryConfig;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Telemetry gateway daemon.
///
/// Listens for JSON and OutGauge-binary telemetry datagrams, keeps a
/// decimated history, and streams the latest sample to every connected
/// subscriber as newline-delimited JSON.
#[derive(Debug, Parser)]
#[command(name = "pitwalld", version, about)]
pub struct GatewayArgs {
    /// Address the UDP listeners bind to.
    #[arg(long, default_value = "127.0.0.1")]
    pub udp_bind: IpAddr,

    /// Port for JSON telemetry datagrams.
    #[arg(long, default_value_t = 9998)]
    pub json_port: u16,

    /// Port for OutGauge binary telemetry datagrams.
    #[arg(long, default_value_t = 9999)]
    pub bin_port: u16,

    /// Address the subscriber stream endpoint binds to.
    #[arg(long, default_value = "0.0.0.0")]
    pub subscriber_bind: IpAddr,

    /// Port for the newline-delimited JSON subscriber stream.
    #[arg(long, default_value_t = 8080)]
    pub subscriber_port: u16,

    /// Fan-out cadence in ticks per second.
    #[arg(long, default_value_t = 20.0)]
    pub broadcast_hz: f64,

    /// Target stored-sample rate for the history.
    #[arg(long, default_value_t = 60.0)]
    pub sample_hz: f64,

    /// Maximum stored history points per channel.
    #[arg(long, default_value_t = 999_999)]
    pub max_points: usize,

    /// Seconds between status log lines.
    #[arg(long, default_value_t = 1)]
    pub status_interval_secs: u64,
}

impl GatewayArgs {
    pub fn json_addr(&self) -> SocketAddr {
        SocketAddr::new(self.udp_bind, self.json_port)
    }

    pub fn bin_addr(&self) -> SocketAddr {
        SocketAddr::new(self.udp_bind, self.bin_port)
    }

    pub fn subscriber_addr(&self) -> SocketAddr {
        SocketAddr::new(self.subscriber_bind, self.subscriber_port)
    }

    pub fn history_config(&self) -> HistoryConfig {
        HistoryConfig {
            sample_hz: self.sample_hz,
            max_points: self.max_points,
        }
    }

    pub fn fanout_config(&self) -> FanoutConfig {
        FanoutConfig {
            broadcast_hz: self.broadcast_hz,
            ..Default::default()
        }
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn defaults_match_the_documented_ports() -> TestResult {
        let args = GatewayArgs::try_parse_from(["pitwalld"])?;
        assert_eq!(args.json_addr().to_string(), "127.0.0.1:9998");
        assert_eq!(args.bin_addr().to_string(), "127.0.0.1:9999");
        assert_eq!(args.subscriber_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(args.history_config().max_points, 999_999);
        Ok(())
    }

    #[test]
    fn flags_override_defaults() -> TestResult {
        let args = GatewayArgs::try_parse_from([
            "pitwalld",
            "--json-port",
            "15000",
            "--broadcast-hz",
            "5",
            "--sample-hz",
            "30",
        ])?;
        assert_eq!(args.json_addr().port(), 15000);
        assert_eq!(args.fanout_config().broadcast_hz, 5.0);
        assert_eq!(args.history_config().sample_hz, 30.0);
        Ok(())
    }
}
