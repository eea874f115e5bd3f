//! UDP ingestion listeners.

use anyhow::{Context, Result};
use pitwall_telemetry_store::TelemetryContext;
use pitwall_telemetry_wire::{decode, WireFormat};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Largest datagram either sender produces is well under this.
const MAX_PACKET_SIZE: usize = 65_536;

/// Back-off after a socket-level receive error; such errors are transient on
/// a connectionless socket and must not spin the loop.
const SOCKET_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Interval between heartbeat log lines.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// One listener = one socket + one wire format.
#[derive(Debug, Clone, Copy)]
pub struct ListenerConfig {
    pub format: WireFormat,
    pub bind_addr: SocketAddr,
}

/// Bind the socket and spawn the receive loop.
///
/// Binding happens before the task is spawned so a bind failure aborts
/// startup; everything after that is handled inside the loop and never
/// terminates it. Returns the bound address (useful with port 0) and the
/// task handle.
///
/// # Errors
///
/// Fails only when the socket cannot be bound.
pub async fn spawn_udp_listener(
    config: ListenerConfig,
    ctx: Arc<TelemetryContext>,
) -> Result<(SocketAddr, JoinHandle<()>)> {
    let socket = UdpSocket::bind(config.bind_addr)
        .await
        .with_context(|| {
            format!(
                "failed to bind {} listener on {}",
                config.format.label(),
                config.bind_addr
            )
        })?;
    let local_addr = socket
        .local_addr()
        .context("bound UDP socket has no local address")?;

    info!(
        format = config.format.label(),
        addr = %local_addr,
        "telemetry listener ready"
    );

    let handle = tokio::spawn(receive_loop(socket, config.format, ctx));
    Ok((local_addr, handle))
}

async fn receive_loop(socket: UdpSocket, format: WireFormat, ctx: Arc<TelemetryContext>) {
    let mut buf = vec![0u8; MAX_PACKET_SIZE];
    let mut last_beat = tokio::time::Instant::now();
    let mut last_rx = 0u64;

    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, _peer)) => {
                ctx.counters.record_packet();

                let Some(payload) = buf.get(..len) else {
                    continue;
                };
                match decode(format, payload) {
                    Ok(sample) => ctx.publish(sample),
                    Err(e) => {
                        ctx.counters.record_failure();
                        debug!(
                            format = format.label(),
                            error = %e,
                            len,
                            "dropped undecodable packet"
                        );
                    }
                }

                if last_beat.elapsed() >= HEARTBEAT_INTERVAL {
                    let snap = ctx.counters.snapshot();
                    debug!(
                        format = format.label(),
                        rx_per_s = snap.packets_rx.saturating_sub(last_rx),
                        total_rx = snap.packets_rx,
                        ok = snap.decode_ok,
                        failed = snap.decode_failed,
                        "listener heartbeat"
                    );
                    last_rx = snap.packets_rx;
                    last_beat = tokio::time::Instant::now();
                }
            }
            Err(e) => {
                warn!(
                    format = format.label(),
                    error = %e,
                    "socket receive error; retrying"
                );
                tokio::time::sleep(SOCKET_RETRY_DELAY).await;
            }
        }
    }
}
