//! End-to-end gateway tests over real sockets on ephemeral ports.

use pitwall_telemetry_gateway::{
    spawn_udp_listener, Broadcaster, FanoutConfig, ListenerConfig, SubscriberRegistry,
    serve_subscribers,
};
use pitwall_telemetry_store::{HistoryConfig, TelemetryContext};
use pitwall_telemetry_wire::{WireFormat, BASE_PACKET_SIZE};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::net::{TcpListener, TcpStream, UdpSocket};

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Poll until `check` passes or a couple of seconds elapse.
async fn wait_until<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn start_json_listener(
    ctx: &Arc<TelemetryContext>,
) -> Result<std::net::SocketAddr, Box<dyn std::error::Error>> {
    let config = ListenerConfig {
        format: WireFormat::Json,
        bind_addr: "127.0.0.1:0".parse()?,
    };
    let (addr, _handle) = spawn_udp_listener(config, Arc::clone(ctx)).await?;
    Ok(addr)
}

#[tokio::test]
async fn json_listener_ingests_and_counts() -> TestResult {
    let ctx = TelemetryContext::new(HistoryConfig::default());
    let addr = start_json_listener(&ctx).await?;

    let sender = UdpSocket::bind("127.0.0.1:0").await?;
    sender
        .send_to(br#"{"rpm": 4000.0, "kmh": 80.0, "car": "FZ5"}"#, addr)
        .await?;

    assert!(
        wait_until(|| ctx.counters.snapshot().decode_ok == 1).await,
        "decoded packet never arrived"
    );

    let latest = ctx.latest.snapshot().ok_or("latest cache empty")?;
    assert!((latest.rpm - 4000.0).abs() < 0.001);
    assert_eq!(latest.car_id, "FZ5");
    assert!(latest.timestamp >= 0.0);
    assert_eq!(ctx.history.len(), 1);
    Ok(())
}

#[tokio::test]
async fn malformed_packets_are_counted_and_do_not_kill_the_loop() -> TestResult {
    let ctx = TelemetryContext::new(HistoryConfig::default());
    let addr = start_json_listener(&ctx).await?;

    let sender = UdpSocket::bind("127.0.0.1:0").await?;
    sender.send_to(b"{definitely not json", addr).await?;
    assert!(
        wait_until(|| ctx.counters.snapshot().decode_failed == 1).await,
        "decode failure never counted"
    );

    // The loop must still be alive and able to process a good packet.
    sender.send_to(br#"{"rpm": 1500.0}"#, addr).await?;
    assert!(
        wait_until(|| ctx.counters.snapshot().decode_ok == 1).await,
        "listener died after a bad packet"
    );

    let snap = ctx.counters.snapshot();
    assert_eq!(snap.packets_rx, 2);
    assert_eq!(snap.decode_failed, 1);
    Ok(())
}

#[tokio::test]
async fn binary_listener_accepts_only_valid_lengths() -> TestResult {
    let ctx = TelemetryContext::new(HistoryConfig::default());
    let config = ListenerConfig {
        format: WireFormat::OutGauge,
        bind_addr: "127.0.0.1:0".parse()?,
    };
    let (addr, _handle) = spawn_udp_listener(config, Arc::clone(&ctx)).await?;

    let sender = UdpSocket::bind("127.0.0.1:0").await?;
    sender.send_to(&[0u8; 40], addr).await?;
    sender.send_to(&[0u8; BASE_PACKET_SIZE], addr).await?;

    assert!(
        wait_until(|| {
            let snap = ctx.counters.snapshot();
            snap.decode_ok == 1 && snap.decode_failed == 1
        })
        .await,
        "expected one accepted and one rejected packet"
    );

    let latest = ctx.latest.snapshot().ok_or("latest cache empty")?;
    assert_eq!(latest.car_id, "ERX");
    Ok(())
}

#[tokio::test]
async fn both_listeners_share_one_context() -> TestResult {
    let ctx = TelemetryContext::new(HistoryConfig::default());
    let json_addr = start_json_listener(&ctx).await?;
    let bin_config = ListenerConfig {
        format: WireFormat::OutGauge,
        bind_addr: "127.0.0.1:0".parse()?,
    };
    let (bin_addr, _handle) = spawn_udp_listener(bin_config, Arc::clone(&ctx)).await?;

    let sender = UdpSocket::bind("127.0.0.1:0").await?;
    sender.send_to(br#"{"rpm": 1.0}"#, json_addr).await?;
    sender.send_to(&[0u8; BASE_PACKET_SIZE], bin_addr).await?;

    assert!(
        wait_until(|| ctx.counters.snapshot().decode_ok == 2).await,
        "both packets should land in the shared context"
    );
    Ok(())
}

#[tokio::test]
async fn tcp_subscriber_receives_broadcast_lines() -> TestResult {
    let ctx = TelemetryContext::new(HistoryConfig::default());
    ctx.publish(pitwall_telemetry_wire::TelemetrySample {
        rpm: 7000.0,
        gear: 3,
        ..Default::default()
    });

    let registry = Arc::new(SubscriberRegistry::new());
    let tcp = TcpListener::bind("127.0.0.1:0").await?;
    let tcp_addr = tcp.local_addr()?;
    tokio::spawn(serve_subscribers(tcp, Arc::clone(&registry)));

    let stream = TcpStream::connect(tcp_addr).await?;
    assert!(
        wait_until(|| registry.len() == 1).await,
        "connection was never registered"
    );

    let broadcaster = Broadcaster::new(
        Arc::clone(&ctx),
        Arc::clone(&registry),
        FanoutConfig::default(),
    );
    assert_eq!(broadcaster.broadcast_tick().await, 1);

    let mut reader = tokio::io::BufReader::new(stream);
    let mut line = String::new();
    tokio::time::timeout(Duration::from_secs(2), reader.read_line(&mut line)).await??;
    let decoded: serde_json::Value = serde_json::from_str(line.trim_end())?;
    assert_eq!(decoded.get("gear").and_then(serde_json::Value::as_i64), Some(3));
    assert_eq!(
        decoded.get("rpm").and_then(serde_json::Value::as_f64),
        Some(7000.0)
    );
    Ok(())
}

#[tokio::test]
async fn dropped_tcp_subscriber_is_deregistered() -> TestResult {
    let ctx = TelemetryContext::new(HistoryConfig::default());
    let registry = Arc::new(SubscriberRegistry::new());
    let tcp = TcpListener::bind("127.0.0.1:0").await?;
    let tcp_addr = tcp.local_addr()?;
    tokio::spawn(serve_subscribers(tcp, Arc::clone(&registry)));

    let stream = TcpStream::connect(tcp_addr).await?;
    assert!(wait_until(|| registry.len() == 1).await);

    drop(stream);
    assert!(
        wait_until(|| registry.is_empty()).await,
        "disconnect must deregister the sink"
    );

    // Broadcasting afterwards is a clean no-op.
    ctx.publish(pitwall_telemetry_wire::TelemetrySample::default());
    let broadcaster = Broadcaster::new(ctx, registry, FanoutConfig::default());
    assert_eq!(broadcaster.broadcast_tick().await, 0);
    Ok(())
}
