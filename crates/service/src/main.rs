//! `pitwalld`: the telemetry gateway daemon.

mod config;
mod status;

use anyhow::{Context, Result};
use clap::Parser;
use config::GatewayArgs;
use pitwall_telemetry_gateway::{
    serve_subscribers, spawn_udp_listener, Broadcaster, ListenerConfig, SubscriberRegistry,
};
use pitwall_telemetry_store::TelemetryContext;
use pitwall_telemetry_wire::WireFormat;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = GatewayArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let ctx = TelemetryContext::new(args.history_config());

    let (json_addr, _json_task) = spawn_udp_listener(
        ListenerConfig {
            format: WireFormat::Json,
            bind_addr: args.json_addr(),
        },
        Arc::clone(&ctx),
    )
    .await
    .context("failed to start JSON listener")?;

    let (bin_addr, _bin_task) = spawn_udp_listener(
        ListenerConfig {
            format: WireFormat::OutGauge,
            bind_addr: args.bin_addr(),
        },
        Arc::clone(&ctx),
    )
    .await
    .context("failed to start OutGauge listener")?;

    let subscriber_addr = args.subscriber_addr();
    let tcp = TcpListener::bind(subscriber_addr)
        .await
        .with_context(|| format!("failed to bind subscriber endpoint {subscriber_addr}"))?;
    let registry = Arc::new(SubscriberRegistry::new());
    tokio::spawn(serve_subscribers(tcp, Arc::clone(&registry)));

    let broadcaster = Broadcaster::new(Arc::clone(&ctx), registry, args.fanout_config());
    tokio::spawn(broadcaster.run());

    tokio::spawn(status::run_status_loop(
        Arc::clone(&ctx),
        args.status_interval(),
    ));

    tracing::info!(
        %json_addr,
        %bin_addr,
        %subscriber_addr,
        "pitwall gateway up"
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to wait for shutdown signal")?;
    tracing::info!("shutting down");
    Ok(())
}
