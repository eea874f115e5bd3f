//! Subscriber sinks and the TCP line-stream endpoint.

use crate::broadcast::SubscriberRegistry;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// One writable subscriber endpoint.
///
/// Implementations own the underlying transport; the broadcaster only ever
/// hands them a fully serialized payload line (without the trailing
/// newline). The first failed or stalled write deregisters the sink.
#[async_trait]
pub trait SubscriberSink: Send + Sync {
    /// Write one payload line plus the line terminator, flushing it out.
    async fn send_line(&mut self, line: &str) -> Result<()>;
}

/// Newline-delimited JSON over a TCP write half.
pub struct TcpLineSink {
    writer: OwnedWriteHalf,
}

impl TcpLineSink {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl SubscriberSink for TcpLineSink {
    async fn send_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Accept subscriber connections and register them with the fan-out.
///
/// This is the reference transport endpoint: each connection's write half
/// becomes a [`TcpLineSink`]; a companion task drains the read half and
/// deregisters the subscription on disconnect. The caller binds the
/// listener so bind failures stay fatal at startup.
pub async fn serve_subscribers(listener: TcpListener, registry: Arc<SubscriberRegistry>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let (read_half, write_half) = stream.into_split();
                let handle = registry.register(Box::new(TcpLineSink::new(write_half)));
                info!(%peer, subscriber = handle.id(), "subscriber connected");

                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    drain_until_disconnect(read_half).await;
                    registry.deregister(&handle);
                    info!(%peer, subscriber = handle.id(), "subscriber disconnected");
                });
            }
            Err(e) => {
                warn!(error = %e, "subscriber accept error; retrying");
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

/// Subscribers never send payload; read until EOF/error to notice the
/// disconnect promptly.
async fn drain_until_disconnect(mut read_half: OwnedReadHalf) {
    let mut scratch = [0u8; 256];
    loop {
        match read_half.read(&mut scratch).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}
