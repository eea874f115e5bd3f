//! Wire-format decoding for the pitwall telemetry gateway.
//!
//! Telemetry datagrams arrive in one of two formats:
//!
//! - **JSON**: one UTF-8 encoded JSON object per datagram with short field
//!   names (`rpm`, `kmh`, `psi`, …). See [`json`] for the alias tables.
//! - **OutGauge binary**: the fixed-layout 92/96-byte little-endian record
//!   emitted by LFS-style OutGauge senders. See [`outgauge`] for the layout.
//!
//! Both codecs produce the same canonical [`TelemetrySample`] and are pure
//! with respect to their input bytes; the receive-time [`timestamp`] is
//! stamped by the caller from a [`MonotonicClock`], never taken from the
//! sender.
//!
//! [`timestamp`]: TelemetrySample::timestamp

pub mod clock;
pub mod json;
pub mod outgauge;
pub mod sample;

pub use clock::MonotonicClock;
pub use json::decode_json_packet;
pub use outgauge::{decode_outgauge_packet, BASE_PACKET_SIZE, EXTENDED_PACKET_SIZE};
pub use sample::TelemetrySample;

use thiserror::Error;

/// The two supported datagram encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// UTF-8 JSON object, one per datagram.
    Json,
    /// Fixed-layout 92/96-byte OutGauge record.
    OutGauge,
}

impl WireFormat {
    /// Short label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            WireFormat::Json => "json",
            WireFormat::OutGauge => "outgauge",
        }
    }
}

/// A packet that could not be turned into a [`TelemetrySample`].
///
/// Per-field problems (missing keys, unparseable values) are *not* decode
/// errors; they resolve to documented defaults inside the codecs.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not syntactically valid JSON.
    #[error("malformed JSON payload: {0}")]
    JsonSyntax(#[from] serde_json::Error),

    /// The payload parsed as JSON but was not an object.
    #[error("JSON payload is not an object")]
    NotAnObject,

    /// Binary payload with a length outside {92, 96}.
    #[error("unexpected binary packet size {got} (want 92 or 96)")]
    BadLength {
        /// Observed payload length in bytes.
        got: usize,
    },
}

/// Decode a raw datagram in the given wire format.
pub fn decode(format: WireFormat, data: &[u8]) -> Result<TelemetrySample, DecodeError> {
    match format {
        WireFormat::Json => decode_json_packet(data),
        WireFormat::OutGauge => decode_outgauge_packet(data),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn decode_dispatches_to_json_codec() -> TestResult {
        let sample = decode(WireFormat::Json, br#"{"rpm": 1200.0}"#)?;
        assert!((sample.rpm - 1200.0).abs() < 0.001);
        Ok(())
    }

    #[test]
    fn decode_dispatches_to_binary_codec() -> TestResult {
        let sample = decode(WireFormat::OutGauge, &[0u8; BASE_PACKET_SIZE])?;
        assert_eq!(sample.car_id, "ERX");
        Ok(())
    }

    #[test]
    fn format_labels_are_stable() {
        assert_eq!(WireFormat::Json.label(), "json");
        assert_eq!(WireFormat::OutGauge.label(), "outgauge");
    }
}
