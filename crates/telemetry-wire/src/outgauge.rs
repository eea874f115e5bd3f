//! OutGauge binary wire-format codec.
//!
//! Little-endian packed record, 92 bytes plus an optional trailing 4-byte id:
//!
//! | Offset | Type      | Field                         |
//! |--------|-----------|-------------------------------|
//! | 0      | u32       | sender time (ms, not trusted) |
//! | 4      | `[u8; 4]` | car tag                       |
//! | 8      | u16       | flags                         |
//! | 10     | u8        | gear (0=R, 1=N, n=gear n-1)   |
//! | 11     | u8        | plid                          |
//! | 12     | f32       | speed (m/s)                   |
//! | 16     | f32       | speed (km/h)                  |
//! | 20     | f32       | speed (mph)                   |
//! | 24     | f32       | rpm                           |
//! | 28     | f32       | turbo (bar)                   |
//! | 32     | f32       | bar                           |
//! | 36     | f32       | boost (psi)                   |
//! | 40     | u32       | limiter                       |
//! | 44     | u32       | lights (not carried)          |
//! | 48     | f32       | throttle                      |
//! | 52     | f32       | brake                         |
//! | 56     | f32       | clutch                        |
//! | 60     | `[u8;16]` | display line 1 (not carried)  |
//! | 76     | `[u8;16]` | display line 2 (not carried)  |
//! | 92     | i32       | id (only in 96-byte packets)  |
//!
//! Any payload length other than 92 or 96 is a hard decode failure; every
//! other problem resolves to a field default.

use crate::sample::{TelemetrySample, BINARY_FALLBACK_CAR};
use crate::DecodeError;

/// Size of the base OutGauge record.
pub const BASE_PACKET_SIZE: usize = 92;
/// Size of the extended record carrying the trailing i32 id.
pub const EXTENDED_PACKET_SIZE: usize = 96;

const OFF_CAR: usize = 4;
const OFF_FLAGS: usize = 8;
const OFF_GEAR: usize = 10;
const OFF_PLID: usize = 11;
const OFF_SPEED_MS: usize = 12;
const OFF_SPEED_KMH: usize = 16;
const OFF_SPEED_MPH: usize = 20;
const OFF_RPM: usize = 24;
const OFF_TURBO: usize = 28;
const OFF_BAR: usize = 32;
const OFF_BOOST_PSI: usize = 36;
const OFF_LIMITER: usize = 40;
const OFF_THROTTLE: usize = 48;
const OFF_BRAKE: usize = 52;
const OFF_CLUTCH: usize = 56;
const OFF_ID: usize = 92;

/// Decode one OutGauge datagram into a canonical sample.
///
/// The returned sample's `timestamp` is zero; the listener stamps it from
/// the shared clock after a successful decode. The sender's own millisecond
/// counter at offset 0 is deliberately ignored.
///
/// # Errors
///
/// [`DecodeError::BadLength`] for any payload length outside {92, 96}.
pub fn decode_outgauge_packet(data: &[u8]) -> Result<TelemetrySample, DecodeError> {
    if data.len() != BASE_PACKET_SIZE && data.len() != EXTENDED_PACKET_SIZE {
        return Err(DecodeError::BadLength { got: data.len() });
    }

    let id = if data.len() == EXTENDED_PACKET_SIZE {
        read_i32_le(data, OFF_ID).unwrap_or(0)
    } else {
        0
    };

    Ok(TelemetrySample {
        timestamp: 0.0,
        car_id: decode_car_tag(data.get(OFF_CAR..OFF_CAR + 4).unwrap_or(&[])),
        gear: i32::from(read_u8(data, OFF_GEAR)),
        rpm: read_f32_le(data, OFF_RPM).unwrap_or(0.0),
        speed_kmh: read_f32_le(data, OFF_SPEED_KMH).unwrap_or(0.0),
        speed_mph: read_f32_le(data, OFF_SPEED_MPH).unwrap_or(0.0),
        boost_psi: read_f32_le(data, OFF_BOOST_PSI).unwrap_or(0.0),
        throttle: read_f32_le(data, OFF_THROTTLE).unwrap_or(0.0),
        brake: read_f32_le(data, OFF_BRAKE).unwrap_or(0.0),
        clutch: read_f32_le(data, OFF_CLUTCH).unwrap_or(0.0),
        flags: read_u16_le(data, OFF_FLAGS).unwrap_or(0),
        plid: read_u8(data, OFF_PLID),
        speed_ms: read_f32_le(data, OFF_SPEED_MS).unwrap_or(0.0),
        turbo: read_f32_le(data, OFF_TURBO).unwrap_or(0.0),
        bar: read_f32_le(data, OFF_BAR).unwrap_or(0.0),
        limiter: read_u32_le(data, OFF_LIMITER).unwrap_or(0) as f32,
        id,
    })
}

/// First 3 bytes of the tag, ASCII with non-ASCII bytes dropped and trailing
/// NULs trimmed; an empty result falls back to the default tag.
fn decode_car_tag(raw: &[u8]) -> String {
    let tag: String = raw
        .iter()
        .take(3)
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect();
    let trimmed = tag.trim_end_matches('\0');
    if trimmed.is_empty() {
        BINARY_FALLBACK_CAR.to_string()
    } else {
        trimmed.to_string()
    }
}

fn read_u8(data: &[u8], offset: usize) -> u8 {
    data.get(offset).copied().unwrap_or(0)
}

fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .and_then(|b| b.try_into().ok())
        .map(u16::from_le_bytes)
}

fn read_u32_le(data: &[u8], offset: usize) -> Option<u32> {
    data.get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
}

fn read_i32_le(data: &[u8], offset: usize) -> Option<i32> {
    data.get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(i32::from_le_bytes)
}

fn read_f32_le(data: &[u8], offset: usize) -> Option<f32> {
    data.get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(f32::from_le_bytes)
        .filter(|v| v.is_finite())
}
