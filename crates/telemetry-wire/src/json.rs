//! JSON wire-format codec.
//!
//! One UTF-8 JSON object per datagram. Senders are inconsistent about key
//! names, so each numeric field carries an ordered alias list; the first
//! present key whose value coerces to a number wins. A field that is missing
//! or refuses to coerce falls back to its default; the only hard failure is
//! a JSON syntax error (invalid UTF-8 bytes are replaced before parsing, so
//! text decoding itself never fails).

use crate::sample::{TelemetrySample, JSON_FALLBACK_CAR};
use crate::DecodeError;
use serde_json::{Map, Value};

const RPM_KEYS: &[&str] = &["rpm"];
const SPEED_KMH_KEYS: &[&str] = &["kmh"];
const SPEED_MPH_KEYS: &[&str] = &["mph"];
const BOOST_KEYS: &[&str] = &["psi", "boost"];
const THROTTLE_KEYS: &[&str] = &["throttle", "thr"];
const BRAKE_KEYS: &[&str] = &["brake", "brk"];
const CLUTCH_KEYS: &[&str] = &["clutch", "clt"];
const GEAR_KEYS: &[&str] = &["gear"];
const CAR_KEYS: &[&str] = &["car"];

/// Decode one JSON datagram into a canonical sample.
///
/// The returned sample's `timestamp` is zero; the listener stamps it from
/// the shared clock after a successful decode.
///
/// # Errors
///
/// [`DecodeError::JsonSyntax`] when the payload is not valid JSON and
/// [`DecodeError::NotAnObject`] when it parses to a non-object value.
pub fn decode_json_packet(data: &[u8]) -> Result<TelemetrySample, DecodeError> {
    let text = String::from_utf8_lossy(data);
    let value: Value = serde_json::from_str(&text)?;
    let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;

    Ok(TelemetrySample {
        timestamp: 0.0,
        car_id: string_field(obj, CAR_KEYS),
        gear: integer_field(obj, GEAR_KEYS),
        rpm: numeric_field(obj, RPM_KEYS),
        speed_kmh: numeric_field(obj, SPEED_KMH_KEYS),
        speed_mph: numeric_field(obj, SPEED_MPH_KEYS),
        boost_psi: numeric_field(obj, BOOST_KEYS),
        throttle: numeric_field(obj, THROTTLE_KEYS),
        brake: numeric_field(obj, BRAKE_KEYS),
        clutch: numeric_field(obj, CLUTCH_KEYS),
        ..Default::default()
    })
}

/// Numeric coercion: JSON numbers, numeric strings, and booleans (1/0).
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn numeric_field(obj: &Map<String, Value>, keys: &[&str]) -> f32 {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(coerce_f64)
        .unwrap_or(0.0) as f32
}

fn integer_field(obj: &Map<String, Value>, keys: &[&str]) -> i32 {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(coerce_f64)
        .map(|v| v.trunc() as i32)
        .unwrap_or(0)
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find_map(Value::as_str)
        .unwrap_or(JSON_FALLBACK_CAR)
        .to_string()
}
