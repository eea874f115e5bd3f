//! Canonical telemetry sample shared by every codec and consumer.

use serde::{Deserialize, Serialize};

/// Car identifier used when a JSON packet carries no usable `car` field.
pub const JSON_FALLBACK_CAR: &str = "???";

/// Car identifier used when a binary packet's tag trims down to nothing.
pub const BINARY_FALLBACK_CAR: &str = "ERX";

/// One normalized telemetry sample.
///
/// Always fully populated: fields missing from the wire encoding resolve to
/// their defaults (`0`/`0.0`, or the fallback car identifier), never to an
/// absent value. Gear keeps the OutGauge display convention: `0` = reverse,
/// `1` = neutral, `n > 1` = forward gear `n - 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    /// Monotonic seconds since process start, assigned at receipt time.
    pub timestamp: f64,
    pub car_id: String,
    pub gear: i32,
    pub rpm: f32,
    pub speed_kmh: f32,
    pub speed_mph: f32,
    pub boost_psi: f32,
    pub throttle: f32,
    pub brake: f32,
    pub clutch: f32,

    // Binary-only extras; zero for samples decoded from JSON.
    pub flags: u16,
    pub plid: u8,
    pub speed_ms: f32,
    pub turbo: f32,
    pub bar: f32,
    pub limiter: f32,
    /// Trailing optional id of the extended 96-byte record; `0` when absent.
    pub id: i32,
}

impl Default for TelemetrySample {
    fn default() -> Self {
        Self {
            timestamp: 0.0,
            car_id: JSON_FALLBACK_CAR.to_string(),
            gear: 0,
            rpm: 0.0,
            speed_kmh: 0.0,
            speed_mph: 0.0,
            boost_psi: 0.0,
            throttle: 0.0,
            brake: 0.0,
            clutch: 0.0,
            flags: 0,
            plid: 0,
            speed_ms: 0.0,
            turbo: 0.0,
            bar: 0.0,
            limiter: 0.0,
            id: 0,
        }
    }
}

impl TelemetrySample {
    /// Gear rendered in the display convention: `R`, `N`, or the forward
    /// gear number.
    pub fn gear_label(&self) -> String {
        match self.gear {
            0 => "R".to_string(),
            1 => "N".to_string(),
            g => (g - 1).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn default_sample_is_fully_populated() {
        let sample = TelemetrySample::default();
        assert_eq!(sample.car_id, JSON_FALLBACK_CAR);
        assert_eq!(sample.gear, 0);
        assert_eq!(sample.rpm, 0.0);
        assert_eq!(sample.id, 0);
    }

    #[test]
    fn gear_labels_follow_display_convention() {
        let mut sample = TelemetrySample::default();
        assert_eq!(sample.gear_label(), "R");
        sample.gear = 1;
        assert_eq!(sample.gear_label(), "N");
        sample.gear = 4;
        assert_eq!(sample.gear_label(), "3");
    }

    #[test]
    fn serializes_with_camel_case_keys() -> TestResult {
        let sample = TelemetrySample {
            speed_kmh: 101.2,
            ..Default::default()
        };
        let text = serde_json::to_string(&sample)?;
        assert!(text.contains("\"speedKmh\":101.2"), "got: {text}");
        assert!(text.contains("\"carId\":\"???\""), "got: {text}");
        assert!(!text.contains("speed_kmh"), "got: {text}");
        Ok(())
    }
}
