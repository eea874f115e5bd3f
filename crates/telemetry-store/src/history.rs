//! Decimated, bounded sample history.
//!
//! Telemetry arrives far faster (and less regularly) than a plot needs, so
//! the store keeps one entry per decimation interval: a sample that arrives
//! before the interval has elapsed overwrites the newest stored entry rather
//! than appending, which keeps the latest values visible without growing the
//! series. Storage is one deque per numeric channel plus a shared time
//! channel, all trimmed together so they stay index-aligned.

use parking_lot::Mutex;
use pitwall_telemetry_wire::TelemetrySample;
use std::collections::VecDeque;

/// Default decimation rate, samples per second.
pub const DEFAULT_SAMPLE_HZ: f64 = 60.0;

/// Default cap on stored points per channel.
pub const DEFAULT_MAX_POINTS: usize = 999_999;

/// Sizing and decimation parameters for [`SampleHistory`].
#[derive(Debug, Clone, Copy)]
pub struct HistoryConfig {
    /// Target stored-sample rate; the decimation interval is `1 / sample_hz`.
    pub sample_hz: f64,
    /// Maximum stored points per channel.
    pub max_points: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            sample_hz: DEFAULT_SAMPLE_HZ,
            max_points: DEFAULT_MAX_POINTS,
        }
    }
}

#[derive(Debug, Default)]
struct Channels {
    time: VecDeque<f64>,
    rpm: VecDeque<f32>,
    speed_kmh: VecDeque<f32>,
    speed_mph: VecDeque<f32>,
    boost_psi: VecDeque<f32>,
    throttle: VecDeque<f32>,
    brake: VecDeque<f32>,
    clutch: VecDeque<f32>,
    last_store_time: Option<f64>,
}

impl Channels {
    fn append(&mut self, sample: &TelemetrySample) {
        self.time.push_back(sample.timestamp);
        self.rpm.push_back(sample.rpm);
        self.speed_kmh.push_back(sample.speed_kmh);
        self.speed_mph.push_back(sample.speed_mph);
        self.boost_psi.push_back(sample.boost_psi);
        self.throttle.push_back(sample.throttle);
        self.brake.push_back(sample.brake);
        self.clutch.push_back(sample.clutch);
    }

    fn overwrite_newest(&mut self, sample: &TelemetrySample) {
        let Some(t) = self.time.back_mut() else {
            return;
        };
        *t = sample.timestamp;
        set_back(&mut self.rpm, sample.rpm);
        set_back(&mut self.speed_kmh, sample.speed_kmh);
        set_back(&mut self.speed_mph, sample.speed_mph);
        set_back(&mut self.boost_psi, sample.boost_psi);
        set_back(&mut self.throttle, sample.throttle);
        set_back(&mut self.brake, sample.brake);
        set_back(&mut self.clutch, sample.clutch);
    }

    fn trim_front(&mut self) {
        self.time.pop_front();
        self.rpm.pop_front();
        self.speed_kmh.pop_front();
        self.speed_mph.pop_front();
        self.boost_psi.pop_front();
        self.throttle.pop_front();
        self.brake.pop_front();
        self.clutch.pop_front();
    }
}

fn set_back(channel: &mut VecDeque<f32>, value: f32) {
    if let Some(slot) = channel.back_mut() {
        *slot = value;
    }
}

/// Decimated time-series store, safe to share across tasks.
///
/// Written only by the ingestion listeners; readers always get an owned
/// [`HistorySnapshot`] so a concurrent trim can never invalidate their view.
pub struct SampleHistory {
    inner: Mutex<Channels>,
    sample_interval: f64,
    max_points: usize,
}

impl SampleHistory {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            inner: Mutex::new(Channels::default()),
            sample_interval: 1.0 / config.sample_hz.max(f64::MIN_POSITIVE),
            max_points: config.max_points.max(1),
        }
    }

    /// Record one sample, decimating by receive timestamp.
    ///
    /// A sample arriving before the decimation interval has elapsed (this
    /// includes equal timestamps and clock regressions) overwrites the
    /// newest stored entry in place and does not advance the decimation
    /// deadline; a regressed timestamp is deliberately accepted rather than
    /// rejected so the display keeps updating through clock anomalies.
    pub fn record(&self, sample: &TelemetrySample) {
        let mut channels = self.inner.lock();

        let due = match channels.last_store_time {
            None => true,
            Some(last) => sample.timestamp - last >= self.sample_interval,
        };

        if due {
            channels.last_store_time = Some(sample.timestamp);
            channels.append(sample);
        } else {
            channels.overwrite_newest(sample);
        }

        while channels.time.len() > self.max_points {
            channels.trim_front();
        }
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.inner.lock().time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().time.is_empty()
    }

    /// Copy the full series out for rendering.
    pub fn snapshot(&self) -> HistorySnapshot {
        let channels = self.inner.lock();
        HistorySnapshot {
            time: channels.time.iter().copied().collect(),
            rpm: channels.rpm.iter().copied().collect(),
            speed_kmh: channels.speed_kmh.iter().copied().collect(),
            speed_mph: channels.speed_mph.iter().copied().collect(),
            boost_psi: channels.boost_psi.iter().copied().collect(),
            throttle: channels.throttle.iter().copied().collect(),
            brake: channels.brake.iter().copied().collect(),
            clutch: channels.clutch.iter().copied().collect(),
        }
    }
}

/// Owned copy of every history channel, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    pub time: Vec<f64>,
    pub rpm: Vec<f32>,
    pub speed_kmh: Vec<f32>,
    pub speed_mph: Vec<f32>,
    pub boost_psi: Vec<f32>,
    pub throttle: Vec<f32>,
    pub brake: Vec<f32>,
    pub clutch: Vec<f32>,
}

impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}
