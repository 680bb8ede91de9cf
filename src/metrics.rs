//! Rate and normalization engine.
//!
//! Turns a raw [`Snapshot`] plus the previous tick's [`Baseline`] into the
//! fixed-shape [`MetricsRecord`] sent to the display, and returns the baseline
//! for the next tick. Nothing here touches the OS or the serial link.

use serde::Serialize;

use crate::system::snapshot::Snapshot;

/// Upload rate in KB/s that counts as one percent of activity.
pub const DEFAULT_UPLOAD_KBS_PER_PERCENT: f64 = 5.0;
/// Download rate in KB/s that counts as one percent of activity.
pub const DEFAULT_DOWNLOAD_KBS_PER_PERCENT: f64 = 10.0;
/// Percent of disk activity per MB/s of combined read+write throughput.
pub const DEFAULT_DISK_PERCENT_PER_MBS: f64 = 2.0;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Heuristic scale factors mapping raw rates onto 0..=100.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    pub upload_kbs_per_percent: f64,
    pub download_kbs_per_percent: f64,
    pub disk_percent_per_mbs: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Calibration {
            upload_kbs_per_percent: DEFAULT_UPLOAD_KBS_PER_PERCENT,
            download_kbs_per_percent: DEFAULT_DOWNLOAD_KBS_PER_PERCENT,
            disk_percent_per_mbs: DEFAULT_DISK_PERCENT_PER_MBS,
        }
    }
}

/// The rate-derived part of a record, carried forward for degenerate ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Activity {
    pub netu: u8,
    pub netd: u8,
    pub disk: u8,
}

/// Counters and time of the previous sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Baseline {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub disk_io_bytes: u64,
    /// Unix time in milliseconds.
    pub timestamp_ms: u64,
    pub last_activity: Activity,
}

impl Baseline {
    /// Zeroed counters at `timestamp_ms`. The first tick after this reads
    /// everything since boot as one interval and saturates; that is expected.
    pub fn starting_at(timestamp_ms: u64) -> Self {
        Baseline {
            rx_bytes: 0,
            tx_bytes: 0,
            disk_io_bytes: 0,
            timestamp_ms,
            last_activity: Activity::default(),
        }
    }
}

/// One line on the wire. Field order is the serialized order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MetricsRecord {
    pub cpu: u8,
    pub cput: i16,
    pub mem: u8,
    pub gpu: u8,
    pub gput: i16,
    pub gpum: u8,
    pub netu: u8,
    pub netd: u8,
    pub disk: u8,
}

/// Raw throughput between two samples. Deltas may be negative after a counter reset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rates {
    pub upload_kbs: f64,
    pub download_kbs: f64,
    pub disk_mbs: f64,
}

impl Rates {
    pub fn activity(&self, cal: &Calibration) -> Activity {
        Activity {
            netu: activity_percent(self.upload_kbs / cal.upload_kbs_per_percent),
            netd: activity_percent(self.download_kbs / cal.download_kbs_per_percent),
            disk: activity_percent(self.disk_mbs * cal.disk_percent_per_mbs),
        }
    }
}

/// Rates since `baseline`, or `None` when no time has passed (or the clock went back).
pub fn measure(snapshot: &Snapshot, baseline: &Baseline, now_ms: u64) -> Option<Rates> {
    let elapsed_ms = i128::from(now_ms) - i128::from(baseline.timestamp_ms);
    if elapsed_ms <= 0 {
        return None;
    }
    let secs = elapsed_ms as f64 / 1000.0;

    Some(Rates {
        upload_kbs: delta(snapshot.network.tx_bytes, baseline.tx_bytes) / KIB / secs,
        download_kbs: delta(snapshot.network.rx_bytes, baseline.rx_bytes) / KIB / secs,
        disk_mbs: delta(snapshot.disk.total(), baseline.disk_io_bytes) / MIB / secs,
    })
}

pub fn compute(
    snapshot: &Snapshot,
    baseline: &Baseline,
    now_ms: u64,
    cal: &Calibration,
) -> (MetricsRecord, Baseline) {
    let activity = match measure(snapshot, baseline, now_ms) {
        Some(rates) => rates.activity(cal),
        None => baseline.last_activity,
    };

    let mem = if snapshot.memory_total == 0 {
        0
    } else {
        activity_percent(snapshot.memory_used as f64 / snapshot.memory_total as f64 * 100.0)
    };

    let gpu = snapshot.gpus.first().cloned().unwrap_or_default();

    let record = MetricsRecord {
        cpu: activity_percent(f64::from(snapshot.cpu_usage_percent)),
        cput: temperature(snapshot.cpu_temperature.unwrap_or(0.0)),
        mem,
        gpu: activity_percent(f64::from(gpu.utilization_percent.unwrap_or(0.0))),
        gput: temperature(gpu.temperature.unwrap_or(0.0)),
        gpum: activity_percent(f64::from(gpu.memory_utilization_percent.unwrap_or(0.0))),
        netu: activity.netu,
        netd: activity.netd,
        disk: activity.disk,
    };

    let next = Baseline {
        rx_bytes: snapshot.network.rx_bytes,
        tx_bytes: snapshot.network.tx_bytes,
        disk_io_bytes: snapshot.disk.total(),
        timestamp_ms: now_ms,
        last_activity: activity,
    };

    (record, next)
}

fn delta(now: u64, then: u64) -> f64 {
    (i128::from(now) - i128::from(then)) as f64
}

/// Rounds and clamps into 0..=100. NaN and infinities map to 0.
pub fn activity_percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

fn temperature(celsius: f32) -> i16 {
    if !celsius.is_finite() {
        return 0;
    }
    celsius.round().clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}
