use std::collections::HashSet;
use std::ffi::OsStr;
use std::thread;

use sysinfo::{Components, Disks, Networks, System};

use super::platform;
use super::snapshot::{DiskCounters, NetworkCounters, Snapshot};
use crate::error::SampleError;

/// Component labels that identify a CPU sensor, most specific first.
/// "computer" is the single ACPI thermal zone sysinfo exposes on Windows.
const CPU_SENSOR_PATTERNS: [&str; 8] = [
    "package", "tctl", "tdie", "coretemp", "k10temp", "cpu", "acpitz", "computer",
];

/// Anything that can produce one [`Snapshot`] per tick.
pub trait TelemetrySource: Send {
    fn sample(&mut self) -> Result<Snapshot, SampleError>;
}

pub struct Collector {
    sys: System,
    networks: Networks,
    disks: Disks,
    components: Components,
    interface: Option<String>,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Collector {
    /// `interface` pins a network interface by name; `None` uses [`select_interface`]'s default.
    pub fn new(interface: Option<String>) -> Self {
        let mut sys = System::new();
        // CPU usage is a delta between refreshes, so prime it once here.
        sys.refresh_memory();
        sys.refresh_cpu_usage();
        Collector {
            sys,
            networks: Networks::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            components: Components::new_with_refreshed_list(),
            interface,
        }
    }

    fn refresh(&mut self) {
        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.networks.refresh(true);
        self.disks.refresh(true);
        self.components.refresh(true);
    }

    fn build_snapshot(&self) -> Result<Snapshot, SampleError> {
        let memory_total = self.sys.total_memory();
        if memory_total == 0 {
            return Err(SampleError::MemoryUnavailable);
        }

        let network = select_interface(
            self.networks
                .list()
                .iter()
                .map(|(name, data)| NetworkCounters {
                    interface: name.clone(),
                    rx_bytes: data.total_received(),
                    tx_bytes: data.total_transmitted(),
                }),
            self.interface.as_deref(),
        )?;

        let disk = sum_disk_counters(self.disks.list().iter().map(|d| {
            let usage = d.usage();
            (d.name(), usage.total_read_bytes, usage.total_written_bytes)
        }));

        let cpu_temperature = pick_cpu_temperature(
            self.components
                .list()
                .iter()
                .map(|c| (c.label(), c.temperature())),
        );

        Ok(Snapshot {
            cpu_usage_percent: self.sys.global_cpu_usage(),
            cpu_temperature,
            memory_used: self.sys.used_memory(),
            memory_total,
            gpus: Vec::new(),
            network,
            disk,
        })
    }
}

impl TelemetrySource for Collector {
    fn sample(&mut self) -> Result<Snapshot, SampleError> {
        // The graphics probe may shell out, so it runs beside the sysinfo refreshes.
        let gpus = thread::scope(|scope| {
            let probe = scope.spawn(platform::gpu_readings);
            self.refresh();
            probe
                .join()
                .map_err(|_| SampleError::Probe("graphics probe panicked".to_string()))
        })?;

        let mut snapshot = self.build_snapshot()?;
        snapshot.gpus = gpus;
        Ok(snapshot)
    }
}

pub fn is_loopback(name: &str) -> bool {
    name == "lo" || name == "lo0" || name.to_ascii_lowercase().contains("loopback")
}

/// Picks the interface whose counters feed the network fields.
///
/// A pinned name must be present. Otherwise non-loopback interfaces are
/// ordered by name and the first one wins.
pub fn select_interface(
    interfaces: impl IntoIterator<Item = NetworkCounters>,
    preferred: Option<&str>,
) -> Result<NetworkCounters, SampleError> {
    let mut candidates: Vec<NetworkCounters> = interfaces.into_iter().collect();

    if let Some(name) = preferred {
        return candidates
            .into_iter()
            .find(|c| c.interface == name)
            .ok_or_else(|| SampleError::InterfaceNotFound(name.to_string()));
    }

    candidates.retain(|c| !is_loopback(&c.interface));
    candidates.sort_by(|a, b| a.interface.cmp(&b.interface));
    candidates
        .into_iter()
        .next()
        .ok_or(SampleError::NoNetworkInterface)
}

/// Sums `(device, read, written)` per block device.
///
/// sysinfo lists one entry per mount but reports I/O for the backing device,
/// so mounts sharing a device (btrfs subvolumes, bind mounts) repeat the same
/// counters. Only the first entry per device name counts.
pub fn sum_disk_counters<'a>(
    disks: impl IntoIterator<Item = (&'a OsStr, u64, u64)>,
) -> DiskCounters {
    let mut seen = HashSet::new();
    disks
        .into_iter()
        .filter(|(name, _, _)| seen.insert(*name))
        .fold(DiskCounters::default(), |acc, (_, read, written)| DiskCounters {
            read_bytes: acc.read_bytes.saturating_add(read),
            written_bytes: acc.written_bytes.saturating_add(written),
        })
}

pub fn pick_cpu_temperature<'a>(
    sensors: impl IntoIterator<Item = (&'a str, Option<f32>)>,
) -> Option<f32> {
    let readings: Vec<(String, f32)> = sensors
        .into_iter()
        .filter_map(|(label, temp)| Some((label.to_ascii_lowercase(), temp?)))
        .filter(|(_, temp)| temp.is_finite())
        .collect();

    CPU_SENSOR_PATTERNS.iter().find_map(|pattern| {
        readings
            .iter()
            .find(|(label, _)| label.contains(pattern))
            .map(|&(_, temp)| temp)
    })
}
