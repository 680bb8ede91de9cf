/// Raw readings gathered in one tick. Byte counters are cumulative since boot.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub cpu_usage_percent: f32,
    pub cpu_temperature: Option<f32>,
    pub memory_used: u64,
    pub memory_total: u64,
    /// Ordered as the platform reports them; index 0 is the primary controller.
    pub gpus: Vec<GpuReading>,
    pub network: NetworkCounters,
    pub disk: DiskCounters,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpuReading {
    pub utilization_percent: Option<f32>,
    pub temperature: Option<f32>,
    pub memory_utilization_percent: Option<f32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkCounters {
    pub interface: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiskCounters {
    pub read_bytes: u64,
    pub written_bytes: u64,
}

impl DiskCounters {
    pub fn total(&self) -> u64 {
        self.read_bytes.saturating_add(self.written_bytes)
    }
}
