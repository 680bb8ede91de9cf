use super::PlatformExtensions;
use crate::system::snapshot::GpuReading;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn gpu_readings() -> Vec<GpuReading> {
        // No unprivileged utilization counters for the integrated GPU.
        Vec::new()
    }
}
