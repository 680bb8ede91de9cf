use super::{PlatformExtensions, nvidia_smi_readings};
use crate::system::snapshot::GpuReading;

pub struct Platform;

impl PlatformExtensions for Platform {
    fn gpu_readings() -> Vec<GpuReading> {
        nvidia_smi_readings().unwrap_or_default()
    }
}
