use std::fs;
use std::path::Path;

use super::{PlatformExtensions, nvidia_smi_readings};
use crate::system::snapshot::GpuReading;

const DRM_ROOT: &str = "/sys/class/drm";

pub struct Platform;

impl PlatformExtensions for Platform {
    fn gpu_readings() -> Vec<GpuReading> {
        if let Some(readings) = nvidia_smi_readings()
            && !readings.is_empty()
        {
            return readings;
        }
        drm_readings(Path::new(DRM_ROOT))
    }
}

/// amdgpu exposes busy percentages and a hwmon node per card under /sys/class/drm.
fn drm_readings(root: &Path) -> Vec<GpuReading> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    let mut cards: Vec<_> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            // "card0" but not connectors like "card0-HDMI-A-1"
            let is_card = name
                .strip_prefix("card")
                .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
            is_card.then(|| (name, entry.path()))
        })
        .collect();
    cards.sort();

    cards
        .iter()
        .filter_map(|(_, path)| read_drm_card(&path.join("device")))
        .collect()
}

fn read_drm_card(device: &Path) -> Option<GpuReading> {
    // Cards without a busy counter (most non-amdgpu drivers) are skipped.
    let utilization = read_number(&device.join("gpu_busy_percent"))?;
    Some(GpuReading {
        utilization_percent: Some(utilization),
        temperature: hwmon_temperature(&device.join("hwmon")),
        memory_utilization_percent: read_number(&device.join("mem_busy_percent")),
    })
}

fn hwmon_temperature(hwmon: &Path) -> Option<f32> {
    let mut nodes: Vec<_> = fs::read_dir(hwmon).ok()?.flatten().map(|e| e.path()).collect();
    nodes.sort();
    nodes
        .iter()
        .find_map(|node| read_number(&node.join("temp1_input")))
        .map(|millidegrees| millidegrees / 1000.0)
}

fn read_number(path: &Path) -> Option<f32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_amdgpu_style_tree() {
        let root = std::env::temp_dir().join(format!("pcmon_drm_{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let device = root.join("card1").join("device");
        fs::create_dir_all(device.join("hwmon").join("hwmon3")).unwrap();
        fs::create_dir_all(root.join("card1-DP-1")).unwrap();
        fs::create_dir_all(root.join("card0").join("device")).unwrap();
        fs::write(device.join("gpu_busy_percent"), "23\n").unwrap();
        fs::write(device.join("mem_busy_percent"), "4\n").unwrap();
        fs::write(device.join("hwmon/hwmon3/temp1_input"), "48000\n").unwrap();

        let readings = drm_readings(&root);
        let _ = fs::remove_dir_all(&root);

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].utilization_percent, Some(23.0));
        assert_eq!(readings[0].memory_utilization_percent, Some(4.0));
        assert_eq!(readings[0].temperature, Some(48.0));
    }

    #[test]
    fn missing_drm_root_is_empty() {
        assert!(drm_readings(Path::new("/nonexistent/drm")).is_empty());
    }
}
