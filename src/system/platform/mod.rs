use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::system::snapshot::GpuReading;

pub trait PlatformExtensions {
    /// Graphics controllers in a stable order. Empty when nothing can be probed.
    fn gpu_readings() -> Vec<GpuReading>;
}

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform_impl;
#[cfg(target_os = "macos")]
use macos as platform_impl;
#[cfg(target_os = "windows")]
use windows as platform_impl;

pub fn gpu_readings() -> Vec<GpuReading> {
    platform_impl::Platform::gpu_readings()
}

#[cfg_attr(target_os = "macos", allow(dead_code))]
const NVIDIA_SMI_QUERY: [&str; 2] = [
    "--query-gpu=utilization.gpu,temperature.gpu,utilization.memory",
    "--format=csv,noheader,nounits",
];

/// Longest a vendor tool may run before it is killed.
#[cfg_attr(target_os = "macos", allow(dead_code))]
const TOOL_TIMEOUT: Duration = Duration::from_secs(2);
#[cfg_attr(target_os = "macos", allow(dead_code))]
const TOOL_POLL: Duration = Duration::from_millis(10);

/// Queries the NVIDIA driver tool. `None` if it is missing, exits non-zero or hangs.
#[cfg_attr(target_os = "macos", allow(dead_code))]
fn nvidia_smi_readings() -> Option<Vec<GpuReading>> {
    let stdout = stdout_within(Command::new("nvidia-smi").args(NVIDIA_SMI_QUERY), TOOL_TIMEOUT)?;
    Some(parse_nvidia_smi_csv(&String::from_utf8_lossy(&stdout)))
}

/// Runs `command` and returns its stdout if it exits successfully within `limit`.
/// A child still running at the deadline is killed and reaped.
#[cfg_attr(target_os = "macos", allow(dead_code))]
pub(crate) fn stdout_within(command: &mut Command, limit: Duration) -> Option<Vec<u8>> {
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    // Drained on its own thread so a chatty child cannot block on a full pipe.
    let mut pipe = child.stdout.take()?;
    let reader = thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf).map(|_| buf)
    });

    let deadline = Instant::now() + limit;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() < deadline => thread::sleep(TOOL_POLL),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
        }
    };
    if !status.success() {
        return None;
    }
    reader.join().ok()?.ok()
}

/// Parses `utilization.gpu, temperature.gpu, utilization.memory` rows.
/// Fields the driver reports as `[N/A]` become `None`.
#[cfg_attr(target_os = "macos", allow(dead_code))]
pub(crate) fn parse_nvidia_smi_csv(text: &str) -> Vec<GpuReading> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut fields = line.split(',').map(|f| f.trim().parse::<f32>().ok());
            GpuReading {
                utilization_percent: fields.next().flatten(),
                temperature: fields.next().flatten(),
                memory_utilization_percent: fields.next().flatten(),
            }
        })
        .collect()
}
