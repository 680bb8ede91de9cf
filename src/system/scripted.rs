use std::collections::VecDeque;
use std::time::Duration;

use super::collector::TelemetrySource;
use super::snapshot::Snapshot;
use crate::error::SampleError;

/// Replays canned samples in order; used to drive the monitor without touching the host.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<Result<Snapshot, SampleError>>,
    delay: Option<Duration>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<Snapshot, SampleError>>) -> Self {
        Self {
            script: script.into(),
            delay: None,
        }
    }

    /// Every sample sleeps for `delay` first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl TelemetrySource for ScriptedSource {
    fn sample(&mut self) -> Result<Snapshot, SampleError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(SampleError::Probe("script exhausted".to_string())))
    }
}
