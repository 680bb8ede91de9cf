use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use super::LineSink;
use crate::error::TransportError;

/// In-memory sink that records writes and can be scripted to fail.
///
/// Clones share state, so a test can keep a handle while the monitor owns another.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    lines: Vec<String>,
    /// `true` entries fail the matching write; an empty script always succeeds.
    failures: VecDeque<bool>,
    attempts: usize,
}

impl MemorySink {
    /// Fails the writes whose position in `script` is `true`.
    pub fn with_failures(script: Vec<bool>) -> Self {
        let sink = Self::default();
        sink.lock().failures = script.into();
        sink
    }

    pub fn lines(&self) -> Vec<String> {
        self.lock().lines.clone()
    }

    pub fn attempts(&self) -> usize {
        self.lock().attempts
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not hide the recorded lines.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LineSink for MemorySink {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut inner = self.lock();
        inner.attempts += 1;
        if inner.failures.pop_front().unwrap_or(false) {
            return Err(TransportError::Write(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "scripted write failure",
            )));
        }
        inner.lines.push(line.to_string());
        Ok(())
    }
}
