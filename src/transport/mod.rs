//! Line-oriented output to the display.

pub mod memory;
pub mod serial;

use std::io::Write;

use crate::error::TransportError;
use crate::metrics::MetricsRecord;

pub use memory::MemorySink;
pub use serial::SerialLink;

/// Writes one newline-terminated line per call. No buffering across calls.
pub trait LineSink: Send {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError>;
}

/// Compact JSON followed by `\n`.
pub fn encode_line(record: &MetricsRecord) -> Result<String, TransportError> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    Ok(line)
}

/// Encodes and writes `record`, returning the line that went out.
pub fn send<L: LineSink + ?Sized>(
    sink: &mut L,
    record: &MetricsRecord,
) -> Result<String, TransportError> {
    let line = encode_line(record)?;
    sink.write_line(&line)?;
    Ok(line)
}

/// Dry-run sink that prints records instead of driving a device.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl LineSink for StdoutSink {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut out = std::io::stdout().lock();
        out.write_all(line.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

impl LineSink for Box<dyn LineSink> {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        (**self).write_line(line)
    }
}
