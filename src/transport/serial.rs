use std::io::Write;
use std::time::Duration;

use serialport::SerialPort;

use super::LineSink;
use crate::error::TransportError;

/// The display's serial connection, opened once at startup.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialLink {
    pub fn open(
        path: &str,
        baud_rate: u32,
        write_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let port = serialport::new(path, baud_rate)
            .timeout(write_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                port: path.to_string(),
                source,
            })?;
        Ok(SerialLink {
            port,
            name: path.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl LineSink for SerialLink {
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        self.port.write_all(line.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}
