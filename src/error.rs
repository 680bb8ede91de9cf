use std::time::Duration;

use thiserror::Error;

/// A telemetry read failed; the whole sample is discarded.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("no network interface reported")]
    NoNetworkInterface,

    #[error("network interface `{0}` not found")]
    InterfaceNotFound(String),

    #[error("total memory reported as zero")]
    MemoryUnavailable,

    #[error("telemetry probe failed: {0}")]
    Probe(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a tick ended without transmitting a record.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("sample failed: {0}")]
    Sample(#[from] SampleError),

    #[error("transmit failed: {0}")]
    Transport(#[from] TransportError),

    #[error("sampling took {elapsed:?}, over the {limit:?} tick deadline")]
    DeadlineExceeded { elapsed: Duration, limit: Duration },
}
