pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod system;
pub mod transport;
