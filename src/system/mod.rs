pub mod collector;
pub mod platform;
pub mod scripted;
pub mod snapshot;
