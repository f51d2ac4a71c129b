//! `rfid-forwarder` library.
//!
//! The binary (`src/main.rs`) is responsible for logging setup, signals, opening
//! the serial port and process exit codes. The pipeline itself lives in
//! [`crate::app`] where it can be tested deterministically with an injected
//! reader and an injected collector.

pub mod app;
pub mod config;
pub mod dedup;
pub mod dispatch;
pub mod frame;
pub mod identity;
pub mod logging;
pub mod mac_address;
pub mod reader;
pub mod tag;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use app::{CycleReport, Options, RunError, poll_cycle, run};
pub use config::parse_duration;
pub use dedup::DedupCache;
pub use dispatch::{
    AttemptError, Collector, DeliveryOutcome, Dispatcher, FixedDelay, HttpCollector, Payload,
    RetryPolicy, SubmitFuture,
};
pub use frame::extract_events;
pub use identity::DeviceIdentity;
pub use mac_address::MacAddress;
pub use reader::{ReaderError, SerialReader, TagReader};
pub use tag::{Epc, TagEvent};
