//! Poll loop (business logic) for `rfid-forwarder`.
//!
//! This module is decoupled from process setup (logging, signals, opening the
//! serial port) so it can be driven deterministically with a scripted reader
//! and a fake collector on tokio's paused clock.

use crate::config::{
    DEFAULT_BAUD_RATE, DEFAULT_LOG_DIR, DEFAULT_MAX_ATTEMPTS, DEFAULT_SERIAL_PORT, parse_duration,
};
use crate::dedup::DedupCache;
use crate::dispatch::{Dispatcher, FixedDelay, HttpCollector};
use crate::frame;
use crate::identity::DeviceIdentity;
use crate::mac_address::MacAddress;
use crate::reader::{ReaderError, TagReader};
use clap::Parser;
use futures::future::join_all;
use std::future::Future;
use std::net::IpAddr;
use std::path::PathBuf;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Configuration for the forwarder.
#[derive(Parser, Debug, Clone)]
#[command(author, about, version)]
pub struct Options {
    /// Collector URL that accepts tag events (HTTP POST, JSON body).
    #[arg(long, env = "RFID_ENDPOINT")]
    pub endpoint: String,

    /// Bearer token sent with every submission.
    #[arg(long, env = "RFID_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Serial device the reader is attached to.
    #[arg(long, default_value = DEFAULT_SERIAL_PORT)]
    pub port: String,

    #[arg(long, default_value_t = DEFAULT_BAUD_RATE)]
    pub baud_rate: u32,

    /// Forward each tag at most once per window.
    /// Accepts duration with suffix: 3s, 1m, 500ms, 2h.
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub window: Duration,

    /// Submission attempts per tag event, including the first.
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Pause between attempts for the same event.
    #[arg(long, default_value = "2s", value_parser = parse_duration)]
    pub retry_delay: Duration,

    /// Upper bound for a single submission attempt.
    #[arg(long, default_value = "5s", value_parser = parse_duration)]
    pub timeout: Duration,

    /// Idle time between two reads of the device.
    #[arg(long, default_value = "100ms", value_parser = parse_duration)]
    pub poll_interval: Duration,

    /// Directory for daily rotated log files.
    #[arg(long, default_value = DEFAULT_LOG_DIR)]
    pub log_dir: PathBuf,

    /// Report this IP address instead of discovering the outbound one.
    #[arg(long)]
    pub ip_address: Option<IpAddr>,

    /// Report this hardware address instead of reading it from the system.
    #[arg(long)]
    pub mac_address: Option<MacAddress>,

    /// Verbose output, log raw reads and suppressed duplicates
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Options {
    /// Dispatcher posting to the configured HTTP collector.
    pub fn http_dispatcher(&self, identity: DeviceIdentity) -> Dispatcher {
        Dispatcher::new(
            Arc::new(HttpCollector::new(&self.endpoint, &self.token)),
            Box::new(FixedDelay::new(self.max_attempts, self.retry_delay)),
            self.timeout,
            identity,
        )
    }
}

/// Errors returned by the poll loop.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Reader(#[from] ReaderError),
}

/// What one dispatch cycle did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub bytes: usize,
    pub extracted: usize,
    pub claimed: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Run one dispatch cycle: read, extract, claim, deliver.
///
/// Claims are taken in extraction order before any delivery starts, so a tag
/// that appears twice in one buffer is sent once. All deliveries of the cycle
/// run concurrently and are awaited before returning.
pub async fn poll_cycle(
    reader: &mut dyn TagReader,
    cache: &DedupCache,
    dispatcher: &Dispatcher,
) -> Result<CycleReport, ReaderError> {
    let mut report = CycleReport::default();

    if reader.bytes_available()? == 0 {
        return Ok(report);
    }

    let raw = reader.read_available()?;
    report.bytes = raw.len();
    tracing::debug!("Read {} bytes: {}", raw.len(), frame::to_hex(&raw));

    let events = frame::extract_events(&raw);
    report.extracted = events.len();

    let now = Instant::now();
    let mut claimed = Vec::with_capacity(events.len());
    for event in events {
        if cache.try_claim(event.epc, now) {
            claimed.push(event);
        } else {
            tracing::debug!("Suppressed duplicate read of {}", event.epc);
        }
    }
    report.claimed = claimed.len();

    let outcomes = join_all(claimed.iter().map(|event| dispatcher.deliver(event))).await;
    report.delivered = outcomes.iter().filter(|o| o.is_delivered()).count();
    report.failed = outcomes.len() - report.delivered;

    Ok(report)
}

/// Run the poll loop until `shutdown` resolves or the reader fails.
///
/// `shutdown` is polled once before the first cycle, so a future that
/// registers a signal handler when first polled (such as
/// `tokio::signal::ctrl_c`) is armed before any device I/O. After that it is
/// only observed between cycles; a cycle that is delivering finishes first.
/// The reader is closed on every exit path.
pub async fn run<F>(
    options: &Options,
    reader: &mut dyn TagReader,
    dispatcher: &Dispatcher,
    shutdown: F,
) -> Result<(), RunError>
where
    F: Future<Output = ()>,
{
    let cache = DedupCache::new(options.window);
    let mut shutdown = pin!(shutdown);

    let result = if futures::poll!(shutdown.as_mut()).is_ready() {
        tracing::info!("Stopping RFID reading");
        Ok(())
    } else {
        poll_until_shutdown(options, reader, &cache, dispatcher, shutdown).await
    };

    reader.close();
    tracing::info!("Device reader released");
    result
}

async fn poll_until_shutdown<F>(
    options: &Options,
    reader: &mut dyn TagReader,
    cache: &DedupCache,
    dispatcher: &Dispatcher,
    mut shutdown: Pin<&mut F>,
) -> Result<(), RunError>
where
    F: Future<Output = ()>,
{
    loop {
        match poll_cycle(reader, cache, dispatcher).await {
            Ok(report) if report.extracted > 0 => {
                tracing::debug!(
                    "Cycle: {} extracted, {} claimed, {} delivered, {} failed, {} tags tracked",
                    report.extracted,
                    report.claimed,
                    report.delivered,
                    report.failed,
                    cache.len()
                );
            }
            Ok(_) => {}
            Err(err) => {
                tracing::error!("Reading from device failed: {}", err);
                return Err(err.into());
            }
        }

        tokio::select! {
            () = shutdown.as_mut() => {
                tracing::info!("Stopping RFID reading");
                return Ok(());
            }
            () = tokio::time::sleep(options.poll_interval) => {}
        }
    }
}
