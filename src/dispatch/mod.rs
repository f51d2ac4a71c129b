//! Delivery of claimed tag events to the remote collector.
//!
//! A delivery is a short state sequence driven by a [`RetryPolicy`]:
//!
//! ```text
//! Attempt(1) -> Backoff -> Attempt(2) -> ... -> Delivered | Failed
//! ```
//!
//! Each attempt is bounded by a timeout and every failure is logged with its
//! detail. Nothing is re-queued after the last attempt; the event is dropped.

pub mod http;

pub use http::HttpCollector;

use crate::identity::DeviceIdentity;
use crate::tag::TagEvent;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a single submission attempt failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttemptError {
    /// Collector answered with something other than 200
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// Connection, TLS or protocol failure
    #[error("transport error: {0}")]
    Transport(String),
    /// No answer within the per-attempt bound
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// JSON body accepted by the collector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payload {
    pub epc: String,
    pub rssi: Option<i8>,
    pub ipaddress: String,
    pub macaddress: String,
}

impl Payload {
    pub fn new(event: &TagEvent, identity: &DeviceIdentity) -> Self {
        Payload {
            epc: event.epc.to_string(),
            rssi: event.rssi,
            ipaddress: identity.ip_address.to_string(),
            macaddress: identity.hardware_address.to_string(),
        }
    }
}

/// Future returned by [`Collector::submit`].
pub type SubmitFuture<'a> = Pin<Box<dyn Future<Output = Result<(), AttemptError>> + Send + 'a>>;

/// Remote endpoint abstraction to enable deterministic tests without a network.
pub trait Collector: Send + Sync {
    /// Perform exactly one submission of `payload`.
    fn submit<'a>(&'a self, payload: &'a Payload) -> SubmitFuture<'a>;
}

/// Decides how many attempts a delivery gets and how long to wait between them.
pub trait RetryPolicy: Send + Sync {
    /// Delay before the attempt following failed attempt number `attempt` (1-based),
    /// or `None` when no further attempt should be made.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;
}

/// A fixed number of attempts separated by a constant delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    max_attempts: u32,
    delay: Duration,
}

impl FixedDelay {
    /// `max_attempts` counts the first attempt and is at least 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        FixedDelay {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl RetryPolicy for FixedDelay {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then_some(self.delay)
    }
}

/// Terminal result of one delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    /// Collector accepted the event on attempt number `attempts`
    Delivered { attempts: u32 },
    /// Every attempt failed; `last_error` is the final attempt's failure
    Failed { attempts: u32, last_error: AttemptError },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }
}

enum Step {
    Attempt(u32),
    Backoff { after: u32, delay: Duration },
    Done(DeliveryOutcome),
}

/// Sends claimed events to the collector with bounded retry.
pub struct Dispatcher {
    collector: Arc<dyn Collector>,
    policy: Box<dyn RetryPolicy>,
    attempt_timeout: Duration,
    identity: DeviceIdentity,
}

impl Dispatcher {
    pub fn new(
        collector: Arc<dyn Collector>,
        policy: Box<dyn RetryPolicy>,
        attempt_timeout: Duration,
        identity: DeviceIdentity,
    ) -> Self {
        Dispatcher {
            collector,
            policy,
            attempt_timeout,
            identity,
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Deliver one event, retrying per the policy.
    ///
    /// Never fails: the outcome is logged and returned for the caller to
    /// count. The caller's dedup claim stands either way.
    pub async fn deliver(&self, event: &TagEvent) -> DeliveryOutcome {
        let payload = Payload::new(event, &self.identity);
        let mut step = Step::Attempt(1);

        loop {
            step = match step {
                Step::Attempt(attempt) => match self.attempt(&payload).await {
                    Ok(()) => {
                        tracing::info!(epc = %payload.epc, rssi = ?payload.rssi, "SENT");
                        Step::Done(DeliveryOutcome::Delivered { attempts: attempt })
                    }
                    Err(err) => {
                        tracing::warn!("Attempt {} failed for {}: {}", attempt, payload.epc, err);
                        match self.policy.next_delay(attempt) {
                            Some(delay) => Step::Backoff {
                                after: attempt,
                                delay,
                            },
                            None => Step::Done(DeliveryOutcome::Failed {
                                attempts: attempt,
                                last_error: err,
                            }),
                        }
                    }
                },
                Step::Backoff { after, delay } => {
                    tokio::time::sleep(delay).await;
                    Step::Attempt(after + 1)
                }
                Step::Done(outcome) => {
                    if let DeliveryOutcome::Failed { attempts, .. } = &outcome {
                        tracing::warn!(
                            "FAILED to send after {} attempts: {}",
                            attempts,
                            payload.epc
                        );
                    }
                    return outcome;
                }
            };
        }
    }

    async fn attempt(&self, payload: &Payload) -> Result<(), AttemptError> {
        tokio::time::timeout(self.attempt_timeout, self.collector.submit(payload))
            .await
            .unwrap_or(Err(AttemptError::Timeout(self.attempt_timeout)))
    }
}
