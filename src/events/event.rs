//! # Relay events reported to observers.
//!
//! The [`EventKind`] enum classifies what the relay reports:
//! - **Membership events**: subscriber registered / unregistered
//! - **Publish events**: message enqueued, or published with nobody listening
//! - **Fault events**: a sink failed, panicked, timed out, overflowed its queue, or lost its worker
//! - **Shutdown events**: relay closing, drained in time, or grace exceeded
//!
//! The [`Event`] struct carries the metadata: timestamp, subscriber name/id,
//! reason, recipient count, timeout.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Observers run independently, so use `seq` to restore the exact order.
//!
//! ## Example
//! ```rust
//! use pubrelay::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::SinkFailed)
//!     .with_subscriber("audit")
//!     .with_reason("disk full");
//!
//! assert_eq!(ev.kind, EventKind::SinkFailed);
//! assert_eq!(ev.subscriber.as_deref(), Some("audit"));
//! assert!(ev.is_fault());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::SubscriberId;
use crate::error::SinkFault;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of relay events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Membership events ===
    /// A sink was registered and is now active.
    ///
    /// Sets:
    /// - `subscriber`: sink name
    /// - `subscriber_id`: generated id
    SubscriberRegistered,

    /// A subscriber moved `Active → Removed`.
    ///
    /// Sets:
    /// - `subscriber`: sink name
    /// - `subscriber_id`: removed id
    SubscriberUnregistered,

    // === Publish events ===
    /// A message was enqueued for every active subscriber.
    ///
    /// Sets:
    /// - `recipients`: size of the delivery set
    MessagePublished,

    /// A message was published while no subscriber was active (no-op).
    PublishedWithoutSubscribers,

    // === Fault events ===
    /// Sink returned an error for one message.
    ///
    /// Sets:
    /// - `subscriber`, `subscriber_id`
    /// - `reason`: error message
    SinkFailed,

    /// Sink panicked while handling one message.
    ///
    /// Sets:
    /// - `subscriber`, `subscriber_id`
    /// - `reason`: panic payload
    SinkPanicked,

    /// Sink did not finish within the configured delivery timeout.
    ///
    /// Sets:
    /// - `subscriber`, `subscriber_id`
    /// - `timeout_ms`: configured timeout
    SinkTimedOut,

    /// Message dropped for one subscriber because its queue was full.
    ///
    /// Sets:
    /// - `subscriber`, `subscriber_id`
    /// - `reason`: overflow details (queue capacity)
    SinkOverflow,

    /// Message dropped for one subscriber because its worker is no longer running.
    ///
    /// Sets:
    /// - `subscriber`, `subscriber_id`
    SinkWorkerGone,

    // === Shutdown events ===
    /// `Relay::shutdown` was called.
    ShutdownRequested,

    /// Every queued delivery finished within the grace period.
    AllDrainedWithin,

    /// Grace period exceeded; remaining deliveries were cancelled.
    ///
    /// Sets:
    /// - `reason`: number of workers still running
    GraceExceeded,
}

/// Relay event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Sink name, if applicable.
    pub subscriber: Option<Arc<str>>,
    /// Subscriber id, if applicable.
    pub subscriber_id: Option<SubscriberId>,
    /// Human-readable reason (errors, panic payloads, overflow details).
    pub reason: Option<Arc<str>>,
    /// Number of subscribers a message was enqueued for.
    pub recipients: Option<u32>,
    /// Delivery timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            subscriber: None,
            subscriber_id: None,
            reason: None,
            recipients: None,
            timeout_ms: None,
        }
    }

    /// Attaches a sink name.
    #[inline]
    pub fn with_subscriber(mut self, name: impl Into<Arc<str>>) -> Self {
        self.subscriber = Some(name.into());
        self
    }

    /// Attaches a subscriber id.
    #[inline]
    pub fn with_subscriber_id(mut self, id: SubscriberId) -> Self {
        self.subscriber_id = Some(id);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the size of a delivery set.
    #[inline]
    pub fn with_recipients(mut self, n: usize) -> Self {
        self.recipients = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Creates the event reporting a contained sink fault.
    pub fn sink_fault(subscriber: Arc<str>, id: SubscriberId, fault: &SinkFault) -> Self {
        let kind = match fault {
            SinkFault::Failed { .. } => EventKind::SinkFailed,
            SinkFault::Panicked { .. } => EventKind::SinkPanicked,
            SinkFault::TimedOut { .. } => EventKind::SinkTimedOut,
            SinkFault::Overflow { .. } => EventKind::SinkOverflow,
            SinkFault::WorkerGone => EventKind::SinkWorkerGone,
        };
        let ev = Event::new(kind)
            .with_subscriber(subscriber)
            .with_subscriber_id(id)
            .with_reason(fault.as_message());
        match fault {
            SinkFault::TimedOut { timeout } => ev.with_timeout(*timeout),
            _ => ev,
        }
    }

    /// Returns true for events reporting a sink fault.
    #[inline]
    pub fn is_fault(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SinkFailed
                | EventKind::SinkPanicked
                | EventKind::SinkTimedOut
                | EventKind::SinkOverflow
                | EventKind::SinkWorkerGone
        )
    }
}
