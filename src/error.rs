//! Error types used by the relay and its sinks.
//!
//! This module defines three enums:
//!
//! - [`RelayError`] — errors surfaced to the host (construction, payload
//!   conversion, shutdown).
//! - [`SinkError`] — errors a sink returns from a single delivery.
//! - [`SinkFault`] — what the relay reports when a delivery goes wrong; never
//!   propagated to producers.
//!
//! All types provide `as_label` / `as_message` helpers for logging.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the relay itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RelayError {
    /// The relay was built outside a Tokio runtime; workers cannot be spawned.
    #[error("no tokio runtime available to spawn subscriber workers")]
    NoRuntime,

    /// A JSON value used as a message payload was not an object.
    #[error("message payload must be a JSON object, got {found}")]
    NotAnObject {
        /// JSON type that was supplied instead.
        found: &'static str,
    },

    /// Shutdown grace period was exceeded; remaining deliveries were cancelled.
    #[error("shutdown timeout {grace:?} exceeded; {pending} worker(s) cancelled")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Workers still running when the grace period ran out.
        pending: usize,
    },
}

impl RelayError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pubrelay::RelayError;
    /// use std::time::Duration;
    ///
    /// let err = RelayError::GraceExceeded { grace: Duration::from_secs(5), pending: 2 };
    /// assert_eq!(err.as_label(), "relay_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RelayError::NoRuntime => "relay_no_runtime",
            RelayError::NotAnObject { .. } => "relay_not_an_object",
            RelayError::GraceExceeded { .. } => "relay_grace_exceeded",
        }
    }
}

/// # Errors returned by a sink for one delivery.
///
/// The relay catches these per subscriber; other subscribers and the
/// producer are never affected.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SinkError {
    /// Delivery failed; the next message will still be attempted.
    #[error("delivery failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The sink's downstream is gone (for example a closed socket).
    ///
    /// The subscriber stays registered until its host unregisters it.
    #[error("sink closed")]
    Closed,
}

impl SinkError {
    /// Shorthand for [`SinkError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        SinkError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SinkError::Fail { .. } => "sink_failed",
            SinkError::Closed => "sink_closed",
        }
    }
}

/// # A delivery fault contained at the subscriber boundary.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SinkFault {
    /// The sink returned an error.
    #[error("sink error: {0}")]
    Failed(#[from] SinkError),

    /// The sink panicked.
    #[error("sink panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The sink exceeded the delivery timeout.
    #[error("sink timed out after {timeout:?}")]
    TimedOut {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The subscriber's queue was full; the message was dropped for it.
    #[error("message dropped: queue full (capacity {capacity})")]
    Overflow {
        /// Queue capacity of the subscriber.
        capacity: usize,
    },

    /// The subscriber's worker is no longer running; the message was dropped.
    #[error("message dropped: delivery worker gone")]
    WorkerGone,
}

impl SinkFault {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pubrelay::{SinkError, SinkFault};
    ///
    /// let fault = SinkFault::from(SinkError::fail("boom"));
    /// assert_eq!(fault.as_label(), "sink_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SinkFault::Failed(e) => e.as_label(),
            SinkFault::Panicked { .. } => "sink_panicked",
            SinkFault::TimedOut { .. } => "sink_timed_out",
            SinkFault::Overflow { .. } => "sink_overflow",
            SinkFault::WorkerGone => "sink_worker_gone",
        }
    }

    /// Returns a human-readable message with details about the fault.
    pub fn as_message(&self) -> String {
        match self {
            SinkFault::Failed(SinkError::Fail { error }) => format!("error: {error}"),
            SinkFault::Failed(SinkError::Closed) => "closed".to_string(),
            SinkFault::Panicked { info } => format!("panic: {info}"),
            SinkFault::TimedOut { timeout } => format!("timeout: {timeout:?}"),
            SinkFault::Overflow { capacity } => {
                format!("overflow: queue full (capacity {capacity})")
            }
            SinkFault::WorkerGone => "worker gone".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_labels() {
        assert_eq!(SinkFault::from(SinkError::Closed).as_label(), "sink_closed");
        assert_eq!(
            SinkFault::Overflow { capacity: 1 }.as_label(),
            "sink_overflow"
        );
        assert_eq!(SinkFault::WorkerGone.as_label(), "sink_worker_gone");
        assert_eq!(
            SinkFault::Panicked {
                info: "boom".into()
            }
            .as_message(),
            "panic: boom"
        );
    }

    #[test]
    fn test_not_an_object_message() {
        let err = RelayError::NotAnObject { found: "array" };
        assert_eq!(
            err.to_string(),
            "message payload must be a JSON object, got array"
        );
    }
}
