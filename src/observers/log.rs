//! # LogWriter — renders relay events through `tracing`
//!
//! Faults are logged at `warn`, shutdown overruns at `error`, the rest at
//! `debug` / `info`.
//!
//! ## Example output
//! ```text
//! [registered] subscriber="chat" id=1b4e28ba-2fa1-11d2-883f-0016d3cca427
//! [published] recipients=2
//! [no-subscribers]
//! [sink-failed] subscriber="chat" reason="error: connection reset"
//! [sink-overflow] subscriber="audit" reason="overflow: queue full (capacity 1024)"
//! [unregistered] subscriber="chat" id=1b4e28ba-2fa1-11d2-883f-0016d3cca427
//! [shutdown-requested]
//! [all-drained-within-grace]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::observers::Observe;

/// Event writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let sub = e.subscriber.as_deref().unwrap_or("unknown");
        let reason = e.reason.as_deref().unwrap_or("unknown");
        let id = e.subscriber_id.map(|id| id.to_string()).unwrap_or_default();

        match e.kind {
            EventKind::SubscriberRegistered => {
                tracing::info!("[registered] subscriber={sub:?} id={id}");
            }
            EventKind::SubscriberUnregistered => {
                tracing::info!("[unregistered] subscriber={sub:?} id={id}");
            }
            EventKind::MessagePublished => {
                tracing::debug!("[published] recipients={}", e.recipients.unwrap_or(0));
            }
            EventKind::PublishedWithoutSubscribers => {
                tracing::info!("[no-subscribers]");
            }
            EventKind::SinkFailed => {
                tracing::warn!("[sink-failed] subscriber={sub:?} reason={reason:?}");
            }
            EventKind::SinkPanicked => {
                tracing::warn!("[sink-panicked] subscriber={sub:?} reason={reason:?}");
            }
            EventKind::SinkTimedOut => {
                tracing::warn!(
                    "[sink-timed-out] subscriber={sub:?} timeout_ms={:?}",
                    e.timeout_ms
                );
            }
            EventKind::SinkOverflow => {
                tracing::warn!("[sink-overflow] subscriber={sub:?} reason={reason:?}");
            }
            EventKind::SinkWorkerGone => {
                tracing::warn!("[sink-worker-gone] subscriber={sub:?} id={id}");
            }
            EventKind::ShutdownRequested => {
                tracing::info!("[shutdown-requested]");
            }
            EventKind::AllDrainedWithin => {
                tracing::info!("[all-drained-within-grace]");
            }
            EventKind::GraceExceeded => {
                tracing::error!("[grace-exceeded] {reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
