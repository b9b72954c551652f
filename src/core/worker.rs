//! # Per-subscriber delivery worker.
//!
//! Each registered sink is served by one [`Worker`] task reading its bounded queue.
//!
//! ```text
//! [queue] ──► recv ──► sink.deliver(&Message)
//!                         ├─ Ok          → next
//!                         ├─ Err(e)      → SinkFailed
//!                         ├─ panic       → SinkPanicked
//!                         └─ timeout     → SinkTimedOut
//! ```
//!
//! ## Rules
//! - Deliveries are sequential, so the sink sees messages in publish order.
//! - A fault is reported and the worker moves on; it never stops the worker.
//! - The worker exits once its queue is closed **and** drained (shutdown), or
//!   as soon as `cancel` fires (unregister, or shutdown grace exceeded); what is
//!   still queued is discarded and a delivery in progress is aborted.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a sink panics while holding a lock.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::SinkFault;
use crate::events::{Bus, Event};
use crate::message::Message;
use crate::sinks::SinkRef;

use super::id::SubscriberId;

pub(crate) struct Worker {
    pub(crate) id: SubscriberId,
    pub(crate) name: Arc<str>,
    pub(crate) sink: SinkRef,
    pub(crate) bus: Bus,
    pub(crate) timeout: Option<Duration>,
    pub(crate) cancel: CancellationToken,
}

impl Worker {
    /// Delivers queued messages until the queue is closed and empty, or `cancel` fires.
    pub(crate) async fn run(self, mut rx: mpsc::Receiver<Message>) {
        loop {
            let msg = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                msg = rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                res = self.deliver(&msg) => res,
            };

            if let Err(fault) = outcome {
                self.report(&fault);
            }
        }
        tracing::trace!(subscriber = %self.name, id = %self.id, "worker stopped");
    }

    async fn deliver(&self, msg: &Message) -> Result<(), SinkFault> {
        let fut = AssertUnwindSafe(self.sink.deliver(msg)).catch_unwind();

        let res = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, fut).await {
                Ok(res) => res,
                Err(_) => return Err(SinkFault::TimedOut { timeout }),
            },
            None => fut.await,
        };

        match res {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(SinkFault::Failed(err)),
            Err(panic) => Err(SinkFault::Panicked {
                info: panic_message(panic.as_ref()),
            }),
        }
    }

    fn report(&self, fault: &SinkFault) {
        tracing::debug!(
            subscriber = %self.name,
            id = %self.id,
            fault = fault.as_label(),
            "delivery fault contained"
        );
        self.bus
            .publish(Event::sink_fault(Arc::clone(&self.name), self.id, fault));
    }
}

/// Renders a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
