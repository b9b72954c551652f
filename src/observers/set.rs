//! # Event fan-out to observers.
//!
//! [`ObserverSet`] gives every observer its own bus receiver and listener task.
//!
//! ```text
//! Bus ──► receiver 1 ──► listener 1 ──► observer1.on_event()
//!     │                       └──────► panic → logged, continue
//!     └─► receiver N ──► listener N ──► observerN.on_event()
//! ```
//!
//! Receivers are created at construction time, so no event published after
//! the relay is built is missed. On shutdown each listener first drains what
//! is already buffered, then exits.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle as RuntimeHandle;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::core::panic_message;
use crate::events::{Bus, Event};
use crate::observers::Observe;

/// Listener tasks feeding observers from the bus.
pub(crate) struct ObserverSet {
    tracker: TaskTracker,
    stop: CancellationToken,
}

impl ObserverSet {
    /// Subscribes one receiver per observer and spawns its listener on `runtime`.
    pub(crate) fn spawn(observers: Vec<Arc<dyn Observe>>, bus: &Bus, runtime: &RuntimeHandle) -> Self {
        let tracker = TaskTracker::new();
        let stop = CancellationToken::new();

        for obs in observers {
            let rx = bus.subscribe();
            tracker.spawn_on(listen(obs, rx, stop.clone()), runtime);
        }
        tracker.close();

        Self { tracker, stop }
    }

    /// Flushes buffered events to every observer and waits for listeners to exit.
    pub(crate) async fn shutdown(self) {
        self.stop.cancel();
        self.tracker.wait().await;
    }
}

async fn listen(obs: Arc<dyn Observe>, mut rx: broadcast::Receiver<Event>, stop: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            msg = rx.recv() => match msg {
                Ok(ev) => notify(obs.as_ref(), &ev).await,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(observer = obs.name(), skipped, "observer lagged behind relay events");
                }
                Err(RecvError::Closed) => break,
            },
            _ = stop.cancelled() => {
                loop {
                    match rx.try_recv() {
                        Ok(ev) => notify(obs.as_ref(), &ev).await,
                        Err(TryRecvError::Lagged(_)) => continue,
                        Err(_) => break,
                    }
                }
                break;
            }
        }
    }
}

async fn notify(obs: &dyn Observe, ev: &Event) {
    if let Err(panic) = AssertUnwindSafe(obs.on_event(ev)).catch_unwind().await {
        tracing::warn!(
            observer = obs.name(),
            info = %panic_message(panic.as_ref()),
            "observer panicked"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::events::EventKind;
    use crate::{Message, Relay, RelayConfig, SinkError};

    use super::*;

    #[derive(Default)]
    struct Collect {
        kinds: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Observe for Collect {
        async fn on_event(&self, ev: &Event) {
            self.kinds.lock().unwrap().push(ev.kind);
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    struct Explode;

    #[async_trait]
    impl Observe for Explode {
        async fn on_event(&self, _ev: &Event) {
            panic!("observer exploded");
        }

        fn name(&self) -> &'static str {
            "explode"
        }
    }

    #[tokio::test]
    async fn test_observers_see_events_despite_panicking_peer() {
        let collect = Arc::new(Collect::default());
        let relay = Relay::builder(RelayConfig::default())
            .with_observers(vec![Arc::new(Explode), collect.clone()])
            .build()
            .unwrap();

        relay.publish(Message::new().with("type", "nobody"));
        let _h = relay.register_fn("failing", |_m: Message| async {
            Err::<(), _>(SinkError::fail("down"))
        });
        relay.publish(Message::new().with("type", "ping"));
        relay.shutdown().await.unwrap();

        let kinds = collect.kinds.lock().unwrap().clone();
        assert_eq!(
            kinds,
            vec![
                EventKind::PublishedWithoutSubscribers,
                EventKind::SubscriberRegistered,
                EventKind::MessagePublished,
                EventKind::ShutdownRequested,
                EventKind::SubscriberUnregistered,
                EventKind::SinkFailed,
                EventKind::AllDrainedWithin,
            ]
        );
    }
}
