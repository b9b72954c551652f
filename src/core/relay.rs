//! # Relay: owns the active subscriber set and fans messages out.
//!
//! The [`Relay`] is an explicit object built by its host (no global state).
//! Cloning it is cheap and every clone refers to the same subscriber set.
//!
//! ## Architecture
//! ```text
//! register(sink) ──► id = SubscriberId::new()
//!                    spawn Worker ◄── [bounded queue] ◄── Slot{sender, cancel} in active set
//!
//! publish(msg)   ──► lock active set
//!                    ├─ empty  → PublishedWithoutSubscribers (no-op)
//!                    └─ for each slot: try_send(msg.clone())
//!                         ├─ Ok     → enqueued
//!                         ├─ Full   → SinkOverflow (this subscriber only)
//!                         └─ Closed → SinkWorkerGone (this subscriber only)
//!                    unlock → MessagePublished{recipients = enqueued count}
//!
//! unregister(h)  ──► lock active set, remove slot (Active → Removed)
//!                    slot.cancel fired → worker discards its queue and exits
//!
//! shutdown()     ──► close set, drop every sender (tokens untouched)
//!                    wait for workers up to cfg.grace
//!                      ├─ drained  → AllDrainedWithin
//!                      └─ exceeded → cancel workers, GraceExceeded
//! ```
//!
//! ## Rules
//! - `register`, `unregister` and `publish` never await sink work.
//! - `publish` enqueues while holding the lock, so it sees a consistent
//!   snapshot and concurrent publishes are totally ordered per subscriber.
//! - Once `unregister` returns, the sink receives nothing more: messages
//!   still queued for it are discarded and a delivery in progress is aborted.
//! - `shutdown` drains queued messages instead of discarding them.
//! - Sink faults are reported on the event bus and never reach the producer.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::runtime::Handle as RuntimeHandle;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::{RelayError, SinkError, SinkFault};
use crate::events::{Bus, Event, EventKind};
use crate::message::Message;
use crate::observers::ObserverSet;
use crate::sinks::{SinkFn, SinkRef};

use super::builder::RelayBuilder;
use super::config::RelayConfig;
use super::handle::SubscriptionHandle;
use super::id::SubscriberId;
use super::worker::Worker;

/// Active subscriber entry.
struct Slot {
    name: Arc<str>,
    sender: mpsc::Sender<Message>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct State {
    slots: HashMap<SubscriberId, Slot>,
    closed: bool,
}

/// State shared by every clone of a [`Relay`] (and weakly by its handles).
pub(crate) struct Shared {
    cfg: RelayConfig,
    bus: Bus,
    runtime: RuntimeHandle,
    state: Mutex<State>,
    workers: TaskTracker,
    cancel: CancellationToken,
    observers: Mutex<Option<ObserverSet>>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Performs `Active → Removed` for `id`; returns false when already removed or unknown.
    pub(crate) fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.lock_state().slots.remove(&id);

        match removed {
            Some(slot) => {
                slot.cancel.cancel();
                tracing::debug!(subscriber = %slot.name, %id, "subscriber unregistered");
                self.bus.publish(
                    Event::new(EventKind::SubscriberUnregistered)
                        .with_subscriber(slot.name)
                        .with_subscriber_id(id),
                );
                true
            }
            None => {
                tracing::debug!(%id, "unregister of unknown or removed subscriber ignored");
                false
            }
        }
    }
}

/// In-process publish/subscribe notification relay.
#[derive(Clone)]
pub struct Relay {
    shared: Arc<Shared>,
}

impl Relay {
    /// Returns a builder for a relay with the given configuration.
    pub fn builder(cfg: RelayConfig) -> RelayBuilder {
        RelayBuilder::new(cfg)
    }

    /// Builds a relay without observers.
    ///
    /// # Errors
    /// [`RelayError::NoRuntime`] when called outside a Tokio runtime.
    pub fn new(cfg: RelayConfig) -> Result<Self, RelayError> {
        RelayBuilder::new(cfg).build()
    }

    pub(crate) fn from_parts(
        cfg: RelayConfig,
        bus: Bus,
        runtime: RuntimeHandle,
        observers: ObserverSet,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                cfg,
                bus,
                runtime,
                state: Mutex::new(State::default()),
                workers: TaskTracker::new(),
                cancel: CancellationToken::new(),
                observers: Mutex::new(Some(observers)),
            }),
        }
    }

    /// Registers `sink` and returns the handle that removes it.
    ///
    /// The sink receives every message published after this call returns.
    /// Never fails; on a relay that was already shut down the returned handle
    /// refers to a subscriber that is already removed.
    pub fn register(&self, sink: SinkRef) -> SubscriptionHandle {
        let id = SubscriberId::new();
        let name: Arc<str> = Arc::from(sink.name());
        let shared = &self.shared;

        {
            let mut state = shared.lock_state();
            if state.closed {
                tracing::debug!(subscriber = %name, "relay closed; registration ignored");
                return SubscriptionHandle::new(id, name, Weak::new());
            }

            let (tx, rx) = mpsc::channel::<Message>(sink.queue_capacity().max(1));
            let cancel = shared.cancel.child_token();
            let worker = Worker {
                id,
                name: Arc::clone(&name),
                sink,
                bus: shared.bus.clone(),
                timeout: shared.cfg.delivery_limit(),
                cancel: cancel.clone(),
            };
            shared.workers.spawn_on(worker.run(rx), &shared.runtime);
            state.slots.insert(
                id,
                Slot {
                    name: Arc::clone(&name),
                    sender: tx,
                    cancel,
                },
            );
        }

        tracing::debug!(subscriber = %name, %id, "subscriber registered");
        shared.bus.publish(
            Event::new(EventKind::SubscriberRegistered)
                .with_subscriber(Arc::clone(&name))
                .with_subscriber_id(id),
        );
        SubscriptionHandle::new(id, name, Arc::downgrade(shared))
    }

    /// Registers a closure as a sink (see [`SinkFn`]).
    pub fn register_fn<F, Fut>(&self, name: &'static str, f: F) -> SubscriptionHandle
    where
        F: Fn(Message) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), SinkError>> + Send + 'static,
    {
        self.register(SinkFn::arc(name, f))
    }

    /// Removes the subscriber behind `handle`.
    ///
    /// After this returns the sink receives nothing more, including messages
    /// that were still queued for it.
    ///
    /// Idempotent: returns `true` only for the call that performed the removal.
    pub fn unregister(&self, handle: &SubscriptionHandle) -> bool {
        self.shared.remove(handle.id())
    }

    /// Delivers `message` to every subscriber active at call time.
    ///
    /// Returns as soon as the message is enqueued; with no active subscribers
    /// it is a no-op reported as `PublishedWithoutSubscribers`. The
    /// `MessagePublished` event counts only the subscribers it was enqueued for.
    pub fn publish(&self, message: Message) {
        let shared = &self.shared;
        let mut dropped: Vec<(Arc<str>, SubscriberId, SinkFault)> = Vec::new();

        let recipients = {
            let state = shared.lock_state();
            if state.closed {
                tracing::debug!("relay closed; publish ignored");
                return;
            }
            if state.slots.is_empty() {
                drop(state);
                tracing::debug!("no subscribers; publish is a no-op");
                shared
                    .bus
                    .publish(Event::new(EventKind::PublishedWithoutSubscribers));
                return;
            }

            for (id, slot) in &state.slots {
                match slot.sender.try_send(message.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        let fault = SinkFault::Overflow {
                            capacity: slot.sender.max_capacity(),
                        };
                        dropped.push((Arc::clone(&slot.name), *id, fault));
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        dropped.push((Arc::clone(&slot.name), *id, SinkFault::WorkerGone));
                    }
                }
            }
            state.slots.len() - dropped.len()
        };

        for (name, id, fault) in dropped {
            tracing::debug!(subscriber = %name, %id, fault = fault.as_label(), "message dropped");
            shared.bus.publish(Event::sink_fault(name, id, &fault));
        }
        shared
            .bus
            .publish(Event::new(EventKind::MessagePublished).with_recipients(recipients));
    }

    /// Returns true while the subscriber behind `handle` is active.
    pub fn is_active(&self, handle: &SubscriptionHandle) -> bool {
        self.shared.lock_state().slots.contains_key(&handle.id())
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock_state().slots.len()
    }

    /// Returns active subscribers sorted by name.
    pub fn subscribers(&self) -> Vec<(SubscriberId, Arc<str>)> {
        let mut list: Vec<(SubscriberId, Arc<str>)> = self
            .shared
            .lock_state()
            .slots
            .iter()
            .map(|(id, slot)| (*id, Arc::clone(&slot.name)))
            .collect();
        list.sort_unstable_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        list
    }

    /// Creates a receiver for subsequent relay events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Returns the configuration the relay was built with.
    pub fn config(&self) -> &RelayConfig {
        &self.shared.cfg
    }

    /// Closes the relay and drains queued deliveries.
    ///
    /// Every subscriber is removed; messages already queued are delivered
    /// within [`RelayConfig::grace`]. Observers are flushed and stopped last.
    /// Calling it again is a no-op.
    ///
    /// # Errors
    /// [`RelayError::GraceExceeded`] when deliveries were still running after
    /// the grace period; they are cancelled.
    pub async fn shutdown(&self) -> Result<(), RelayError> {
        let shared = &self.shared;
        let slots = {
            let mut state = shared.lock_state();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            std::mem::take(&mut state.slots)
        };

        shared.bus.publish(Event::new(EventKind::ShutdownRequested));
        for (id, slot) in slots {
            shared.bus.publish(
                Event::new(EventKind::SubscriberUnregistered)
                    .with_subscriber(slot.name)
                    .with_subscriber_id(id),
            );
        }

        let grace = shared.cfg.grace;
        shared.workers.close();
        let result = match tokio::time::timeout(grace, shared.workers.wait()).await {
            Ok(()) => {
                shared.bus.publish(Event::new(EventKind::AllDrainedWithin));
                Ok(())
            }
            Err(_) => {
                let pending = shared.workers.len();
                shared.cancel.cancel();
                shared.workers.wait().await;
                shared.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(format!("pending={pending}")),
                );
                Err(RelayError::GraceExceeded { grace, pending })
            }
        };

        let observers = shared
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(observers) = observers {
            observers.shutdown().await;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::sinks::Sink;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Message>>,
    }

    impl Recorder {
        fn seen(&self) -> Vec<Message> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sink for Recorder {
        async fn deliver(&self, message: &Message) -> Result<(), SinkError> {
            self.seen.lock().unwrap().push(message.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    struct Failing;

    #[async_trait]
    impl Sink for Failing {
        async fn deliver(&self, _message: &Message) -> Result<(), SinkError> {
            Err(SinkError::fail("boom"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Panicking;

    #[async_trait]
    impl Sink for Panicking {
        async fn deliver(&self, _message: &Message) -> Result<(), SinkError> {
            panic!("sink exploded");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn msg(kind: &str) -> Message {
        Message::new().with("type", kind)
    }

    fn relay() -> Relay {
        Relay::new(RelayConfig::default()).unwrap()
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    /// Yields until `rec` has seen at least `n` messages.
    async fn wait_seen(rec: &Recorder, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while rec.seen().len() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }

    /// Asserts strictly increasing `n` per producer; returns the count per producer.
    fn assert_fifo_per_producer(seen: &[Message]) -> HashMap<i64, usize> {
        let mut last: HashMap<i64, i64> = HashMap::new();
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for m in seen {
            let Some(p) = m.get("producer").and_then(|v| v.as_i64()) else {
                continue;
            };
            let n = m.get("n").and_then(|v| v.as_i64()).unwrap();
            if let Some(prev) = last.insert(p, n) {
                assert!(n > prev, "producer {p}: {n} after {prev}");
            }
            *counts.entry(p).or_default() += 1;
        }
        counts
    }

    fn markers(seen: &[Message]) -> Vec<String> {
        seen.iter()
            .filter_map(|m| m.get("marker").and_then(|v| v.as_str()).map(String::from))
            .collect()
    }

    #[tokio::test]
    async fn test_ping_pong_scenario() {
        let relay = relay();
        let s1 = Arc::new(Recorder::default());
        let s2 = Arc::new(Recorder::default());
        let h1 = relay.register(s1.clone());
        let _h2 = relay.register(s2.clone());

        relay.publish(msg("ping"));
        wait_seen(&s1, 1).await;
        wait_seen(&s2, 1).await;
        assert!(relay.unregister(&h1));
        relay.publish(msg("pong"));

        relay.shutdown().await.unwrap();
        assert_eq!(s1.seen(), vec![msg("ping")]);
        assert_eq!(s2.seen(), vec![msg("ping"), msg("pong")]);
    }

    #[tokio::test]
    async fn test_queued_messages_dropped_after_unregister() {
        let relay = relay();
        let sub = Arc::new(Recorder::default());
        let h = relay.register(sub.clone());

        // current-thread runtime: both messages are still queued here
        relay.publish(msg("ping"));
        relay.publish(msg("pong"));
        assert!(relay.unregister(&h));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(sub.seen().is_empty());
        relay.shutdown().await.unwrap();
        assert!(sub.seen().is_empty());
    }

    #[tokio::test]
    async fn test_unregister_aborts_delivery_in_progress() {
        let relay = relay();
        let started = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let (s, f) = (Arc::clone(&started), Arc::clone(&finished));
        let h = relay.register_fn("slow", move |_m: Message| {
            let (s, f) = (Arc::clone(&s), Arc::clone(&f));
            async move {
                s.store(true, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                f.store(true, Ordering::SeqCst);
                Ok::<_, SinkError>(())
            }
        });

        relay.publish(msg("ping"));
        while !started.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        assert!(relay.unregister(&h));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!finished.load(Ordering::SeqCst));
        relay.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unregistered_before_publish_receives_nothing() {
        let relay = relay();
        let sub = Arc::new(Recorder::default());
        let h = relay.register(sub.clone());
        relay.unregister(&h);

        relay.publish(msg("ping"));
        relay.shutdown().await.unwrap();
        assert!(sub.seen().is_empty());
    }

    #[tokio::test]
    async fn test_registered_after_publish_misses_it() {
        let relay = relay();
        relay.publish(msg("early"));
        let sub = Arc::new(Recorder::default());
        let _h = relay.register(sub.clone());
        relay.publish(msg("late"));

        relay.shutdown().await.unwrap();
        assert_eq!(sub.seen(), vec![msg("late")]);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let relay = relay();
        let mut rx = relay.events();
        let h = relay.register(Arc::new(Recorder::default()));

        assert!(relay.is_active(&h));
        assert!(relay.unregister(&h));
        assert!(!relay.unregister(&h));
        assert!(!h.remove());
        assert!(!relay.is_active(&h));
        assert_eq!(relay.subscriber_count(), 0);

        let removed = drain(&mut rx)
            .into_iter()
            .filter(|e| e.kind == EventKind::SubscriberUnregistered)
            .count();
        assert_eq!(removed, 1);
    }

    #[tokio::test]
    async fn test_handle_remove_and_drop() {
        let relay = relay();
        let kept = relay.register(Arc::new(Recorder::default()));
        let dropped = relay.register(Arc::new(Recorder::default()));
        drop(dropped);
        assert_eq!(relay.subscriber_count(), 2);

        assert!(kept.remove());
        assert_eq!(relay.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_faulty_sinks_are_isolated() {
        let relay = relay();
        let mut rx = relay.events();
        let healthy = Arc::new(Recorder::default());
        let _a = relay.register(Arc::new(Failing));
        let _b = relay.register(Arc::new(Panicking));
        let _c = relay.register(healthy.clone());

        relay.publish(msg("one"));
        relay.publish(msg("two"));
        relay.shutdown().await.unwrap();

        assert_eq!(healthy.seen(), vec![msg("one"), msg("two")]);

        let events = drain(&mut rx);
        let failed = events.iter().filter(|e| e.kind == EventKind::SinkFailed).count();
        let panicked: Vec<&Event> = events
            .iter()
            .filter(|e| e.kind == EventKind::SinkPanicked)
            .collect();
        assert_eq!(failed, 2);
        assert_eq!(panicked.len(), 2);
        assert_eq!(panicked[0].subscriber.as_deref(), Some("panicking"));
        assert_eq!(panicked[0].reason.as_deref(), Some("panic: sink exploded"));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let relay = relay();
        let mut rx = relay.events();
        relay.publish(msg("ping"));

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::PublishedWithoutSubscribers);
    }

    #[tokio::test]
    async fn test_fifo_per_subscriber() {
        let relay = relay();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        let _ha = relay.register(a.clone());
        let _hb = relay.register(b.clone());

        let sent: Vec<Message> = (0..200).map(|i| Message::new().with("n", i)).collect();
        for m in &sent {
            relay.publish(m.clone());
        }
        relay.shutdown().await.unwrap();

        assert_eq!(a.seen(), sent);
        assert_eq!(b.seen(), sent);
    }

    #[tokio::test]
    async fn test_overflow_drops_for_full_subscriber_only() {
        let relay = relay();
        let mut rx = relay.events();
        let small = Arc::new(Recorder::default());
        let roomy = Arc::new(Recorder::default());

        let seen = Arc::clone(&small);
        let _hs = relay.register(Arc::new(
            SinkFn::new("small", move |m: Message| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.seen.lock().unwrap().push(m);
                    Ok::<_, SinkError>(())
                }
            })
            .with_queue_capacity(1),
        ));
        let _hr = relay.register(roomy.clone());

        // current-thread runtime: workers do not run until the test yields
        relay.publish(msg("first"));
        relay.publish(msg("second"));
        relay.shutdown().await.unwrap();

        assert_eq!(small.seen(), vec![msg("first")]);
        assert_eq!(roomy.seen(), vec![msg("first"), msg("second")]);

        let events = drain(&mut rx);
        let overflow: Vec<&Event> = events
            .iter()
            .filter(|e| e.kind == EventKind::SinkOverflow)
            .collect();
        assert_eq!(overflow.len(), 1);
        assert_eq!(overflow[0].subscriber.as_deref(), Some("small"));
        assert_eq!(
            overflow[0].reason.as_deref(),
            Some("overflow: queue full (capacity 1)")
        );

        let recipients: Vec<Option<u32>> = events
            .iter()
            .filter(|e| e.kind == EventKind::MessagePublished)
            .map(|e| e.recipients)
            .collect();
        assert_eq!(recipients, vec![Some(2), Some(1)]);
    }

    #[tokio::test]
    async fn test_dead_worker_reported_as_worker_gone() {
        let relay = relay();
        let mut rx = relay.events();
        let h = relay.register(Arc::new(Recorder::default()));

        let sender = {
            let state = relay.shared.lock_state();
            let slot = state.slots.get(&h.id()).unwrap();
            slot.cancel.cancel();
            slot.sender.clone()
        };
        tokio::time::timeout(Duration::from_secs(5), async {
            while !sender.is_closed() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        relay.publish(msg("ping"));
        let events = drain(&mut rx);

        let gone = events
            .iter()
            .find(|e| e.kind == EventKind::SinkWorkerGone)
            .unwrap();
        assert_eq!(gone.subscriber.as_deref(), Some("recorder"));
        assert_eq!(gone.subscriber_id, Some(h.id()));
        assert!(!events.iter().any(|e| e.kind == EventKind::SinkOverflow));

        let published = events
            .iter()
            .find(|e| e.kind == EventKind::MessagePublished)
            .unwrap();
        assert_eq!(published.recipients, Some(0));
        relay.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publish_with_membership_churn() {
        const PRODUCERS: i64 = 4;
        const PER_PRODUCER: i64 = 200;
        const ROUNDS: usize = 50;

        let relay = relay();
        let steady: Vec<Arc<Recorder>> = (0..3).map(|_| Arc::new(Recorder::default())).collect();
        let _steady_handles: Vec<SubscriptionHandle> =
            steady.iter().map(|s| relay.register(s.clone())).collect();

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|p| {
                let relay = relay.clone();
                tokio::spawn(async move {
                    for n in 0..PER_PRODUCER {
                        relay.publish(Message::new().with("producer", p).with("n", n));
                        if n % 16 == 0 {
                            tokio::task::yield_now().await;
                        }
                    }
                })
            })
            .collect();

        let churn = {
            let relay = relay.clone();
            tokio::spawn(async move {
                let mut churned = Vec::with_capacity(ROUNDS);
                for r in 0..ROUNDS {
                    relay.publish(Message::new().with("marker", format!("before-{r}")));
                    let sub = Arc::new(Recorder::default());
                    let h = relay.register(sub.clone());
                    tokio::task::yield_now().await;
                    assert!(relay.unregister(&h));
                    relay.publish(Message::new().with("marker", format!("after-{r}")));
                    churned.push(sub);
                }
                churned
            })
        };

        for p in producers {
            p.await.unwrap();
        }
        let churned = churn.await.unwrap();
        relay.shutdown().await.unwrap();

        let expected_markers: Vec<String> = (0..ROUNDS)
            .flat_map(|r| [format!("before-{r}"), format!("after-{r}")])
            .collect();
        for sub in &steady {
            let seen = sub.seen();
            let counts = assert_fifo_per_producer(&seen);
            for p in 0..PRODUCERS {
                assert_eq!(counts.get(&p).copied(), Some(PER_PRODUCER as usize));
            }
            assert_eq!(markers(&seen), expected_markers);
        }
        for sub in &churned {
            let seen = sub.seen();
            assert_fifo_per_producer(&seen);
            assert!(markers(&seen).is_empty(), "churned subscriber saw {seen:?}");
        }
    }

    #[tokio::test]
    async fn test_delivery_timeout_does_not_stall_queue() {
        let relay = Relay::new(RelayConfig {
            delivery_timeout: Duration::from_millis(50),
            ..RelayConfig::default()
        })
        .unwrap();
        let mut rx = relay.events();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink_seen = Arc::clone(&seen);
        let _h = relay.register_fn("sleepy", move |m: Message| {
            let seen = Arc::clone(&sink_seen);
            async move {
                if m.get("type") == Some(&json!("slow")) {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                }
                seen.lock().unwrap().push(m);
                Ok::<_, SinkError>(())
            }
        });

        relay.publish(msg("slow"));
        relay.publish(msg("fast"));
        relay.shutdown().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![msg("fast")]);
        let timed_out = drain(&mut rx)
            .into_iter()
            .find(|e| e.kind == EventKind::SinkTimedOut)
            .unwrap();
        assert_eq!(timed_out.timeout_ms, Some(50));
    }

    #[tokio::test]
    async fn test_shutdown_grace_exceeded() {
        let relay = Relay::new(RelayConfig {
            grace: Duration::from_millis(50),
            ..RelayConfig::default()
        })
        .unwrap();
        let _h = relay.register_fn("stuck", |_m: Message| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, SinkError>(())
        });
        relay.publish(msg("ping"));

        let err = relay.shutdown().await.unwrap_err();
        assert!(matches!(err, RelayError::GraceExceeded { pending: 1, .. }));
        assert!(relay.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn test_closed_relay_ignores_register_and_publish() {
        let relay = relay();
        relay.shutdown().await.unwrap();

        let sub = Arc::new(Recorder::default());
        let h = relay.register(sub.clone());
        assert!(!relay.is_active(&h));
        assert!(!h.remove());

        relay.publish(msg("ping"));
        assert!(sub.seen().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_sorted_by_name() {
        let relay = relay();
        let _b = relay.register_fn("beta", |_m: Message| async { Ok::<_, SinkError>(()) });
        let _a = relay.register_fn("alpha", |_m: Message| async { Ok::<_, SinkError>(()) });

        let names: Vec<String> = relay
            .subscribers()
            .into_iter()
            .map(|(_, name)| name.to_string())
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_build_outside_runtime_fails() {
        let err = Relay::new(RelayConfig::default()).err().unwrap();
        assert!(matches!(err, RelayError::NoRuntime));
    }
}
