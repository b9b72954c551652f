use std::sync::Arc;

use tokio::runtime::Handle as RuntimeHandle;

use crate::error::RelayError;
use crate::events::Bus;
use crate::observers::{Observe, ObserverSet};

use super::config::RelayConfig;
use super::relay::Relay;

/// Builder for constructing a [`Relay`] with optional observers.
pub struct RelayBuilder {
    cfg: RelayConfig,
    observers: Vec<Arc<dyn Observe>>,
}

impl RelayBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: RelayConfig) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
        }
    }

    /// Sets the observers that receive relay events (registrations, publishes, sink faults).
    ///
    /// Each observer gets its own listener task, so a slow or panicking
    /// observer never affects the relay or the other observers.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Adds a single observer.
    pub fn with_observer(mut self, observer: Arc<dyn Observe>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Builds the relay.
    ///
    /// Captures the current Tokio runtime: subscriber workers and observer
    /// listeners are spawned on it.
    ///
    /// # Errors
    /// [`RelayError::NoRuntime`] when called outside a Tokio runtime.
    pub fn build(self) -> Result<Relay, RelayError> {
        let runtime = RuntimeHandle::try_current().map_err(|_| RelayError::NoRuntime)?;
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let observers = ObserverSet::spawn(self.observers, &bus, &runtime);

        Ok(Relay::from_parts(self.cfg, bus, runtime, observers))
    }
}
