//! # Relay configuration.
//!
//! Provides [`RelayConfig`], the tunables consumed by [`RelayBuilder`](crate::RelayBuilder).
//!
//! ## Sentinel values
//! - `delivery_timeout = 0s` → no per-delivery timeout
//! - `grace = 0s` → shutdown cancels pending deliveries immediately
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

/// Configuration for a [`Relay`](crate::Relay).
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1)
/// - `delivery_timeout`: Upper bound for one `Sink::deliver` call (`0s` = unbounded)
/// - `grace`: Maximum wait for queued deliveries during shutdown
///
/// Per-subscriber queue capacity is chosen by each sink
/// ([`Sink::queue_capacity`](crate::Sink::queue_capacity)).
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Observers that lag behind more than `bus_capacity` events skip the
    /// oldest ones.
    pub bus_capacity: usize,

    /// Per-delivery timeout.
    ///
    /// - `Duration::ZERO` = a sink may take as long as it likes
    /// - `> 0` = slower deliveries are abandoned and reported as `SinkTimedOut`
    pub delivery_timeout: Duration,

    /// Maximum time `Relay::shutdown` waits for queued deliveries.
    ///
    /// When exceeded, remaining deliveries are cancelled and
    /// `RelayError::GraceExceeded` is returned.
    pub grace: Duration,
}

impl RelayConfig {
    /// Returns the per-delivery timeout as an `Option`.
    #[inline]
    pub fn delivery_limit(&self) -> Option<Duration> {
        if self.delivery_timeout == Duration::ZERO {
            None
        } else {
            Some(self.delivery_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for RelayConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `delivery_timeout = 0s` (no timeout)
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            delivery_timeout: Duration::ZERO,
            grace: Duration::from_secs(5),
        }
    }
}
