//! # Observer trait.
//!
//! [`Observe`] is the extension point for the relay's external observability
//! collaborator: logging, metrics, alerting. Observers see every [`Event`]
//! the relay reports, including contained sink faults.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use pubrelay::{Event, Observe};
//!
//! struct FaultCounter;
//!
//! #[async_trait]
//! impl Observe for FaultCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.is_fault() {
//!             // increment a counter, page someone, ...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "fault-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of relay events.
///
/// Each observer runs in its own listener task:
/// - events arrive in bus order;
/// - panics are caught and logged, the listener keeps going;
/// - an observer lagging more than `RelayConfig::bus_capacity` events skips the oldest ones.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Processes a single event.
    async fn on_event(&self, event: &Event);

    /// Returns the observer name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
