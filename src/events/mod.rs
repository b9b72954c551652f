//! Relay events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** the relay
//! reports through.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Relay` (membership, publish, shutdown) and subscriber
//!   workers (sink faults).
//! - **Consumers**: observer listeners (see [`crate::observers`]) and any
//!   receiver obtained from `Relay::events()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
