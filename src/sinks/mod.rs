//! # Sink abstractions.
//!
//! - [`Sink`] - trait a subscriber implements to receive messages
//! - [`SinkFn`] - closure-backed sink
//! - [`SinkRef`] - shared reference to a sink (`Arc<dyn Sink>`)

mod sink;
mod sink_fn;

pub use sink::Sink;
pub use sink_fn::{SinkFn, SinkRef};
