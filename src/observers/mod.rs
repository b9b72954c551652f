//! # Observers of relay events.
//!
//! The relay reports everything it does, including contained sink faults,
//! as [`Event`](crate::Event)s on its bus. Observers are the hosts' hook into
//! that stream.
//!
//! - [`Observe`]: the observer trait
//! - [`LogWriter`]: built-in observer rendering events through `tracing`

mod log;
mod observer;
mod set;

pub use log::LogWriter;
pub use observer::Observe;

pub(crate) use set::ObserverSet;
