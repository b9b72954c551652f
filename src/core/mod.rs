//! Relay core: subscriber set, delivery workers and lifecycle.
//!
//! The public API from this module is [`Relay`] plus the types needed to
//! build and drive it.
//!
//! Internal modules:
//! - [`relay`]: active set, register / unregister / publish, shutdown;
//! - [`worker`]: per-subscriber queue consumer with fault isolation;
//! - [`handle`]: subscription handle;
//! - [`builder`]: relay construction with observers;
//! - [`config`]: tunables.

mod builder;
mod config;
mod handle;
mod id;
mod relay;
mod worker;

pub use builder::RelayBuilder;
pub use config::RelayConfig;
pub use handle::SubscriptionHandle;
pub use id::SubscriberId;
pub use relay::Relay;

pub(crate) use worker::panic_message;
