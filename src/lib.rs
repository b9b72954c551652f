//! # pubrelay
//!
//! **pubrelay** is an in-process publish/subscribe notification relay.
//!
//! Producers publish [`Message`]s; every [`Sink`] registered at publish time
//! receives each message exactly once, in publish order, and nothing after it
//! is unregistered. Sink failures are contained per subscriber and reported
//! to observers, never to the producer.
//!
//! ## Architecture
//! ```text
//!   producer A        producer B
//!       │                 │
//!       └──── publish ────┘
//!                ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  Relay                                                   │
//! │  - active set: SubscriberId ──► Slot{ bounded queue }    │
//! │  - Bus (broadcast of relay events)                       │
//! └──────┬──────────────────┬──────────────────┬─────────────┘
//!        ▼                  ▼                  ▼
//!   [queue S1]         [queue S2]         [queue SN]
//!        │                  │                  │
//!    worker S1          worker S2          worker SN
//!        │                  │                  │
//!   S1.deliver()       S2.deliver()       SN.deliver()
//!        └── Err / panic / timeout ──► Bus ──► observers (LogWriter, ...)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Relay**         | Register, unregister, publish, graceful shutdown.            | [`Relay`], [`SubscriptionHandle`]           |
//! | **Sinks**         | Anything that can receive one message.                       | [`Sink`], [`SinkFn`], [`SinkRef`]           |
//! | **Messages**      | Immutable key/value payloads, cheap to fan out.              | [`Message`]                                 |
//! | **Observability** | Membership, publish and fault events; `tracing` writer.      | [`Observe`], [`LogWriter`], [`Event`]       |
//! | **Errors**        | Typed errors for the host, the sinks and contained faults.   | [`RelayError`], [`SinkError`], [`SinkFault`]|
//! | **Configuration** | Event bus size, delivery timeout, shutdown grace.            | [`RelayConfig`]                             |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use pubrelay::{LogWriter, Message, Relay, RelayConfig, SinkError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let relay = Relay::builder(RelayConfig::default())
//!         .with_observer(Arc::new(LogWriter::new()))
//!         .build()?;
//!
//!     let s1 = relay.register_fn("s1", |msg: Message| async move {
//!         println!("s1 got {msg}");
//!         Ok::<_, SinkError>(())
//!     });
//!     let _s2 = relay.register_fn("s2", |msg: Message| async move {
//!         println!("s2 got {msg}");
//!         Ok::<_, SinkError>(())
//!     });
//!
//!     relay.publish(Message::new().with("type", "ping"));
//!     relay.unregister(&s1);
//!     relay.publish(Message::new().with("type", "pong"));
//!
//!     relay.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod message;
mod observers;
mod sinks;

// ---- Public re-exports ----

pub use self::core::{Relay, RelayBuilder, RelayConfig, SubscriberId, SubscriptionHandle};
pub use error::{RelayError, SinkError, SinkFault};
pub use events::{Event, EventKind};
pub use message::Message;
pub use observers::{LogWriter, Observe};
pub use sinks::{Sink, SinkFn, SinkRef};
