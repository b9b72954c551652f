//! # Subscriber sink trait.
//!
//! Provides [`Sink`], the capability a subscriber implements to receive messages.
//! Any type that can "receive one message" qualifies; there is no base type.
//!
//! Each registered sink gets:
//! - **Dedicated worker task** (runs independently of producers)
//! - **Per-subscriber bounded queue** (capacity via [`Sink::queue_capacity`])
//! - **Fault isolation** (errors, panics and timeouts are reported as events)
//!
//! ## Architecture
//! ```text
//! Relay::publish ──► [bounded queue] ──► worker task ──► sink.deliver(&Message)
//!                                                   └─► Err / panic / timeout → Sink* event
//! ```
//!
//! ## Rules
//! - A slow sink only affects its own queue.
//! - Queue overflow drops the message **for this sink only** and reports
//!   `EventKind::SinkOverflow`.
//! - Messages are delivered sequentially (FIFO) per sink.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use pubrelay::{Message, Sink, SinkError};
//!
//! struct Printer;
//!
//! #[async_trait]
//! impl Sink for Printer {
//!     async fn deliver(&self, message: &Message) -> Result<(), SinkError> {
//!         println!("got {message}");
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "printer" }
//! }
//! ```

use async_trait::async_trait;

use crate::error::SinkError;
use crate::message::Message;

/// Receiver of published messages.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Return [`SinkError`] rather than panicking; panics are caught anyway.
#[async_trait]
pub trait Sink: Send + Sync + 'static {
    /// Handles a single message.
    ///
    /// Called from the subscriber's worker task, never in the producer context.
    /// Messages arrive in publish order.
    async fn deliver(&self, message: &Message) -> Result<(), SinkError>;

    /// Returns the sink name used in logs and fault events.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose; override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this sink.
    ///
    /// The relay clamps capacity to a minimum of 1.
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
