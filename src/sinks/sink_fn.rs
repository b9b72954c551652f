//! # Function-backed sink (`SinkFn`)
//!
//! [`SinkFn`] wraps a closure `F: Fn(Message) -> Fut`, producing a fresh
//! future per delivery. The closure receives an owned (cheaply cloned)
//! [`Message`], so the future can be `'static`.
//!
//! ## Example
//! ```rust
//! use pubrelay::{Message, SinkError, SinkFn, SinkRef};
//!
//! let s: SinkRef = SinkFn::arc("printer", |msg: Message| async move {
//!     println!("{msg}");
//!     Ok::<_, SinkError>(())
//! });
//!
//! assert_eq!(s.name(), "printer");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SinkError;
use crate::message::Message;
use crate::sinks::Sink;

/// Shared handle to a sink.
pub type SinkRef = Arc<dyn Sink>;

/// Function-backed sink implementation.
#[derive(Debug)]
pub struct SinkFn<F> {
    name: Cow<'static, str>,
    capacity: usize,
    f: F,
}

impl<F> SinkFn<F> {
    /// Creates a new function-backed sink with the default queue capacity.
    ///
    /// Prefer [`SinkFn::arc`] when you immediately need a [`SinkRef`].
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            capacity: 1024,
            f,
        }
    }

    /// Creates the sink and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Overrides the queue capacity.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

#[async_trait]
impl<F, Fut> Sink for SinkFn<F>
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SinkError>> + Send + 'static,
{
    async fn deliver(&self, message: &Message) -> Result<(), SinkError> {
        (self.f)(message.clone()).await
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn queue_capacity(&self) -> usize {
        self.capacity
    }
}
