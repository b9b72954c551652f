//! # Subscription handle.
//!
//! [`SubscriptionHandle`] is returned by `Relay::register` and is the only way
//! to remove a subscriber. It holds a weak reference to the relay, so keeping
//! a handle around never keeps a relay alive.
//!
//! ## Rules
//! - Exactly one unregistration takes effect; later ones are no-ops.
//! - Dropping the handle does **not** unregister. The caller decides when.

use std::fmt;
use std::sync::{Arc, Weak};

use super::id::SubscriberId;
use super::relay::Shared;

/// Token authorizing removal of exactly one subscriber.
pub struct SubscriptionHandle {
    id: SubscriberId,
    name: Arc<str>,
    relay: Weak<Shared>,
}

impl SubscriptionHandle {
    pub(crate) fn new(id: SubscriberId, name: Arc<str>, relay: Weak<Shared>) -> Self {
        Self { id, name, relay }
    }

    /// Id generated for this subscriber.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Name of the registered sink.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unregisters the subscriber; same as `relay.unregister(&handle)`.
    ///
    /// Returns `true` if this call removed it, `false` if it was already gone
    /// or the relay no longer exists.
    pub fn remove(&self) -> bool {
        self.relay
            .upgrade()
            .is_some_and(|shared| shared.remove(self.id))
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
