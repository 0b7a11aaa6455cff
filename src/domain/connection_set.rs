//! The authoritative set of live connections.
//!
//! [`ConnectionSet`] is plain owned state with no interior locking. It is
//! only ever touched from the manager actor's task, which is what makes
//! concurrent access safe.

use std::collections::HashMap;
use std::fmt;

use super::ConnectionId;

/// Live connections keyed by identity.
pub struct ConnectionSet<W> {
    sinks: HashMap<ConnectionId, W>,
}

impl<W> ConnectionSet<W> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sinks: HashMap::new(),
        }
    }

    /// Starts tracking `sink` under `id`.
    ///
    /// Returns the previous sink if `id` was already present (never the
    /// case for ids minted by [`ConnectionId::new`]).
    pub fn insert(&mut self, id: ConnectionId, sink: W) -> Option<W> {
        self.sinks.insert(id, sink)
    }

    /// Stops tracking `id`, handing its sink back to the caller.
    ///
    /// Absent ids return `None` and leave the set unchanged.
    pub fn remove(&mut self, id: ConnectionId) -> Option<W> {
        self.sinks.remove(&id)
    }

    /// Returns `true` if `id` is tracked.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.sinks.contains_key(&id)
    }

    /// Iterates over all tracked connections with mutable access to sinks.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ConnectionId, &mut W)> {
        self.sinks.iter_mut().map(|(id, sink)| (*id, sink))
    }

    /// Returns the tracked ids in unspecified order.
    #[must_use]
    pub fn ids(&self) -> Vec<ConnectionId> {
        self.sinks.keys().copied().collect()
    }

    /// Removes and yields every tracked connection.
    pub fn drain(&mut self) -> impl Iterator<Item = (ConnectionId, W)> + '_ {
        self.sinks.drain()
    }

    /// Number of tracked connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns `true` if nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<W> Default for ConnectionSet<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> fmt::Debug for ConnectionSet<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSet")
            .field("len", &self.sinks.len())
            .finish()
    }
}
