//! RAII guard for scoped reservations
//!
//! Releases the owner's reservation when dropped, unless the owner already
//! held a connection when the guard was created.

use super::{OwnerId, ResourcePool};
use crate::connection::Connection;
use std::ops::Deref;
use std::sync::Arc;

/// Scoped hold on the connection reserved for one owner
///
/// Only the outermost guard for an owner releases the reservation; nested
/// guards for the same owner share the connection and leave it reserved.
pub struct ReservationGuard<'a, C: Connection> {
    /// Pool the reservation belongs to
    pool: &'a ResourcePool<C>,
    /// Owner holding the reservation
    owner: OwnerId,
    /// The reserved connection
    conn: Arc<C>,
    /// Whether this guard created the reservation
    outermost: bool,
}

impl<'a, C: Connection> ReservationGuard<'a, C> {
    pub(super) fn new(
        pool: &'a ResourcePool<C>,
        owner: OwnerId,
        conn: Arc<C>,
        outermost: bool,
    ) -> Self {
        ReservationGuard {
            pool,
            owner,
            conn,
            outermost,
        }
    }

    /// Owner this guard reserves for
    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Whether dropping this guard releases the reservation
    pub fn is_outermost(&self) -> bool {
        self.outermost
    }

    /// Shared handle to the reserved connection
    pub fn connection(&self) -> &Arc<C> {
        &self.conn
    }
}

impl<C: Connection> Deref for ReservationGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl<C: Connection> Drop for ReservationGuard<'_, C> {
    fn drop(&mut self) {
        if self.outermost {
            self.pool.release(self.owner);
        }
    }
}
