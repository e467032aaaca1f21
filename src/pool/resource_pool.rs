//! Bounded, owner-aware connection pool
//!
//! Connections are created lazily up to `capacity`, handed out exclusively,
//! and remembered per owner so repeated requests from the same unit of work
//! get the same connection back without touching the pool lock.

use super::guard::ReservationGuard;
use super::owner::OwnerId;
use super::queue::WaitQueue;
use super::stats::PoolStats;
use crate::config::PoolConfig;
use crate::connection::{Connection, ConnectionParams};
use crate::error::{ConnpoolError, PoolError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// State guarded by the pool lock
struct PoolState<C> {
    /// Every live connection created by this pool
    connections: Vec<Arc<C>>,
    /// Idle connections
    available: WaitQueue<Arc<C>>,
    /// Maximum time to block in `acquire`
    checkout_timeout: Duration,
    /// Whether new connections may be opened
    auto_connect: bool,
}

impl<C> PoolState<C> {
    fn available(&mut self) -> &mut WaitQueue<Arc<C>> {
        &mut self.available
    }

    fn owns(&self, conn: &Arc<C>) -> bool {
        self.connections.iter().any(|c| Arc::ptr_eq(c, conn))
    }
}

/// Pool of at most `capacity` connections shared by many owners
///
/// All bookkeeping happens under one mutex; the per-owner reservation map is a
/// concurrent map so that an owner that already holds a connection can look it
/// up without taking that mutex. The map is only written with the mutex held.
pub struct ResourcePool<C: Connection> {
    /// Maximum number of live connections
    capacity: usize,
    /// Forwarded verbatim to `Connection::open`
    params: ConnectionParams,
    /// Pool lock
    state: Mutex<PoolState<C>>,
    /// Signalled when a connection is added to `available`
    available_cond: Condvar,
    /// Owner -> connection currently reserved for it
    reserved: DashMap<OwnerId, Arc<C>>,
    /// Counters
    stats: PoolStats,
}

impl<C: Connection> ResourcePool<C> {
    /// Create a pool from validated configuration. No connection is opened yet.
    pub fn new(config: PoolConfig) -> Result<Self, ConnpoolError> {
        config.validate().map_err(ConnpoolError::Config)?;
        let checkout_timeout = config
            .checkout_timeout_duration()
            .map_err(ConnpoolError::Config)?;

        Ok(ResourcePool {
            capacity: config.capacity,
            params: config.connection,
            state: Mutex::new(PoolState {
                connections: Vec::with_capacity(config.capacity),
                available: WaitQueue::with_capacity(config.capacity),
                checkout_timeout,
                auto_connect: config.auto_connect,
            }),
            available_cond: Condvar::new(),
            reserved: DashMap::with_capacity(config.capacity),
            stats: PoolStats::new(),
        })
    }

    /// Connection reserved for `owner`, checking one out if it has none
    ///
    /// Repeated calls with the same owner return the same connection until it
    /// is released.
    pub fn acquire(&self, owner: OwnerId) -> Result<Arc<C>, PoolError> {
        if let Some(conn) = self.reserved_for(owner) {
            return Ok(conn);
        }

        let mut state = self.state.lock();
        if let Some(conn) = self.reserved_for(owner) {
            return Ok(conn);
        }

        let conn = self.checkout_locked(&mut state)?;

        // Another caller with the same owner may have reserved while we waited
        match self.reserved.entry(owner) {
            Entry::Occupied(entry) => {
                let existing = Arc::clone(entry.get());
                drop(entry);
                self.checkin_locked(&mut state, conn);
                Ok(existing)
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&conn));
                debug!("Reserved connection for {}", owner);
                Ok(conn)
            }
        }
    }

    /// Whether `owner` currently holds a reservation
    pub fn is_active(&self, owner: OwnerId) -> bool {
        self.reserved.contains_key(&owner)
    }

    /// Release the reservation of `owner` and return its connection to idle
    ///
    /// No-op when the owner holds nothing.
    pub fn release(&self, owner: OwnerId) {
        let mut state = self.state.lock();
        if let Some((_, conn)) = self.reserved.remove(&owner) {
            debug!("Released connection of {}", owner);
            self.checkin_locked(&mut state, conn);
        }
    }

    /// Reserve a connection for `owner` for as long as the returned guard lives
    ///
    /// If the owner already holds a connection the guard reuses it and leaves
    /// the reservation in place when dropped.
    pub fn scoped(&self, owner: OwnerId) -> Result<ReservationGuard<'_, C>, PoolError> {
        let outermost = !self.is_active(owner);
        let conn = self.acquire(owner)?;
        Ok(ReservationGuard::new(self, owner, conn, outermost))
    }

    /// Run `body` with the connection reserved for `owner`
    ///
    /// A reservation created here is released on every exit path of `body`,
    /// including panics. A reservation that existed before the call is kept.
    pub fn with_resource<R, E, F>(&self, owner: OwnerId, body: F) -> Result<R, E>
    where
        F: FnOnce(&Arc<C>) -> Result<R, E>,
        E: From<PoolError>,
    {
        let guard = self.scoped(owner)?;
        body(guard.connection())
    }

    /// Check out a connection without reserving it for any owner
    ///
    /// The caller must hand it back with [`ResourcePool::checkin`].
    pub fn checkout(&self) -> Result<Arc<C>, PoolError> {
        let mut state = self.state.lock();
        self.checkout_locked(&mut state)
    }

    /// Return a connection to idle by value
    ///
    /// Whichever owner currently has `conn` reserved loses the reservation;
    /// `likely_owner` is tried before scanning all reservations. A connection
    /// that is not part of this pool's live set is closed instead of queued.
    pub fn checkin(&self, conn: Arc<C>, likely_owner: Option<OwnerId>) {
        let mut state = self.state.lock();
        self.release_reservation(&conn, likely_owner);
        self.checkin_locked(&mut state, conn);
    }

    /// Whether any connection has been opened
    pub fn is_connected(&self) -> bool {
        !self.state.lock().connections.is_empty()
    }

    /// Close every connection and forget all reservations
    ///
    /// The pool may open fresh connections afterwards. Idempotent.
    pub fn disconnect_all(&self) {
        let mut state = self.state.lock();
        self.reserved.clear();

        let count = state.connections.len();
        for conn in state.connections.drain(..) {
            conn.close();
        }
        state.available.clear();

        if count > 0 {
            self.stats.record_closed(count);
            info!("Disconnected {} pooled connection(s)", count);
        }
    }

    /// Forget all reservations and discard connections that are no longer alive
    ///
    /// Surviving connections all become idle.
    pub fn drop_stale_connections(&self) {
        let mut state = self.state.lock();
        self.reserved.clear();

        let before = state.connections.len();
        state.connections.retain(|conn| {
            if conn.is_finished() {
                conn.close();
                false
            } else {
                true
            }
        });
        let dropped = before - state.connections.len();

        state.available.clear();
        let survivors = state.connections.clone();
        for conn in survivors {
            state.available.add(conn, &self.available_cond);
        }

        if dropped > 0 {
            self.stats.record_closed(dropped);
            warn!("Dropped {} stale connection(s)", dropped);
        }
        debug!("Pool rebuilt with {} idle connection(s)", state.available.len());
    }

    /// Maximum number of live connections
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Maximum time `acquire` blocks waiting for a connection
    pub fn checkout_timeout(&self) -> Duration {
        self.state.lock().checkout_timeout
    }

    /// Change the checkout timeout for subsequent checkouts
    pub fn set_checkout_timeout(&self, timeout: Duration) {
        self.state.lock().checkout_timeout = timeout;
    }

    /// Whether new connections may be opened
    pub fn auto_connect(&self) -> bool {
        self.state.lock().auto_connect
    }

    /// Allow or forbid opening new connections
    pub fn set_auto_connect(&self, auto_connect: bool) {
        self.state.lock().auto_connect = auto_connect;
    }

    /// Parameters forwarded to `Connection::open`
    pub fn connection_params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Snapshot of every live connection
    pub fn connections(&self) -> Vec<Arc<C>> {
        self.state.lock().connections.clone()
    }

    /// Number of live connections
    pub fn size(&self) -> usize {
        self.state.lock().connections.len()
    }

    /// Number of idle connections
    pub fn available_count(&self) -> usize {
        self.state.lock().available.len()
    }

    /// Number of callers blocked waiting for a connection
    pub fn num_waiting(&self) -> usize {
        self.state.lock().available.num_waiting()
    }

    /// Number of owners currently holding a reservation
    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    /// Pool counters
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    fn reserved_for(&self, owner: OwnerId) -> Option<Arc<C>> {
        self.reserved.get(&owner).map(|entry| Arc::clone(entry.value()))
    }

    /// Pop an idle connection, open a new one, or wait, then reset it
    fn checkout_locked(&self, state: &mut MutexGuard<'_, PoolState<C>>) -> Result<Arc<C>, PoolError> {
        let conn = self.acquire_connection(state)?;

        if let Err(e) = conn.reset() {
            warn!("Failed to reset connection on checkout: {}", e);
            state.available.add(conn, &self.available_cond);
            return Err(e.into());
        }

        self.stats.record_acquired();
        Ok(conn)
    }

    fn acquire_connection(&self, state: &mut MutexGuard<'_, PoolState<C>>) -> Result<Arc<C>, PoolError> {
        if let Some(conn) = state.available.poll() {
            return Ok(conn);
        }

        if state.connections.len() < self.capacity {
            return self.checkout_new_connection(state);
        }

        let timeout = state.checkout_timeout;
        WaitQueue::poll_timeout(state, &self.available_cond, timeout, PoolState::available)
            .inspect_err(|e| {
                self.stats.record_timed_out();
                warn!("{}", e);
            })
    }

    fn checkout_new_connection(&self, state: &mut PoolState<C>) -> Result<Arc<C>, PoolError> {
        if !state.auto_connect {
            return Err(PoolError::Misconfigured);
        }

        let conn = Arc::new(C::open(&self.params)?);
        state.connections.push(Arc::clone(&conn));
        self.stats.record_created();
        debug!(
            "Opened new connection, live: {}/{}",
            state.connections.len(),
            self.capacity
        );
        Ok(conn)
    }

    fn checkin_locked(&self, state: &mut PoolState<C>, conn: Arc<C>) {
        if !state.owns(&conn) {
            warn!("Closing checked-in connection that is not part of this pool");
            conn.close();
            return;
        }
        if state.available.iter().any(|c| Arc::ptr_eq(c, &conn)) {
            debug!("Ignoring duplicate checkin");
            return;
        }

        state.available.add(conn, &self.available_cond);
        self.stats.record_released();
    }

    fn release_reservation(&self, conn: &Arc<C>, likely_owner: Option<OwnerId>) {
        let owner = likely_owner
            .filter(|owner| {
                self.reserved
                    .get(owner)
                    .is_some_and(|entry| Arc::ptr_eq(entry.value(), conn))
            })
            .or_else(|| {
                self.reserved
                    .iter()
                    .find(|entry| Arc::ptr_eq(entry.value(), conn))
                    .map(|entry| *entry.key())
            });

        if let Some(owner) = owner {
            self.reserved.remove(&owner);
        }
    }
}
