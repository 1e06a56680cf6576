//! Local cart store.
//!
//! A mapping from menu item ID to (item data, quantity), persisted on every
//! mutation under a key namespaced by session identity. The cart is strictly
//! session-scoped: it is restored only when a session exists, and it is
//! cleared - memory and persisted copy - whenever the session goes away,
//! regardless of which context removed it.
//!
//! Invariants:
//! - line IDs are unique and keep their insertion order; new lines append
//! - quantities are always >= 1; a line reduced below 1 is removed
//! - the total is recomputed on every read, never stored

use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use refectory_core::{CartLine, MenuItem, MenuItemId};

use crate::session::{SessionEvent, SessionStore};
use crate::storage::{Storage, StorageError};

/// Prefix for persisted cart keys; the suffix is the session fingerprint.
const CART_KEY_PREFIX: &str = "cart.";

fn cart_key(fingerprint: &str) -> String {
    format!("{CART_KEY_PREFIX}{fingerprint}")
}

/// Session-scoped shopping cart. Cheaply cloneable.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

struct CartInner {
    storage: Arc<dyn Storage>,
    session: SessionStore,
    state: Mutex<CartState>,
}

struct CartState {
    lines: Vec<CartLine>,
    /// Persisted key for the session the lines belong to; `None` while no
    /// session exists (mutations then stay in memory only).
    key: Option<String>,
}

impl CartStore {
    /// Build the cart store, restoring the persisted snapshot only if a
    /// session exists at load time. A snapshot that fails to parse restores
    /// as an empty cart.
    #[must_use]
    pub fn load(storage: Arc<dyn Storage>, session: SessionStore) -> Self {
        let key = session.fingerprint().map(|fp| cart_key(&fp));
        let lines = key
            .as_deref()
            .and_then(|key| storage.get(key))
            .map_or_else(Vec::new, |raw| {
                serde_json::from_str(&raw).unwrap_or_else(|e| {
                    warn!(error = %e, "persisted cart is corrupt, starting empty");
                    Vec::new()
                })
            });

        Self {
            inner: Arc::new(CartInner {
                storage,
                session,
                state: Mutex::new(CartState { lines, key }),
            }),
        }
    }

    // =========================================================================
    // Mutators (persist-on-change)
    // =========================================================================

    /// Add one unit of `item`. An existing line increments its quantity;
    /// otherwise a new line with quantity 1 appends at the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be persisted.
    pub fn add_item(&self, item: &MenuItem) -> Result<(), StorageError> {
        let mut state = self.inner.state.lock();
        match state.lines.iter().position(|line| line.id == item.id) {
            Some(index) => {
                if let Some(line) = state.lines.get_mut(index) {
                    line.quantity += 1;
                }
            }
            None => state.lines.push(CartLine::from(item)),
        }
        self.persist(&state)
    }

    /// Remove the line with `id`. Absent ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be persisted.
    pub fn remove_item(&self, id: MenuItemId) -> Result<(), StorageError> {
        let mut state = self.inner.state.lock();
        let before = state.lines.len();
        state.lines.retain(|line| line.id != id);
        if state.lines.len() == before {
            return Ok(());
        }
        self.persist(&state)
    }

    /// Set the quantity of the line with `id`. A quantity below 1 removes
    /// the line; absent ids are a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be persisted.
    pub fn set_quantity(&self, id: MenuItemId, quantity: u32) -> Result<(), StorageError> {
        if quantity < 1 {
            return self.remove_item(id);
        }
        let mut state = self.inner.state.lock();
        let Some(line) = state.lines.iter_mut().find(|line| line.id == id) else {
            return Ok(());
        };
        line.quantity = quantity;
        self.persist(&state)
    }

    /// Empty the cart and erase its persisted copy. The key itself is
    /// removed rather than overwritten, so no ghost empty snapshot remains.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted copy cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut state = self.inner.state.lock();
        state.lines.clear();
        if let Some(key) = &state.key {
            self.inner.storage.remove(key)?;
        }
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the current lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.inner.state.lock().lines.clone()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().lines.is_empty()
    }

    /// Total number of units across all lines (the cart badge count).
    #[must_use]
    pub fn count(&self) -> u32 {
        self.inner
            .state
            .lock()
            .lines
            .iter()
            .map(|line| line.quantity)
            .sum()
    }

    /// Cart total: sum of price x quantity over all lines, recomputed on
    /// every call.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.inner
            .state
            .lock()
            .lines
            .iter()
            .map(CartLine::line_total)
            .sum()
    }

    // =========================================================================
    // Session coupling
    // =========================================================================

    /// Listen for session lifecycle events and keep the cart session-scoped:
    /// a revocation from any context clears this cart, a new session starts
    /// an empty cart under its own persisted key.
    pub fn spawn_session_watcher(&self) -> JoinHandle<()> {
        let cart = self.clone();
        let mut events = cart.inner.session.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Err(e) = cart.apply_session_event(&event) {
                            warn!(error = %e, "failed to apply session event to cart");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "cart watcher lagged, resyncing from session");
                        if let Err(e) = cart.resync() {
                            warn!(error = %e, "cart resync failed");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn apply_session_event(&self, event: &SessionEvent) -> Result<(), StorageError> {
        let mut state = self.inner.state.lock();
        match event {
            SessionEvent::Established { fingerprint } => {
                // A session transition never inherits cart contents; the old
                // persisted snapshot is invalidated along with it.
                state.lines.clear();
                let new_key = cart_key(fingerprint);
                if let Some(old_key) = state.key.replace(new_key.clone())
                    && old_key != new_key
                {
                    self.inner.storage.remove(&old_key)?;
                }
                debug!("cart re-keyed for new session");
            }
            SessionEvent::Revoked => {
                state.lines.clear();
                if let Some(key) = state.key.take() {
                    self.inner.storage.remove(&key)?;
                }
                debug!("cart cleared after session revocation");
            }
        }
        Ok(())
    }

    /// Drop to whatever the session store currently says. Used when events
    /// were missed.
    fn resync(&self) -> Result<(), StorageError> {
        let mut state = self.inner.state.lock();
        state.lines.clear();
        let old = state.key.take();
        state.key = self.inner.session.fingerprint().map(|fp| cart_key(&fp));
        if let Some(old_key) = old
            && state.key.as_ref() != Some(&old_key)
        {
            self.inner.storage.remove(&old_key)?;
        }
        Ok(())
    }

    fn persist(&self, state: &CartState) -> Result<(), StorageError> {
        let Some(key) = &state.key else {
            return Ok(());
        };
        let snapshot = serde_json::to_string(&state.lines)?;
        self.inner.storage.set(key, &snapshot)
    }
}
