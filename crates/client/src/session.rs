//! Session token lifecycle.
//!
//! A session is a single opaque bearer token held in persistent storage;
//! its presence is the only "logged in" signal. No in-memory copy is
//! authoritative - every read goes to storage.
//!
//! [`SessionStore`] is also the single subscription point for invalidation:
//! establishing or revoking the token broadcasts a [`SessionEvent`], and
//! [`SessionStore::refresh`] detects removals made by another execution
//! context (the "other tab logged out" case) and broadcasts them too.

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use tracing::debug;

use crate::storage::{Storage, StorageError};

/// Storage key under which the session token is persisted.
pub(crate) const TOKEN_KEY: &str = "token";

/// Hex characters of the token digest used to namespace per-session state.
const FINGERPRINT_LEN: usize = 16;

/// Broadcast channel capacity; events are tiny and consumers are few.
const EVENT_CAPACITY: usize = 16;

// =============================================================================
// SessionToken
// =============================================================================

/// Opaque credential proving an authenticated identity to the backend.
///
/// Held redacted in memory; [`SessionToken::expose`] is for the wire and the
/// storage layer only.
#[derive(Clone)]
pub struct SessionToken(SecretString);

impl SessionToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(SecretString::from(raw.into()))
    }

    /// The raw token value, for the `Authorization` header and persistence.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// Short SHA-256 digest of the token.
    ///
    /// Used to namespace persisted state (the cart) by session identity, so
    /// one identity can never inherit another's persisted cart.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.expose().as_bytes());
        let mut hex = hex::encode(digest);
        hex.truncate(FINGERPRINT_LEN);
        hex
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

impl PartialEq for SessionToken {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for SessionToken {}

// =============================================================================
// SessionStore
// =============================================================================

/// Session lifecycle events observed by dependent stores.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new session token was stored.
    Established {
        /// Fingerprint of the new token, for re-keying persisted state.
        fingerprint: String,
    },
    /// The session token was removed (logout, 401, or another context).
    Revoked,
}

/// Holds the session token in persistent storage and broadcasts lifecycle
/// events. Cheaply cloneable.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    storage: Arc<dyn Storage>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create a session store over the given storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(SessionStoreInner { storage, events }),
        }
    }

    /// The current session token, if one is stored.
    #[must_use]
    pub fn token(&self) -> Option<SessionToken> {
        self.inner.storage.get(TOKEN_KEY).map(SessionToken::new)
    }

    /// Whether a session token is present. Absence is a normal state, not an
    /// error.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.storage.get(TOKEN_KEY).is_some()
    }

    /// Fingerprint of the current token, if a session exists.
    #[must_use]
    pub fn fingerprint(&self) -> Option<String> {
        self.token().map(|token| token.fingerprint())
    }

    /// Store a token and broadcast [`SessionEvent::Established`].
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted.
    pub fn establish(&self, token: &SessionToken) -> Result<(), StorageError> {
        self.inner.storage.set(TOKEN_KEY, token.expose())?;
        let _ = self.inner.events.send(SessionEvent::Established {
            fingerprint: token.fingerprint(),
        });
        debug!("session established");
        Ok(())
    }

    /// Remove the token and broadcast [`SessionEvent::Revoked`].
    ///
    /// Revoking an absent session is a no-op and broadcasts nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    pub fn revoke(&self) -> Result<(), StorageError> {
        if self.inner.storage.get(TOKEN_KEY).is_none() {
            return Ok(());
        }
        self.inner.storage.remove(TOKEN_KEY)?;
        let _ = self.inner.events.send(SessionEvent::Revoked);
        debug!("session revoked");
        Ok(())
    }

    /// Subscribe to session lifecycle events.
    ///
    /// This is the single subscription point for cross-context invalidation:
    /// any store that must not outlive the session listens here.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Re-read the backing storage and broadcast any externally-made change.
    ///
    /// A token that vanished means another context logged out (or was logged
    /// out); this store never assumes it made the removal itself. A token
    /// that appeared or changed means another context logged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage document cannot be re-read.
    pub fn refresh(&self) -> Result<(), StorageError> {
        let before = self.token();
        self.inner.storage.reload()?;
        let after = self.token();

        match (before, after) {
            (Some(_), None) => {
                debug!("session token removed externally");
                let _ = self.inner.events.send(SessionEvent::Revoked);
            }
            (before, Some(after)) if before.as_ref() != Some(&after) => {
                let _ = self.inner.events.send(SessionEvent::Established {
                    fingerprint: after.fingerprint(),
                });
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_absent_token_is_not_authenticated() {
        let session = store();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(session.fingerprint().is_none());
    }

    #[test]
    fn test_establish_then_revoke() {
        let session = store();
        session.establish(&SessionToken::new("tok-1")).unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.token().unwrap().expose(), "tok-1");

        session.revoke().unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_revoke_without_session_is_silent() {
        let session = store();
        let mut events = session.subscribe();
        session.revoke().unwrap();
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_events_broadcast_in_order() {
        let session = store();
        let mut events = session.subscribe();

        let token = SessionToken::new("tok-1");
        session.establish(&token).unwrap();
        session.revoke().unwrap();

        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::Established { fingerprint } if fingerprint == token.fingerprint()
        ));
        assert!(matches!(events.try_recv().unwrap(), SessionEvent::Revoked));
    }

    #[test]
    fn test_fingerprint_is_stable_and_distinct() {
        let a = SessionToken::new("tok-a");
        let b = SessionToken::new("tok-b");
        assert_eq!(a.fingerprint(), SessionToken::new("tok-a").fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = SessionToken::new("super-secret");
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_refresh_detects_external_removal() {
        // Two stores sharing one backing file simulate two tabs.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        let tab_a = SessionStore::new(Arc::new(
            crate::storage::FileStorage::open(&path).unwrap(),
        ));
        let tab_b = SessionStore::new(Arc::new(
            crate::storage::FileStorage::open(&path).unwrap(),
        ));

        tab_a.establish(&SessionToken::new("tok-1")).unwrap();
        tab_b.refresh().unwrap();
        assert!(tab_b.is_authenticated());

        let mut events = tab_b.subscribe();
        tab_a.revoke().unwrap();
        tab_b.refresh().unwrap();

        assert!(!tab_b.is_authenticated());
        assert!(matches!(events.try_recv().unwrap(), SessionEvent::Revoked));
    }
}
