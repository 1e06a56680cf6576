//! Application state shared across the client.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::cart::CartStore;
use crate::checkout::Checkout;
use crate::config::ClientConfig;
use crate::error::AppError;
use crate::guard::SessionGuard;
use crate::services::auth::AuthService;
use crate::session::SessionStore;
use crate::storage::{FileStorage, Storage};

/// Name of the storage document inside the data directory.
const STORAGE_FILE: &str = "storage.json";

/// Application state wiring storage, session, cart, and gateway together.
///
/// This struct is cheaply cloneable via `Arc`. Construction spawns the
/// cart's session watcher, so it must happen inside a Tokio runtime.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ClientConfig,
    session: SessionStore,
    cart: CartStore,
    api: ApiClient,
}

impl AppState {
    /// Create the application state over file-backed storage in the
    /// configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage document cannot be opened.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let storage: Arc<dyn Storage> =
            Arc::new(FileStorage::open(config.data_dir.join(STORAGE_FILE))?);
        Ok(Self::with_storage(config, storage))
    }

    /// Create the application state over an explicit storage backend.
    /// Tests use this with in-memory storage.
    #[must_use]
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn Storage>) -> Self {
        let session = SessionStore::new(Arc::clone(&storage));
        let cart = CartStore::load(storage, session.clone());
        // Detached on purpose: the watcher lives as long as the process.
        let _ = cart.spawn_session_watcher();
        let api = ApiClient::new(&config, session.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                cart,
                api,
            }),
        }
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get a reference to the session store.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the API gateway.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Build a session guard for protected views.
    #[must_use]
    pub fn guard(&self) -> SessionGuard {
        SessionGuard::new(self.inner.session.clone())
    }

    /// Build the authentication service.
    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(
            self.inner.api.clone(),
            self.inner.session.clone(),
            self.inner.cart.clone(),
        )
    }

    /// Build the checkout orchestrator.
    #[must_use]
    pub fn checkout(&self) -> Checkout {
        Checkout::new(self.inner.api.clone(), self.inner.cart.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn config(data_dir: std::path::PathBuf) -> ClientConfig {
        ClientConfig {
            api_base_url: "http://127.0.0.1:9".parse().unwrap(),
            data_dir,
            currency_symbol: "£".to_owned(),
            paypal_client_id: None,
        }
    }

    #[tokio::test]
    async fn test_state_wires_guard_to_session() {
        let state = AppState::with_storage(
            config(std::env::temp_dir()),
            Arc::new(MemoryStorage::new()),
        );
        assert!(!state.guard().is_authenticated());

        state
            .session()
            .establish(&crate::session::SessionToken::new("tok-1"))
            .unwrap();
        assert!(state.guard().is_authenticated());
    }

    #[tokio::test]
    async fn test_state_creates_storage_document_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(config(dir.path().to_path_buf())).unwrap();
        state
            .session()
            .establish(&crate::session::SessionToken::new("tok-1"))
            .unwrap();
        assert!(dir.path().join(STORAGE_FILE).exists());
    }
}
