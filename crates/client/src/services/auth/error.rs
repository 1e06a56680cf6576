//! Authentication error types.

use thiserror::Error;

use refectory_core::EmailError;

use crate::api::GatewayError;
use crate::storage::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The backend rejected the request (e.g. wrong credentials); the
    /// server's message is carried through.
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// Persisting or clearing local session state failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
