//! Authentication service.
//!
//! Client-side credential validation plus the two public endpoints. The
//! password policy is enforced before any network call; server-side
//! rejections surface the server's own message.

mod error;

pub use error::AuthError;

use tracing::{info, instrument};

use refectory_core::Email;

use crate::api::ApiClient;
use crate::cart::CartStore;
use crate::session::SessionStore;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 15;

/// Characters accepted as "special" by the password policy.
const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Authentication flows: register, login, logout.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    session: SessionStore,
    cart: CartStore,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(api: ApiClient, session: SessionStore, cart: CartStore) -> Self {
        Self { api, session, cart }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmail`, `PasswordMismatch`, or `WeakPassword` before
    /// any network call; `Gateway` if the backend rejects the registration.
    #[instrument(skip(self, password, confirm_password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        if password != confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(password)?;

        self.api
            .register(username, email.as_str(), password)
            .await?;
        info!("account registered");
        Ok(())
    }

    /// Login with email and password.
    ///
    /// On success the session is established and the cart is cleared - a
    /// fresh session always starts with an empty cart. On rejection no token
    /// is stored and the server's message is surfaced.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEmail` before any network call, `Gateway` on
    /// rejection, or `Storage` if the token cannot be persisted.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let token = self.api.login(email.as_str(), password).await?;
        self.session.establish(&token)?;
        self.cart.clear()?;
        info!("logged in");
        Ok(())
    }

    /// Logout: clear the cart, then revoke the session.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if local state cannot be cleared.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.cart.clear()?;
        self.session.revoke()?;
        info!("logged out");
        Ok(())
    }
}

/// Enforce the password policy: 6-15 characters with at least one uppercase
/// letter, one lowercase letter, one digit, and one special character.
fn validate_password(password: &str) -> Result<(), AuthError> {
    let mut issues = Vec::new();

    if password.len() < MIN_PASSWORD_LENGTH || password.len() > MAX_PASSWORD_LENGTH {
        issues.push(format!(
            "must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} characters"
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push("must contain at least one uppercase letter".to_owned());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        issues.push("must contain at least one lowercase letter".to_owned());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("must contain at least one number".to_owned());
    }
    if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        issues.push("must contain at least one special character".to_owned());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(AuthError::WeakPassword(issues.join("; ")))
    }
}
