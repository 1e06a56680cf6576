//! Authenticated request gateway for the campus backend API.
//!
//! Every server read and write goes through [`ApiClient`]. The gateway
//! attaches the session token, centralizes 401-driven session teardown, and
//! extracts server-supplied error messages. The menu read is cached for five
//! minutes; cart and order operations are never cached.
//!
//! Session teardown ordering: on a 401 the token is destroyed *before* the
//! error surfaces to the caller, so a caller reacting by redirecting to
//! login can never race a stale token. Clearing the cart is deliberately not
//! done here - that is the cart store's policy, wired through the session
//! event subscription.

mod types;

pub use types::{CreateOrderResponse, OrderItemInput};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use refectory_core::{MenuItem, Order, OrderId, PaypalOrderId};

use crate::config::ClientConfig;
use crate::session::{SessionStore, SessionToken};

use types::{
    CaptureOrderRequest, CaptureOrderResponse, CreateOrderRequest, ErrorBody, LoginRequest,
    LoginResponse, MenuResponse, OrdersResponse, RegisterRequest,
};

// Endpoint paths are part of the backend contract.
const LOGIN_PATH: &str = "/api/public/v1/login";
const REGISTER_PATH: &str = "/api/public/v1/user";
const MENU_PATH: &str = "/api/authenticated/v1/menu";
const ORDERS_PATH: &str = "/api/authenticated/v1/orders";
const CREATE_ORDER_PATH: &str = "/api/authenticated/v1/paypal/create-order";
const CAPTURE_ORDER_PATH: &str = "/api/authenticated/v1/paypal/capture-order";

const MENU_CACHE_KEY: &str = "menu";
const MENU_CACHE_TTL: Duration = Duration::from_secs(300);

/// Longest slice of an unstructured error body carried into an error.
const ERROR_BODY_LIMIT: usize = 200;

/// Errors surfaced by the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No session token is present; no network call was made.
    #[error("not logged in")]
    NoSession,

    /// The backend rejected the token. The session has already been
    /// destroyed by the time this error is observable.
    #[error("session expired, please log in again")]
    Unauthorized,

    /// Non-success response with a server-supplied message.
    #[error("server error ({status}): {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Message from the response body's `error` field when present.
        message: String,
    },

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for the campus backend API.
///
/// Cheaply cloneable; all clones share the HTTP connection pool and the
/// menu cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
    menu_cache: Cache<String, Arc<Vec<MenuItem>>>,
}

impl ApiClient {
    /// Create a new API client bound to the given session store.
    #[must_use]
    pub fn new(config: &ClientConfig, session: SessionStore) -> Self {
        let menu_cache = Cache::builder()
            .max_capacity(4)
            .time_to_live(MENU_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                http: reqwest::Client::new(),
                base_url: config
                    .api_base_url
                    .as_str()
                    .trim_end_matches('/')
                    .to_owned(),
                session,
                menu_cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Execute an authenticated request.
    ///
    /// Fails with `NoSession` before any network activity if no token is
    /// stored. A 401 destroys the session as a side effect and fails with
    /// `Unauthorized`.
    async fn execute<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let token = self.inner.session.token().ok_or(GatewayError::NoSession)?;

        // The backend expects the token verbatim, no scheme prefix.
        let mut request = self
            .inner
            .http
            .request(method, self.url(path))
            .header(reqwest::header::AUTHORIZATION, token.expose())
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            // Tear the session down before the caller can observe the error.
            if let Err(e) = self.inner.session.revoke() {
                warn!(error = %e, "failed to remove rejected session token");
            }
            return Err(GatewayError::Unauthorized);
        }

        let text = response.text().await?;
        if !status.is_success() {
            return Err(remote_error(status, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Execute a request against a public endpoint. No token is attached and
    /// a 401 carries no session side effect - there may be nothing to tear
    /// down, and a failed login must not disturb an existing session.
    async fn execute_public<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self
            .inner
            .http
            .request(method, self.url(path))
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(remote_error(status, &text));
        }
        Ok(serde_json::from_str(&text)?)
    }

    // =========================================================================
    // Public endpoints
    // =========================================================================

    /// Exchange credentials for a session token.
    ///
    /// The token is returned, not stored - establishing the session is the
    /// auth service's job.
    ///
    /// # Errors
    ///
    /// Returns `Remote` with the server's message on rejected credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionToken, GatewayError> {
        let body = LoginRequest { email, password };
        let response: LoginResponse = self
            .execute_public(Method::POST, LOGIN_PATH, Some(&body))
            .await?;
        Ok(SessionToken::new(response.token))
    }

    /// Create a new user account.
    ///
    /// # Errors
    ///
    /// Returns `Remote` with the server's message on rejection (e.g. email
    /// already registered).
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), GatewayError> {
        let body = RegisterRequest {
            username,
            email,
            password,
        };
        let _: serde_json::Value = self
            .execute_public(Method::POST, REGISTER_PATH, Some(&body))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Authenticated endpoints
    // =========================================================================

    /// Fetch the menu. Cached for five minutes.
    ///
    /// # Errors
    ///
    /// Returns a gateway error if the session is missing/rejected or the
    /// request fails.
    #[instrument(skip(self))]
    pub async fn menu(&self) -> Result<Arc<Vec<MenuItem>>, GatewayError> {
        if let Some(items) = self.inner.menu_cache.get(MENU_CACHE_KEY).await {
            debug!("cache hit for menu");
            return Ok(items);
        }

        let response: MenuResponse = self.execute(Method::GET, MENU_PATH, None::<&()>).await?;
        let items = Arc::new(response.items);
        self.inner
            .menu_cache
            .insert(MENU_CACHE_KEY.to_owned(), Arc::clone(&items))
            .await;
        Ok(items)
    }

    /// Fetch the user's order history.
    ///
    /// # Errors
    ///
    /// Returns a gateway error if the session is missing/rejected, the
    /// request fails, or the backend reports the listing as unsuccessful.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, GatewayError> {
        let response: OrdersResponse = self.execute(Method::GET, ORDERS_PATH, None::<&()>).await?;
        if !response.success {
            return Err(GatewayError::Remote {
                status: StatusCode::OK.as_u16(),
                message: "order history unavailable".to_owned(),
            });
        }
        Ok(response.data)
    }

    /// Create a pending remote order from cart lines (ids and quantities
    /// only).
    ///
    /// # Errors
    ///
    /// Returns a gateway error if the session is missing/rejected or the
    /// backend refuses the order.
    #[instrument(skip(self, items))]
    pub async fn create_order(
        &self,
        items: Vec<OrderItemInput>,
    ) -> Result<CreateOrderResponse, GatewayError> {
        let body = CreateOrderRequest { items };
        self.execute(Method::POST, CREATE_ORDER_PATH, Some(&body))
            .await
    }

    /// Capture payment for a previously created order. Returns whether the
    /// backend reports the capture as successful.
    ///
    /// # Errors
    ///
    /// Returns a gateway error if the session is missing/rejected or the
    /// capture request fails outright.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn capture_order(
        &self,
        paypal_order_id: &PaypalOrderId,
        order_id: OrderId,
    ) -> Result<bool, GatewayError> {
        let body = CaptureOrderRequest {
            paypal_order_id: paypal_order_id.as_str(),
            order_id: order_id.as_i64(),
        };
        let response: CaptureOrderResponse = self
            .execute(Method::POST, CAPTURE_ORDER_PATH, Some(&body))
            .await?;
        Ok(response.success)
    }
}

/// Build a `Remote` error from a non-success response, preferring the body's
/// `error` field.
fn remote_error(status: StatusCode, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .unwrap_or_else(|| body.chars().take(ERROR_BODY_LIMIT).collect());

    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_owned()
    } else {
        message
    };

    GatewayError::Remote {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStorage;

    fn client() -> ApiClient {
        let config = ClientConfig {
            // Port 9 is discard; nothing listens in tests that reach it.
            api_base_url: "http://127.0.0.1:9".parse().unwrap(),
            data_dir: std::env::temp_dir(),
            currency_symbol: "£".to_owned(),
            paypal_client_id: None,
        };
        let session = SessionStore::new(Arc::new(MemoryStorage::new()));
        ApiClient::new(&config, session)
    }

    #[tokio::test]
    async fn test_authenticated_call_without_session_short_circuits() {
        // No listener exists at the base URL; reaching the network would
        // produce an Http error, so NoSession proves the short circuit.
        let api = client();
        let result = api.orders().await;
        assert!(matches!(result, Err(GatewayError::NoSession)));
    }

    #[test]
    fn test_remote_error_prefers_error_field() {
        let err = remote_error(StatusCode::UNPROCESSABLE_ENTITY, r#"{"error":"item sold out"}"#);
        assert!(matches!(
            err,
            GatewayError::Remote { status: 422, ref message } if message == "item sold out"
        ));
    }

    #[test]
    fn test_remote_error_falls_back_to_body_text() {
        let err = remote_error(StatusCode::BAD_GATEWAY, "upstream exploded");
        assert!(matches!(
            err,
            GatewayError::Remote { status: 502, ref message } if message == "upstream exploded"
        ));
    }

    #[test]
    fn test_remote_error_empty_body_uses_status_reason() {
        let err = remote_error(StatusCode::NOT_FOUND, "");
        assert!(matches!(
            err,
            GatewayError::Remote { status: 404, ref message } if message == "Not Found"
        ));
    }

    #[test]
    fn test_remote_error_truncates_unstructured_bodies() {
        let long = "x".repeat(1000);
        let err = remote_error(StatusCode::INTERNAL_SERVER_ERROR, &long);
        let GatewayError::Remote { message, .. } = err else {
            panic!("expected Remote");
        };
        assert_eq!(message.len(), ERROR_BODY_LIMIT);
    }

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let config = ClientConfig {
            api_base_url: "http://localhost:8080/".parse().unwrap(),
            data_dir: std::env::temp_dir(),
            currency_symbol: "£".to_owned(),
            paypal_client_id: None,
        };
        let session = SessionStore::new(Arc::new(MemoryStorage::new()));
        let api = ApiClient::new(&config, session);
        assert_eq!(
            api.url(MENU_PATH),
            "http://localhost:8080/api/authenticated/v1/menu"
        );
    }
}
