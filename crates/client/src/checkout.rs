//! Checkout orchestration.
//!
//! One checkout attempt is a small state machine:
//!
//! ```text
//! Idle -> OrderCreated -> Captured
//!   \          \
//!    -> Failed  -> Failed
//! ```
//!
//! Capture is never issued without a successful create-order in the same
//! attempt, and a capture must present exactly the processor order token the
//! create step recorded. `Captured` and `Failed` are terminal - a retry
//! starts a fresh [`CheckoutAttempt`], so stale order ids and tokens can
//! never be reused.
//!
//! The processor's approval arrives as a plain argument to
//! [`Checkout::approve_payment`]; this module knows nothing about any
//! payment SDK's callback shapes.

use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use refectory_core::{OrderId, PaypalOrderId};

use crate::api::{ApiClient, GatewayError, OrderItemInput};
use crate::cart::CartStore;
use crate::storage::StorageError;

/// Processor-side failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// The approval reported by the processor does not match the order token
    /// recorded by this attempt.
    #[error("payment approval does not match this checkout attempt")]
    TokenMismatch,

    /// The backend reported the capture as unsuccessful.
    #[error("payment capture was declined")]
    CaptureDeclined,
}

/// Errors surfaced by the checkout orchestrator.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout requires at least one cart line.
    #[error("cart is empty")]
    EmptyCart,

    /// A step was invoked out of order or on a terminal attempt.
    #[error("checkout step out of order: {0}")]
    InvalidState(&'static str),

    /// A backend call failed.
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// The payment itself failed.
    #[error("{0}")]
    Payment(#[from] PaymentError),

    /// Clearing the cart after capture failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// State of a single checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    /// Nothing has happened yet.
    Idle,
    /// The backend holds a pending order awaiting payment approval.
    OrderCreated {
        /// Backend-issued order id.
        order_id: OrderId,
        /// Processor order token tied to this attempt.
        paypal_order_id: PaypalOrderId,
    },
    /// Payment captured; the order is out of our hands.
    Captured {
        /// Backend-issued order id.
        order_id: OrderId,
    },
    /// The attempt failed. Terminal; start a fresh attempt to retry.
    Failed {
        /// Human-readable failure description for the view.
        message: String,
    },
}

/// One run of the create-order/capture sequence. Never reused across
/// retries.
#[derive(Debug)]
pub struct CheckoutAttempt {
    id: Uuid,
    state: AttemptState,
}

impl CheckoutAttempt {
    /// Start a fresh attempt in `Idle`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: AttemptState::Idle,
        }
    }

    /// Attempt identity, for log correlation.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &AttemptState {
        &self.state
    }

    /// Whether the attempt reached a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            AttemptState::Captured { .. } | AttemptState::Failed { .. }
        )
    }
}

impl Default for CheckoutAttempt {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequences create-order and capture against the gateway and clears the
/// cart once - and only once - capture succeeds.
#[derive(Clone)]
pub struct Checkout {
    api: ApiClient,
    cart: CartStore,
}

impl Checkout {
    /// Create a checkout orchestrator over the gateway and cart.
    #[must_use]
    pub const fn new(api: ApiClient, cart: CartStore) -> Self {
        Self { api, cart }
    }

    /// Create a pending remote order from the current cart lines.
    ///
    /// Only quantities and item ids are submitted; the backend recomputes
    /// prices from its own menu. On success the attempt records the backend
    /// order id and the processor order token and moves to `OrderCreated`.
    ///
    /// # Errors
    ///
    /// `EmptyCart` leaves the attempt in `Idle` (add items and call again);
    /// a gateway failure moves it to `Failed`.
    #[instrument(skip(self, attempt), fields(attempt_id = %attempt.id))]
    pub async fn create_remote_order(
        &self,
        attempt: &mut CheckoutAttempt,
    ) -> Result<PaypalOrderId, CheckoutError> {
        if attempt.state != AttemptState::Idle {
            return Err(CheckoutError::InvalidState(
                "create-order is only valid on a fresh attempt",
            ));
        }

        let lines = self.cart.lines();
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let items = lines
            .iter()
            .map(|line| OrderItemInput {
                menu_item_id: line.id,
                quantity: line.quantity,
            })
            .collect();

        match self.api.create_order(items).await {
            Ok(response) => {
                info!(order_id = %response.order_id, "remote order created");
                attempt.state = AttemptState::OrderCreated {
                    order_id: response.order_id,
                    paypal_order_id: response.paypal_order_id.clone(),
                };
                Ok(response.paypal_order_id)
            }
            Err(e) => {
                warn!(error = %e, "create-order failed");
                attempt.state = AttemptState::Failed {
                    message: e.to_string(),
                };
                Err(e.into())
            }
        }
    }

    /// Capture payment after the processor reports buyer approval for
    /// `approved`.
    ///
    /// On success the cart is cleared and the attempt moves to `Captured`.
    /// On any failure the cart is left intact so the user can retry with a
    /// fresh attempt.
    ///
    /// # Errors
    ///
    /// `InvalidState` if no order was created in this attempt (or it already
    /// finished); `Payment` on token mismatch or a declined capture; a
    /// gateway error if the capture call itself fails.
    #[instrument(skip(self, attempt, approved), fields(attempt_id = %attempt.id))]
    pub async fn approve_payment(
        &self,
        attempt: &mut CheckoutAttempt,
        approved: &PaypalOrderId,
    ) -> Result<OrderId, CheckoutError> {
        let AttemptState::OrderCreated {
            order_id,
            paypal_order_id,
        } = &attempt.state
        else {
            return Err(CheckoutError::InvalidState(
                "capture requires a created order in the same attempt",
            ));
        };
        let order_id = *order_id;
        let paypal_order_id = paypal_order_id.clone();

        if *approved != paypal_order_id {
            warn!("approval token does not match the recorded order token");
            attempt.state = AttemptState::Failed {
                message: PaymentError::TokenMismatch.to_string(),
            };
            return Err(PaymentError::TokenMismatch.into());
        }

        match self.api.capture_order(&paypal_order_id, order_id).await {
            Ok(true) => {
                self.cart.clear()?;
                attempt.state = AttemptState::Captured { order_id };
                info!(order_id = %order_id, "payment captured");
                Ok(order_id)
            }
            Ok(false) => {
                attempt.state = AttemptState::Failed {
                    message: PaymentError::CaptureDeclined.to_string(),
                };
                Err(PaymentError::CaptureDeclined.into())
            }
            Err(e) => {
                warn!(error = %e, "capture failed");
                attempt.state = AttemptState::Failed {
                    message: e.to_string(),
                };
                Err(e.into())
            }
        }
    }
}
