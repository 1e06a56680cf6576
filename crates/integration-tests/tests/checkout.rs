//! Checkout flows: the create-order/capture sequence end to end.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;

use refectory_client::checkout::{AttemptState, CheckoutAttempt, CheckoutError, PaymentError};
use refectory_client::state::AppState;
use refectory_client::storage::MemoryStorage;
use refectory_core::{MenuItemId, OrderStatus, PaypalOrderId};
use refectory_integration_tests::MockCampusApi;

/// A logged-in client with 2x Flat White (2.50) and 1x Bakewell Slice
/// (1.00) in the cart.
async fn checkout_ready_state(server: &MockCampusApi) -> AppState {
    server.seed_user("sam@campus.ac.uk", "Abc123!");
    let state = AppState::with_storage(server.client_config(), Arc::new(MemoryStorage::new()));
    state.auth().login("sam@campus.ac.uk", "Abc123!").await.unwrap();

    let menu = state.api().menu().await.unwrap();
    let flat_white = menu.iter().find(|i| i.id == MenuItemId::new(1)).unwrap();
    let bakewell = menu.iter().find(|i| i.id == MenuItemId::new(2)).unwrap();
    state.cart().add_item(flat_white).unwrap();
    state.cart().add_item(flat_white).unwrap();
    state.cart().add_item(bakewell).unwrap();

    assert_eq!(state.cart().total(), Decimal::new(600, 2));
    state
}

#[tokio::test]
async fn test_happy_path_captures_and_clears_cart() {
    let server = MockCampusApi::spawn().await;
    let state = checkout_ready_state(&server).await;
    let checkout = state.checkout();
    let mut attempt = CheckoutAttempt::new();

    let paypal_order_id = checkout.create_remote_order(&mut attempt).await.unwrap();
    assert!(matches!(attempt.state(), AttemptState::OrderCreated { .. }));

    let order_id = checkout
        .approve_payment(&mut attempt, &paypal_order_id)
        .await
        .unwrap();

    assert!(matches!(attempt.state(), AttemptState::Captured { .. }));
    assert!(state.cart().is_empty());
    assert_eq!(server.order_status(order_id), Some(OrderStatus::Paid));

    // The backend computed the total from its own menu.
    assert_eq!(server.order_total(order_id), Some(Decimal::new(600, 2)));

    // The placed order shows up in history.
    let orders = state.api().orders().await.unwrap();
    assert!(orders.iter().any(|order| order.id == order_id));
}

#[tokio::test]
async fn test_capture_failure_keeps_cart_and_pins_attempt() {
    let server = MockCampusApi::spawn().await;
    let state = checkout_ready_state(&server).await;
    let checkout = state.checkout();
    let mut attempt = CheckoutAttempt::new();

    let paypal_order_id = checkout.create_remote_order(&mut attempt).await.unwrap();

    server.fail_next_capture();
    let err = checkout
        .approve_payment(&mut attempt, &paypal_order_id)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Payment(PaymentError::CaptureDeclined)
    ));
    assert!(matches!(attempt.state(), AttemptState::Failed { .. }));

    // Checkout failures never leave the cart empty unless capture succeeded.
    assert_eq!(state.cart().lines().len(), 2);
    assert_eq!(state.cart().total(), Decimal::new(600, 2));

    // The failed attempt is terminal; its ids cannot be replayed.
    let replay = checkout
        .approve_payment(&mut attempt, &paypal_order_id)
        .await;
    assert!(matches!(replay, Err(CheckoutError::InvalidState(_))));

    // A retry is a fresh attempt with a fresh processor token.
    let mut retry = CheckoutAttempt::new();
    let retry_token = checkout.create_remote_order(&mut retry).await.unwrap();
    assert_ne!(retry_token, paypal_order_id);
    checkout.approve_payment(&mut retry, &retry_token).await.unwrap();
    assert!(state.cart().is_empty());
}

#[tokio::test]
async fn test_capture_is_never_issued_without_create() {
    let server = MockCampusApi::spawn().await;
    let state = checkout_ready_state(&server).await;
    let checkout = state.checkout();
    let mut attempt = CheckoutAttempt::new();

    let err = checkout
        .approve_payment(&mut attempt, &PaypalOrderId::new("PP-forged"))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::InvalidState(_)));
    assert_eq!(server.capture_requests(), 0);
}

#[tokio::test]
async fn test_mismatched_approval_never_reaches_backend() {
    let server = MockCampusApi::spawn().await;
    let state = checkout_ready_state(&server).await;
    let checkout = state.checkout();
    let mut attempt = CheckoutAttempt::new();

    checkout.create_remote_order(&mut attempt).await.unwrap();

    let err = checkout
        .approve_payment(&mut attempt, &PaypalOrderId::new("PP-someone-elses"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Payment(PaymentError::TokenMismatch)
    ));
    assert_eq!(server.capture_requests(), 0);
    assert!(!state.cart().is_empty());
}

#[tokio::test]
async fn test_unavailable_items_are_rejected_by_backend() {
    let server = MockCampusApi::spawn().await;
    server.seed_user("sam@campus.ac.uk", "Abc123!");
    let state = AppState::with_storage(server.client_config(), Arc::new(MemoryStorage::new()));
    state.auth().login("sam@campus.ac.uk", "Abc123!").await.unwrap();

    // Force the sold-out item into the cart, bypassing the view's own
    // availability check.
    let menu = state.api().menu().await.unwrap();
    let haggis = menu.iter().find(|i| !i.is_available).unwrap();
    state.cart().add_item(haggis).unwrap();

    let checkout = state.checkout();
    let mut attempt = CheckoutAttempt::new();
    let err = checkout.create_remote_order(&mut attempt).await.unwrap_err();

    assert!(matches!(err, CheckoutError::Gateway(_)));
    assert!(matches!(attempt.state(), AttemptState::Failed { .. }));
    // The cart is untouched by a failed create.
    assert_eq!(state.cart().lines().len(), 1);
}
