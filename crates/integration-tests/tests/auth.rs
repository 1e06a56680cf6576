//! Login and registration flows against the mock backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use refectory_client::api::GatewayError;
use refectory_client::services::auth::AuthError;
use refectory_client::state::AppState;
use refectory_client::storage::MemoryStorage;
use refectory_integration_tests::MockCampusApi;

fn state_for(server: &MockCampusApi) -> AppState {
    AppState::with_storage(server.client_config(), Arc::new(MemoryStorage::new()))
}

#[tokio::test]
async fn test_login_stores_token_and_passes_guard() {
    let server = MockCampusApi::spawn().await;
    server.seed_user("sam@campus.ac.uk", "Abc123!");
    let state = state_for(&server);

    assert!(!state.guard().is_authenticated());
    state.auth().login("sam@campus.ac.uk", "Abc123!").await.unwrap();

    assert!(state.guard().is_authenticated());
    assert!(state.session().token().is_some());
    assert!(state.cart().is_empty());
}

#[tokio::test]
async fn test_login_wrong_password_surfaces_server_message_and_stores_no_token() {
    let server = MockCampusApi::spawn().await;
    server.seed_user("sam@campus.ac.uk", "Abc123!");
    let state = state_for(&server);

    let err = state
        .auth()
        .login("sam@campus.ac.uk", "wrong-password")
        .await
        .unwrap_err();

    // The server's own message comes through for the view to display.
    let AuthError::Gateway(GatewayError::Remote { status, message }) = err else {
        panic!("expected a remote rejection, got: {err}");
    };
    assert_eq!(status, 401);
    assert_eq!(message, "invalid credentials");

    // A failed login stores nothing.
    assert!(state.session().token().is_none());
    assert!(!state.guard().is_authenticated());
}

#[tokio::test]
async fn test_register_then_login() {
    let server = MockCampusApi::spawn().await;
    let state = state_for(&server);

    state
        .auth()
        .register("sam", "sam@campus.ac.uk", "Abc123!", "Abc123!")
        .await
        .unwrap();

    // Registration does not log in by itself.
    assert!(!state.guard().is_authenticated());

    state.auth().login("sam@campus.ac.uk", "Abc123!").await.unwrap();
    assert!(state.guard().is_authenticated());
}

#[tokio::test]
async fn test_register_duplicate_email_surfaces_server_message() {
    let server = MockCampusApi::spawn().await;
    server.seed_user("sam@campus.ac.uk", "Abc123!");
    let state = state_for(&server);

    let err = state
        .auth()
        .register("sam", "sam@campus.ac.uk", "Abc123!", "Abc123!")
        .await
        .unwrap_err();

    let AuthError::Gateway(GatewayError::Remote { status, message }) = err else {
        panic!("expected a remote rejection, got: {err}");
    };
    assert_eq!(status, 409);
    assert_eq!(message, "email already registered");
}

#[tokio::test]
async fn test_login_starts_with_an_empty_cart() {
    let server = MockCampusApi::spawn().await;
    server.seed_user("sam@campus.ac.uk", "Abc123!");
    let state = state_for(&server);

    state.auth().login("sam@campus.ac.uk", "Abc123!").await.unwrap();
    let menu = state.api().menu().await.unwrap();
    state.cart().add_item(menu.first().unwrap()).unwrap();
    assert!(!state.cart().is_empty());

    // Logging in again (fresh token, same person or not) never carries a
    // cart over.
    state.auth().login("sam@campus.ac.uk", "Abc123!").await.unwrap();
    assert!(state.cart().is_empty());
}

#[tokio::test]
async fn test_logout_clears_session_and_cart() {
    let server = MockCampusApi::spawn().await;
    server.seed_user("sam@campus.ac.uk", "Abc123!");
    let state = state_for(&server);

    state.auth().login("sam@campus.ac.uk", "Abc123!").await.unwrap();
    let menu = state.api().menu().await.unwrap();
    state.cart().add_item(menu.first().unwrap()).unwrap();

    state.auth().logout().unwrap();

    assert!(!state.guard().is_authenticated());
    assert!(state.cart().is_empty());
}
