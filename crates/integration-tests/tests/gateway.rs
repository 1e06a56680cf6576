//! Gateway behavior: 401 teardown ordering, error extraction, caching.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use refectory_client::api::GatewayError;
use refectory_client::state::AppState;
use refectory_client::storage::{MemoryStorage, Storage};
use refectory_integration_tests::MockCampusApi;

fn shared_storage() -> Arc<MemoryStorage> {
    Arc::new(MemoryStorage::new())
}

#[tokio::test]
async fn test_unauthorized_destroys_session_and_cart_regardless_of_endpoint() {
    let server = MockCampusApi::spawn().await;
    server.seed_user("sam@campus.ac.uk", "Abc123!");
    let storage = shared_storage();
    let state = AppState::with_storage(
        server.client_config(),
        Arc::clone(&storage) as Arc<dyn Storage>,
    );

    state.auth().login("sam@campus.ac.uk", "Abc123!").await.unwrap();
    let menu = state.api().menu().await.unwrap();
    state.cart().add_item(menu.first().unwrap()).unwrap();

    let token = state.session().token().unwrap();
    let cart_storage_key = format!("cart.{}", token.fingerprint());
    assert!(storage.get(&cart_storage_key).is_some());

    // The backend invalidates the token; the next authenticated call - the
    // orders endpoint here, but any would do - triggers teardown.
    server.expire_sessions();
    let err = state.api().orders().await.unwrap_err();
    assert!(matches!(err, GatewayError::Unauthorized));

    // Token destruction happened before the error surfaced.
    assert!(state.session().token().is_none());

    // The cart store reacts within one event cycle: memory and persisted
    // snapshot are both gone.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(state.cart().is_empty());
    assert!(storage.get(&cart_storage_key).is_none());
}

#[tokio::test]
async fn test_no_session_fails_without_network_call() {
    let server = MockCampusApi::spawn().await;
    let state = AppState::with_storage(server.client_config(), shared_storage());

    let err = state.api().menu().await.unwrap_err();
    assert!(matches!(err, GatewayError::NoSession));
    // The request never reached the backend.
    assert_eq!(server.menu_requests(), 0);
}

#[tokio::test]
async fn test_remote_error_carries_server_message() {
    let server = MockCampusApi::spawn().await;
    server.seed_user("sam@campus.ac.uk", "Abc123!");
    let state = AppState::with_storage(server.client_config(), shared_storage());
    state.auth().login("sam@campus.ac.uk", "Abc123!").await.unwrap();

    // An empty create-order is rejected by the backend with an error body.
    let err = state.api().create_order(Vec::new()).await.unwrap_err();
    let GatewayError::Remote { status, message } = err else {
        panic!("expected Remote, got: {err}");
    };
    assert_eq!(status, 422);
    assert_eq!(message, "no items");

    // Non-401 errors do not disturb the session.
    assert!(state.session().token().is_some());
}

#[tokio::test]
async fn test_menu_is_cached_between_calls() {
    let server = MockCampusApi::spawn().await;
    server.seed_user("sam@campus.ac.uk", "Abc123!");
    let state = AppState::with_storage(server.client_config(), shared_storage());
    state.auth().login("sam@campus.ac.uk", "Abc123!").await.unwrap();

    let first = state.api().menu().await.unwrap();
    let second = state.api().menu().await.unwrap();

    assert_eq!(first.len(), second.len());
    assert_eq!(server.menu_requests(), 1);
}

#[tokio::test]
async fn test_menu_lists_unavailable_items_as_unavailable() {
    let server = MockCampusApi::spawn().await;
    server.seed_user("sam@campus.ac.uk", "Abc123!");
    let state = AppState::with_storage(server.client_config(), shared_storage());
    state.auth().login("sam@campus.ac.uk", "Abc123!").await.unwrap();

    let menu = state.api().menu().await.unwrap();
    let sold_out = menu.iter().find(|item| !item.is_available).unwrap();
    assert_eq!(sold_out.name, "Haggis Roll");
}
