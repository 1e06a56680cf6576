//! Integration test harness for Refectory.
//!
//! [`MockCampusApi`] is an in-process implementation of the campus backend
//! API - the six endpoints the ordering client speaks - bound to an
//! ephemeral port. It recomputes order totals from its own menu (clients
//! submit ids and quantities only) and offers fault injection for the
//! scenarios the client must survive: expired sessions and declined
//! captures.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p refectory-integration-tests
//! ```

#![allow(clippy::expect_used)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use uuid::Uuid;

use refectory_client::config::ClientConfig;
use refectory_core::{MenuItem, MenuItemId, Order, OrderId, OrderItem, OrderStatus, UserId};

type SharedState = Arc<Mutex<BackendState>>;

struct SeededUser {
    username: String,
    password: String,
}

struct BackendState {
    users: HashMap<String, SeededUser>,
    tokens: HashSet<String>,
    menu: Vec<MenuItem>,
    orders: Vec<Order>,
    /// Pending processor orders: token -> backend order id.
    paypal_orders: HashMap<String, OrderId>,
    next_order_id: i64,
    fail_next_capture: bool,
    menu_requests: u64,
    capture_requests: u64,
}

impl BackendState {
    fn new() -> Self {
        Self {
            users: HashMap::new(),
            tokens: HashSet::new(),
            menu: default_menu(),
            orders: Vec::new(),
            paypal_orders: HashMap::new(),
            next_order_id: 1,
            fail_next_capture: false,
            menu_requests: 0,
            capture_requests: 0,
        }
    }
}

fn menu_item(id: i64, name: &str, price: Decimal, is_available: bool) -> MenuItem {
    MenuItem {
        id: MenuItemId::new(id),
        name: name.to_owned(),
        description: String::new(),
        price,
        category: "mains".to_owned(),
        image_url: None,
        is_available,
        created_at: None,
    }
}

fn default_menu() -> Vec<MenuItem> {
    vec![
        menu_item(1, "Flat White", Decimal::new(250, 2), true),
        menu_item(2, "Bakewell Slice", Decimal::new(100, 2), true),
        menu_item(3, "Falafel Wrap", Decimal::new(475, 2), true),
        menu_item(4, "Haggis Roll", Decimal::new(320, 2), false),
    ]
}

/// In-process mock of the campus backend API.
pub struct MockCampusApi {
    addr: SocketAddr,
    state: SharedState,
    server: JoinHandle<()>,
}

impl MockCampusApi {
    /// Bind to an ephemeral port and start serving.
    pub async fn spawn() -> Self {
        let state: SharedState = Arc::new(Mutex::new(BackendState::new()));
        let app = router(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock backend");
        let addr = listener.local_addr().expect("mock backend has no address");

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock backend crashed");
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL clients should point at.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A client configuration pointing at this mock. Tests that need
    /// file-backed storage override `data_dir`.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base_url: self
                .base_url()
                .parse()
                .expect("mock base url is not a valid URL"),
            data_dir: std::env::temp_dir(),
            currency_symbol: "£".to_owned(),
            paypal_client_id: None,
        }
    }

    /// Register a user without going through the HTTP endpoint.
    pub fn seed_user(&self, email: &str, password: &str) {
        let username = email.split('@').next().unwrap_or(email).to_owned();
        self.state.lock().users.insert(
            email.to_owned(),
            SeededUser {
                username,
                password: password.to_owned(),
            },
        );
    }

    /// Invalidate every issued token; the next authenticated call sees 401.
    pub fn expire_sessions(&self) {
        self.state.lock().tokens.clear();
    }

    /// Make the next capture call report `success: false`.
    pub fn fail_next_capture(&self) {
        self.state.lock().fail_next_capture = true;
    }

    /// Number of menu fetches that reached the backend.
    #[must_use]
    pub fn menu_requests(&self) -> u64 {
        self.state.lock().menu_requests
    }

    /// Number of capture calls that reached the backend.
    #[must_use]
    pub fn capture_requests(&self) -> u64 {
        self.state.lock().capture_requests
    }

    /// Status of a backend order, if it exists.
    #[must_use]
    pub fn order_status(&self, order_id: OrderId) -> Option<OrderStatus> {
        self.state
            .lock()
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .map(|order| order.status)
    }

    /// Server-side total of a backend order, if it exists.
    #[must_use]
    pub fn order_total(&self, order_id: OrderId) -> Option<Decimal> {
        self.state
            .lock()
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .map(|order| order.total_amount)
    }
}

impl Drop for MockCampusApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/public/v1/login", post(login))
        .route("/api/public/v1/user", post(register))
        .route("/api/authenticated/v1/menu", get(menu))
        .route("/api/authenticated/v1/orders", get(orders))
        .route("/api/authenticated/v1/paypal/create-order", post(create_order))
        .route("/api/authenticated/v1/paypal/capture-order", post(capture_order))
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

/// Check the verbatim `Authorization` header against issued tokens.
fn authorize(state: &BackendState, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if token.is_empty() || !state.tokens.contains(token) {
        return Err(error_response(StatusCode::UNAUTHORIZED, "unauthorized"));
    }
    Ok(())
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<SharedState>,
    Json(body): Json<LoginBody>,
) -> impl IntoResponse {
    let mut state = state.lock();
    let valid = state
        .users
        .get(&body.email)
        .is_some_and(|user| user.password == body.password);
    if !valid {
        return error_response(StatusCode::UNAUTHORIZED, "invalid credentials");
    }

    let token = format!("tok-{}", Uuid::new_v4());
    state.tokens.insert(token.clone());
    (StatusCode::OK, Json(json!({ "token": token })))
}

#[derive(Deserialize)]
struct RegisterBody {
    username: String,
    email: String,
    password: String,
}

async fn register(
    State(state): State<SharedState>,
    Json(body): Json<RegisterBody>,
) -> impl IntoResponse {
    let mut state = state.lock();
    if state.users.contains_key(&body.email) {
        return error_response(StatusCode::CONFLICT, "email already registered");
    }
    state.users.insert(
        body.email,
        SeededUser {
            username: body.username,
            password: body.password,
        },
    );
    (StatusCode::OK, Json(json!({})))
}

async fn menu(State(state): State<SharedState>, headers: HeaderMap) -> impl IntoResponse {
    let mut state = state.lock();
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    state.menu_requests += 1;
    (StatusCode::OK, Json(json!({ "items": &state.menu })))
}

async fn orders(State(state): State<SharedState>, headers: HeaderMap) -> impl IntoResponse {
    let state = state.lock();
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": &state.orders })),
    )
}

#[derive(Deserialize)]
struct CreateOrderBody {
    items: Vec<CreateOrderItem>,
}

#[derive(Deserialize)]
struct CreateOrderItem {
    menu_item_id: i64,
    quantity: u32,
}

async fn create_order(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<CreateOrderBody>,
) -> impl IntoResponse {
    let mut state = state.lock();
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }

    if body.items.is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "no items");
    }

    // Prices come from the backend's own menu; clients are never trusted
    // with amounts.
    let mut total = Decimal::ZERO;
    let mut order_items = Vec::new();
    let order_id = OrderId::new(state.next_order_id);
    for item in &body.items {
        let id = MenuItemId::new(item.menu_item_id);
        let Some(menu_item) = state.menu.iter().find(|m| m.id == id) else {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "unknown menu item");
        };
        if !menu_item.is_available {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "item unavailable");
        }
        if item.quantity < 1 {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, "invalid quantity");
        }
        let subtotal = menu_item.price * Decimal::from(item.quantity);
        total += subtotal;
        order_items.push(OrderItem {
            id: i64::try_from(order_items.len()).unwrap_or(0) + 1,
            order_id,
            menu_item_id: id,
            quantity: item.quantity,
            unit_price: menu_item.price,
            subtotal,
            name: menu_item.name.clone(),
        });
    }

    state.next_order_id += 1;
    state.orders.push(Order {
        id: order_id,
        user_id: UserId::new(1),
        total_amount: total,
        status: OrderStatus::Pending,
        created_at: Utc::now(),
        items: order_items,
    });

    let paypal_order_id = format!("PP-{}", Uuid::new_v4());
    state
        .paypal_orders
        .insert(paypal_order_id.clone(), order_id);

    (
        StatusCode::OK,
        Json(json!({
            "order_id": order_id,
            "paypal_order_id": paypal_order_id,
        })),
    )
}

#[derive(Deserialize)]
struct CaptureOrderBody {
    paypal_order_id: String,
    order_id: i64,
}

async fn capture_order(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<CaptureOrderBody>,
) -> impl IntoResponse {
    let mut state = state.lock();
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    state.capture_requests += 1;

    if state.fail_next_capture {
        state.fail_next_capture = false;
        return (StatusCode::OK, Json(json!({ "success": false })));
    }

    let expected = state.paypal_orders.get(&body.paypal_order_id).copied();
    if expected != Some(OrderId::new(body.order_id)) {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "unknown paypal order");
    }

    state.paypal_orders.remove(&body.paypal_order_id);
    if let Some(order) = state
        .orders
        .iter_mut()
        .find(|order| order.id == OrderId::new(body.order_id))
    {
        order.status = OrderStatus::Paid;
    }

    (StatusCode::OK, Json(json!({ "success": true })))
}
