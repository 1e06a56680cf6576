//! Request and response bodies for the campus backend API.

use serde::{Deserialize, Serialize};

use refectory_core::{MenuItem, MenuItemId, Order, OrderId, PaypalOrderId};

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MenuResponse {
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Order>,
}

/// One cart line as submitted at checkout: id and quantity only. Prices
/// never travel client to server; the backend's menu is authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemInput {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
}

/// Response to a create-order call: the backend's order ID plus the
/// processor order token minted for this attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderResponse {
    pub order_id: OrderId,
    pub paypal_order_id: PaypalOrderId,
}

#[derive(Debug, Serialize)]
pub(crate) struct CaptureOrderRequest<'a> {
    pub paypal_order_id: &'a str,
    pub order_id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaptureOrderResponse {
    #[serde(default)]
    pub success: bool,
}

/// Error envelope the backend uses on non-success responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}
