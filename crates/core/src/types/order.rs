//! Order history wire types.
//!
//! Matches the JSON emitted by `GET /api/authenticated/v1/orders`. Orders are
//! created and owned by the backend; the client only observes them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{MenuItemId, OrderId, UserId};
use super::status::OrderStatus;

/// A food order placed by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Backend-assigned order ID.
    pub id: OrderId,
    /// Owning user.
    pub user_id: UserId,
    /// Authoritative total, computed server-side.
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    /// Current order status.
    pub status: OrderStatus,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
    /// Line items, included when the backend expands them.
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// An individual item within an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Backend-assigned line ID.
    pub id: i64,
    /// Order this line belongs to.
    pub order_id: OrderId,
    /// Menu item ordered.
    pub menu_item_id: MenuItemId,
    /// Quantity ordered.
    pub quantity: u32,
    /// Unit price the backend charged.
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    /// Line subtotal the backend charged.
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    /// Item name snapshot.
    #[serde(default)]
    pub name: String,
}
