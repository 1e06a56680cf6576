//! Cart line type.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::MenuItemId;
use super::menu::MenuItem;

/// One menu item and its requested quantity within the active cart.
///
/// Lines are keyed by `id`; the cart store guarantees ids stay unique and
/// quantities stay at least 1. A line whose quantity would drop below 1 is
/// removed rather than stored at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Menu item this line refers to.
    pub id: MenuItemId,
    /// Item name, carried for display without re-fetching the menu.
    pub name: String,
    /// Unit price at the time the item was added. Display only - the backend
    /// recomputes authoritative totals at checkout.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Requested quantity, always >= 1.
    pub quantity: u32,
    /// Availability at the time the item was added.
    pub is_available: bool,
    /// Image URL, if the item has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Item description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CartLine {
    /// Price times quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

impl From<&MenuItem> for CartLine {
    fn from(item: &MenuItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            price: item.price,
            quantity: 1,
            is_available: item.is_available,
            image_url: item.image_url.clone(),
            description: if item.description.is_empty() {
                None
            } else {
                Some(item.description.clone())
            },
        }
    }
}
