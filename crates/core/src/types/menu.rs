//! Menu item wire type.
//!
//! Matches the JSON emitted by `GET /api/authenticated/v1/menu`. The backend
//! serializes a handful of fields in camelCase, hence the renames.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::MenuItemId;

/// A food item available for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Backend-assigned item ID.
    pub id: MenuItemId,
    /// Display name.
    pub name: String,
    /// Longer description shown on the item card.
    #[serde(default)]
    pub description: String,
    /// Unit price. The backend sends a plain JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Menu category (e.g. "mains", "drinks").
    #[serde(default)]
    pub category: String,
    /// Image URL, if the item has one.
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    /// Whether the item can currently be ordered.
    #[serde(rename = "isAvailable")]
    pub is_available: bool,
    /// When the item was added to the menu.
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_backend_json() {
        let json = r#"{
            "id": 4,
            "name": "Falafel Wrap",
            "description": "With pickled red cabbage",
            "price": 4.75,
            "category": "mains",
            "imageUrl": "https://cdn.example.com/falafel.jpg",
            "isAvailable": true,
            "createdAt": "2026-01-12T09:30:00Z"
        }"#;

        let item: MenuItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, MenuItemId::new(4));
        assert_eq!(item.price, Decimal::new(475, 2));
        assert!(item.is_available);
        assert_eq!(
            item.image_url.as_deref(),
            Some("https://cdn.example.com/falafel.jpg")
        );
    }

    #[test]
    fn test_deserialize_minimal_json() {
        // Optional fields may be absent entirely.
        let json = r#"{"id": 1, "name": "Tea", "price": 1.2, "isAvailable": false}"#;
        let item: MenuItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.price, Decimal::new(12, 1));
        assert!(!item.is_available);
        assert!(item.image_url.is_none());
        assert!(item.created_at.is_none());
    }
}
