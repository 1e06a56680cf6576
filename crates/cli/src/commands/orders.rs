//! Order history listing.

use super::{format_price, require_session};
use refectory_client::state::AppState;

/// Print the user's past orders.
pub async fn show(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    if !require_session(state) {
        return Ok(());
    }

    let orders = state.api().orders().await?;
    if orders.is_empty() {
        println!("No orders found.");
        return Ok(());
    }

    println!("My orders:");
    for order in &orders {
        println!(
            "  Order #{} - {} - {} - {}",
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.status,
            format_price(state, order.total_amount)
        );
        for item in &order.items {
            println!(
                "      {} x{} @ {} = {}",
                item.name,
                item.quantity,
                format_price(state, item.unit_price),
                format_price(state, item.subtotal)
            );
        }
    }
    Ok(())
}
