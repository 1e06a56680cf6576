//! Cart management.

use refectory_core::MenuItemId;

use super::{format_price, require_session};
use refectory_client::state::AppState;

/// Add one unit of a menu item, resolving it from the current menu.
pub async fn add(state: &AppState, item_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    if !require_session(state) {
        return Ok(());
    }

    let id = MenuItemId::new(item_id);
    let menu = state.api().menu().await?;
    let Some(item) = menu.iter().find(|item| item.id == id) else {
        println!("No menu item with id {item_id}. See `refectory menu`.");
        return Ok(());
    };
    if !item.is_available {
        println!("{} is currently sold out.", item.name);
        return Ok(());
    }

    state.cart().add_item(item)?;
    println!(
        "Added {}. Cart: {} item(s), {}.",
        item.name,
        state.cart().count(),
        format_price(state, state.cart().total())
    );
    Ok(())
}

/// Remove an item from the cart.
pub fn remove(state: &AppState, item_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    if !require_session(state) {
        return Ok(());
    }
    state.cart().remove_item(MenuItemId::new(item_id))?;
    show(state)
}

/// Set an item's quantity; 0 removes the line.
pub fn set_quantity(
    state: &AppState,
    item_id: i64,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if !require_session(state) {
        return Ok(());
    }
    state.cart().set_quantity(MenuItemId::new(item_id), quantity)?;
    show(state)
}

/// Print the cart.
pub fn show(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    if !require_session(state) {
        return Ok(());
    }

    let lines = state.cart().lines();
    if lines.is_empty() {
        println!("Your cart is empty.");
        return Ok(());
    }

    println!("Your cart:");
    for line in &lines {
        println!(
            "  [{}] {:<30} x{:<3} {}",
            line.id,
            line.name,
            line.quantity,
            format_price(state, line.line_total())
        );
    }
    println!("Total: {}", format_price(state, state.cart().total()));
    Ok(())
}

/// Empty the cart.
pub fn clear(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    if !require_session(state) {
        return Ok(());
    }
    state.cart().clear()?;
    println!("Cart cleared.");
    Ok(())
}
