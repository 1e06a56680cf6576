//! Menu listing.

use super::{format_price, require_session};
use refectory_client::state::AppState;

/// Print today's menu.
pub async fn show(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    if !require_session(state) {
        return Ok(());
    }

    let items = state.api().menu().await?;
    if items.is_empty() {
        println!("The menu is empty right now. Check back later.");
        return Ok(());
    }

    println!("Today's menu:");
    for item in items.iter() {
        let marker = if item.is_available { "" } else { "  (sold out)" };
        println!(
            "  [{}] {:<30} {}{marker}",
            item.id,
            item.name,
            format_price(state, item.price)
        );
        if !item.description.is_empty() {
            println!("      {}", item.description);
        }
    }
    Ok(())
}
