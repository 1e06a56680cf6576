//! Checkout flow.
//!
//! Drives one checkout attempt end to end: create the remote order, wait for
//! the user to approve the payment out-of-band, then capture. The approval
//! confirmation read from stdin is the view-layer stand-in for the payment
//! processor's approval callback.

use std::io::Write;

use refectory_core::PaypalOrderId;

use super::{format_price, require_session};
use refectory_client::checkout::CheckoutAttempt;
use refectory_client::state::AppState;

/// Run the checkout flow for the current cart.
pub async fn run(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    if !require_session(state) {
        return Ok(());
    }

    let cart = state.cart();
    let lines = cart.lines();
    if lines.is_empty() {
        println!("Your cart is empty. Add items with `refectory cart add <item-id>`.");
        return Ok(());
    }

    println!("Order summary:");
    for line in &lines {
        println!(
            "  {:<30} x{:<3} {}",
            line.name,
            line.quantity,
            format_price(state, line.line_total())
        );
    }
    println!("Total: {}", format_price(state, cart.total()));

    let checkout = state.checkout();
    let mut attempt = CheckoutAttempt::new();

    let paypal_order_id = checkout.create_remote_order(&mut attempt).await?;

    if let Some(client_id) = &state.config().paypal_client_id {
        println!("PayPal client: {client_id}");
    }
    println!("Processor order token: {paypal_order_id}");
    print!("Approve the payment in your PayPal window, then press Enter to confirm (or paste the approved token): ");
    std::io::stdout().flush()?;

    let approved = read_approval(&paypal_order_id)?;
    match checkout.approve_payment(&mut attempt, &approved).await {
        Ok(order_id) => {
            println!("Payment captured. Order #{order_id} placed - see you at pickup.");
            Ok(())
        }
        Err(e) => {
            // The cart is untouched on failure; a retry starts a fresh attempt.
            println!("Checkout failed: {e}");
            println!("Your cart is unchanged; run `refectory checkout` to try again.");
            Err(e.into())
        }
    }
}

/// Read the approved processor token from stdin. An empty line confirms the
/// token from this attempt.
fn read_approval(created: &PaypalOrderId) -> Result<PaypalOrderId, std::io::Error> {
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Ok(created.clone())
    } else {
        Ok(PaypalOrderId::new(trimmed))
    }
}
