//! Command implementations: thin views over `refectory-client`.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod menu;
pub mod orders;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use refectory_client::guard::RouteOutcome;
use refectory_client::state::AppState;

/// Gate a protected command on session presence. Prints the login notice
/// and returns `false` when no session exists.
pub(crate) fn require_session(state: &AppState) -> bool {
    match state.guard().require_session(()) {
        RouteOutcome::Render(()) => true,
        RouteOutcome::RedirectToLogin => {
            println!("You are not logged in. Run `refectory login` first.");
            false
        }
    }
}

/// Format a price with the configured currency symbol.
pub(crate) fn format_price(state: &AppState, amount: Decimal) -> String {
    let symbol = &state.config().currency_symbol;
    amount.to_f64().map_or_else(
        || format!("{symbol}{amount}"),
        |value| format!("{symbol}{value:.2}"),
    )
}
