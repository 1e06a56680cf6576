//! Refectory - campus food ordering from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Create an account, then log in
//! refectory register -u sam -e sam@campus.ac.uk -p 'Abc123!'
//! refectory login -e sam@campus.ac.uk -p 'Abc123!'
//!
//! # Browse and fill the cart
//! refectory menu
//! refectory cart add 3
//! refectory cart set 3 2
//! refectory cart show
//!
//! # Pay and review
//! refectory checkout
//! refectory orders
//! refectory logout
//! ```
//!
//! This binary is the view layer only: it renders the stores from
//! `refectory-client` and forwards user actions to them. Session-protected
//! commands pass through the session guard and print a login notice instead
//! of running when no session exists.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, Subcommand};

mod commands;

use refectory_client::api::GatewayError;
use refectory_client::checkout::CheckoutError;
use refectory_client::config::ClientConfig;
use refectory_client::error::AppError;
use refectory_client::services::auth::AuthError;
use refectory_client::state::AppState;

#[derive(Parser)]
#[command(name = "refectory")]
#[command(author, version, about = "Campus food ordering from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Register {
        /// Display name
        #[arg(short, long)]
        username: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (6-15 chars, upper/lower/digit/special)
        #[arg(short, long)]
        password: String,

        /// Password confirmation; defaults to the password itself
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Log in and start a session
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// End the session and clear the cart
    Logout,
    /// Show today's menu
    Menu,
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Show past orders
    Orders,
    /// Pay for the cart and place the order
    Checkout,
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a menu item
    Add {
        /// Menu item id (see `refectory menu`)
        item_id: i64,
    },
    /// Remove an item from the cart
    Remove {
        /// Menu item id
        item_id: i64,
    },
    /// Set an item's quantity (0 removes it)
    Set {
        /// Menu item id
        item_id: i64,
        /// New quantity
        quantity: u32,
    },
    /// Show the cart
    Show,
    /// Empty the cart
    Clear,
}

#[tokio::main]
async fn main() {
    // Initialize tracing; default to info for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "refectory_cli=info,refectory_client=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        if is_session_loss(e.as_ref()) {
            eprintln!("Your session has ended. Run `refectory login` to continue.");
        }
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let state = AppState::new(config)?;

    match cli.command {
        Commands::Register {
            username,
            email,
            password,
            confirm_password,
        } => {
            commands::auth::register(
                &state,
                &username,
                &email,
                &password,
                confirm_password.as_deref(),
            )
            .await?;
        }
        Commands::Login { email, password } => {
            commands::auth::login(&state, &email, &password).await?;
        }
        Commands::Logout => commands::auth::logout(&state)?,
        Commands::Menu => commands::menu::show(&state).await?,
        Commands::Cart { action } => match action {
            CartAction::Add { item_id } => commands::cart::add(&state, item_id).await?,
            CartAction::Remove { item_id } => commands::cart::remove(&state, item_id)?,
            CartAction::Set { item_id, quantity } => {
                commands::cart::set_quantity(&state, item_id, quantity)?;
            }
            CartAction::Show => commands::cart::show(&state)?,
            CartAction::Clear => commands::cart::clear(&state)?,
        },
        Commands::Orders => commands::orders::show(&state).await?,
        Commands::Checkout => commands::checkout::run(&state).await?,
    }
    Ok(())
}

/// Whether an error means the session is gone. The gateway has already torn
/// the token down and the cart store has cleared itself; the view's only job
/// is pointing the user back at login.
fn is_session_loss(error: &(dyn std::error::Error + 'static)) -> bool {
    let gateway = if let Some(e) = error.downcast_ref::<GatewayError>() {
        Some(e)
    } else if let Some(e) = error.downcast_ref::<AuthError>() {
        match e {
            AuthError::Gateway(e) => Some(e),
            _ => None,
        }
    } else if let Some(e) = error.downcast_ref::<CheckoutError>() {
        match e {
            CheckoutError::Gateway(e) => Some(e),
            _ => None,
        }
    } else if let Some(e) = error.downcast_ref::<AppError>() {
        match e {
            AppError::Gateway(e)
            | AppError::Auth(AuthError::Gateway(e))
            | AppError::Checkout(CheckoutError::Gateway(e)) => Some(e),
            _ => None,
        }
    } else {
        None
    };

    matches!(
        gateway,
        Some(GatewayError::NoSession | GatewayError::Unauthorized)
    )
}
