//! Login, registration, and logout.

use refectory_client::state::AppState;

/// Register a new account. A missing confirmation repeats the password, for
/// one-line usage.
pub async fn register(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
    confirm_password: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let confirm = confirm_password.unwrap_or(password);
    state
        .auth()
        .register(username, email, password, confirm)
        .await?;
    println!("Account created for {email}. Log in with `refectory login`.");
    Ok(())
}

/// Log in and start a session. The cart always starts empty.
pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    state.auth().login(email, password).await?;
    println!("Logged in as {email}.");
    Ok(())
}

/// End the session and clear the cart.
pub fn logout(state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    state.auth().logout()?;
    println!("Logged out.");
    Ok(())
}
