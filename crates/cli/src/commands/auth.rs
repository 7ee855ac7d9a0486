//! Account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an account (logs in on success)
//! ecomai register --name "Ana Pérez" --email ana@example.com --password s3cret!
//!
//! # Log in with a password
//! ECOMAI_PASSWORD=s3cret! ecomai login --email ana@example.com
//!
//! # Forget the stored token
//! ecomai logout
//! ```

use ecomai_core::Email;
use secrecy::SecretString;

use super::Context;
use crate::error::CliError;

/// Shortest password the registration form accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Parse an email argument.
///
/// # Errors
///
/// Returns error if the address is malformed.
pub fn parse_email(raw: &str) -> Result<Email, CliError> {
    Email::parse(raw).map_err(|e| CliError::invalid("email", e))
}

/// Log in with a password.
///
/// # Errors
///
/// Returns the server message when the credentials are rejected.
pub async fn login(ctx: &Context, email: &str, password: String) -> Result<(), CliError> {
    let email = parse_email(email)?;
    ctx.shop.login(&email, &SecretString::from(password)).await?;
    tracing::info!(
        email = %email,
        token_file = %ctx.shop.tokens().path().display(),
        "Logged in"
    );
    Ok(())
}

/// Create an account and log in.
///
/// # Errors
///
/// Returns error on invalid input or when the backend refuses the account.
pub async fn register(
    ctx: &Context,
    full_name: &str,
    email: &str,
    password: String,
) -> Result<(), CliError> {
    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err(CliError::invalid("name", "must not be empty"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CliError::invalid(
            "password",
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    let email = parse_email(email)?;

    ctx.shop
        .register(full_name, &email, &SecretString::from(password))
        .await?;
    tracing::info!(email = %email, "Account created");
    Ok(())
}

/// Forget the stored token. Succeeds when already logged out.
///
/// # Errors
///
/// Returns error if the token file cannot be removed.
pub async fn logout(ctx: &Context) -> Result<(), CliError> {
    ctx.shop.logout().await?;
    tracing::info!("Logged out");
    Ok(())
}
