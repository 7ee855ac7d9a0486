//! Shopping assistant command.

use std::io::Write;

use super::Context;
use crate::error::CliError;

/// Context sent when none is given on the command line.
pub const DEFAULT_CONTEXT: &str = "The shopper is using the terminal client of the store.";

/// Ask the assistant one question and print the answer.
///
/// Assistant failures print the fixed apology instead of failing.
///
/// # Errors
///
/// Returns error on an empty message or when the answer cannot be written.
pub async fn ask(
    ctx: &Context,
    message: &str,
    context: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(CliError::invalid("message", "must not be empty"));
    }
    let context = context
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CONTEXT);

    let answer = ctx.chat.reply(message, context).await;
    writeln!(out, "{answer}")?;
    Ok(())
}
