//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shortens a product description for list cards.
///
/// Usage in templates: `{{ description|excerpt }}`
#[askama::filter_fn]
pub fn excerpt(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    const MAX_CHARS: usize = 120;

    let text = value.to_string();
    if text.chars().count() <= MAX_CHARS {
        return Ok(text);
    }
    let cut: String = text.chars().take(MAX_CHARS).collect();
    Ok(format!("{}…", cut.trim_end()))
}
