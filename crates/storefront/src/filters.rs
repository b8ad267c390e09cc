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

/// Version of the files under `static/`, computed at build time.
///
/// Usage in templates: `{{ ""|static_version }}`
#[askama::filter_fn]
pub fn static_version(
    _value: impl Display,
    _env: &dyn askama::Values,
) -> askama::Result<&'static str> {
    Ok(env!("STATIC_VERSION"))
}
