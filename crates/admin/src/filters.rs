//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Longest preview shown in list tables, in characters.
const EXCERPT_CHARS: usize = 120;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Shortens long text for table cells, ending cut text with an ellipsis.
///
/// Usage in templates: `{{ message.message|excerpt }}`
#[askama::filter_fn]
pub fn excerpt(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(shorten(&value.to_string(), EXCERPT_CHARS))
}

fn shorten(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("  short  ", 10), "short");
        assert_eq!(shorten("exactly ten", 11), "exactly ten");
        assert_eq!(shorten("a long sentence here", 7), "a long…");
    }
}
