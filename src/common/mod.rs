//! Common utilities shared by the loaders, the dispatcher and the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};

/// Normalize a raw cell value: trimmed, with empty meaning absent
pub fn normalize_cell(raw: &str) -> String {
    raw.trim().to_string()
}

/// Interpret a boolean-like cell ("yes" enables, case-insensitive)
pub fn is_yes(flag: &str) -> bool {
    flag.trim().eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("yes"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("no"));
        assert!(!is_yes(""));
        assert!(!is_yes("y"));
    }

    #[test]
    fn test_normalize_cell() {
        assert_eq!(normalize_cell("  GET \n"), "GET");
        assert_eq!(normalize_cell("   "), "");
    }
}
