//! Filename character validation.
//!
//! Passwords and titles are free-form strings inside NZB metadata, but once a
//! value is headed into a filename it must not contain characters that are
//! illegal in filesystem names. The denylist is the Windows reserved set,
//! which is a superset of what Unix filesystems reject.

use std::sync::OnceLock;

use regex::Regex;

/// Matches any character that is illegal in a filename: `\ / : * ? " < > |`.
fn invalid_character_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("denylist pattern is valid"))
}

/// Returns true if the value is safe to place into a filename.
///
/// The empty string is valid. This check applies only to values about to
/// become part of a filename; metadata-only values are never restricted.
pub fn is_valid_filename(value: &str) -> bool {
    !invalid_character_pattern().is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_values_are_valid() {
        assert!(is_valid_filename("Movie Title"));
        assert!(is_valid_filename("release.2024"));
        assert!(is_valid_filename("under_score-dash"));
    }

    #[test]
    fn test_empty_string_is_valid() {
        assert!(is_valid_filename(""));
    }

    #[test]
    fn test_each_denylisted_character_is_rejected() {
        for ch in ['\\', '/', ':', '*', '?', '"', '<', '>', '|'] {
            let value = format!("bad{ch}name");
            assert!(!is_valid_filename(&value), "expected '{value}' to be invalid");
        }
    }

    #[test]
    fn test_braces_and_spaces_are_allowed() {
        assert!(is_valid_filename("name {{with}} braces"));
    }
}
