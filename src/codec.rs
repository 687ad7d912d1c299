//! Filename/password codec for the `name{{password}}.nzb` convention.
//!
//! NZB files circulating with an archive password often carry it embedded in
//! the filename between double braces, e.g. `release{{s3cret}}.nzb`. This
//! module decodes that convention into a `(base name, password)` pair and
//! encodes it back. Decoding never fails: a filename without the pattern
//! simply yields an empty password.

use std::sync::OnceLock;

use regex::Regex;

/// Matches `<name>{{<password>}}.nzb` against a base filename.
///
/// The password capture is greedy and requires at least one character; the
/// brace markers are literal and case-sensitive.
fn password_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.*)\{\{(.+)\}\}\.nzb$").expect("filename password pattern is valid")
    })
}

/// Splits an NZB filename into its base name and embedded password.
///
/// Returns `(base_name, password)`. When the `{{password}}` suffix is absent
/// the password is empty and a trailing `.nzb` extension (any case) is
/// stripped from the name.
pub fn decode(filename: &str) -> (String, String) {
    if let Some(captures) = password_pattern().captures(filename) {
        let base_name = captures[1].to_string();
        let password = captures[2].to_string();
        return (base_name, password);
    }

    let base_name = strip_nzb_extension(filename);
    (base_name.to_string(), String::new())
}

/// Builds an NZB filename from a base name and password.
///
/// A non-empty password is appended as `{{password}}` before the `.nzb`
/// extension. This is the exact inverse of [`decode`] for any password that
/// does not contain the closing marker `}}`.
pub fn encode(base_name: &str, password: &str) -> String {
    if password.is_empty() {
        format!("{base_name}.nzb")
    } else {
        format!("{base_name}{{{{{password}}}}}.nzb")
    }
}

/// Removes a trailing `.nzb` extension, matched case-insensitively.
fn strip_nzb_extension(filename: &str) -> &str {
    let len = filename.len();
    if len >= 4 && filename.is_char_boundary(len - 4) && filename[len - 4..].eq_ignore_ascii_case(".nzb")
    {
        &filename[..len - 4]
    } else {
        filename
    }
}
