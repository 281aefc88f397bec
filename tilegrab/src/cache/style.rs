//! Style names as used in cache paths.

use std::sync::OnceLock;

use regex::Regex;

/// Characters that may not appear in a sanitized style name.
fn disallowed() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").unwrap())
}

/// Turns a display name into a single safe path component.
///
/// Spaces become `-` and every other character outside `[A-Za-z0-9_-]` is
/// removed, so `"Open Street Map"` is stored under `Open-Street-Map` and
/// `"../etc"` under `etc`.
pub fn sanitize_style_name(name: &str) -> String {
    let dashed: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    disallowed().replace_all(&dashed, "").into_owned()
}
