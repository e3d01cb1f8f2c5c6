//! Line-level helpers for `key = value` configuration files.

/// What: Check if a line should be skipped (empty or comment).
///
/// Details:
/// - Skips empty lines and lines starting with `#`, `//`, or `;`
pub fn skip_comment_or_empty(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed.starts_with("//")
        || trimmed.starts_with(';')
}

/// What: Split a `key = value` line.
///
/// Output:
/// - `Some((key, value))` with the key lower-cased and `.`/`-`/spaces mapped
///   to `_`, and the value stripped of trailing comments; `None` without `=`.
pub fn parse_key_value(line: &str) -> Option<(String, String)> {
    let (raw_key, raw_value) = line.trim().split_once('=')?;
    let key = raw_key.trim().to_lowercase().replace(['.', '-', ' '], "_");
    if key.is_empty() {
        return None;
    }
    Some((key, strip_inline_comment(raw_value).to_string()))
}

/// Drop a trailing ` # ...` or ` // ...` comment.
fn strip_inline_comment(value: &str) -> &str {
    let mut end = value.len();
    for marker in [" #", "\t#", " //", "\t//"] {
        if let Some(i) = value.find(marker) {
            end = end.min(i);
        }
    }
    value[..end].trim()
}

/// What: Interpret a boolean setting.
///
/// Output:
/// - `Some(true)` for `true`/`1`/`yes`/`on`, `Some(false)` for
///   `false`/`0`/`no`/`off`, `None` otherwise.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
