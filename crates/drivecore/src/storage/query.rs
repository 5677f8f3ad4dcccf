//! Drive search query construction
//!
//! Folder names are user text. Inside a Drive query string literal a
//! single quote and a backslash must be escaped with a backslash, so the
//! exact-name match holds for any name, including empty ones.

use super::FOLDER_MIME_TYPE;

/// Escapes `value` for use inside a single-quoted query literal.
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '\\' || ch == '\'' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Query matching non-trashed folders named exactly `name`.
pub fn folder_by_name(name: &str) -> String {
    format!(
        "name='{}' and mimeType='{}' and trashed=false",
        escape_literal(name),
        FOLDER_MIME_TYPE
    )
}
