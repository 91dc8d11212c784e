//! C7: text sanitisation, length caps, forbidden-property rejection, and
//! file-path safety.

use crate::error::EngineError;

const FORBIDDEN_PROPERTIES: &[&str] = &["__proto__", "prototype", "constructor"];

/// Strip control characters (`\x00..\x1F`, `\x7F`) — notably newlines —
/// from a string. The anti-JSONL-injection guarantee: nothing
/// stored or templated downstream can smuggle a raw newline.
pub fn sanitize(text: &str) -> String {
    text.chars().filter(|c| !is_control_char(*c)).collect()
}

fn is_control_char(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1F}' | '\u{7F}')
}

/// Validate and sanitize caller-supplied thought text. Returns the cleaned
/// text or a `Validation` error.
pub fn validate_text(text: &str, max_length: usize) -> Result<String, EngineError> {
    let cleaned = sanitize(text);
    if cleaned.trim().is_empty() {
        return Err(EngineError::validation("text is empty after sanitisation"));
    }
    if cleaned.chars().count() > max_length {
        return Err(EngineError::validation(format!(
            "text exceeds max_length ({max_length})"
        )));
    }
    let normalized = cleaned.trim().to_lowercase();
    if FORBIDDEN_PROPERTIES.contains(&normalized.as_str()) {
        return Err(EngineError::validation(format!(
            "text matches a forbidden property name: {normalized}"
        )));
    }
    Ok(cleaned)
}

/// Reject path traversal and absolute system paths for any caller-supplied
/// persistence path.
pub fn validate_file_path(path: &str) -> Result<(), EngineError> {
    if path.contains("..") {
        return Err(EngineError::security("path traversal is not permitted"));
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(EngineError::security("absolute paths are not permitted"));
    }
    Ok(())
}
