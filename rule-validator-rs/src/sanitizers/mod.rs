//! Value coercion utilities
//!
//! Building blocks for the `sanitize` step of the type handlers and for the
//! input adapter's text preparation. Text sanitizers report whether they
//! changed anything so callers can log it.

pub mod date;
pub mod number;
pub mod text;

pub use date::*;
pub use number::*;
pub use text::*;

/// Sanitization result containing the sanitized content and information
/// about whether changes were made during sanitization
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizeResult<T> {
    /// Sanitized content
    pub sanitized: T,
    /// Whether any changes were made during sanitization
    pub was_modified: bool,
    /// Optional details about what was modified
    pub details: Option<String>,
}

impl<T> SanitizeResult<T> {
    /// Create a result with unmodified content
    pub fn unmodified(content: T) -> Self {
        Self {
            sanitized: content,
            was_modified: false,
            details: None,
        }
    }

    /// Create a result with modified content
    pub fn modified(content: T, details: Option<String>) -> Self {
        Self {
            sanitized: content,
            was_modified: true,
            details,
        }
    }
}

/// Run multiple sanitizers in sequence
pub fn chain_sanitizers<T, F>(input: T, sanitizers: Vec<F>) -> SanitizeResult<T>
where
    F: FnOnce(T) -> SanitizeResult<T>,
{
    let mut result = SanitizeResult::unmodified(input);
    let mut all_details = Vec::new();

    for sanitizer in sanitizers {
        let current = sanitizer(result.sanitized);
        result.sanitized = current.sanitized;

        if current.was_modified {
            result.was_modified = true;
            if let Some(details) = current.details {
                all_details.push(details);
            }
        }
    }

    if !all_details.is_empty() {
        result.details = Some(all_details.join("; "));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_sanitizers() {
        let steps: Vec<fn(String) -> SanitizeResult<String>> = vec![
            |s| trim_whitespace(&s),
            |s| normalize_unicode(&s),
        ];
        let result = chain_sanitizers("  Cafe\u{0301} ".to_string(), steps);

        assert!(result.was_modified);
        assert_eq!(result.sanitized, "Caf\u{00e9}");
        let details = result.details.unwrap();
        assert!(details.contains("Trimmed"));
        assert!(details.contains("Unicode"));
    }

    #[test]
    fn test_chain_sanitizers_unmodified() {
        let steps: Vec<fn(String) -> SanitizeResult<String>> = vec![|s| trim_whitespace(&s)];
        let result = chain_sanitizers("clean".to_string(), steps);

        assert!(!result.was_modified);
        assert_eq!(result.sanitized, "clean");
        assert_eq!(result.details, None);
    }
}
