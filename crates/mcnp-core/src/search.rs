//! Search utilities for the notification history.
//!
//! Matching is a case-insensitive substring test using Unicode lowercasing,
//! so accented Spanish text ("AVISO IMPORTANTE" / "Información") folds the
//! same way the user types it.

/// Normalize a query: trimmed and lowercased. Empty means "match everything".
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Check if `text` contains an already-normalized `term`
pub fn text_contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    text.to_lowercase().contains(term)
}

/// Check if either field contains the term (title + body search)
pub fn any_field_contains(fields: &[&str], term: &str) -> bool {
    term.is_empty() || fields.iter().any(|field| text_contains_term(field, term))
}
