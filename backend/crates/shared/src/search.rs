//! Free-text search helpers

/// Escape `%`, `_` and `\` so user input matches literally in `LIKE`.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%input%` for a case-insensitive substring match with `ILIKE`
pub fn contains_pattern(raw: &str) -> String {
    format!("%{}%", escape_like(raw.trim()))
}

/// Trimmed search text, `None` when blank
pub fn normalize_query(raw: Option<String>) -> Option<String> {
    raw.map(|q| q.trim().to_string()).filter(|q| !q.is_empty())
}
