//! String literal escaping.

/// Double every single quote so `s` can sit inside a single-quoted literal.
///
/// No other escaping is performed.
pub fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Escape `s` and wrap it in single quotes.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", escape_literal(s))
}
