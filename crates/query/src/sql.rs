//! Literal escaping for text interpolated into query strings.

/// Character used in `ESCAPE '\'` clauses of every LIKE pattern we build.
pub const LIKE_ESCAPE: char = '\\';

/// Renders `value` as a single-quoted SQL string literal.
///
/// Single quotes are doubled and NUL characters dropped, so the literal can
/// never terminate early.
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '\0' => {}
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Escapes LIKE wildcards so `value` matches literally under `ESCAPE '\'`.
pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(ch);
    }
    out
}

/// Quoted pattern matching any text containing `needle`.
pub fn contains_pattern(needle: &str) -> String {
    quote_literal(&format!("%{}%", escape_like(needle)))
}

/// Quoted pattern matching any text starting with `prefix`.
pub fn prefix_pattern(prefix: &str) -> String {
    quote_literal(&format!("{}%", escape_like(prefix)))
}
