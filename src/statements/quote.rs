//! String literal quoting for values that end up inside statement text.
//!
//! Bulk-copy commands cannot take bind parameters for their source, credential
//! or region clauses, so configuration values are embedded as literals built
//! here and nowhere else.

/// Render `value` as a single-quoted SQL string literal.
///
/// Single quotes are doubled and backslashes (an escape character inside
/// Redshift literals) are doubled, so the value can never terminate the
/// literal early.
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("''"),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// True if every single quote in `sql` is part of a balanced literal.
pub fn literals_balanced(sql: &str) -> bool {
    let mut in_literal = false;
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, in_literal) {
            ('\'', false) => in_literal = true,
            ('\'', true) => {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                } else {
                    in_literal = false;
                }
            }
            ('\\', true) => {
                chars.next();
            }
            _ => {}
        }
    }
    !in_literal
}
