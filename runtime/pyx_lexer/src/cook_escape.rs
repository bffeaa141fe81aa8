//! Escape processing for string literals.
//!
//! Unknown escapes are kept verbatim (backslash included), so Windows paths
//! pasted into a patch survive unchanged.

/// Resolve the escapes in a string literal body.
///
/// Fast path: bodies without a backslash are returned as-is.
pub(crate) fn cook_string(raw: &str) -> String {
    if !raw.contains('\\') {
        return raw.to_string();
    }

    let mut cooked = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            cooked.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => cooked.push('\\'),
            Some('\'') => cooked.push('\''),
            Some('"') => cooked.push('"'),
            Some('n') => cooked.push('\n'),
            Some('t') => cooked.push('\t'),
            Some('r') => cooked.push('\r'),
            Some('0') => cooked.push('\0'),
            // Escaped newline joins the lines.
            Some('\n') => {}
            Some(other) => {
                cooked.push('\\');
                cooked.push(other);
            }
            None => cooked.push('\\'),
        }
    }
    cooked
}
