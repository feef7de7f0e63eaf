//! Placeholder syntax.
//!
//! The core only ever emits positional placeholders; which token represents
//! position `n` depends on the row store's driver.

/// How positional placeholders are written into query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `$1, $2, ...` (PostgreSQL).
    #[default]
    Dollar,
    /// `?` for every position (bound strictly left to right).
    Question,
}

impl PlaceholderStyle {
    /// Append the placeholder for 1-based position `index`.
    pub fn write(self, out: &mut String, index: usize) {
        match self {
            PlaceholderStyle::Dollar => {
                out.push('$');
                out.push_str(&index.to_string());
            }
            PlaceholderStyle::Question => out.push('?'),
        }
    }

    /// Count the placeholders in `sql`.
    ///
    /// Text inside double-quoted identifiers and single-quoted literals is
    /// skipped.
    pub fn count(self, sql: &str) -> usize {
        let mut count = 0;
        let mut chars = sql.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '"' | '\'' => {
                    // A doubled quote closes and immediately reopens the region.
                    for inner in chars.by_ref() {
                        if inner == c {
                            break;
                        }
                    }
                }
                '$' if self == PlaceholderStyle::Dollar => {
                    if chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                        count += 1;
                        while chars.peek().is_some_and(|d| d.is_ascii_digit()) {
                            chars.next();
                        }
                    }
                }
                '?' if self == PlaceholderStyle::Question => count += 1,
                _ => {}
            }
        }
        count
    }
}
