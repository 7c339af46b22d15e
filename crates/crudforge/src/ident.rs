//! Identifier quoting.
//!
//! Table, schema and column names come from record metadata, never from callers, but they
//! may still contain spaces or quote characters (`Order Details`, `a"b`). Names made of
//! letters, digits and underscores (not starting with a digit) are emitted as-is; anything
//! else is wrapped in the dialect's quote characters with the closing quote doubled.
//!
//! # Example
//! ```ignore
//! use crudforge::ident::Quoting;
//!
//! let q = Quoting::new('[', ']');
//! assert_eq!(q.quote("Employees"), "Employees");
//! assert_eq!(q.quote("Order Details"), "[Order Details]");
//! ```

use crate::error::{OrmError, OrmResult};

/// `true` if `name` can be emitted without quoting.
pub fn is_bare(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Reject names that cannot be quoted at all.
pub fn validate(name: &str) -> OrmResult<()> {
    if name.is_empty() {
        return Err(OrmError::validation("Identifier cannot be empty"));
    }
    if name.contains('\0') {
        return Err(OrmError::validation(
            "Identifier cannot contain NUL character",
        ));
    }
    Ok(())
}

/// A dialect's identifier quote pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quoting {
    pub open: char,
    pub close: char,
}

impl Quoting {
    pub const fn new(open: char, close: char) -> Self {
        Self { open, close }
    }

    /// Quote `name` unless it is bare.
    pub fn quote(&self, name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 2);
        self.write(&mut out, name);
        out
    }

    pub(crate) fn write(&self, out: &mut String, name: &str) {
        if is_bare(name) {
            out.push_str(name);
            return;
        }
        out.push(self.open);
        for ch in name.chars() {
            if ch == self.close {
                out.push(ch);
            }
            out.push(ch);
        }
        out.push(self.close);
    }

    /// Quote an optionally schema-qualified name, each part on its own.
    pub fn qualified(&self, schema: Option<&str>, name: &str) -> String {
        let mut out = String::new();
        if let Some(schema) = schema {
            self.write(&mut out, schema);
            out.push('.');
        }
        self.write(&mut out, name);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DQ: Quoting = Quoting::new('"', '"');
    const BRACKET: Quoting = Quoting::new('[', ']');

    #[test]
    fn bare_names_pass_through() {
        assert_eq!(DQ.quote("Employees"), "Employees");
        assert_eq!(BRACKET.quote("_order_2"), "_order_2");
        assert!(!is_bare("2nd"));
        assert!(!is_bare("a-b"));
        assert!(!is_bare("Straße"));
    }

    #[test]
    fn spaces_are_quoted() {
        assert_eq!(DQ.quote("Order Details"), r#""Order Details""#);
        assert_eq!(BRACKET.quote("Order Details"), "[Order Details]");
    }

    #[test]
    fn closing_quote_is_escaped() {
        assert_eq!(DQ.quote(r#"has"quote"#), r#""has""quote""#);
        assert_eq!(BRACKET.quote("a]b; DROP TABLE x"), "[a]]b; DROP TABLE x]");
        assert_eq!(BRACKET.quote("a[b"), "[a[b]");
    }

    #[test]
    fn quoting_is_not_idempotent() {
        let once = DQ.quote("Order Details");
        assert_ne!(DQ.quote(&once), once);
        assert_eq!(DQ.quote(&DQ.quote("id")), "id");
    }

    #[test]
    fn schema_qualified() {
        assert_eq!(DQ.qualified(Some("hr"), "Employees"), "hr.Employees");
        assert_eq!(DQ.qualified(Some("my schema"), "t"), r#""my schema".t"#);
        assert_eq!(DQ.qualified(None, "t"), "t");
    }

    #[test]
    fn validate_rejects_empty_and_nul() {
        assert!(validate("").is_err());
        assert!(validate("a\0b").is_err());
        assert!(validate("Order Details").is_ok());
    }
}
