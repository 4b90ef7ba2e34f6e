//! Filter expression helpers.
//!
//! Values are always quoted, so user input (an email typed into a form) can
//! never change the shape of the expression.

/// Quote a string literal for a filter expression.
#[must_use]
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// `field = "value"`.
#[must_use]
pub fn eq(field: &str, value: &str) -> String {
    format!("{field} = {}", quote(value))
}

/// Join clauses with `&&`.
#[must_use]
pub fn and(clauses: &[String]) -> String {
    clauses.join(" && ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eq() {
        assert_eq!(eq("email", "a@b.co"), r#"email = "a@b.co""#);
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"x" || id != ""#), r#""x\" || id != \"""#);
        assert_eq!(quote(r"back\slash"), r#""back\\slash""#);
    }

    #[test]
    fn test_and() {
        let filter = and(&[eq("shop", "s1"), eq("name", "Caja")]);
        assert_eq!(filter, r#"shop = "s1" && name = "Caja""#);
    }
}
