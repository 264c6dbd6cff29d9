//! Property tests for client-side parameter binding.

use cql_user_gateway::{Statement, quote_literal};
use proptest::prelude::*;

/// Undo `quote_literal`, returning `None` if the text is not a single literal.
fn unquote(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut out = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\'' {
            // a lone quote would have closed the literal
            if chars.next() != Some('\'') {
                return None;
            }
        }
        out.push(ch);
    }
    Some(out)
}

proptest! {
    #[test]
    fn quoted_literal_is_closed_and_recovers_value(value in ".*") {
        let literal = quote_literal(&value);
        prop_assert_eq!(unquote(&literal), Some(value));
    }

    #[test]
    fn rendered_password_stays_inside_its_literal(name in "[a-z]{1,12}", password in ".*") {
        let rendered = Statement::new("ALTER USER ? WITH PASSWORD ?")
            .bind(name.clone())
            .bind(password.clone())
            .render();
        prop_assert!(rendered.is_ok());
        let rendered = rendered.unwrap_or_default();

        let prefix = format!("ALTER USER '{name}' WITH PASSWORD ");
        prop_assert!(rendered.starts_with(&prefix));
        let tail = rendered.strip_prefix(&prefix).map(unquote);
        prop_assert_eq!(tail, Some(Some(password)));
    }
}
