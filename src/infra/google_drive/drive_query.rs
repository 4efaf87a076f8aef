// Builders for Drive v3 `q` filter strings.
//
// Every user-controlled value goes through `quote_literal`, so names with
// quotes or backslashes cannot break out of the string literal.

use crate::core::conversion::NativeKind;

/// Wraps `value` in single quotes, escaping `\` and `'`.
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// `mimeType = '<a>' or mimeType = '<b>' ...`
pub fn native_types_filter(kinds: &[NativeKind]) -> String {
    kinds
        .iter()
        .map(|kind| format!("mimeType = {}", quote_literal(kind.mime_type())))
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Files named exactly `name` inside any of `parents`.
pub fn named_in_parents_filter(name: &str, parents: &[String]) -> String {
    let name_clause = format!("name = {}", quote_literal(name));
    if parents.is_empty() {
        return name_clause;
    }

    let parent_clause = parents
        .iter()
        .map(|parent| format!("{} in parents", quote_literal(parent)))
        .collect::<Vec<_>>()
        .join(" or ");
    format!("{} and ({})", name_clause, parent_clause)
}
