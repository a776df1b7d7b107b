//! Operator chunk ids.
//!
//! A binary operator chunk is identified by the operator followed by the
//! encoded type of its right operand, so `uid == 0` becomes `==\x05`.

pub const COMPARISONS: [&str; 6] = ["==", "!=", "<=", ">=", "<", ">"];

/// All operators, longest first so prefix matching is unambiguous.
pub const OPERATORS: [&str; 13] = [
    "==", "!=", "<=", ">=", "&&", "||", "<", ">", "+", "-", "*", "/", "!",
];

pub fn is_comparison(op: &str) -> bool {
    COMPARISONS.contains(&op)
}

/// Splits an operator chunk id into the operator and the encoded right
/// operand type. Returns `None` for non-operator ids such as `where`.
pub fn split_operator(id: &str) -> Option<(&'static str, &str)> {
    OPERATORS
        .iter()
        .find(|op| id.starts_with(**op))
        .map(|op| (*op, &id[op.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_operator_ids() {
        assert_eq!(split_operator("==\u{5}"), Some(("==", "\u{5}")));
        assert_eq!(split_operator("<=\u{6}"), Some(("<=", "\u{6}")));
        assert_eq!(split_operator("<\u{5}"), Some(("<", "\u{5}")));
        assert_eq!(split_operator("!"), Some(("!", "")));
        assert_eq!(split_operator("where"), None);
        assert_eq!(split_operator("$all"), None);
    }
}
