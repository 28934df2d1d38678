//! Column type inference from raw cell text.
//!
//! [`infer_type`] looks at every data-row value of one column and decides a single
//! [`ColumnType`]. The decision starts at [`ColumnType::String`] and then applies
//! [`RULES`] in order; each rule that matches overwrites the decision made so far, so a later
//! rule takes precedence over an earlier one.
//!
//! Known sharp edges, kept on purpose:
//!
//! - An all-empty column (or one made only of dots, like `"..."`) is classified as numeric,
//!   and the conversion step then rejects it.
//! - A column with no data rows satisfies every rule vacuously and ends up as
//!   [`ColumnType::Bool`].
//! - Signs, exponents and surrounding whitespace are not part of the numeric alphabet, so
//!   `"-1"` or `" 1"` make the column text.

use crate::types::ColumnType;

/// A single inference rule: returns `Some(type)` when every value satisfies it.
#[derive(Clone, Copy)]
pub struct InferenceRule {
    /// Short rule name, used in diagnostics.
    pub name: &'static str,
    apply: fn(&[&str]) -> Option<ColumnType>,
}

impl InferenceRule {
    /// Evaluate the rule against one column's values.
    pub fn evaluate(&self, values: &[&str]) -> Option<ColumnType> {
        (self.apply)(values)
    }
}

impl std::fmt::Debug for InferenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceRule").field("name", &self.name).finish()
    }
}

/// Inference rules in evaluation order. Later matches override earlier ones.
pub const RULES: &[InferenceRule] = &[
    InferenceRule {
        name: "numeric",
        apply: numeric_rule,
    },
    InferenceRule {
        name: "boolean",
        apply: boolean_rule,
    },
];

/// Infer the type of one column from its data-row values (header excluded), in row order.
///
/// Pure and deterministic; never fails.
pub fn infer_type<S: AsRef<str>>(values: &[S]) -> ColumnType {
    let values: Vec<&str> = values.iter().map(AsRef::as_ref).collect();
    RULES
        .iter()
        .fold(ColumnType::String, |decision, rule| {
            rule.evaluate(&values).unwrap_or(decision)
        })
}

/// `true` if `s` consists only of ASCII digits and `.` (the empty string qualifies).
pub fn is_numeric_text(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || b == b'.')
}

/// `true` if `s` equals `true` or `false`, ignoring ASCII case.
pub fn is_bool_literal(s: &str) -> bool {
    s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false")
}

fn numeric_rule(values: &[&str]) -> Option<ColumnType> {
    if !values.iter().all(|v| is_numeric_text(v)) {
        return None;
    }
    if values.iter().any(|v| v.contains('.')) {
        Some(ColumnType::Double)
    } else {
        Some(ColumnType::Int)
    }
}

fn boolean_rule(values: &[&str]) -> Option<ColumnType> {
    values
        .iter()
        .all(|v| is_bool_literal(v))
        .then_some(ColumnType::Bool)
}
