//! Pass/fail verdicts against schema thresholds.
//!
//! Each field is judged on its own. Number fields are checked against the
//! closed interval `[min_limit, max_limit]`; boolean fields fail on a literal
//! `false`. Every other type passes. Absent data never fails.

use crate::specimen::SpecimenRow;
use labcert_types::{format_number, FieldSchema, FieldScope, FieldValue, ResultBag, ValueType};
use tracing::trace;

/// Verdict for a field over the whole sample.
///
/// `raw_value` is the aggregate from [`crate::aggregate::aggregate`]; booleans
/// are judged from the global entry or from every specimen row.
pub fn evaluate(
    field: &FieldSchema,
    raw_value: Option<f64>,
    rows: &[SpecimenRow],
    bag: &ResultBag,
) -> bool {
    let passed = match field.value_type {
        ValueType::Number => raw_value.map_or(true, |n| !outside_limits(field, n)),
        ValueType::Boolean => match field.effective_scope(!rows.is_empty()) {
            FieldScope::Global => !bag.global(&field.id).is_some_and(FieldValue::is_false),
            FieldScope::Specimen => !rows
                .iter()
                .any(|r| r.get(&field.id).is_some_and(FieldValue::is_false)),
        },
        ValueType::Select | ValueType::Text => true,
    };
    trace!(field = %field.id, ?raw_value, passed, "compliance verdict");
    passed
}

/// Whether a single specimen value is out of range.
///
/// Missing values and values of the wrong type are never flagged.
pub fn value_fails(field: &FieldSchema, value: Option<&FieldValue>) -> bool {
    let Some(value) = value else {
        return false;
    };
    match field.value_type {
        ValueType::Number => value
            .as_number()
            .is_some_and(|n| outside_limits(field, n)),
        ValueType::Boolean => value.is_false(),
        ValueType::Select | ValueType::Text => false,
    }
}

/// Out-of-range check for one specimen of a row.
pub fn row_fails(field: &FieldSchema, row: &SpecimenRow) -> bool {
    value_fails(field, row.get(&field.id))
}

/// Closed-interval check; an undefined bound does not constrain.
pub fn outside_limits(field: &FieldSchema, n: f64) -> bool {
    field.min_limit.is_some_and(|min| n < min) || field.max_limit.is_some_and(|max| n > max)
}

/// Printed specification for a field's limits.
pub fn format_specification(field: &FieldSchema) -> String {
    match (field.min_limit, field.max_limit) {
        (Some(min), Some(max)) => format!("{} - {}", format_number(min), format_number(max)),
        (Some(min), None) => format!("≥ {}", format_number(min)),
        (None, Some(max)) => format!("≤ {}", format_number(max)),
        (None, None) => "-".to_string(),
    }
}

/// Quantity fields are metadata and stay out of the compliance table.
pub fn is_reportable(field: &FieldSchema) -> bool {
    !field.is_quantity()
}
