//! Reduce a field's values to one reportable figure.

use crate::config::DisplayLabels;
use crate::specimen::SpecimenRow;
use labcert_types::{format_number, FieldSchema, FieldScope, FieldValue, ResultBag, ValueType};
use serde::{Deserialize, Serialize};

/// Reportable value of one field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub display_value: String,
    /// Numeric value compliance is judged on, when there is one.
    pub raw_value: Option<f64>,
}

impl Aggregate {
    fn missing(labels: &DisplayLabels) -> Self {
        Self {
            display_value: labels.missing.clone(),
            raw_value: None,
        }
    }

    fn text(display_value: String) -> Self {
        Self {
            display_value,
            raw_value: None,
        }
    }
}

/// Aggregate `field` over a sample's specimen rows, or read its global value.
///
/// Global fields and specimen-less samples use the sample-level entry.
/// Specimen numbers average over the rows that have a finite value; select
/// and text values list their distinct entries in first-seen order. Specimen
/// booleans have no aggregate display; their verdict comes from the rows.
pub fn aggregate(
    field: &FieldSchema,
    rows: &[SpecimenRow],
    bag: &ResultBag,
    labels: &DisplayLabels,
) -> Aggregate {
    let scope = field.effective_scope(!rows.is_empty());
    if scope == FieldScope::Global || rows.is_empty() {
        return aggregate_global(field, bag, labels);
    }

    match field.value_type {
        ValueType::Number => {
            let values: Vec<f64> = rows.iter().filter_map(|r| r.number(&field.id)).collect();
            match mean(&values) {
                Some(m) => Aggregate {
                    display_value: format_mean(m),
                    raw_value: Some(m),
                },
                None => Aggregate::missing(labels),
            }
        }
        ValueType::Select | ValueType::Text => {
            let mut distinct: Vec<String> = Vec::new();
            for value in rows.iter().filter_map(|r| r.get(&field.id)) {
                let rendered = render_value(value, labels);
                if !distinct.contains(&rendered) {
                    distinct.push(rendered);
                }
            }
            if distinct.is_empty() {
                Aggregate::missing(labels)
            } else {
                Aggregate::text(distinct.join(", "))
            }
        }
        ValueType::Boolean => Aggregate::missing(labels),
    }
}

fn aggregate_global(field: &FieldSchema, bag: &ResultBag, labels: &DisplayLabels) -> Aggregate {
    let Some(value) = bag.global(&field.id) else {
        return Aggregate::missing(labels);
    };
    match (field.value_type, value.as_number()) {
        (ValueType::Number, Some(n)) => Aggregate {
            display_value: format_number(n),
            raw_value: Some(n),
        },
        _ => Aggregate::text(render_value(value, labels)),
    }
}

/// Render a single value for display, booleans through the localized labels.
pub fn render_value(value: &FieldValue, labels: &DisplayLabels) -> String {
    match value {
        FieldValue::Boolean(b) => labels.boolean(*b).to_string(),
        other => other.to_string(),
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Whole means print as integers, anything else with two decimals.
///
/// Ties round away from zero (1.125 prints "1.13").
pub fn format_mean(m: f64) -> String {
    if m.fract() == 0.0 {
        format_number(m)
    } else {
        format!("{:.2}", (m * 100.0).round() / 100.0)
    }
}
