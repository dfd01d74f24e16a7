//! Typed result values.
//!
//! The data store keeps a sample's results as a flat, untyped map where
//! `field.id` holds a sample-level value and `field.id + "_" + n` holds the
//! value of specimen `n`. [`ResultBag::decode`] turns that map into typed
//! entries keyed by [`ResultKey`] once, at the boundary, and
//! [`ResultBag::encode`] writes it back. Everything downstream works on
//! [`FieldValue`] only.

use crate::schema::{Standard, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::warn;

/// Reserved key carrying an explicit specimen count.
pub const QUANTITY_KEY: &str = "_qty";

/// Untyped result map as stored.
pub type RawResults = BTreeMap<String, serde_json::Value>;

/// A single typed result value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Number(f64),
    Boolean(bool),
    Text(String),
    Select(String),
}

impl FieldValue {
    /// Decode one stored scalar, coercing it toward the declared type.
    ///
    /// Returns `None` for absent values (`null`, blank strings) and for
    /// non-scalar JSON.
    pub fn decode(raw: &serde_json::Value, value_type: Option<ValueType>) -> Option<Self> {
        use serde_json::Value;

        match raw {
            Value::Null => None,
            Value::Bool(b) => Some(FieldValue::Boolean(*b)),
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(match value_type {
                Some(ValueType::Number) | None => match parse_finite(s) {
                    Some(n) => FieldValue::Number(n),
                    None => FieldValue::Text(s.clone()),
                },
                Some(ValueType::Boolean) => match s.trim() {
                    "true" => FieldValue::Boolean(true),
                    "false" => FieldValue::Boolean(false),
                    _ => FieldValue::Text(s.clone()),
                },
                Some(ValueType::Select) => FieldValue::Select(s.clone()),
                Some(ValueType::Text) => FieldValue::Text(s.clone()),
            }),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Inverse of [`FieldValue::decode`].
    pub fn encode(&self) -> serde_json::Value {
        match self {
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Boolean(b) => serde_json::Value::Bool(*b),
            FieldValue::Text(s) | FieldValue::Select(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Finite numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Interpret as a specimen count. Negative and non-finite numbers are not counts.
    pub fn as_count(&self) -> Option<usize> {
        self.as_number()
            .filter(|n| *n >= 0.0)
            .map(|n| n.trunc() as usize)
    }

    /// Literal `false`. Anything else, including text, is not a failure.
    pub fn is_false(&self) -> bool {
        matches!(self, FieldValue::Boolean(false))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => f.write_str(&format_number(*n)),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Text(s) | FieldValue::Select(s) => f.write_str(s),
        }
    }
}

/// Shortest string form of a number: whole numbers carry no decimal point.
///
/// Magnitudes from 1e21 up and below 1e-6 switch to exponent form with an
/// explicit exponent sign ("1e+21", "1.5e-7").
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        // also folds -0
        return "0".to_string();
    }
    let magnitude = n.abs();
    if n.is_finite() && !(1e-6..1e21).contains(&magnitude) {
        let exp = format!("{:e}", n);
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                format!("{}e+{}", mantissa, power)
            }
            _ => exp,
        };
    }
    n.to_string()
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Address of a result: a field, optionally narrowed to one specimen.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResultKey {
    pub field_id: String,
    pub specimen: Option<usize>,
}

impl ResultKey {
    pub fn global(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            specimen: None,
        }
    }

    pub fn specimen(field_id: impl Into<String>, index: usize) -> Self {
        Self {
            field_id: field_id.into(),
            specimen: Some(index),
        }
    }

    /// Classify a stored key against a schema.
    ///
    /// A key naming a schema field is global even when it ends in digits
    /// (`f_c083_4`). Otherwise a trailing `_<n>` marks specimen `n`, whether
    /// or not the prefix is a known field.
    pub fn parse(standard: &Standard, key: &str) -> Self {
        if standard.field(key).is_some() {
            return Self::global(key);
        }
        match split_specimen_suffix(key) {
            Some((prefix, index)) => Self::specimen(prefix, index),
            None => Self::global(key),
        }
    }

    /// Flat key as stored.
    pub fn to_raw(&self) -> String {
        match self.specimen {
            Some(index) => format!("{}_{}", self.field_id, index),
            None => self.field_id.clone(),
        }
    }
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_raw())
    }
}

fn split_specimen_suffix(key: &str) -> Option<(&str, usize)> {
    let (prefix, suffix) = key.rsplit_once('_')?;
    if prefix.is_empty() || suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok().map(|index| (prefix, index))
}

/// Typed results of one sample.
///
/// Not serialized directly; [`ResultBag::encode`] produces the stored shape.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultBag {
    entries: BTreeMap<ResultKey, FieldValue>,
    /// Keys stored with no usable value (null, blank, non-scalar).
    blanks: BTreeSet<ResultKey>,
    quantity_hint: Option<FieldValue>,
}

impl ResultBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stored result map against a standard's schema.
    pub fn decode(standard: &Standard, raw: &RawResults) -> Self {
        let mut bag = Self::new();
        for (key, value) in raw {
            if key == QUANTITY_KEY {
                bag.quantity_hint = FieldValue::decode(value, Some(ValueType::Number));
                continue;
            }
            let result_key = ResultKey::parse(standard, key);
            if value.is_array() || value.is_object() {
                warn!(key = %key, "dropping non-scalar result value");
                bag.blanks.insert(result_key);
                continue;
            }
            let value_type = standard.field(&result_key.field_id).map(|f| f.value_type);
            match FieldValue::decode(value, value_type) {
                Some(decoded) => {
                    bag.entries.insert(result_key, decoded);
                }
                None => {
                    bag.blanks.insert(result_key);
                }
            }
        }
        bag
    }

    /// Write the bag back to the stored flat shape.
    pub fn encode(&self) -> RawResults {
        let mut raw: RawResults = self
            .entries
            .iter()
            .map(|(key, value)| (key.to_raw(), value.encode()))
            .chain(
                self.blanks
                    .iter()
                    .map(|key| (key.to_raw(), serde_json::Value::Null)),
            )
            .collect();
        if let Some(hint) = &self.quantity_hint {
            raw.insert(QUANTITY_KEY.to_string(), hint.encode());
        }
        raw
    }

    pub fn insert(&mut self, key: ResultKey, value: FieldValue) -> Option<FieldValue> {
        self.blanks.remove(&key);
        self.entries.insert(key, value)
    }

    pub fn with_global(mut self, field_id: &str, value: FieldValue) -> Self {
        self.insert(ResultKey::global(field_id), value);
        self
    }

    pub fn with_specimen(mut self, field_id: &str, index: usize, value: FieldValue) -> Self {
        self.insert(ResultKey::specimen(field_id, index), value);
        self
    }

    pub fn with_quantity_hint(mut self, value: FieldValue) -> Self {
        self.quantity_hint = Some(value);
        self
    }

    pub fn global(&self, field_id: &str) -> Option<&FieldValue> {
        self.entries.get(&ResultKey::global(field_id))
    }

    pub fn specimen(&self, field_id: &str, index: usize) -> Option<&FieldValue> {
        self.entries.get(&ResultKey::specimen(field_id, index))
    }

    pub fn quantity_hint(&self) -> Option<&FieldValue> {
        self.quantity_hint.as_ref()
    }

    /// Record a key that was stored without a usable value.
    pub fn with_blank(mut self, key: ResultKey) -> Self {
        if !self.entries.contains_key(&key) {
            self.blanks.insert(key);
        }
        self
    }

    /// Highest specimen index under any stored key, blank ones included.
    pub fn max_specimen_index(&self) -> Option<usize> {
        self.entries
            .keys()
            .chain(self.blanks.iter())
            .filter_map(|k| k.specimen)
            .max()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResultKey, &FieldValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.quantity_hint.is_none()
    }
}
