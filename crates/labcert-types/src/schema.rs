//! Standard ("norma") schemas.
//!
//! A [`Standard`] names a test method and declares the measurable fields a
//! sample tested under it carries. Schemas are owned by the data store; this
//! crate only reads them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Value type of a measurable field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    Boolean,
    Select,
    Text,
}

/// Where a field's values live: once per sample, or once per specimen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldScope {
    Global,
    Specimen,
}

/// One measurable attribute of a standard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Stable key; also the prefix of the field's entries in a result map.
    pub id: String,
    /// Display label
    pub name: String,
    pub value_type: ValueType,
    /// Declared scope. `None` resolves per sample, see [`FieldSchema::effective_scope`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<FieldScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_limit: Option<f64>,
    /// Advisory only; not enforced by compliance.
    #[serde(default)]
    pub required: bool,
}

impl FieldSchema {
    /// Create a field with no unit, limits, or declared scope.
    pub fn new(id: impl Into<String>, name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value_type,
            scope: None,
            unit: None,
            min_limit: None,
            max_limit: None,
            required: false,
        }
    }

    pub fn with_scope(mut self, scope: FieldScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_limits(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_limit = min;
        self.max_limit = max;
        self
    }

    /// Resolve the scope for a sample.
    ///
    /// An undeclared scope is global when the sample has no specimen rows and
    /// specimen otherwise.
    pub fn effective_scope(&self, has_specimens: bool) -> FieldScope {
        match self.scope {
            Some(scope) => scope,
            None if has_specimens => FieldScope::Specimen,
            None => FieldScope::Global,
        }
    }

    /// Quantity fields carry specimen counts, not measurements.
    pub fn is_quantity(&self) -> bool {
        self.id.contains("qty")
    }

    /// Whether this field may hold the specimen count of a sample.
    pub fn is_count_candidate(&self) -> bool {
        let name = self.name.to_lowercase();
        self.is_quantity() || name.contains("cantidad") || name.contains("número")
    }
}

/// A test method and its field schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standard {
    /// Method code, e.g. `NMX-C-416-ONNCCE`.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Fields in display order.
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    #[serde(default)]
    pub compatible_sample_categories: BTreeSet<String>,
}

impl Standard {
    pub fn new(code: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            code: code.into(),
            name: None,
            fields,
            compatible_sample_categories: BTreeSet::new(),
        }
    }

    /// Look up a field by id.
    pub fn field(&self, id: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// First field id that appears more than once, if any.
    pub fn duplicate_field_id(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.fields
            .iter()
            .map(|f| f.id.as_str())
            .find(|id| !seen.insert(*id))
    }

    /// Whether a sample category may be tested under this standard.
    ///
    /// An empty category set accepts every category.
    pub fn accepts_category(&self, category: &str) -> bool {
        self.compatible_sample_categories.is_empty()
            || self.compatible_sample_categories.contains(category)
    }
}
