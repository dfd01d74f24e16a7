//! Specimen rows.
//!
//! A sample's specimens exist only implicitly, as `field_n` entries in its
//! results. [`infer_specimen_count`] is the single place that decides how many
//! there are; [`extract_rows`] rebuilds one row per specimen from it.

use labcert_types::{FieldValue, ResultBag, Standard};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Upper bound on inferred specimen counts.
pub const MAX_SPECIMENS: usize = 10_000;

/// Which evidence decided the specimen count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountSource {
    /// The reserved `_qty` entry.
    QuantityHint,
    /// A schema field holding a count.
    QuantityField(String),
    /// Highest `_<n>` suffix among result keys.
    IndexedKeys,
    /// No evidence of specimens.
    None,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecimenCount {
    pub count: usize,
    pub source: CountSource,
}

/// Decide how many specimens a sample has.
///
/// Precedence: the `_qty` hint, then the first count-like schema field with a
/// usable value, then the highest indexed key plus one. Total: falls back to 0.
pub fn infer_specimen_count(standard: &Standard, bag: &ResultBag) -> SpecimenCount {
    let inferred = if let Some(count) = bag.quantity_hint().and_then(FieldValue::as_count) {
        SpecimenCount {
            count,
            source: CountSource::QuantityHint,
        }
    } else if let Some((field_id, count)) = standard
        .fields
        .iter()
        .filter(|f| f.is_count_candidate())
        .find_map(|f| {
            bag.global(&f.id)
                .and_then(FieldValue::as_count)
                .map(|count| (f.id.clone(), count))
        })
    {
        SpecimenCount {
            count,
            source: CountSource::QuantityField(field_id),
        }
    } else if let Some(max_index) = bag.max_specimen_index() {
        SpecimenCount {
            count: max_index.saturating_add(1),
            source: CountSource::IndexedKeys,
        }
    } else {
        SpecimenCount {
            count: 0,
            source: CountSource::None,
        }
    };

    if inferred.count > MAX_SPECIMENS {
        warn!(
            count = inferred.count,
            limit = MAX_SPECIMENS,
            "specimen count clamped"
        );
        return SpecimenCount {
            count: MAX_SPECIMENS,
            ..inferred
        };
    }

    debug!(
        standard = %standard.code,
        count = inferred.count,
        source = ?inferred.source,
        "inferred specimen count"
    );
    inferred
}

/// Values recorded for one specimen.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecimenRow {
    pub index: usize,
    pub values: BTreeMap<String, FieldValue>,
}

impl SpecimenRow {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field_id: &str, value: FieldValue) -> Self {
        self.values.insert(field_id.to_string(), value);
        self
    }

    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    /// Finite number under `field_id`.
    pub fn number(&self, field_id: &str) -> Option<f64> {
        self.get(field_id).and_then(FieldValue::as_number)
    }

    /// Number under `field_id`, with 0 standing in for absent or unparseable values.
    pub fn number_or_zero(&self, field_id: &str) -> f64 {
        self.number(field_id).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One row per specimen `0..N`, holding only the schema fields present for it.
pub fn extract_rows(standard: &Standard, bag: &ResultBag) -> Vec<SpecimenRow> {
    let SpecimenCount { count, .. } = infer_specimen_count(standard, bag);

    (0..count)
        .map(|index| {
            let values = standard
                .fields
                .iter()
                .filter_map(|field| {
                    bag.specimen(&field.id, index)
                        .map(|value| (field.id.clone(), value.clone()))
                })
                .collect();
            SpecimenRow { index, values }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use labcert_types::{FieldSchema, FieldScope, ValueType};

    fn compaction_standard() -> Standard {
        Standard::new(
            "NMX-C-416",
            vec![
                FieldSchema::new("f_c416_h", "Humedad", ValueType::Number)
                    .with_scope(FieldScope::Specimen),
                FieldSchema::new("f_c416_d", "Densidad", ValueType::Number)
                    .with_scope(FieldScope::Specimen),
            ],
        )
    }

    #[test]
    fn no_evidence_means_no_rows() {
        let standard = compaction_standard();
        let bag = ResultBag::new().with_global("f_c416_opt", FieldValue::Number(11.0));
        let count = infer_specimen_count(&standard, &bag);
        assert_eq!(count.count, 0);
        assert_eq!(count.source, CountSource::None);
        assert!(extract_rows(&standard, &bag).is_empty());
    }

    #[test]
    fn quantity_hint_forces_row_count() {
        let standard = compaction_standard();
        let bag = ResultBag::new()
            .with_quantity_hint(FieldValue::Number(3.0))
            .with_specimen("f_c416_h", 0, FieldValue::Number(10.0));
        let rows = extract_rows(&standard, &bag);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].number("f_c416_h"), Some(10.0));
        assert!(rows[0].get("f_c416_d").is_none());
        assert!(rows[1].is_empty());
        assert!(rows[2].is_empty());
    }

    #[test]
    fn quantity_hint_wins_over_indexed_keys() {
        let standard = compaction_standard();
        let bag = ResultBag::new()
            .with_quantity_hint(FieldValue::Number(1.0))
            .with_specimen("f_c416_h", 4, FieldValue::Number(10.0));
        assert_eq!(extract_rows(&standard, &bag).len(), 1);
    }

    #[test]
    fn non_numeric_hint_falls_through() {
        let standard = compaction_standard();
        let bag = ResultBag::new()
            .with_quantity_hint(FieldValue::Text("tres".into()))
            .with_specimen("f_c416_d", 1, FieldValue::Number(1800.0));
        let count = infer_specimen_count(&standard, &bag);
        assert_eq!(count.count, 2);
        assert_eq!(count.source, CountSource::IndexedKeys);
    }

    #[test]
    fn quantity_field_by_id_or_name() {
        let mut standard = compaction_standard();
        standard
            .fields
            .push(FieldSchema::new("f_pieces", "Número de probetas", ValueType::Number));
        let bag = ResultBag::new()
            .with_global("f_pieces", FieldValue::Number(2.0))
            .with_specimen("f_c416_h", 5, FieldValue::Number(10.0));
        let count = infer_specimen_count(&standard, &bag);
        assert_eq!(count.count, 2);
        assert_eq!(count.source, CountSource::QuantityField("f_pieces".into()));
    }

    #[test]
    fn indexed_keys_from_unknown_fields_count() {
        let standard = compaction_standard();
        let bag = ResultBag::new()
            .with_specimen("f_c416_h", 0, FieldValue::Number(10.0))
            .with_specimen("f_notes", 2, FieldValue::Text("ok".into()));
        let rows = extract_rows(&standard, &bag);
        assert_eq!(rows.len(), 3);
        assert!(rows[2].get("f_notes").is_none());
        assert_eq!(rows[2].index, 2);
    }

    #[test]
    fn blank_specimen_entries_still_count() {
        let standard = compaction_standard();
        let raw: labcert_types::RawResults = serde_json::from_value(serde_json::json!({
            "f_c416_h_0": 10,
            "f_c416_h_1": 12,
            "f_c416_h_2": "",
            "f_c416_h_3": null,
        }))
        .unwrap();
        let bag = ResultBag::decode(&standard, &raw);

        let count = infer_specimen_count(&standard, &bag);
        assert_eq!(count.count, 4);
        assert_eq!(count.source, CountSource::IndexedKeys);

        let rows = extract_rows(&standard, &bag);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].number("f_c416_h"), Some(12.0));
        assert!(rows[2].is_empty());
        assert!(rows[3].is_empty());
    }

    #[test]
    fn huge_hint_is_clamped() {
        let standard = compaction_standard();
        let bag = ResultBag::new().with_quantity_hint(FieldValue::Number(1e12));
        assert_eq!(infer_specimen_count(&standard, &bag).count, MAX_SPECIMENS);
    }
}
