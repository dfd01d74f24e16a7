//! Property tests: specimen inference, aggregation, and the validation marker.

use labcert_engine::*;
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn arb_status() -> impl Strategy<Value = SampleStatus> {
    prop_oneof![
        Just(SampleStatus::Pending),
        Just(SampleStatus::InProcess),
        Just(SampleStatus::Approved),
        Just(SampleStatus::Rejected),
    ]
}

fn arb_sample() -> impl Strategy<Value = Sample> {
    ("[a-z0-9-]{1,36}", "[0-9T:-]{0,25}", arb_status())
        .prop_map(|(id, received_at, status)| Sample::new(id, "LAB", received_at, status))
}

fn measured_standard() -> Standard {
    Standard::new(
        "NMX-C-000",
        vec![FieldSchema::new("f", "Medición", ValueType::Number).with_scope(FieldScope::Specimen)],
    )
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// The seal is the signature followed by its reverse.
    #[test]
    fn seal_is_signature_and_mirror(sample in arb_sample()) {
        let block = sign(&sample, &CompanyIdentity::default());
        let n = block.signature.len();
        prop_assert!(n <= 32);
        prop_assert_eq!(block.seal.len(), 2 * n);
        prop_assert_eq!(&block.seal[..n], block.signature.as_str());
        let mirrored: String = block.signature.chars().rev().collect();
        prop_assert_eq!(&block.seal[n..], mirrored.as_str());
    }

    /// Signing is deterministic in (id, receivedAt, status).
    #[test]
    fn signature_is_deterministic(sample in arb_sample()) {
        let company = CompanyIdentity::default();
        prop_assert_eq!(sign(&sample, &company), sign(&sample.clone(), &company));
    }

    /// Changing the status changes the signature while it stays untruncated.
    #[test]
    fn status_change_changes_short_signature(id in "[a-z]{1,4}", day in 1u32..28) {
        let received = format!("2024-01-{:02}", day);
        let company = CompanyIdentity::default();
        let approved = sign(&Sample::new(id.clone(), "L", received.clone(), SampleStatus::Approved), &company);
        let rejected = sign(&Sample::new(id, "L", received, SampleStatus::Rejected), &company);
        prop_assert_ne!(approved.signature, rejected.signature);
    }

    /// `_qty` fixes the row count whatever indexed keys exist.
    #[test]
    fn quantity_hint_fixes_row_count(
        qty in 0usize..50,
        present in prop::collection::vec(0usize..80, 0..10),
    ) {
        let standard = measured_standard();
        let mut bag = ResultBag::new().with_quantity_hint(FieldValue::Number(qty as f64));
        for index in present {
            bag = bag.with_specimen("f", index, FieldValue::Number(index as f64));
        }
        let rows = extract_rows(&standard, &bag);
        prop_assert_eq!(rows.len(), qty);
        for (i, row) in rows.iter().enumerate() {
            prop_assert_eq!(row.index, i);
        }
    }

    /// Without indexed keys or hints there are no rows.
    #[test]
    fn global_only_results_have_no_rows(values in prop::collection::vec(-1e6f64..1e6, 0..6)) {
        let standard = measured_standard();
        let mut bag = ResultBag::new();
        for (i, v) in values.iter().enumerate() {
            bag = bag.with_global(&format!("g{}", i), FieldValue::Number(*v));
        }
        prop_assert!(extract_rows(&standard, &bag).is_empty());
    }

    /// The aggregate of specimen numbers lies within their range.
    #[test]
    fn mean_is_bounded(values in prop::collection::vec(-1e6f64..1e6, 1..20)) {
        let rows: Vec<SpecimenRow> = values
            .iter()
            .enumerate()
            .map(|(i, v)| SpecimenRow::new(i).with("f", FieldValue::Number(*v)))
            .collect();
        let standard = measured_standard();
        let agg = aggregate(&standard.fields[0],&rows, &ResultBag::new(), &DisplayLabels::default());
        let mean = agg.raw_value.unwrap();
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(mean >= min - 1e-6 && mean <= max + 1e-6);
    }
}
