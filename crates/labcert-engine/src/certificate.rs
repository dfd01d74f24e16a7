//! Certificate view model.
//!
//! [`CertificateAssembler`] folds the outputs of extraction, aggregation,
//! compliance, chart selection, and signing into one renderable
//! [`Certificate`]. It adds no business rules of its own.

use crate::aggregate::{aggregate, render_value};
use crate::chart::{select_chart, ChartSpec};
use crate::compliance::{evaluate, format_specification, is_reportable, row_fails};
use crate::config::EngineConfig;
use crate::error::{LabError, LabResult};
use crate::signature::{sign_with_length, SignatureBlock};
use crate::specimen::{extract_rows, SpecimenRow};
use chrono::{DateTime, NaiveDate};
use labcert_types::{FieldSchema, FieldScope, ResultBag, Sample, SampleStatus, Standard};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateHeader {
    pub company_name: String,
    pub company_address: Option<String>,
    pub accreditation: Option<String>,
    /// Sample code, printed as the certificate number.
    pub certificate_number: String,
    pub standard_code: String,
    pub standard_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSummary {
    pub sample_id: String,
    pub code: String,
    pub project: Option<String>,
    pub material_type: Option<String>,
    pub location: Option<String>,
    pub supplier: Option<String>,
    pub received_at: String,
    pub tested_at: Option<String>,
    pub status: SampleStatus,
    pub status_label: String,
    pub specimen_count: usize,
}

/// One line of the compliance table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceRow {
    pub field_id: String,
    pub name: String,
    pub unit: Option<String>,
    pub specification: String,
    pub value: String,
    pub raw_value: Option<f64>,
    pub passed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecimenColumn {
    pub field_id: String,
    pub name: String,
    pub unit: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecimenCell {
    /// `None` when the specimen has no value for the column.
    pub value: Option<String>,
    pub out_of_range: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpecimenTableRow {
    /// One-based specimen number.
    pub number: usize,
    pub cells: Vec<SpecimenCell>,
}

/// Per-specimen detail table: one column per specimen-scope field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecimenTable {
    pub columns: Vec<SpecimenColumn>,
    pub rows: Vec<SpecimenTableRow>,
}

impl SpecimenTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Renderable certificate.
///
/// Page one carries the header, sample summary, compliance table, chart, and
/// specimen table; page two the photographic evidence and signature block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub header: CertificateHeader,
    pub sample: SampleSummary,
    pub compliance: Vec<ComplianceRow>,
    pub chart: Option<ChartSpec>,
    pub specimens: SpecimenTable,
    pub evidence: Vec<String>,
    pub signature: SignatureBlock,
}

impl Certificate {
    /// True when every reported field passed.
    pub fn overall_passed(&self) -> bool {
        self.compliance.iter().all(|row| row.passed)
    }

    pub fn failed_fields(&self) -> impl Iterator<Item = &ComplianceRow> {
        self.compliance.iter().filter(|row| !row.passed)
    }

    pub fn to_json(&self) -> LabResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds certificates under one configuration.
#[derive(Clone, Debug)]
pub struct CertificateAssembler {
    config: EngineConfig,
}

impl CertificateAssembler {
    pub fn new(config: EngineConfig) -> LabResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Assemble the certificate for `sample` tested under `standard`.
    ///
    /// Fails only when the inputs contradict each other: a standard with
    /// duplicate field ids, or a sample recorded under a different standard.
    pub fn assemble(&self, standard: &Standard, sample: &Sample) -> LabResult<Certificate> {
        check_contract(standard, sample)?;

        let labels = &self.config.labels;
        let bag = sample.result_bag(standard);
        let rows = extract_rows(standard, &bag);

        let compliance = compliance_table(standard, &rows, &bag, &self.config);
        let chart = select_chart(standard, &bag, &rows, labels);
        let specimens = specimen_table(standard, &rows, &self.config);
        let evidence = sample
            .photographic_evidence
            .iter()
            .take(self.config.max_evidence_images)
            .cloned()
            .collect();
        let signature = sign_with_length(sample, &self.config.company, self.config.signature_length);

        let certificate = Certificate {
            header: CertificateHeader {
                company_name: self.config.company.name.clone(),
                company_address: self.config.company.address.clone(),
                accreditation: self.config.company.accreditation.clone(),
                certificate_number: sample.code.clone(),
                standard_code: standard.code.clone(),
                standard_name: standard.name.clone(),
            },
            sample: SampleSummary {
                sample_id: sample.id.clone(),
                code: sample.code.clone(),
                project: sample.project_name.clone(),
                material_type: sample.material_type.clone(),
                location: sample.location.clone(),
                supplier: sample.supplier.clone(),
                received_at: display_date(&sample.received_at),
                tested_at: sample.tested_at.as_deref().map(display_date),
                status: sample.status,
                status_label: sample.status.label().to_string(),
                specimen_count: rows.len(),
            },
            compliance,
            chart,
            specimens,
            evidence,
            signature,
        };

        info!(
            sample = %sample.code,
            standard = %standard.code,
            specimens = rows.len(),
            passed = certificate.overall_passed(),
            "certificate assembled"
        );
        Ok(certificate)
    }
}

fn check_contract(standard: &Standard, sample: &Sample) -> LabResult<()> {
    if let Some(id) = standard.duplicate_field_id() {
        warn!(standard = %standard.code, field = id, "duplicate field id in schema");
        return Err(LabError::ContractViolation(format!(
            "standard {} declares field {} more than once",
            standard.code, id
        )));
    }
    if let Some(code) = sample.standard_code.as_deref() {
        if code != standard.code {
            warn!(sample = %sample.code, expected = code, got = %standard.code, "standard mismatch");
            return Err(LabError::ContractViolation(format!(
                "sample {} was tested under {}, not {}",
                sample.code, code, standard.code
            )));
        }
    }
    Ok(())
}

fn compliance_table(
    standard: &Standard,
    rows: &[SpecimenRow],
    bag: &ResultBag,
    config: &EngineConfig,
) -> Vec<ComplianceRow> {
    standard
        .fields
        .iter()
        .filter(|field| is_reportable(field))
        .map(|field| {
            let agg = aggregate(field, rows, bag, &config.labels);
            ComplianceRow {
                field_id: field.id.clone(),
                name: field.name.clone(),
                unit: field.unit.clone(),
                specification: format_specification(field),
                passed: evaluate(field, agg.raw_value, rows, bag),
                value: agg.display_value,
                raw_value: agg.raw_value,
            }
        })
        .collect()
}

fn specimen_table(standard: &Standard, rows: &[SpecimenRow], config: &EngineConfig) -> SpecimenTable {
    if rows.is_empty() {
        return SpecimenTable::default();
    }
    let fields: Vec<&FieldSchema> = standard
        .fields
        .iter()
        .filter(|f| f.effective_scope(true) == FieldScope::Specimen)
        .collect();

    SpecimenTable {
        columns: fields
            .iter()
            .map(|f| SpecimenColumn {
                field_id: f.id.clone(),
                name: f.name.clone(),
                unit: f.unit.clone(),
            })
            .collect(),
        rows: rows
            .iter()
            .map(|row| SpecimenTableRow {
                number: row.index + 1,
                cells: fields
                    .iter()
                    .map(|field| SpecimenCell {
                        value: row.get(&field.id).map(|v| render_value(v, &config.labels)),
                        out_of_range: row_fails(field, row),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// `dd/mm/yyyy` for RFC 3339 timestamps and ISO dates; anything else as stored.
pub fn display_date(raw: &str) -> String {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return timestamp.format("%d/%m/%Y").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%d/%m/%Y").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use labcert_types::{RawResults, ValueType};
    use serde_json::json;

    fn strength_standard() -> Standard {
        Standard::new(
            "NMX-C-083-ONNCCE",
            vec![
                FieldSchema::new("f_c083_qty", "Cantidad de cilindros", ValueType::Number)
                    .with_scope(FieldScope::Global),
                FieldSchema::new("f_c083_age", "Edad", ValueType::Select)
                    .with_scope(FieldScope::Specimen),
                FieldSchema::new("f_c083_4", "Resistencia", ValueType::Number)
                    .with_scope(FieldScope::Specimen)
                    .with_unit("kg/cm²")
                    .with_limits(Some(200.0), None),
                FieldSchema::new("f_c083_cap", "Cabeceo correcto", ValueType::Boolean)
                    .with_scope(FieldScope::Specimen),
            ],
        )
    }

    fn results(value: serde_json::Value) -> RawResults {
        serde_json::from_value(value).unwrap()
    }

    fn strength_sample() -> Sample {
        let mut sample = Sample::new("s-1", "LAB-2024-001", "2024-03-01", SampleStatus::Approved)
            .with_results(results(json!({
                "f_c083_qty": 3,
                "f_c083_age_0": "7",
                "f_c083_4_0": 180,
                "f_c083_cap_0": true,
                "f_c083_age_1": "28",
                "f_c083_4_1": 260,
                "f_c083_cap_1": true,
                "f_c083_age_2": "28",
                "f_c083_4_2": 280,
            })));
        sample.tested_at = Some("2024-03-29T12:00:00Z".into());
        sample.photographic_evidence = (1..=6).map(|i| format!("img-{}.jpg", i)).collect();
        sample
    }

    fn assembler() -> CertificateAssembler {
        CertificateAssembler::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn assembles_full_certificate() {
        let cert = assembler()
            .assemble(&strength_standard(), &strength_sample())
            .unwrap();

        assert_eq!(cert.header.certificate_number, "LAB-2024-001");
        assert_eq!(cert.sample.specimen_count, 3);
        assert_eq!(cert.sample.received_at, "01/03/2024");
        assert_eq!(cert.sample.tested_at.as_deref(), Some("29/03/2024"));
        assert_eq!(cert.sample.status_label, "Aprobado");

        let ids: Vec<&str> = cert.compliance.iter().map(|r| r.field_id.as_str()).collect();
        assert_eq!(ids, vec!["f_c083_age", "f_c083_4", "f_c083_cap"]);

        let resistance = &cert.compliance[1];
        assert_eq!(resistance.value, "240");
        assert_eq!(resistance.specification, "≥ 200");
        assert!(resistance.passed);
        assert_eq!(cert.compliance[0].value, "7, 28");
        assert!(cert.compliance[2].passed);
        assert!(cert.overall_passed());

        assert_eq!(cert.evidence.len(), 4);
        assert!(cert.chart.is_some());
        assert_eq!(cert.signature.validation_url, "https://labcert.app/verify/certificado/s-1");
    }

    #[test]
    fn specimen_table_flags_out_of_range_cells() {
        let cert = assembler()
            .assemble(&strength_standard(), &strength_sample())
            .unwrap();
        let table = &cert.specimens;
        let columns: Vec<&str> = table.columns.iter().map(|c| c.field_id.as_str()).collect();
        assert_eq!(columns, vec!["f_c083_age", "f_c083_4", "f_c083_cap"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].number, 1);
        assert_eq!(table.rows[0].cells[1].value.as_deref(), Some("180"));
        assert!(table.rows[0].cells[1].out_of_range);
        assert!(!table.rows[1].cells[1].out_of_range);
        assert_eq!(table.rows[0].cells[2].value.as_deref(), Some("YES"));
        assert!(table.rows[2].cells[2].value.is_none());
        assert!(!table.rows[2].cells[2].out_of_range);
    }

    #[test]
    fn failing_boolean_fails_certificate() {
        let mut sample = strength_sample();
        sample.results.insert("f_c083_cap_2".into(), json!(false));
        let cert = assembler().assemble(&strength_standard(), &sample).unwrap();
        let failed: Vec<&str> = cert.failed_fields().map(|r| r.field_id.as_str()).collect();
        assert_eq!(failed, vec!["f_c083_cap"]);
        assert!(!cert.overall_passed());
    }

    #[test]
    fn rejects_sample_from_other_standard() {
        let mut sample = strength_sample();
        sample.standard_code = Some("NMX-C-416".into());
        let err = assembler()
            .assemble(&strength_standard(), &sample)
            .unwrap_err();
        assert!(matches!(err, LabError::ContractViolation(_)));
    }

    #[test]
    fn rejects_duplicate_field_ids() {
        let mut standard = strength_standard();
        standard
            .fields
            .push(FieldSchema::new("f_c083_4", "Otra", ValueType::Number));
        assert!(assembler().assemble(&standard, &strength_sample()).is_err());
    }

    #[test]
    fn specimenless_sample_has_empty_table() {
        let standard = Standard::new(
            "NMX-C-000",
            vec![FieldSchema::new("f_abs", "Absorción", ValueType::Number)
                .with_limits(None, Some(5.0))],
        );
        let sample = Sample::new("s-2", "LAB-2", "sin fecha", SampleStatus::Pending)
            .with_results(results(json!({"f_abs": "6.5"})));
        let cert = assembler().assemble(&standard, &sample).unwrap();
        assert!(cert.specimens.is_empty());
        assert!(cert.chart.is_none());
        assert_eq!(cert.sample.received_at, "sin fecha");
        assert_eq!(cert.compliance[0].value, "6.5");
        assert!(!cert.compliance[0].passed);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = EngineConfig::default();
        config.signature_length = 0;
        assert!(CertificateAssembler::new(config).is_err());
    }
}
