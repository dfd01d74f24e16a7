//! # labcert-engine
//!
//! Schema-driven result interpretation and compliance for materials-testing
//! certificates.
//!
//! Given a [`Standard`] and a [`Sample`], the engine rebuilds per-specimen
//! rows from the sample's flat results, reduces them to reportable values,
//! judges each field against its limits, picks the chart for the test method,
//! and derives the certificate's validation marker.
//!
//! ## Components
//!
//! - [`specimen`]: specimen-count inference and row extraction
//! - [`aggregate`]: one display value (and numeric value) per field
//! - [`compliance`]: pass/fail per field and per specimen
//! - [`chart`]: per-method chart datasets
//! - [`signature`]: validation URL, signature, and seal (not cryptographic)
//! - [`certificate`]: the assembled view model
//! - [`export`]: CSV listing of samples
//!
//! Every operation is a synchronous pure function of its inputs; nothing is
//! cached or persisted, so callers may share inputs across threads freely.

#![deny(unsafe_code)]

pub mod aggregate;
pub mod certificate;
pub mod chart;
pub mod compliance;
pub mod config;
pub mod error;
pub mod export;
pub mod signature;
pub mod specimen;

pub use aggregate::{aggregate, format_mean, render_value, Aggregate};
pub use certificate::{
    display_date, Certificate, CertificateAssembler, CertificateHeader, ComplianceRow,
    SampleSummary, SpecimenCell, SpecimenColumn, SpecimenTable, SpecimenTableRow,
};
pub use chart::{
    select_chart, Axis, AxisScale, ChartKind, ChartSeries, ChartSpec, CompactionPoint,
    GradationPoint, ReferenceLine, StrengthPoint, TestMethod,
};
pub use compliance::{evaluate, format_specification, is_reportable, row_fails, value_fails};
pub use config::{CompanyIdentity, DisplayLabels, EngineConfig};
pub use error::{LabError, LabResult};
pub use export::{samples_csv, CSV_COLUMNS};
pub use signature::{sign, sign_with_length, SignatureBlock};
pub use specimen::{extract_rows, infer_specimen_count, CountSource, SpecimenCount, SpecimenRow};

pub use labcert_types::{
    format_number, FieldSchema, FieldScope, FieldValue, ResultBag, Sample, SampleStatus,
    Standard, ValueType,
};
