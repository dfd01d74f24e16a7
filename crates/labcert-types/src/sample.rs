//! Samples ("muestras") as supplied by the data store.

use crate::schema::Standard;
use crate::value::{RawResults, ResultBag};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow status of a sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    Pending,
    InProcess,
    Approved,
    Rejected,
}

impl SampleStatus {
    /// Stored form, as it enters the certificate signature.
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleStatus::Pending => "pending",
            SampleStatus::InProcess => "in_process",
            SampleStatus::Approved => "approved",
            SampleStatus::Rejected => "rejected",
        }
    }

    /// Display label for printed documents and exports.
    pub fn label(&self) -> &'static str {
        match self {
            SampleStatus::Pending => "Pendiente",
            SampleStatus::InProcess => "En proceso",
            SampleStatus::Approved => "Aprobado",
            SampleStatus::Rejected => "Rechazado",
        }
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A material sample tested under one standard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub id: String,
    /// Laboratory code printed on the certificate
    pub code: String,
    /// Flat, untyped result map; decode with [`Sample::result_bag`].
    #[serde(default)]
    pub results: RawResults,
    /// Reception timestamp exactly as stored.
    pub received_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_at: Option<String>,
    pub status: SampleStatus,
    #[serde(default)]
    pub photographic_evidence: Vec<String>,

    /// Code of the standard the sample was tested under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Sample {
    pub fn new(
        id: impl Into<String>,
        code: impl Into<String>,
        received_at: impl Into<String>,
        status: SampleStatus,
    ) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            results: RawResults::new(),
            received_at: received_at.into(),
            tested_at: None,
            status,
            photographic_evidence: Vec::new(),
            standard_code: None,
            project_name: None,
            material_type: None,
            location: None,
            supplier: None,
            category: None,
        }
    }

    pub fn with_results(mut self, results: RawResults) -> Self {
        self.results = results;
        self
    }

    /// Typed view of the results under a standard's schema.
    pub fn result_bag(&self, standard: &Standard) -> ResultBag {
        ResultBag::decode(standard, &self.results)
    }
}
