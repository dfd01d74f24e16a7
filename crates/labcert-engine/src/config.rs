//! Engine configuration.
//!
//! Holds the issuing laboratory's identity and the localized strings printed
//! on certificates. Every field has a default so partial config files work.

use crate::error::{LabError, LabResult};
use crate::signature::SIGNATURE_LENGTH;
use serde::{Deserialize, Serialize};

/// Configuration for certificate assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Photographs printed on the evidence page.
    pub max_evidence_images: usize,

    /// Characters of the encoded signature base kept as the signature.
    pub signature_length: usize,

    /// Issuing laboratory.
    pub company: CompanyIdentity,

    /// Localized display strings.
    pub labels: DisplayLabels,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_evidence_images: 4,
            signature_length: SIGNATURE_LENGTH,
            company: CompanyIdentity::default(),
            labels: DisplayLabels::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> LabResult<()> {
        if self.company.verification_base_url.trim().is_empty() {
            return Err(LabError::InvalidConfiguration(
                "company.verification_base_url must not be empty".into(),
            ));
        }
        if self.signature_length == 0 {
            return Err(LabError::InvalidConfiguration(
                "signature_length must be positive".into(),
            ));
        }
        if self.labels.missing.is_empty() {
            return Err(LabError::InvalidConfiguration(
                "labels.missing must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Identity of the laboratory issuing certificates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyIdentity {
    pub name: String,
    pub address: Option<String>,
    /// Accreditation reference printed in the header.
    pub accreditation: Option<String>,
    /// Base of the public verification URL encoded in the QR code.
    pub verification_base_url: String,
}

impl Default for CompanyIdentity {
    fn default() -> Self {
        Self {
            name: "Laboratorio de Control de Calidad".to_string(),
            address: None,
            accreditation: None,
            verification_base_url: "https://labcert.app".to_string(),
        }
    }
}

/// Localized strings used when rendering values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayLabels {
    pub yes: String,
    pub no: String,
    /// Placeholder for values that are absent.
    pub missing: String,
    /// Group label for specimens with no recorded age.
    pub unknown_age: String,
}

impl Default for DisplayLabels {
    fn default() -> Self {
        Self {
            yes: "YES".to_string(),
            no: "NO".to_string(),
            missing: "-".to_string(),
            unknown_age: "unknown".to_string(),
        }
    }
}

impl DisplayLabels {
    pub fn boolean(&self, value: bool) -> &str {
        if value {
            &self.yes
        } else {
            &self.no
        }
    }
}
