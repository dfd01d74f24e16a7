//! Certificate validation marker.
//!
//! **Not a cryptographic signature.** The marker is the base64 form of the
//! sample's id, reception date, and status, so anyone holding those three
//! values can recompute it. It makes casual edits to a printed certificate
//! visible against the verification page and nothing more. Integrity against
//! a deliberate forger would need a keyed MAC held server-side.

use crate::config::CompanyIdentity;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use labcert_types::Sample;
use serde::{Deserialize, Serialize};

/// Path segment of the public verification page.
pub const VERIFY_PATH: &str = "/verify/certificado/";

/// Default number of encoded characters kept.
pub const SIGNATURE_LENGTH: usize = 32;

/// Printed validation block of a certificate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureBlock {
    /// Verification URL; also the QR payload.
    pub validation_url: String,
    /// Display token; see the module docs, this is not tamper-proof.
    pub signature: String,
    /// Decorative string: the signature followed by its reverse.
    pub seal: String,
}

impl SignatureBlock {
    pub fn qr_payload(&self) -> &str {
        &self.validation_url
    }
}

/// `id-receivedAt-status`, with the reception date exactly as stored.
pub fn signature_base(sample: &Sample) -> String {
    format!(
        "{}-{}-{}",
        sample.id,
        sample.received_at,
        sample.status.as_str()
    )
}

/// Build the validation block with the default signature length.
pub fn sign(sample: &Sample, company: &CompanyIdentity) -> SignatureBlock {
    sign_with_length(sample, company, SIGNATURE_LENGTH)
}

/// Build the validation block, keeping the first `length` encoded characters.
pub fn sign_with_length(
    sample: &Sample,
    company: &CompanyIdentity,
    length: usize,
) -> SignatureBlock {
    let encoded = STANDARD.encode(signature_base(sample).as_bytes());
    // base64 output is ASCII
    let signature: String = encoded.chars().take(length).collect();
    let seal = format!("{}{}", signature, signature.chars().rev().collect::<String>());

    SignatureBlock {
        validation_url: validation_url(company, &sample.id),
        signature,
        seal,
    }
}

pub fn validation_url(company: &CompanyIdentity, sample_id: &str) -> String {
    format!(
        "{}{}{}",
        company.verification_base_url.trim_end_matches('/'),
        VERIFY_PATH,
        sample_id
    )
}
