//! Output formatting utilities

use anyhow::Result;
use labcert_engine::{Certificate, EngineConfig, SignatureBlock};
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Plain-text summary
    Text,
}

/// Print a single item as pretty JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

pub fn print_certificate(cert: &Certificate, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(cert),
        OutputFormat::Text => {
            print!("{}", certificate_summary(cert));
            Ok(())
        }
    }
}

pub fn print_signature(block: &SignatureBlock, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(block),
        OutputFormat::Text => {
            println!("Firma: {}", block.signature);
            println!("Sello: {}", block.seal);
            println!("Verificación: {}", block.validation_url);
            Ok(())
        }
    }
}

/// Print the effective configuration; the text form is loadable TOML.
pub fn print_config(config: &EngineConfig, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(config),
        OutputFormat::Text => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
    }
}

fn certificate_summary(cert: &Certificate) -> String {
    let mut out = format!(
        "Certificado {} ({})\n",
        cert.header.certificate_number, cert.header.standard_code
    );
    out.push_str(&format!(
        "Estado: {}  Especímenes: {}\n",
        cert.sample.status_label, cert.sample.specimen_count
    ));
    for row in &cert.compliance {
        let unit = row.unit.as_deref().unwrap_or("");
        out.push_str(&format!(
            "  {:<28} {:>14} {:>12} {:<8} {}\n",
            row.name,
            row.specification,
            row.value,
            unit,
            if row.passed { "CUMPLE" } else { "NO CUMPLE" }
        ));
    }
    out.push_str(&format!(
        "Dictamen: {}\n",
        if cert.overall_passed() { "CUMPLE" } else { "NO CUMPLE" }
    ));
    out.push_str(&format!("Firma: {}\n", cert.signature.signature));
    out
}
