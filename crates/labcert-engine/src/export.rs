//! CSV listing of samples.

use crate::certificate::display_date;
use labcert_types::Sample;

pub const CSV_COLUMNS: [&str; 8] = [
    "Código",
    "Proyecto",
    "Norma",
    "Tipo Material",
    "Fecha Ensayo",
    "Estado",
    "Ubicación",
    "Proveedor",
];

/// One row per sample under [`CSV_COLUMNS`], every value double-quoted,
/// rows joined by `\n`.
pub fn samples_csv(samples: &[Sample]) -> String {
    let header = CSV_COLUMNS.iter().map(|c| quote(c)).collect::<Vec<_>>().join(",");
    let mut lines = Vec::with_capacity(samples.len() + 1);
    lines.push(header);
    lines.extend(samples.iter().map(sample_line));
    lines.join("\n")
}

fn sample_line(sample: &Sample) -> String {
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();
    [
        sample.code.clone(),
        optional(&sample.project_name),
        optional(&sample.standard_code),
        optional(&sample.material_type),
        sample.tested_at.as_deref().map(display_date).unwrap_or_default(),
        sample.status.label().to_string(),
        optional(&sample.location),
        optional(&sample.supplier),
    ]
    .iter()
    .map(|value| quote(value))
    .collect::<Vec<_>>()
    .join(",")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use labcert_types::SampleStatus;

    #[test]
    fn header_only_for_no_samples() {
        assert_eq!(
            samples_csv(&[]),
            "\"Código\",\"Proyecto\",\"Norma\",\"Tipo Material\",\"Fecha Ensayo\",\"Estado\",\"Ubicación\",\"Proveedor\""
        );
    }

    #[test]
    fn rows_are_quoted_and_newline_joined() {
        let mut first = Sample::new("s-1", "LAB-1", "2024-01-02", SampleStatus::Approved);
        first.project_name = Some("Puente \"Norte\"".into());
        first.standard_code = Some("NMX-C-083".into());
        first.tested_at = Some("2024-01-30".into());
        let second = Sample::new("s-2", "LAB-2", "2024-01-03", SampleStatus::InProcess);

        let csv = samples_csv(&[first, second]);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "\"LAB-1\",\"Puente \"\"Norte\"\"\",\"NMX-C-083\",\"\",\"30/01/2024\",\"Aprobado\",\"\",\"\""
        );
        assert_eq!(lines[2], "\"LAB-2\",\"\",\"\",\"\",\"\",\"En proceso\",\"\",\"\"");
    }
}
