//! Per-standard chart selection.
//!
//! Each supported test method maps to one chart builder. The set is closed:
//! supporting a new standard means adding a [`TestMethod`] variant and its
//! builder, and the exhaustive matches below point at every place to extend.

use crate::aggregate::render_value;
use crate::config::DisplayLabels;
use crate::specimen::SpecimenRow;
use labcert_types::{FieldValue, ResultBag, Standard};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const GRADATION_MESH: &str = "f_c077_mesh";
pub const GRADATION_PASSING: &str = "f_c077_pass";
pub const COMPACTION_HUMIDITY: &str = "f_c416_h";
pub const COMPACTION_DENSITY: &str = "f_c416_d";
pub const COMPACTION_OPTIMUM_HUMIDITY: &str = "f_c416_opt";
pub const COMPACTION_MAX_DENSITY: &str = "f_c416_max";
pub const STRENGTH_AGE: &str = "f_c083_age";
pub const STRENGTH_RESISTANCE: &str = "f_c083_4";

/// Sort key for age labels without a leading integer.
const UNPARSED_AGE_RANK: i64 = 999;

/// Test methods with a dedicated chart, in dispatch priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    /// Particle-size distribution (NMX-C-077)
    ParticleSize,
    /// Compaction curve (NMX-C-416)
    Compaction,
    /// Compressive strength by age (NMX-C-083)
    CompressiveStrength,
}

impl TestMethod {
    pub const ALL: [TestMethod; 3] = [
        TestMethod::ParticleSize,
        TestMethod::Compaction,
        TestMethod::CompressiveStrength,
    ];

    /// Numeric fragment identifying the method inside a standard code.
    pub fn code_marker(&self) -> &'static str {
        match self {
            TestMethod::ParticleSize => "077",
            TestMethod::Compaction => "416",
            TestMethod::CompressiveStrength => "083",
        }
    }

    pub fn matches(&self, code: &str) -> bool {
        code.contains(self.code_marker())
    }

    /// Methods whose marker appears in `code`, in priority order.
    pub fn matching(code: &str) -> impl Iterator<Item = TestMethod> + '_ {
        Self::ALL.into_iter().filter(move |m| m.matches(code))
    }

    fn build(
        &self,
        standard: &Standard,
        bag: &ResultBag,
        rows: &[SpecimenRow],
        labels: &DisplayLabels,
    ) -> Option<ChartSpec> {
        if rows.is_empty() {
            return None;
        }
        match self {
            TestMethod::ParticleSize => gradation_chart(standard, rows, labels),
            TestMethod::Compaction => compaction_chart(standard, bag, rows),
            TestMethod::CompressiveStrength => strength_chart(standard, rows, labels),
        }
    }
}

/// How the rendering layer should draw the series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    LineScatter,
    Bar,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AxisScale {
    /// Labels in data order
    Categorical,
    Linear {
        #[serde(skip_serializing_if = "Option::is_none")]
        domain: Option<(f64, f64)>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub scale: AxisScale,
}

impl Axis {
    /// Axis titled after a schema field when the standard declares it.
    fn for_field(standard: &Standard, field_id: &str, fallback: &str, scale: AxisScale) -> Self {
        let field = standard.field(field_id);
        Self {
            label: field.map_or_else(|| fallback.to_string(), |f| f.name.clone()),
            unit: field.and_then(|f| f.unit.clone()),
            scale,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradationPoint {
    pub mesh: String,
    pub pass_percent: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompactionPoint {
    pub humidity: f64,
    pub density: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrengthPoint {
    pub age: String,
    /// Rounded mean of the positive resistances; `None` when the group has none.
    pub mean_resistance: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "series", content = "points", rename_all = "snake_case")]
pub enum ChartSeries {
    Gradation(Vec<GradationPoint>),
    Compaction(Vec<CompactionPoint>),
    Strength(Vec<StrengthPoint>),
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        match self {
            ChartSeries::Gradation(points) => points.len(),
            ChartSeries::Compaction(points) => points.len(),
            ChartSeries::Strength(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "orientation", rename_all = "snake_case")]
pub enum ReferenceLine {
    Vertical { x: f64, label: String },
    Horizontal { y: f64, label: String },
}

/// Chart dataset for a certificate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub method: TestMethod,
    pub kind: ChartKind,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub series: ChartSeries,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_lines: Vec<ReferenceLine>,
}

/// Pick the chart for a standard, trying matching methods in priority order.
///
/// The first method that yields usable data wins; `None` when no method
/// matches the code or none has data.
pub fn select_chart(
    standard: &Standard,
    bag: &ResultBag,
    rows: &[SpecimenRow],
    labels: &DisplayLabels,
) -> Option<ChartSpec> {
    let chart = TestMethod::matching(&standard.code)
        .find_map(|method| method.build(standard, bag, rows, labels));
    match &chart {
        Some(spec) => debug!(
            standard = %standard.code,
            method = ?spec.method,
            points = spec.series.len(),
            "chart selected"
        ),
        None => debug!(standard = %standard.code, rows = rows.len(), "no chart"),
    }
    chart
}

fn gradation_chart(
    standard: &Standard,
    rows: &[SpecimenRow],
    labels: &DisplayLabels,
) -> Option<ChartSpec> {
    let points: Vec<GradationPoint> = rows
        .iter()
        .filter_map(|row| {
            row.get(GRADATION_MESH).map(|mesh| GradationPoint {
                mesh: render_value(mesh, labels),
                pass_percent: row.number_or_zero(GRADATION_PASSING),
            })
        })
        .collect();
    if points.is_empty() {
        return None;
    }

    Some(ChartSpec {
        method: TestMethod::ParticleSize,
        kind: ChartKind::Line,
        x_axis: Axis::for_field(standard, GRADATION_MESH, "Malla", AxisScale::Categorical),
        y_axis: Axis::for_field(
            standard,
            GRADATION_PASSING,
            "% que pasa",
            AxisScale::Linear {
                domain: Some((0.0, 100.0)),
            },
        ),
        series: ChartSeries::Gradation(points),
        reference_lines: Vec::new(),
    })
}

fn compaction_chart(
    standard: &Standard,
    bag: &ResultBag,
    rows: &[SpecimenRow],
) -> Option<ChartSpec> {
    let mut points: Vec<CompactionPoint> = rows
        .iter()
        .map(|row| CompactionPoint {
            humidity: row.number_or_zero(COMPACTION_HUMIDITY),
            density: row.number_or_zero(COMPACTION_DENSITY),
        })
        .collect();
    points.sort_by(|a, b| a.humidity.total_cmp(&b.humidity));

    let positive = |key: &str| {
        bag.global(key)
            .and_then(FieldValue::as_number)
            .filter(|n| *n > 0.0)
    };
    let mut reference_lines = Vec::new();
    if let Some(x) = positive(COMPACTION_OPTIMUM_HUMIDITY) {
        reference_lines.push(ReferenceLine::Vertical {
            x,
            label: "Humedad óptima".to_string(),
        });
    }
    if let Some(y) = positive(COMPACTION_MAX_DENSITY) {
        reference_lines.push(ReferenceLine::Horizontal {
            y,
            label: "Densidad máxima".to_string(),
        });
    }

    Some(ChartSpec {
        method: TestMethod::Compaction,
        kind: ChartKind::LineScatter,
        x_axis: Axis::for_field(
            standard,
            COMPACTION_HUMIDITY,
            "Humedad",
            AxisScale::Linear { domain: None },
        ),
        y_axis: Axis::for_field(
            standard,
            COMPACTION_DENSITY,
            "Densidad",
            AxisScale::Linear { domain: None },
        ),
        series: ChartSeries::Compaction(points),
        reference_lines,
    })
}

fn strength_chart(
    standard: &Standard,
    rows: &[SpecimenRow],
    labels: &DisplayLabels,
) -> Option<ChartSpec> {
    // (age, sum, count) in first-seen order
    let mut groups: Vec<(String, f64, usize)> = Vec::new();
    for row in rows {
        let age = row
            .get(STRENGTH_AGE)
            .map_or_else(|| labels.unknown_age.clone(), |v| render_value(v, labels));
        let index = match groups.iter().position(|(label, _, _)| *label == age) {
            Some(index) => index,
            None => {
                groups.push((age, 0.0, 0));
                groups.len() - 1
            }
        };
        let resistance = row.number_or_zero(STRENGTH_RESISTANCE);
        if resistance > 0.0 {
            groups[index].1 += resistance;
            groups[index].2 += 1;
        }
    }

    let mut points: Vec<StrengthPoint> = groups
        .into_iter()
        .map(|(age, sum, count)| StrengthPoint {
            age,
            mean_resistance: (count > 0).then(|| (sum / count as f64).round()),
        })
        .collect();
    points.sort_by_key(|p| age_rank(&p.age));

    if points.len() <= 1 {
        return None;
    }

    Some(ChartSpec {
        method: TestMethod::CompressiveStrength,
        kind: ChartKind::Bar,
        x_axis: Axis::for_field(standard, STRENGTH_AGE, "Edad", AxisScale::Categorical),
        y_axis: Axis::for_field(
            standard,
            STRENGTH_RESISTANCE,
            "Resistencia",
            AxisScale::Linear { domain: None },
        ),
        series: ChartSeries::Strength(points),
        reference_lines: Vec::new(),
    })
}

fn age_rank(label: &str) -> i64 {
    leading_integer(label).unwrap_or(UNPARSED_AGE_RANK)
}

/// Integer prefix of a label, after optional whitespace and sign ("28 días" → 28).
fn leading_integer(label: &str) -> Option<i64> {
    let trimmed = label.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse::<i64>().ok().map(|n| sign * n)
}
