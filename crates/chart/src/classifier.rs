use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::debug;

use crate::{
    config::AnalysisConfig,
    structure::{PatternGeometry, PatternKind, StructuralPattern},
    types::{BoundingBox, PatternId, ShapeCandidate, ShapeId, ShapeKind, TextRegion},
};

/// Chart type verdict
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Unknown,
}

/// Best competing verdict of a different kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunnerUp {
    pub kind: ChartKind,
    pub confidence: f64,
}

/// Chart type decision together with the evidence behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChartCandidate {
    pub kind: ChartKind,
    /// Pattern that justified the verdict
    pub pattern: Option<PatternId>,
    /// Shapes that justified the verdict, ascending by id
    pub shapes: Vec<ShapeId>,
    /// min(shape confidence) × pattern confidence; 0 for `unknown`
    pub confidence: f64,
    pub runner_up: Option<RunnerUp>,
    /// Indices into the OCR regions lying around the chart
    pub text_hints: Vec<usize>,
}

impl ChartCandidate {
    pub fn unknown() -> Self {
        Self {
            kind: ChartKind::Unknown,
            pattern: None,
            shapes: Vec::new(),
            confidence: 0.0,
            runner_up: None,
            text_hints: Vec::new(),
        }
    }
}

/// Rule-table chart classifier; a pure function of shapes, patterns and text
#[derive(Debug, Clone)]
pub struct ChartClassifier {
    pub min_confidence: f64,
    /// Text hint margin, as a fraction of the chart's larger side
    pub text_hint_margin: f64,
}

impl Default for ChartClassifier {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// Evidence for one chart kind from one pattern
#[derive(Debug, Clone)]
struct Evidence {
    kind: ChartKind,
    pattern: PatternId,
    shapes: Vec<ShapeId>,
    confidence: f64,
}

impl ChartClassifier {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            min_confidence: config.min_classifier_confidence,
            text_hint_margin: config.text_hint_margin,
        }
    }

    pub fn classify(
        &self,
        shapes: &[ShapeCandidate],
        patterns: &[StructuralPattern],
        text: &[TextRegion],
    ) -> ChartCandidate {
        // Rule order is the priority order
        let rules = [
            best(bar_evidence(shapes, patterns)),
            best(pie_evidence(shapes, patterns)),
            best(line_evidence(shapes, patterns)),
        ];

        let winner = rules
            .iter()
            .flatten()
            .find(|evidence| evidence.confidence >= self.min_confidence);
        let winning_kind = winner.map(|w| w.kind);
        let runner_up = rules
            .iter()
            .flatten()
            .filter(|evidence| Some(evidence.kind) != winning_kind)
            .fold(None::<&Evidence>, |acc, e| match acc {
                Some(current) if current.confidence >= e.confidence => Some(current),
                _ => Some(e),
            })
            .map(|e| RunnerUp {
                kind: e.kind,
                confidence: e.confidence,
            });

        let Some(winner) = winner else {
            debug!(?runner_up, "No chart rule reached the minimum confidence");
            return ChartCandidate {
                runner_up,
                ..ChartCandidate::unknown()
            };
        };

        debug!(kind = %winner.kind, confidence = winner.confidence, "Chart rule matched");
        ChartCandidate {
            kind: winner.kind,
            pattern: Some(winner.pattern),
            shapes: winner.shapes.clone(),
            confidence: winner.confidence,
            runner_up,
            text_hints: text_hints(shapes, &winner.shapes, text, self.text_hint_margin),
        }
    }
}

/// Highest-confidence evidence; the earliest pattern wins ties
fn best(evidence: Vec<Evidence>) -> Option<Evidence> {
    evidence.into_iter().fold(None, |acc, e| match acc {
        Some(current) if current.confidence >= e.confidence => Some(current),
        _ => Some(e),
    })
}

fn combined_confidence(shapes: &[ShapeCandidate], ids: &[ShapeId], pattern: &StructuralPattern) -> f64 {
    let weakest = ids
        .iter()
        .filter_map(|id| shapes.get(*id))
        .map(|s| s.confidence)
        .fold(1.0, f64::min);
    (weakest * pattern.confidence).clamp(0.0, 1.0)
}

fn bar_evidence(shapes: &[ShapeCandidate], patterns: &[StructuralPattern]) -> Vec<Evidence> {
    patterns
        .iter()
        .filter(|p| p.kind == PatternKind::VerticalAlignment)
        .filter_map(|pattern| {
            let rectangles: Vec<ShapeId> = pattern
                .members
                .iter()
                .copied()
                .filter(|id| shapes.get(*id).is_some_and(|s| s.kind == ShapeKind::Rectangle))
                .collect();
            // A hollow bar traces as an outer and an inner rectangle
            let bars: Vec<ShapeId> = rectangles
                .iter()
                .copied()
                .filter(|id| {
                    shapes[*id]
                        .parent
                        .is_none_or(|parent| !rectangles.contains(&parent))
                })
                .collect();
            (bars.len() >= 2).then(|| Evidence {
                kind: ChartKind::Bar,
                pattern: pattern.id,
                confidence: combined_confidence(shapes, &bars, pattern),
                shapes: bars,
            })
        })
        .collect()
}

fn pie_evidence(shapes: &[ShapeCandidate], patterns: &[StructuralPattern]) -> Vec<Evidence> {
    // Circles nested in another circle (donut holes) do not count as a second pie
    let outer_circles: Vec<ShapeId> = shapes
        .iter()
        .filter(|s| s.kind == ShapeKind::Circle)
        .filter(|s| {
            s.parent
                .and_then(|p| shapes.get(p))
                .is_none_or(|p| p.kind != ShapeKind::Circle)
        })
        .map(|s| s.id)
        .collect();
    if outer_circles.len() != 1 {
        return Vec::new();
    }
    let circle = outer_circles[0];

    patterns
        .iter()
        .filter(|p| p.kind == PatternKind::RadialArrangement)
        .filter(|p| matches!(p.geometry, PatternGeometry::Radial { anchor: Some(a), .. } if a == circle))
        .filter_map(|pattern| {
            let marks: Vec<ShapeId> = pattern
                .members
                .iter()
                .copied()
                .filter(|id| shapes.get(*id).is_some_and(|s| s.kind.is_radial_mark()))
                .collect();
            if marks.len() < 2 {
                return None;
            }
            let mut ids = marks;
            ids.push(circle);
            ids.sort_unstable();
            Some(Evidence {
                kind: ChartKind::Pie,
                pattern: pattern.id,
                confidence: combined_confidence(shapes, &ids, pattern),
                shapes: ids,
            })
        })
        .collect()
}

fn line_evidence(shapes: &[ShapeCandidate], patterns: &[StructuralPattern]) -> Vec<Evidence> {
    patterns
        .iter()
        .filter(|p| p.kind == PatternKind::HorizontalAlignment)
        .filter_map(|pattern| {
            let marks: Vec<&ShapeCandidate> = pattern
                .members
                .iter()
                .filter_map(|id| shapes.get(*id))
                .filter(|s| s.kind.is_series_mark())
                .collect();
            let mut xs: Vec<f64> = marks.iter().flat_map(|s| mark_positions(s)).collect();
            if xs.len() < 3 {
                return None;
            }
            xs.sort_by(f64::total_cmp);
            if xs.windows(2).any(|w| w[1] <= w[0]) {
                return None;
            }
            let ids: Vec<ShapeId> = marks.iter().map(|s| s.id).collect();
            Some(Evidence {
                kind: ChartKind::Line,
                pattern: pattern.id,
                confidence: combined_confidence(shapes, &ids, pattern),
                shapes: ids,
            })
        })
        .collect()
}

/// Horizontal positions a series mark stands for: one per segment of a bent stroke
fn mark_positions(shape: &ShapeCandidate) -> Vec<f64> {
    if shape.kind == ShapeKind::Line && shape.path.len() >= 3 {
        shape.path.windows(2).map(|w| (w[0][0] + w[1][0]) / 2.0).collect()
    } else {
        vec![shape.bounding_box.center()[0]]
    }
}

/// OCR regions whose centre lies within a margin of the chart's shapes
fn text_hints(shapes: &[ShapeCandidate], ids: &[ShapeId], text: &[TextRegion], margin: f64) -> Vec<usize> {
    let Some(extent) = ids
        .iter()
        .filter_map(|id| shapes.get(*id))
        .map(|s| s.bounding_box)
        .reduce(|a, b| a.union(&b))
    else {
        return Vec::new();
    };
    let margin = margin * extent.width.max(extent.height);
    let area = BoundingBox::new(
        extent.x - margin,
        extent.y - margin,
        extent.width + 2.0 * margin,
        extent.height + 2.0 * margin,
    );
    text.iter()
        .enumerate()
        .filter(|(_, region)| area.distance_to_point(region.center()) == 0.0)
        .map(|(i, _)| i)
        .collect()
}
