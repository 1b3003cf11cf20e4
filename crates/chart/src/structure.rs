use std::f64::consts::TAU;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tracing::debug;

use crate::{
    config::AnalysisConfig,
    types::{PatternId, ShapeCandidate, ShapeId, ShapeKind},
};

/// Spatial relationship found among shapes
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PatternKind {
    VerticalAlignment,
    HorizontalAlignment,
    RadialArrangement,
    Grid,
}

/// Where a pattern sits in the region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PatternGeometry {
    /// Common lower edge of vertically aligned shapes
    Baseline { y: f64 },
    /// Common vertical centre of a row
    Row { y: f64 },
    /// Left-to-right series with its mean horizontal spacing
    Progression { mean_spacing: f64 },
    Radial {
        center: [f64; 2],
        mean_radius: f64,
        /// Circle whose centroid is the centre, if any
        anchor: Option<ShapeId>,
    },
    /// Mean row (y) and column (x) centres, ascending
    Grid { rows: Vec<f64>, columns: Vec<f64> },
}

/// A group of shapes satisfying one spatial predicate.
///
/// Patterns only relate shapes; a shape may appear in several patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructuralPattern {
    pub id: PatternId,
    pub kind: PatternKind,
    /// Member shapes, ascending by id
    pub members: Vec<ShapeId>,
    /// Band in pixels for alignments and grids; coefficient-of-variation
    /// limit for radial arrangements
    pub tolerance: f64,
    pub confidence: f64,
    pub geometry: PatternGeometry,
}

/// Groups classified shapes into alignment, series, radial and grid patterns
#[derive(Debug, Clone)]
pub struct StructuralAnalyzer {
    pub alignment_tolerance: f64,
    pub radial_tolerance: f64,
    pub grid_tolerance: f64,
}

impl Default for StructuralAnalyzer {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl StructuralAnalyzer {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            alignment_tolerance: config.alignment_tolerance,
            radial_tolerance: config.radial_tolerance,
            grid_tolerance: config.grid_tolerance,
        }
    }

    /// Find every pattern among `shapes` in a region of the given size
    pub fn analyze(&self, shapes: &[ShapeCandidate], width: u32, height: u32) -> Vec<StructuralPattern> {
        let scale = f64::from(width.max(height));
        let classified: Vec<&ShapeCandidate> =
            shapes.iter().filter(|s| s.kind.is_classified()).collect();
        if scale <= 0.0 || classified.is_empty() {
            return Vec::new();
        }

        let band = self.alignment_tolerance * scale;
        let mut patterns = Vec::new();
        patterns.extend(vertical_alignments(&classified, band));
        patterns.extend(horizontal_rows(&classified, band));
        patterns.extend(series(&classified, band));
        patterns.extend(polyline_series(&classified, band));
        patterns.extend(self.radial_arrangements(&classified));
        patterns.extend(grid(&classified, self.grid_tolerance * scale));

        for (id, pattern) in patterns.iter_mut().enumerate() {
            pattern.id = id;
        }
        debug!(patterns = patterns.len(), band, "Structural analysis complete");
        patterns
    }

    fn radial_arrangements(&self, shapes: &[&ShapeCandidate]) -> Vec<StructuralPattern> {
        let mut patterns = Vec::new();

        for circle in shapes.iter().filter(|s| s.kind == ShapeKind::Circle) {
            let members: Vec<&ShapeCandidate> = shapes
                .iter()
                .copied()
                .filter(|s| s.kind.is_radial_mark() && s.parent == Some(circle.id))
                .collect();
            if members.len() >= 2 {
                patterns.extend(self.radial(circle.centroid, Some(circle.id), &members));
            }
        }

        let marks: Vec<&ShapeCandidate> =
            shapes.iter().copied().filter(|s| s.kind.is_radial_mark()).collect();
        if marks.len() >= 3 {
            let n = marks.len() as f64;
            let center = [
                marks.iter().map(|s| s.centroid[0]).sum::<f64>() / n,
                marks.iter().map(|s| s.centroid[1]).sum::<f64>() / n,
            ];
            patterns.extend(self.radial(center, None, &marks));
        }

        patterns
    }

    fn radial(
        &self,
        center: [f64; 2],
        anchor: Option<ShapeId>,
        members: &[&ShapeCandidate],
    ) -> Option<StructuralPattern> {
        let radii: Vec<f64> = members.iter().map(|s| s.distance_to(center)).collect();
        let mut angles: Vec<f64> = members
            .iter()
            .map(|s| (-(s.centroid[1] - center[1])).atan2(s.centroid[0] - center[0]).rem_euclid(TAU))
            .collect();
        angles.sort_by(f64::total_cmp);
        let gaps: Vec<f64> = angles
            .iter()
            .zip(angles.iter().cycle().skip(1))
            .map(|(a, b)| (b - a).rem_euclid(TAU))
            .collect();

        let radial_spread = coefficient_of_variation(&radii)?;
        let angular_spread = coefficient_of_variation(&gaps)?;
        if radial_spread > self.radial_tolerance || angular_spread > self.radial_tolerance {
            return None;
        }

        Some(StructuralPattern {
            id: 0,
            kind: PatternKind::RadialArrangement,
            members: sorted_ids(members.iter().map(|s| s.id)),
            tolerance: self.radial_tolerance,
            confidence: (1.0 - radial_spread.max(angular_spread)).clamp(0.0, 1.0),
            geometry: PatternGeometry::Radial {
                center,
                mean_radius: mean(&radii),
                anchor,
            },
        })
    }
}

fn vertical_alignments(shapes: &[&ShapeCandidate], band: f64) -> Vec<StructuralPattern> {
    let keyed = shapes.iter().map(|s| (s.id, s.bounding_box.max_y())).collect();
    cluster(keyed, band)
        .into_iter()
        .filter(|group| group.len() >= 2)
        .map(|group| {
            let keys: Vec<f64> = group.iter().map(|(_, y)| *y).collect();
            StructuralPattern {
                id: 0,
                kind: PatternKind::VerticalAlignment,
                members: sorted_ids(group.iter().map(|(id, _)| *id)),
                tolerance: band,
                confidence: alignment_confidence(&keys, band),
                geometry: PatternGeometry::Baseline { y: mean(&keys) },
            }
        })
        .collect()
}

fn horizontal_rows(shapes: &[&ShapeCandidate], band: f64) -> Vec<StructuralPattern> {
    let keyed = shapes.iter().map(|s| (s.id, s.bounding_box.center()[1])).collect();
    cluster(keyed, band)
        .into_iter()
        .filter(|group| group.len() >= 2)
        .map(|group| {
            let keys: Vec<f64> = group.iter().map(|(_, y)| *y).collect();
            StructuralPattern {
                id: 0,
                kind: PatternKind::HorizontalAlignment,
                members: sorted_ids(group.iter().map(|(id, _)| *id)),
                tolerance: band,
                confidence: alignment_confidence(&keys, band),
                geometry: PatternGeometry::Row { y: mean(&keys) },
            }
        })
        .collect()
}

/// Line and point shapes progressing left to right, each more than a band
/// past the previous one
fn series(shapes: &[&ShapeCandidate], band: f64) -> Option<StructuralPattern> {
    let mut marks: Vec<(ShapeId, f64)> = shapes
        .iter()
        .filter(|s| s.kind.is_series_mark())
        .map(|s| (s.id, s.bounding_box.center()[0]))
        .collect();
    marks.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut progression: Vec<(ShapeId, f64)> = Vec::with_capacity(marks.len());
    for mark in marks {
        if progression.last().is_none_or(|last| mark.1 - last.1 > band) {
            progression.push(mark);
        }
    }
    if progression.len() < 3 {
        return None;
    }

    let gaps: Vec<f64> = progression.windows(2).map(|w| w[1].1 - w[0].1).collect();
    let spread = coefficient_of_variation(&gaps)?;
    Some(StructuralPattern {
        id: 0,
        kind: PatternKind::HorizontalAlignment,
        members: sorted_ids(progression.iter().map(|(id, _)| *id)),
        tolerance: band,
        confidence: (1.0 - spread).clamp(0.0, 1.0),
        geometry: PatternGeometry::Progression {
            mean_spacing: mean(&gaps),
        },
    })
}

/// A single stroke bending at three or more data points
fn polyline_series(shapes: &[&ShapeCandidate], band: f64) -> Vec<StructuralPattern> {
    shapes
        .iter()
        .filter(|s| s.kind == ShapeKind::Line && s.path.len() >= 4)
        .filter_map(|s| {
            let gaps: Vec<f64> = s.path.windows(2).map(|w| w[1][0] - w[0][0]).collect();
            if gaps.iter().any(|gap| *gap <= 0.0) {
                return None;
            }
            let spread = coefficient_of_variation(&gaps)?;
            Some(StructuralPattern {
                id: 0,
                kind: PatternKind::HorizontalAlignment,
                members: vec![s.id],
                tolerance: band,
                confidence: (1.0 - spread).clamp(0.0, 1.0),
                geometry: PatternGeometry::Progression {
                    mean_spacing: mean(&gaps),
                },
            })
        })
        .collect()
}

/// Shapes sitting at once in a multi-member row and a multi-member column
fn grid(shapes: &[&ShapeCandidate], band: f64) -> Option<StructuralPattern> {
    let rows: Vec<Vec<(ShapeId, f64)>> =
        cluster(shapes.iter().map(|s| (s.id, s.bounding_box.center()[1])).collect(), band)
            .into_iter()
            .filter(|g| g.len() >= 2)
            .collect();
    let columns: Vec<Vec<(ShapeId, f64)>> =
        cluster(shapes.iter().map(|s| (s.id, s.bounding_box.center()[0])).collect(), band)
            .into_iter()
            .filter(|g| g.len() >= 2)
            .collect();
    if rows.len() < 2 || columns.len() < 2 {
        return None;
    }

    let in_column = |id: ShapeId| columns.iter().any(|c| c.iter().any(|(m, _)| *m == id));
    let members = sorted_ids(
        rows.iter()
            .flatten()
            .map(|(id, _)| *id)
            .filter(|id| in_column(*id)),
    );
    if members.len() < 4 {
        return None;
    }

    let spread = rows
        .iter()
        .chain(columns.iter())
        .map(|g| {
            let keys: Vec<f64> = g.iter().map(|(_, k)| *k).collect();
            1.0 - alignment_confidence(&keys, band)
        })
        .fold(0.0, f64::max);
    let centres = |groups: &[Vec<(ShapeId, f64)>]| {
        groups
            .iter()
            .map(|g| mean(&g.iter().map(|(_, k)| *k).collect::<Vec<_>>()))
            .collect::<Vec<f64>>()
    };

    Some(StructuralPattern {
        id: 0,
        kind: PatternKind::Grid,
        members,
        tolerance: band,
        confidence: (1.0 - spread).clamp(0.0, 1.0),
        geometry: PatternGeometry::Grid {
            rows: centres(&rows),
            columns: centres(&columns),
        },
    })
}

/// Sweep sorted keys; a group extends while a key is within `band` of the
/// group's first key
fn cluster(mut keyed: Vec<(ShapeId, f64)>, band: f64) -> Vec<Vec<(ShapeId, f64)>> {
    keyed.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    let mut groups: Vec<Vec<(ShapeId, f64)>> = Vec::new();
    for item in keyed {
        match groups.last_mut() {
            Some(group) if item.1 - group[0].1 <= band => group.push(item),
            _ => groups.push(vec![item]),
        }
    }
    groups
}

fn sorted_ids(ids: impl Iterator<Item = ShapeId>) -> Vec<ShapeId> {
    let mut ids: Vec<ShapeId> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn alignment_confidence(keys: &[f64], band: f64) -> f64 {
    let spread = std_dev(keys);
    if band <= 0.0 {
        return if spread == 0.0 { 1.0 } else { 0.0 };
    }
    (1.0 - spread / band).clamp(0.0, 1.0)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Standard deviation over mean; `None` when the mean is not positive
fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values);
    (m > 0.0).then(|| std_dev(values) / m)
}
