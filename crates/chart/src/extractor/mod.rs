pub mod calibration;

use std::f64::consts::TAU;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    algorithms::detection::{covered_arc, polar_angle},
    classifier::{ChartCandidate, ChartKind},
    config::{AnalysisConfig, ExtractionConfig},
    structure::{PatternGeometry, PatternKind, StructuralPattern, mean},
    types::{BoundingBox, ShapeCandidate, ShapeId, ShapeKind, TextRegion},
};

pub use calibration::{AxisCalibration, Calibration, y_tick_indices};

/// One recovered value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataPoint {
    pub label: Option<String>,
    /// Axis value, grid steps, ratio or pie share depending on calibration
    pub value: f64,
    pub source: Option<ShapeId>,
}

/// Values read from a classified chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedDataset {
    pub kind: ChartKind,
    pub calibration: Calibration,
    pub points: Vec<DataPoint>,
}

impl ExtractedDataset {
    pub fn empty(kind: ChartKind) -> Self {
        Self {
            kind,
            calibration: Calibration::Uncalibrated,
            points: Vec::new(),
        }
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn labels(&self) -> Vec<Option<&str>> {
        self.points.iter().map(|p| p.label.as_deref()).collect()
    }
}

/// Turns a chart verdict into data points
#[derive(Debug, Clone)]
pub struct DataExtractor {
    pub config: ExtractionConfig,
}

impl Default for DataExtractor {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl DataExtractor {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            config: config.extraction.clone(),
        }
    }

    pub fn extract(
        &self,
        chart: &ChartCandidate,
        shapes: &[ShapeCandidate],
        patterns: &[StructuralPattern],
        text: &[TextRegion],
    ) -> ExtractedDataset {
        let members: Vec<&ShapeCandidate> =
            chart.shapes.iter().filter_map(|id| shapes.get(*id)).collect();
        let pattern = chart.pattern.and_then(|id| patterns.get(id));

        let dataset = match (chart.kind, pattern) {
            (ChartKind::Bar, _) => {
                let band = pattern.map_or(0.0, |p| p.tolerance);
                self.extract_bars(&members, band, shapes, patterns, text)
            }
            (ChartKind::Pie, Some(pattern)) => self.extract_pie(&members, pattern, text),
            (ChartKind::Line, Some(pattern)) => self.extract_line(&members, pattern, shapes, patterns, text),
            (kind, _) => ExtractedDataset::empty(kind),
        };

        if dataset.calibration == Calibration::Uncalibrated
            && matches!(chart.kind, ChartKind::Bar | ChartKind::Line)
        {
            warn!(kind = %chart.kind, "No axis calibration found; values are shape-relative");
        }
        debug!(
            kind = %dataset.kind,
            calibration = %dataset.calibration,
            points = dataset.points.len(),
            "Data extraction complete"
        );
        dataset
    }

    /// Axis calibration from tick labels, else gridlines, else grid rows, else none
    fn calibrate(
        &self,
        plot: &BoundingBox,
        band: f64,
        shapes: &[ShapeCandidate],
        patterns: &[StructuralPattern],
        text: &[TextRegion],
    ) -> Option<(Calibration, AxisCalibration)> {
        if let Some(axis) = AxisCalibration::from_y_ticks(text, plot) {
            return Some((Calibration::Axis, axis));
        }
        let rows = gridline_rows(shapes, plot, band, self.config.gridline_min_span);
        if let Some(axis) = AxisCalibration::from_gridlines(&rows) {
            return Some((Calibration::GridSteps, axis));
        }
        patterns
            .iter()
            .filter(|p| p.kind == PatternKind::Grid)
            .find_map(|p| match &p.geometry {
                PatternGeometry::Grid { rows, .. } => AxisCalibration::from_grid_rows(rows),
                _ => None,
            })
            .map(|axis| (Calibration::GridSteps, axis))
    }

    fn extract_bars(
        &self,
        members: &[&ShapeCandidate],
        band: f64,
        shapes: &[ShapeCandidate],
        patterns: &[StructuralPattern],
        text: &[TextRegion],
    ) -> ExtractedDataset {
        let Some(plot) = plot_area(members) else {
            return ExtractedDataset::empty(ChartKind::Bar);
        };
        let mut bars: Vec<&ShapeCandidate> = members.to_vec();
        bars.sort_by(|a, b| a.bounding_box.x.total_cmp(&b.bounding_box.x).then(a.id.cmp(&b.id)));

        let calibration = self.calibrate(&plot, band, shapes, patterns, text);
        let tallest = bars.iter().map(|b| b.bounding_box.height).fold(0.0, f64::max);
        let mut used = vec![false; text.len()];
        for i in y_tick_indices(text, &plot) {
            used[i] = true;
        }

        let points = bars
            .iter()
            .map(|bar| {
                let bbox = bar.bounding_box;
                let value = match &calibration {
                    Some((_, axis)) => axis.value_at(bbox.y),
                    None if tallest > 0.0 => bbox.height / tallest,
                    None => 0.0,
                };
                DataPoint {
                    label: label_below(&bbox, text, &mut used),
                    value,
                    source: Some(bar.id),
                }
            })
            .collect();

        ExtractedDataset {
            kind: ChartKind::Bar,
            calibration: calibration.map_or(Calibration::Uncalibrated, |(c, _)| c),
            points,
        }
    }

    fn extract_pie(
        &self,
        members: &[&ShapeCandidate],
        pattern: &StructuralPattern,
        text: &[TextRegion],
    ) -> ExtractedDataset {
        let PatternGeometry::Radial { center, anchor, .. } = pattern.geometry else {
            return ExtractedDataset::empty(ChartKind::Pie);
        };
        let Some(circle) = members.iter().find(|s| Some(s.id) == anchor) else {
            return ExtractedDataset::empty(ChartKind::Pie);
        };
        let radius = (circle.bounding_box.width + circle.bounding_box.height) / 4.0;
        let core = self.config.pie_core_fraction * radius;

        let sector_shapes: Vec<&&ShapeCandidate> =
            members.iter().filter(|s| s.kind == ShapeKind::Triangle).collect();
        let mut sectors: Vec<Sector> = if !sector_shapes.is_empty() {
            sector_shapes
                .iter()
                .filter_map(|s| {
                    let angles = s
                        .contour
                        .iter()
                        .filter(|p| (p[0] - center[0]).hypot(p[1] - center[1]) >= core)
                        .map(|p| polar_angle(center, *p))
                        .collect();
                    covered_arc(angles).map(|(start, extent)| Sector {
                        start,
                        extent,
                        source: Some(s.id),
                    })
                })
                .collect()
        } else {
            // Bare radii: sectors span between consecutive spokes
            let mut spokes: Vec<(f64, ShapeId)> = members
                .iter()
                .filter(|s| s.kind == ShapeKind::Line)
                .map(|s| (polar_angle(center, s.centroid), s.id))
                .collect();
            spokes.sort_by(|a, b| a.0.total_cmp(&b.0));
            let n = spokes.len();
            (0..n)
                .map(|i| {
                    let (start, id) = spokes[i];
                    let end = spokes[(i + 1) % n].0;
                    Sector {
                        start,
                        extent: (end - start).rem_euclid(TAU),
                        source: Some(id),
                    }
                })
                .filter(|s| s.extent > 0.0)
                .collect()
        };

        let total: f64 = sectors.iter().map(|s| s.extent).sum();
        if !(total > 0.0) {
            return ExtractedDataset::empty(ChartKind::Pie);
        }
        sectors.sort_by(|a, b| a.bisector().total_cmp(&b.bisector()));

        let reach = self.config.pie_label_reach * radius;
        let mut used = vec![false; text.len()];
        let points = sectors
            .iter()
            .map(|sector| {
                let bisector = sector.bisector();
                let start_from = [center[0] + reach * bisector.cos(), center[1] - reach * bisector.sin()];
                DataPoint {
                    label: label_near(start_from, center, radius, text, &mut used),
                    value: sector.extent / total,
                    source: sector.source,
                }
            })
            .collect();

        ExtractedDataset {
            kind: ChartKind::Pie,
            calibration: Calibration::Uncalibrated,
            points,
        }
    }

    fn extract_line(
        &self,
        members: &[&ShapeCandidate],
        pattern: &StructuralPattern,
        shapes: &[ShapeCandidate],
        patterns: &[StructuralPattern],
        text: &[TextRegion],
    ) -> ExtractedDataset {
        let Some(plot) = plot_area(members) else {
            return ExtractedDataset::empty(ChartKind::Line);
        };
        let band = pattern.tolerance.max(1.0);
        let reach = (self.config.line_sample_reach * band).max(1.0);
        let markers: Vec<&ShapeCandidate> =
            members.iter().copied().filter(|s| s.kind == ShapeKind::Point).collect();
        let strokes: Vec<&ShapeCandidate> =
            members.iter().copied().filter(|s| s.kind == ShapeKind::Line).collect();

        let positions = x_positions(&plot, band, &markers, &strokes, text);
        let samples: Vec<Option<(f64, Option<ShapeId>)>> = positions
            .iter()
            .map(|(x, _)| sample_y(*x, band, reach, &markers, &strokes))
            .collect();
        let xs: Vec<f64> = positions.iter().map(|(x, _)| *x).collect();
        let Some(ys) = fill_gaps(&xs, &samples) else {
            return ExtractedDataset::empty(ChartKind::Line);
        };

        let calibration = self.calibrate(&plot, band, shapes, patterns, text);
        let points = positions
            .into_iter()
            .zip(ys)
            .zip(samples)
            .map(|(((_, label), y), sample)| DataPoint {
                label,
                value: match &calibration {
                    Some((_, axis)) => axis.value_at(y),
                    None if plot.height > 0.0 => (plot.max_y() - y) / plot.height,
                    None => 0.0,
                },
                source: sample.and_then(|(_, source)| source),
            })
            .collect();

        ExtractedDataset {
            kind: ChartKind::Line,
            calibration: calibration.map_or(Calibration::Uncalibrated, |(c, _)| c),
            points,
        }
    }
}

/// Rows of horizontal strokes whose pieces together span enough of the plot
/// width, ascending
fn gridline_rows(shapes: &[ShapeCandidate], plot: &BoundingBox, band: f64, min_span: f64) -> Vec<f64> {
    let mut pieces: Vec<(f64, f64, f64)> = shapes
        .iter()
        .filter(|s| s.kind == ShapeKind::Line && s.path.len() == 2)
        .filter(|s| (s.path[1][1] - s.path[0][1]).abs() <= s.features.thickness.max(1.0))
        .map(|s| ((s.path[0][1] + s.path[1][1]) / 2.0, s.bounding_box.x, s.bounding_box.max_x()))
        .collect();
    pieces.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut rows: Vec<Vec<(f64, f64, f64)>> = Vec::new();
    for piece in pieces {
        match rows.last_mut() {
            Some(row) if piece.0 - row[0].0 <= band => row.push(piece),
            _ => rows.push(vec![piece]),
        }
    }

    rows.into_iter()
        .filter(|row| {
            let left = row.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
            let right = row.iter().map(|p| p.2).fold(f64::NEG_INFINITY, f64::max);
            right - left >= min_span * plot.width
        })
        .map(|row| mean(&row.iter().map(|p| p.0).collect::<Vec<_>>()))
        .collect()
}

fn plot_area(members: &[&ShapeCandidate]) -> Option<BoundingBox> {
    members.iter().map(|s| s.bounding_box).reduce(|a, b| a.union(&b))
}

/// Nearest unused text centred under the bar and within its width
fn label_below(bbox: &BoundingBox, text: &[TextRegion], used: &mut [bool]) -> Option<String> {
    let anchor = [bbox.center()[0], bbox.max_y()];
    let (index, _) = text
        .iter()
        .enumerate()
        .filter(|(i, _)| !used[*i])
        .filter(|(_, region)| {
            let [cx, cy] = region.center();
            cy >= bbox.max_y() && (cx - anchor[0]).abs() <= bbox.width.max(1.0)
        })
        .map(|(i, region)| {
            let [cx, cy] = region.center();
            (i, (cx - anchor[0]).hypot(cy - anchor[1]))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))?;
    used[index] = true;
    Some(text[index].text.clone())
}

struct Sector {
    start: f64,
    extent: f64,
    source: Option<ShapeId>,
}

impl Sector {
    fn bisector(&self) -> f64 {
        (self.start + self.extent / 2.0).rem_euclid(TAU)
    }
}

/// Nearest unused text outside the circle, at most one radius from `start_from`
fn label_near(
    start_from: [f64; 2],
    center: [f64; 2],
    radius: f64,
    text: &[TextRegion],
    used: &mut [bool],
) -> Option<String> {
    let (index, _) = text
        .iter()
        .enumerate()
        .filter(|(i, _)| !used[*i])
        .map(|(i, region)| {
            let [cx, cy] = region.center();
            (i, (cx - center[0]).hypot(cy - center[1]), (cx - start_from[0]).hypot(cy - start_from[1]))
        })
        .filter(|(_, from_center, from_start)| *from_center > radius && *from_start <= radius)
        .map(|(i, _, from_start)| (i, from_start))
        .min_by(|a, b| a.1.total_cmp(&b.1))?;
    used[index] = true;
    Some(text[index].text.clone())
}

/// Sample positions: labels under the plot, else marker centres, else stroke vertices
fn x_positions(
    plot: &BoundingBox,
    band: f64,
    markers: &[&ShapeCandidate],
    strokes: &[&ShapeCandidate],
    text: &[TextRegion],
) -> Vec<(f64, Option<String>)> {
    let ticks = y_tick_indices(text, plot);
    let mut labels: Vec<(f64, Option<String>)> = text
        .iter()
        .enumerate()
        .filter(|(i, _)| !ticks.contains(i))
        .filter(|(_, region)| {
            let cx = region.center()[0];
            region.bounding_box.y >= plot.max_y() - band
                && cx >= plot.x - band
                && cx <= plot.max_x() + band
        })
        .map(|(_, region)| (region.center()[0], Some(region.text.clone())))
        .collect();
    if !labels.is_empty() {
        labels.sort_by(|a, b| a.0.total_cmp(&b.0));
        return labels;
    }

    let mut xs: Vec<f64> = if markers.is_empty() {
        strokes
            .iter()
            .flat_map(|s| s.path.iter().map(|p| p[0]))
            .filter(|x| x.is_finite())
            .collect()
    } else {
        markers.iter().map(|s| s.bounding_box.center()[0]).collect()
    };
    xs.sort_by(f64::total_cmp);
    xs.dedup_by(|later, kept| *later - *kept <= band);
    xs.into_iter().map(|x| (x, None)).collect()
}

/// Marker centre within the band, else the stroke centreline at `x`,
/// extended up to `reach` past the stroke's ends
fn sample_y(
    x: f64,
    band: f64,
    reach: f64,
    markers: &[&ShapeCandidate],
    strokes: &[&ShapeCandidate],
) -> Option<(f64, Option<ShapeId>)> {
    let marker = markers
        .iter()
        .map(|s| (s, (s.bounding_box.center()[0] - x).abs()))
        .filter(|(_, dx)| *dx <= band)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((s, _)) = marker {
        return Some((s.bounding_box.center()[1], Some(s.id)));
    }

    strokes
        .iter()
        .find_map(|s| path_y(&s.path, x, reach).map(|y| (y, Some(s.id))))
}

/// Height of a left-to-right path at `x`; the end vertices hold up to `reach` beyond it
fn path_y(path: &[[f64; 2]], x: f64, reach: f64) -> Option<f64> {
    let (first, last) = (path.first()?, path.last()?);
    if x < first[0] - reach || x > last[0] + reach {
        return None;
    }
    if x <= first[0] {
        return Some(first[1]);
    }
    if x >= last[0] {
        return Some(last[1]);
    }
    path.windows(2)
        .find(|w| x >= w[0][0] && x <= w[1][0])
        .map(|w| {
            let span = w[1][0] - w[0][0];
            if span > 0.0 {
                w[0][1] + (w[1][1] - w[0][1]) * (x - w[0][0]) / span
            } else {
                (w[0][1] + w[1][1]) / 2.0
            }
        })
}

/// Interpolate missing samples linearly between sampled neighbours;
/// `None` when nothing was sampled
fn fill_gaps(xs: &[f64], samples: &[Option<(f64, Option<ShapeId>)>]) -> Option<Vec<f64>> {
    let known: Vec<(f64, f64)> = xs
        .iter()
        .zip(samples)
        .filter_map(|(x, s)| s.map(|(y, _)| (*x, y)))
        .collect();
    if known.is_empty() {
        return None;
    }

    Some(
        xs.iter()
            .zip(samples)
            .map(|(x, sample)| {
                if let Some((y, _)) = sample {
                    return *y;
                }
                let before = known.iter().rev().find(|(kx, _)| kx < x);
                let after = known.iter().find(|(kx, _)| kx > x);
                match (before, after) {
                    (Some((x0, y0)), Some((x1, y1))) => y0 + (y1 - y0) * (x - x0) / (x1 - x0),
                    (Some((_, y)), None) | (None, Some((_, y))) => *y,
                    (None, None) => known[0].1,
                }
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShapeFeatures;

    fn shape(id: ShapeId, kind: ShapeKind, bbox: BoundingBox) -> ShapeCandidate {
        ShapeCandidate {
            id,
            contour: vec![
                [bbox.x, bbox.y],
                [bbox.max_x(), bbox.y],
                [bbox.max_x(), bbox.max_y()],
                [bbox.x, bbox.max_y()],
            ],
            bounding_box: bbox,
            centroid: bbox.center(),
            area: bbox.area(),
            aspect_ratio: bbox.width / bbox.height,
            vertex_count: 4,
            epsilon: 0.01,
            kind,
            confidence: 1.0,
            is_hole: false,
            parent: None,
            features: ShapeFeatures {
                perimeter: 0.0,
                circularity: 0.0,
                solidity: 1.0,
                extent: 1.0,
                thickness: 1.0,
                elongation: 1.0,
            },
            path: Vec::new(),
        }
    }

    fn chart(kind: ChartKind, shapes: Vec<ShapeId>, pattern: Option<usize>) -> ChartCandidate {
        ChartCandidate {
            kind,
            pattern,
            shapes,
            confidence: 0.9,
            runner_up: None,
            text_hints: Vec::new(),
        }
    }

    fn bars() -> Vec<ShapeCandidate> {
        // Deliberately out of x order
        vec![
            shape(0, ShapeKind::Rectangle, BoundingBox::new(110.0, 150.0, 29.0, 99.0)),
            shape(1, ShapeKind::Rectangle, BoundingBox::new(60.0, 200.0, 29.0, 49.0)),
            shape(2, ShapeKind::Rectangle, BoundingBox::new(160.0, 100.0, 29.0, 149.0)),
        ]
    }

    fn text(value: &str, x: f64, y: f64, w: f64) -> TextRegion {
        TextRegion::new(value, BoundingBox::new(x, y, w, 12.0))
    }

    #[test]
    fn test_calibrated_bars_with_labels() {
        let ocr = vec![
            text("0", 20.0, 244.0, 12.0),
            text("40", 14.0, 44.0, 18.0),
            text("B", 120.0, 254.0, 10.0),
            text("A", 70.0, 254.0, 10.0),
            text("C", 170.0, 254.0, 10.0),
        ];
        let dataset = DataExtractor::default().extract(&chart(ChartKind::Bar, vec![0, 1, 2], Some(0)), &bars(), &[], &ocr);
        assert_eq!(dataset.calibration, Calibration::Axis);
        assert_eq!(dataset.labels(), vec![Some("A"), Some("B"), Some("C")]);
        let values = dataset.values();
        for (value, expected) in values.iter().zip([10.0, 20.0, 30.0]) {
            assert!((value - expected).abs() < 1e-9, "{value} vs {expected}");
        }
        assert_eq!(dataset.points[0].source, Some(1));
    }

    #[test]
    fn test_uncalibrated_bars_are_relative_heights() {
        let dataset = DataExtractor::default().extract(&chart(ChartKind::Bar, vec![0, 1, 2], Some(0)), &bars(), &[], &[]);
        assert_eq!(dataset.calibration, Calibration::Uncalibrated);
        let values = dataset.values();
        assert!((values[2] - 1.0).abs() < 1e-9);
        assert!((values[0] - 49.0 / 149.0).abs() < 1e-9);
        assert!(dataset.labels().iter().all(Option::is_none));
    }

    #[test]
    fn test_grid_step_calibration() {
        let grid = StructuralPattern {
            id: 1,
            kind: PatternKind::Grid,
            members: vec![],
            tolerance: 4.0,
            confidence: 1.0,
            geometry: PatternGeometry::Grid {
                rows: vec![125.0, 175.0, 225.0],
                columns: vec![75.0, 125.0],
            },
        };
        let dataset = DataExtractor::default().extract(&chart(ChartKind::Bar, vec![0, 1, 2], Some(0)), &bars(), &[grid], &[]);
        assert_eq!(dataset.calibration, Calibration::GridSteps);
        // Zero at 250, one step per 50 px
        assert!((dataset.values()[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pie_from_spokes() {
        let circle = shape(0, ShapeKind::Circle, BoundingBox::new(50.0, 50.0, 200.0, 200.0));
        let mut shapes = vec![circle];
        // Spokes at 0°, 90° and 180° (y up)
        for (i, (x, y)) in [(200.0, 150.0), (150.0, 100.0), (100.0, 150.0)].into_iter().enumerate() {
            let mut spoke = shape(i + 1, ShapeKind::Line, BoundingBox::new(x - 1.0, y - 1.0, 2.0, 2.0));
            spoke.centroid = [x, y];
            shapes.push(spoke);
        }
        let radial = StructuralPattern {
            id: 0,
            kind: PatternKind::RadialArrangement,
            members: vec![1, 2, 3],
            tolerance: 0.25,
            confidence: 1.0,
            geometry: PatternGeometry::Radial {
                center: [150.0, 150.0],
                mean_radius: 50.0,
                anchor: Some(0),
            },
        };
        let ocr = vec![text("Top", 10.0, 30.0, 30.0), text("Right", 210.0, 10.0, 40.0)];
        let dataset = DataExtractor::default().extract(
            &chart(ChartKind::Pie, vec![0, 1, 2, 3], Some(0)),
            &shapes,
            &[radial],
            &ocr,
        );
        let values = dataset.values();
        assert_eq!(values.len(), 3);
        assert!((values[0] - 0.25).abs() < 1e-9);
        assert!((values[1] - 0.25).abs() < 1e-9);
        assert!((values[2] - 0.5).abs() < 1e-9);
        assert!((values.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(dataset.points[0].label.as_deref(), Some("Right"));
        assert_eq!(dataset.points[1].label.as_deref(), Some("Top"));
        assert_eq!(dataset.points[2].label, None);
    }

    #[test]
    fn test_gridlines_calibrate_bars() {
        let mut shapes = bars();
        let mut rule = |id: ShapeId, from: [f64; 2], to: [f64; 2]| {
            let bbox = BoundingBox::new(from[0], from[1].min(to[1]) - 1.0, to[0] - from[0], (to[1] - from[1]).abs() + 2.0);
            let mut line = shape(id, ShapeKind::Line, bbox);
            line.path = vec![from, to];
            shapes.push(line);
        };
        for (i, y) in [99.0, 149.0, 199.0, 249.0].into_iter().enumerate() {
            rule(3 + i, [40.0, y], [200.0, y]);
        }
        // Vertical axis and a short legend dash are not gridlines
        rule(7, [30.0, 50.0], [30.5, 250.0]);
        rule(8, [150.0, 20.0], [160.0, 20.0]);

        let baseline = StructuralPattern {
            id: 0,
            kind: PatternKind::VerticalAlignment,
            members: vec![0, 1, 2],
            tolerance: 6.0,
            confidence: 1.0,
            geometry: PatternGeometry::Baseline { y: 249.0 },
        };
        let dataset = DataExtractor::default().extract(
            &chart(ChartKind::Bar, vec![0, 1, 2], Some(0)),
            &shapes,
            &[baseline],
            &[],
        );
        assert_eq!(dataset.calibration, Calibration::GridSteps);
        for (value, expected) in dataset.values().iter().zip([0.98, 1.98, 2.98]) {
            assert!((value - expected).abs() < 1e-9, "{value} vs {expected}");
        }
    }

    #[test]
    fn test_bent_stroke_sampled_along_path() {
        let mut stroke = shape(0, ShapeKind::Line, BoundingBox::new(58.0, 67.0, 244.0, 146.0));
        stroke.path = vec![[60.0, 210.0], [120.0, 90.0], [180.0, 170.0], [240.0, 70.0], [300.0, 190.0]];
        let series = StructuralPattern {
            id: 0,
            kind: PatternKind::HorizontalAlignment,
            members: vec![0],
            tolerance: 7.2,
            confidence: 1.0,
            geometry: PatternGeometry::Progression { mean_spacing: 60.0 },
        };
        let mut ocr = vec![text("0", 20.0, 244.0, 12.0), text("100", 14.0, 44.0, 18.0)];
        for (i, month) in ["Jan", "Feb", "Mar", "Apr", "May"].into_iter().enumerate() {
            ocr.push(text(month, 50.0 + 60.0 * i as f64, 264.0, 20.0));
        }
        let dataset = DataExtractor::default().extract(
            &chart(ChartKind::Line, vec![0], Some(0)),
            &[stroke],
            &[series],
            &ocr,
        );
        assert_eq!(dataset.calibration, Calibration::Axis);
        assert_eq!(
            dataset.labels(),
            vec![Some("Jan"), Some("Feb"), Some("Mar"), Some("Apr"), Some("May")]
        );
        for (value, expected) in dataset.values().iter().zip([20.0, 80.0, 40.0, 90.0, 30.0]) {
            assert!((value - expected).abs() < 1e-9, "{value} vs {expected}");
        }
        assert!(dataset.points.iter().all(|p| p.source == Some(0)));
    }

    #[test]
    fn test_path_height_within_reach() {
        let path = [[60.0, 210.0], [120.0, 90.0], [180.0, 170.0]];
        assert_eq!(path_y(&path, 90.0, 3.6), Some(150.0));
        assert_eq!(path_y(&path, 183.0, 3.6), Some(170.0));
        assert_eq!(path_y(&path, 190.0, 3.6), None);
        assert_eq!(path_y(&path, 50.0, 12.0), Some(210.0));
        assert_eq!(path_y(&[], 90.0, 3.6), None);
    }

    #[test]
    fn test_line_interpolates_missing_samples() {
        let shapes = vec![
            shape(0, ShapeKind::Point, BoundingBox::new(57.0, 207.0, 6.0, 6.0)),
            shape(1, ShapeKind::Point, BoundingBox::new(177.0, 87.0, 6.0, 6.0)),
            shape(2, ShapeKind::Point, BoundingBox::new(297.0, 147.0, 6.0, 6.0)),
        ];
        let series = StructuralPattern {
            id: 0,
            kind: PatternKind::HorizontalAlignment,
            members: vec![0, 1, 2],
            tolerance: 7.2,
            confidence: 1.0,
            geometry: PatternGeometry::Progression { mean_spacing: 120.0 },
        };
        let ocr = vec![
            text("0", 20.0, 244.0, 12.0),
            text("100", 14.0, 44.0, 18.0),
            text("a", 55.0, 265.0, 10.0),
            text("b", 115.0, 265.0, 10.0),
            text("c", 175.0, 265.0, 10.0),
            text("d", 295.0, 265.0, 10.0),
        ];
        let dataset = DataExtractor::default().extract(
            &chart(ChartKind::Line, vec![0, 1, 2], Some(0)),
            &shapes,
            &[series],
            &ocr,
        );
        assert_eq!(dataset.calibration, Calibration::Axis);
        assert_eq!(dataset.labels(), vec![Some("a"), Some("b"), Some("c"), Some("d")]);
        let expected = [20.0, 50.0, 80.0, 50.0];
        for (value, expected) in dataset.values().iter().zip(expected) {
            assert!((value - expected).abs() < 1e-6, "{value} vs {expected}");
        }
        assert_eq!(dataset.points[1].source, None);
    }

    #[test]
    fn test_unknown_chart_yields_empty_dataset() {
        let dataset = DataExtractor::default().extract(&ChartCandidate::unknown(), &[], &[], &[]);
        assert_eq!(dataset, ExtractedDataset::empty(ChartKind::Unknown));
    }
}
