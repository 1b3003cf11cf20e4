use std::collections::BTreeMap;
use std::f64::consts::{PI, TAU};

use geo::{Area, Centroid, ConvexHull, MinimumRotatedRect};
use tracing::{debug, trace};

use crate::{
    algorithms::simplification::{
        approximate_path, approximate_polygon, corner_cosines, distance, is_self_intersecting,
        path_distance, ring_area, ring_perimeter, side_lengths,
    },
    config::{AnalysisConfig, ShapeThresholds},
    types::{BoundingBox, RawContour, ShapeCandidate, ShapeFeatures, ShapeKind, to_polygon},
};

/// Output of one detection pass over a region
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    /// Classified shapes; `shapes[i].id == i`
    pub shapes: Vec<ShapeCandidate>,
    /// Contours rejected as degenerate, malformed or too small
    pub dropped: usize,
}

/// Classifies traced contours into primitive shapes.
///
/// Each contour is approximated at every configured tolerance; the rules
/// run in priority order (rectangle, circle, triangle, point, line) against
/// each approximation and the most confident verdict across tolerances wins.
/// A thin contour no rule accepts is retried as a polyline, and children of a
/// circle that reach its centre are measured as pie sectors.
#[derive(Debug, Clone)]
pub struct ShapeDetector {
    pub min_shape_area: f64,
    /// Approximation tolerances as fractions of the contour perimeter
    pub epsilon_values: Vec<f64>,
    pub thresholds: ShapeThresholds,
}

impl Default for ShapeDetector {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

/// Measurements shared by every approximation of one contour
struct ContourGeometry {
    area: f64,
    perimeter: f64,
    bounding_box: BoundingBox,
    centroid: [f64; 2],
    solidity: f64,
    thickness: f64,
    length: f64,
    /// Ends of the long axis of the minimum rotated rectangle
    axis: [[f64; 2]; 2],
}

impl ContourGeometry {
    fn measure(points: &[[f64; 2]]) -> Option<Self> {
        if points.len() < 3 || points.iter().any(|[x, y]| !x.is_finite() || !y.is_finite()) {
            return None;
        }
        let area = ring_area(points);
        if !(area > 0.0) {
            return None;
        }

        let bounding_box = BoundingBox::from_points(points)?;
        let polygon = to_polygon(points);
        let centroid = polygon
            .centroid()
            .map(|c| [c.x(), c.y()])
            .unwrap_or_else(|| bounding_box.center());
        let hull_area = polygon.convex_hull().unsigned_area();
        let solidity = if hull_area > 0.0 { (area / hull_area).min(1.0) } else { 0.0 };

        let midpoint = |p: [f64; 2], q: [f64; 2]| [(p[0] + q[0]) / 2.0, (p[1] + q[1]) / 2.0];
        let (thickness, length, axis) = polygon
            .minimum_rotated_rect()
            .and_then(|rect| {
                let c: Vec<_> = rect.exterior().coords().map(|c| [c.x, c.y]).collect();
                (c.len() >= 4).then(|| {
                    let a = distance(c[0], c[1]);
                    let b = distance(c[1], c[2]);
                    // The long axis joins the midpoints of the short sides
                    if a <= b {
                        (a, b, [midpoint(c[0], c[1]), midpoint(c[2], c[3])])
                    } else {
                        (b, a, [midpoint(c[1], c[2]), midpoint(c[3], c[0])])
                    }
                })
            })
            .unwrap_or_else(|| {
                let [cx, cy] = bounding_box.center();
                let axis = if bounding_box.width >= bounding_box.height {
                    [[bounding_box.x, cy], [bounding_box.max_x(), cy]]
                } else {
                    [[cx, bounding_box.y], [cx, bounding_box.max_y()]]
                };
                (
                    bounding_box.width.min(bounding_box.height),
                    bounding_box.width.max(bounding_box.height),
                    axis,
                )
            });

        Some(Self {
            area,
            perimeter: ring_perimeter(points),
            bounding_box,
            centroid,
            solidity,
            thickness,
            length,
            axis,
        })
    }

    fn elongation(&self) -> f64 {
        self.length / self.thickness.max(1e-9)
    }

    /// Long axis as a left-to-right path
    fn straight_path(&self) -> Vec<[f64; 2]> {
        let mut ends = self.axis.to_vec();
        ends.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
        ends
    }
}

/// Verdict for one approximation
#[derive(Debug, Clone, Copy, PartialEq)]
struct Verdict {
    kind: ShapeKind,
    confidence: f64,
}

impl ShapeDetector {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            min_shape_area: config.min_shape_area,
            epsilon_values: config.epsilon_values.clone(),
            thresholds: config.shape.clone(),
        }
    }

    /// Classify every contour and associate nested shapes with their container
    pub fn detect(&self, contours: Vec<RawContour>) -> Detection {
        let mut epsilons: Vec<f64> = self
            .epsilon_values
            .iter()
            .copied()
            .filter(|eps| eps.is_finite() && *eps > 0.0)
            .collect();
        epsilons.sort_by(f64::total_cmp);
        epsilons.dedup();

        let total = contours.len();
        let mut shapes = Vec::with_capacity(total);
        for contour in contours {
            if let Some(shape) = self.classify_contour(contour, &epsilons, shapes.len()) {
                shapes.push(shape);
            }
        }
        let dropped = total - shapes.len();

        associate_children(&mut shapes, self.thresholds.containment_ratio);
        self.recognize_sectors(&mut shapes);
        debug!(shapes = shapes.len(), dropped, "Shape detection complete");

        Detection { shapes, dropped }
    }

    fn classify_contour(
        &self,
        contour: RawContour,
        epsilons: &[f64],
        id: usize,
    ) -> Option<ShapeCandidate> {
        let geometry = ContourGeometry::measure(&contour.points)?;
        if geometry.area < self.min_shape_area || epsilons.is_empty() {
            return None;
        }

        let approximations: Vec<(f64, Vec<[f64; 2]>)> = epsilons
            .iter()
            .map(|&eps| (eps, approximate_polygon(&contour.points, eps * geometry.perimeter)))
            .collect();

        // The finest approximation smooths pixel staircases without losing curvature
        let finest_perimeter = ring_perimeter(&approximations[0].1);
        let circularity = if finest_perimeter > 0.0 {
            4.0 * PI * geometry.area / finest_perimeter.powi(2)
        } else {
            0.0
        };

        let mut best: Option<(Verdict, f64, usize)> = None;
        let mut usable = 0;
        for (eps, vertices) in &approximations {
            if is_self_intersecting(vertices) {
                trace!(eps, "Skipping self-intersecting approximation");
                continue;
            }
            usable += 1;
            let Some(verdict) = self.classify_approximation(&geometry, vertices, circularity)
            else {
                continue;
            };
            let better = best
                .as_ref()
                .is_none_or(|(current, _, _)| verdict.confidence > current.confidence);
            if better {
                best = Some((verdict, *eps, vertices.len()));
            }
        }

        let mut path = Vec::new();
        if best.is_none() && !contour.is_hole {
            if let Some((verdict, eps, centreline)) =
                self.classify_polyline(&geometry, &contour.points, epsilons)
            {
                best = Some((verdict, eps, centreline.len()));
                path = centreline;
            }
        }
        if usable == 0 && best.is_none() {
            return None;
        }

        let (verdict, epsilon, vertex_count) = best.unwrap_or((
            Verdict {
                kind: ShapeKind::Unknown,
                confidence: 0.0,
            },
            approximations[0].0,
            approximations[0].1.len(),
        ));
        if verdict.kind == ShapeKind::Line && path.is_empty() {
            path = geometry.straight_path();
        }

        let bbox = geometry.bounding_box;
        Some(ShapeCandidate {
            id,
            bounding_box: bbox,
            centroid: geometry.centroid,
            area: geometry.area,
            aspect_ratio: if bbox.height > 0.0 { bbox.width / bbox.height } else { 0.0 },
            vertex_count,
            epsilon,
            kind: verdict.kind,
            confidence: verdict.confidence.clamp(0.0, 1.0),
            is_hole: contour.is_hole,
            parent: None,
            features: ShapeFeatures {
                perimeter: geometry.perimeter,
                circularity,
                solidity: geometry.solidity,
                extent: if bbox.area() > 0.0 { geometry.area / bbox.area() } else { 0.0 },
                thickness: geometry.thickness,
                elongation: geometry.elongation(),
            },
            contour: contour.points,
            path,
        })
    }

    /// Apply the rule table to one approximation; `None` means unknown
    fn classify_approximation(
        &self,
        geometry: &ContourGeometry,
        vertices: &[[f64; 2]],
        circularity: f64,
    ) -> Option<Verdict> {
        let t = &self.thresholds;
        let small = geometry.bounding_box.area() <= t.point_max_area;
        let stroke =
            geometry.thickness <= t.line_max_thickness && geometry.elongation() >= t.line_min_elongation;

        // Corners and roundness cannot be measured on a handful of pixels or on a stroke
        if !small && !stroke {
            if let Some(deviation) = rectangle_deviation(geometry, vertices) {
                if deviation <= t.rectangle_tolerance {
                    return Some(Verdict {
                        kind: ShapeKind::Rectangle,
                        confidence: 1.0 - deviation,
                    });
                }
            }
            if circularity >= t.circularity_threshold {
                return Some(Verdict {
                    kind: ShapeKind::Circle,
                    confidence: (1.0 - (1.0 - circularity).abs()).clamp(0.0, 1.0),
                });
            }
            if let Some(deviation) = triangle_deviation(geometry, vertices) {
                if deviation <= t.triangle_tolerance {
                    return Some(Verdict {
                        kind: ShapeKind::Triangle,
                        confidence: 1.0 - deviation,
                    });
                }
            }
        }

        // A few pixels of a ruling split from a crossing shape stay a stroke
        if small && geometry.elongation() < t.line_min_elongation {
            let bbox = geometry.bounding_box;
            let (short, long) = (bbox.width.min(bbox.height), bbox.width.max(bbox.height));
            return Some(Verdict {
                kind: ShapeKind::Point,
                confidence: if long > 0.0 { short / long } else { 1.0 },
            });
        }

        if stroke && vertices.len() <= t.line_max_vertices {
            return Some(Verdict {
                kind: ShapeKind::Line,
                confidence: (1.0 - geometry.thickness / geometry.length.max(1e-9)).clamp(0.0, 1.0),
            });
        }

        None
    }

    /// Read a thin contour as a bent stroke: its column-wise centreline
    /// approximated at each tolerance, at least two segments long
    fn classify_polyline(
        &self,
        geometry: &ContourGeometry,
        points: &[[f64; 2]],
        epsilons: &[f64],
    ) -> Option<(Verdict, f64, Vec<[f64; 2]>)> {
        let t = &self.thresholds;
        // Mean width of a band enclosing its own area is 2A/P
        let width = 2.0 * geometry.area / geometry.perimeter.max(1e-9);
        if width > t.line_max_thickness || geometry.perimeter / 2.0 < t.line_min_elongation * width.max(1.0) {
            return None;
        }
        let centreline = column_centreline(points, t.line_max_thickness * t.line_min_elongation)?;

        let mut best: Option<(Verdict, f64, Vec<[f64; 2]>)> = None;
        for &eps in epsilons {
            let path = approximate_path(&centreline, (eps * geometry.perimeter).max(width));
            if path.len() < 3 {
                continue;
            }
            let deviation = centreline.iter().map(|p| path_distance(*p, &path)).sum::<f64>()
                / centreline.len() as f64
                / width.max(1.0);
            let verdict = Verdict {
                kind: ShapeKind::Line,
                confidence: (1.0 - deviation).clamp(0.0, 1.0),
            };
            if best.as_ref().is_none_or(|(current, _, _)| verdict.confidence > current.confidence) {
                best = Some((verdict, eps, path));
            }
        }
        best
    }

    /// Give circle children that reach the circle's centre the triangle kind
    /// when the sector fit beats their own verdict
    fn recognize_sectors(&self, shapes: &mut [ShapeCandidate]) {
        let t = &self.thresholds;
        let sectors: Vec<(usize, f64)> = shapes
            .iter()
            .filter(|s| matches!(s.kind, ShapeKind::Unknown | ShapeKind::Triangle))
            .filter_map(|s| {
                let circle = s.parent.and_then(|p| shapes.get(p)).filter(|p| p.kind == ShapeKind::Circle)?;
                let radius = (circle.bounding_box.width + circle.bounding_box.height) / 4.0;
                let deviation =
                    sector_deviation(&s.contour, s.area, circle.centroid, radius, t.sector_apex_fraction)?;
                (deviation <= t.triangle_tolerance && 1.0 - deviation > s.confidence)
                    .then_some((s.id, 1.0 - deviation))
            })
            .collect();

        for (id, confidence) in sectors {
            trace!(id, confidence, "Contour reads as a pie sector");
            shapes[id].kind = ShapeKind::Triangle;
            shapes[id].confidence = confidence;
        }
    }
}

/// Midpoint of every pixel column of a contour, left to right; `None` when a
/// column is crossed more than once or the stroke is thicker than `max_chord`
fn column_centreline(points: &[[f64; 2]], max_chord: f64) -> Option<Vec<[f64; 2]>> {
    let mut columns: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
    for &[x, y] in points {
        let span = columns.entry(x.round() as i64).or_insert((y, y));
        span.0 = span.0.min(y);
        span.1 = span.1.max(y);
    }
    if columns.len() < 2 || columns.values().any(|(top, bottom)| bottom - top > max_chord) {
        return None;
    }
    Some(
        columns
            .into_iter()
            .map(|(x, (top, bottom))| [x as f64, (top + bottom) / 2.0])
            .collect(),
    )
}

/// Area mismatch against the circular sector spanned by a contour whose
/// apex lies within `apex_fraction` of the radius from `center`
fn sector_deviation(
    contour: &[[f64; 2]],
    area: f64,
    center: [f64; 2],
    radius: f64,
    apex_fraction: f64,
) -> Option<f64> {
    let core = apex_fraction * radius;
    let distances: Vec<f64> = contour.iter().map(|p| distance(*p, center)).collect();
    let apex = distances.iter().copied().fold(f64::INFINITY, f64::min);
    if !(apex <= core) {
        return None;
    }
    let reach = distances.iter().copied().fold(0.0, f64::max);
    let angles = contour
        .iter()
        .zip(&distances)
        .filter(|(_, d)| **d >= core)
        .map(|(p, _)| polar_angle(center, *p))
        .collect();
    let (_, extent) = covered_arc(angles)?;
    let ideal = extent * reach * reach / 2.0;
    (ideal > 0.0).then(|| (1.0 - area / ideal).abs())
}

/// Angle of `point` around `center`, counter-clockwise from +x with y up
pub(crate) fn polar_angle(center: [f64; 2], point: [f64; 2]) -> f64 {
    (-(point[1] - center[1])).atan2(point[0] - center[0]).rem_euclid(TAU)
}

/// Start angle and angular extent of the arc covered by `angles`
pub(crate) fn covered_arc(mut angles: Vec<f64>) -> Option<(f64, f64)> {
    if angles.len() < 2 {
        return None;
    }
    angles.sort_by(f64::total_cmp);
    let n = angles.len();
    let (gap_end, largest_gap) = (0..n)
        .map(|i| {
            let next = (i + 1) % n;
            (next, (angles[next] - angles[i]).rem_euclid(TAU))
        })
        .fold((0, f64::NEG_INFINITY), |best, (next, gap)| if gap > best.1 { (next, gap) } else { best });
    Some((angles[gap_end], TAU - largest_gap))
}

/// Worst of opposite-side mismatch, corner skew, fill and convexity deviation
fn rectangle_deviation(geometry: &ContourGeometry, vertices: &[[f64; 2]]) -> Option<f64> {
    if vertices.len() != 4 {
        return None;
    }
    let sides = side_lengths(vertices);
    let mismatch = |a: f64, b: f64| {
        let longer = a.max(b);
        if longer > 0.0 { 1.0 - a.min(b) / longer } else { 1.0 }
    };
    let side = mismatch(sides[0], sides[2]).max(mismatch(sides[1], sides[3]));
    let corner = corner_cosines(vertices).into_iter().fold(0.0, f64::max);

    Some(
        side.max(corner)
            .max(fill_deviation(geometry, vertices))
            .max(1.0 - geometry.solidity),
    )
}

/// Fill and convexity deviation of a three-vertex approximation.
///
/// The angles of a non-degenerate three-vertex polygon always sum to 180°,
/// so the measurable deviation is how well the triangle covers the contour.
fn triangle_deviation(geometry: &ContourGeometry, vertices: &[[f64; 2]]) -> Option<f64> {
    if vertices.len() != 3 || ring_area(vertices) <= 0.0 {
        return None;
    }
    Some(fill_deviation(geometry, vertices).max(1.0 - geometry.solidity))
}

fn fill_deviation(geometry: &ContourGeometry, vertices: &[[f64; 2]]) -> f64 {
    (1.0 - ring_area(vertices) / geometry.area).abs()
}

/// Give every shape the smallest other shape whose bounding box contains it
fn associate_children(shapes: &mut [ShapeCandidate], containment_ratio: f64) {
    let parents: Vec<Option<usize>> = shapes
        .iter()
        .map(|child| {
            shapes
                .iter()
                .filter(|outer| {
                    outer.id != child.id
                        && outer.bounding_box.area() > child.bounding_box.area()
                        && outer.bounding_box.containment_of(&child.bounding_box) >= containment_ratio
                })
                .min_by(|a, b| {
                    a.bounding_box
                        .area()
                        .total_cmp(&b.bounding_box.area())
                        .then(a.id.cmp(&b.id))
                })
                .map(|outer| outer.id)
        })
        .collect();

    for (shape, parent) in shapes.iter_mut().zip(parents) {
        shape.parent = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle_border(x0: i32, y0: i32, x1: i32, y1: i32) -> Vec<[f64; 2]> {
        let mut points = Vec::new();
        for x in x0..x1 {
            points.push([x as f64, y0 as f64]);
        }
        for y in y0..y1 {
            points.push([x1 as f64, y as f64]);
        }
        for x in (x0 + 1..=x1).rev() {
            points.push([x as f64, y1 as f64]);
        }
        for y in (y0 + 1..=y1).rev() {
            points.push([x0 as f64, y as f64]);
        }
        points
    }

    /// Dense samples along the closed polygon through `corners`
    fn polygon_border(corners: &[[f64; 2]]) -> Vec<[f64; 2]> {
        let mut points = Vec::new();
        for i in 0..corners.len() {
            let a = corners[i];
            let b = corners[(i + 1) % corners.len()];
            let steps = distance(a, b).ceil().max(1.0) as usize;
            for s in 0..steps {
                let t = s as f64 / steps as f64;
                points.push([a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]);
            }
        }
        points
    }

    fn circle_border(cx: f64, cy: f64, r: f64) -> Vec<[f64; 2]> {
        (0..360)
            .map(|d| {
                let t = (d as f64).to_radians();
                [cx + r * t.cos(), cy + r * t.sin()]
            })
            .collect()
    }

    fn outer(points: Vec<[f64; 2]>) -> RawContour {
        RawContour {
            points,
            is_hole: false,
        }
    }

    fn detect_one(points: Vec<[f64; 2]>) -> ShapeCandidate {
        let detection = ShapeDetector::default().detect(vec![outer(points)]);
        assert_eq!(detection.shapes.len(), 1, "Expected exactly one shape");
        detection.shapes.into_iter().next().expect("One shape")
    }

    #[test]
    fn test_rectangle() {
        let shape = detect_one(rectangle_border(10, 10, 40, 90));
        assert_eq!(shape.kind, ShapeKind::Rectangle);
        assert!(shape.confidence > 0.99);
        assert_eq!(shape.vertex_count, 4);
        assert!((shape.area - 2400.0).abs() < 1e-6);
        assert!((shape.aspect_ratio - 30.0 / 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_circle() {
        let shape = detect_one(circle_border(100.0, 100.0, 40.0));
        assert_eq!(shape.kind, ShapeKind::Circle);
        assert!(shape.confidence > 0.9);
        assert!(shape.features.circularity > 0.9);
    }

    #[test]
    fn test_triangle() {
        let shape = detect_one(polygon_border(&[[0.0, 0.0], [60.0, 0.0], [30.0, 50.0]]));
        assert_eq!(shape.kind, ShapeKind::Triangle);
        assert_eq!(shape.vertex_count, 3);
        assert!(shape.confidence > 0.95);
    }

    #[test]
    fn test_point_marker() {
        let shape = detect_one(rectangle_border(50, 50, 55, 55));
        assert_eq!(shape.kind, ShapeKind::Point);
        assert!((shape.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_thin_stroke_is_line() {
        let shape = detect_one(rectangle_border(0, 0, 60, 2));
        assert_eq!(shape.kind, ShapeKind::Line);
        assert!(shape.confidence > 0.9);
        assert!(shape.features.elongation >= 4.0);
    }

    #[test]
    fn test_short_sliver_is_line() {
        let shape = detect_one(rectangle_border(0, 0, 19, 1));
        assert_eq!(shape.kind, ShapeKind::Line);
        assert_eq!(shape.path.len(), 2);
        assert!(shape.path[0][0] < shape.path[1][0]);
        assert!(shape.path.iter().all(|p| (p[1] - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_bent_stroke_is_polyline() {
        let centre = |x: f64| if (x as i64 / 60) % 2 == 0 { 100.0 - (x % 60.0) } else { 40.0 + (x % 60.0) };
        let mut band: Vec<[f64; 2]> = (0..=180).map(|x| [x as f64, centre(x as f64) - 2.0]).collect();
        band.extend((0..=180).rev().map(|x| [x as f64, centre(x as f64) + 2.0]));

        let shape = detect_one(band);
        assert_eq!(shape.kind, ShapeKind::Line);
        assert!(shape.confidence > 0.99);
        assert_eq!(
            shape.path,
            vec![[0.0, 100.0], [60.0, 40.0], [120.0, 100.0], [180.0, 40.0]]
        );
        assert_eq!(shape.vertex_count, 4);
    }

    #[test]
    fn test_wide_sector_in_circle_is_triangle() {
        let mut corners = vec![[100.0, 100.0]];
        corners.extend((30..=150).map(|d| {
            let t = (d as f64).to_radians();
            [100.0 + 58.0 * t.cos(), 100.0 - 58.0 * t.sin()]
        }));
        let detection = ShapeDetector::default().detect(vec![
            outer(circle_border(100.0, 100.0, 60.0)),
            RawContour {
                points: polygon_border(&corners),
                is_hole: true,
            },
        ]);
        let sector = &detection.shapes[1];
        assert_eq!(sector.parent, Some(0));
        assert_eq!(sector.kind, ShapeKind::Triangle);
        assert!(sector.confidence > 0.95);

        // Away from the centre the same outline is not a sector
        let moved: Vec<[f64; 2]> = polygon_border(&corners).into_iter().map(|[x, y]| [x, y - 30.0]).collect();
        let offset = sector_deviation(&moved, sector.area, [100.0, 100.0], 60.0, 0.2);
        assert_eq!(offset, None);
    }

    #[test]
    fn test_plus_sign_is_unknown() {
        let plus = polygon_border(&[
            [-10.0, -30.0], [10.0, -30.0], [10.0, -10.0], [30.0, -10.0],
            [30.0, 10.0], [10.0, 10.0], [10.0, 30.0], [-10.0, 30.0],
            [-10.0, 10.0], [-30.0, 10.0], [-30.0, -10.0], [-10.0, -10.0],
        ]);
        let shape = detect_one(plus);
        assert_eq!(shape.kind, ShapeKind::Unknown);
        assert_eq!(shape.confidence, 0.0);
    }

    #[test]
    fn test_degenerate_and_small_contours_dropped() {
        let detection = ShapeDetector::default().detect(vec![
            outer(vec![[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]]),
            outer(vec![[0.0, 0.0], [1.0, 0.0]]),
            outer(rectangle_border(0, 0, 2, 2)),
            outer(vec![[f64::NAN, 0.0], [1.0, 1.0], [2.0, 0.0]]),
        ]);
        assert!(detection.shapes.is_empty());
        assert_eq!(detection.dropped, 4);
    }

    #[test]
    fn test_nested_shape_gets_parent() {
        let detection = ShapeDetector::default().detect(vec![
            outer(circle_border(100.0, 100.0, 60.0)),
            RawContour {
                points: polygon_border(&[[100.0, 100.0], [150.0, 100.0], [100.0, 50.0]]),
                is_hole: true,
            },
            outer(rectangle_border(300, 300, 330, 360)),
        ]);
        assert_eq!(detection.shapes.len(), 3);
        assert_eq!(detection.shapes[0].parent, None);
        assert_eq!(detection.shapes[1].parent, Some(0));
        assert!(detection.shapes[1].is_hole);
        assert_eq!(detection.shapes[2].parent, None);
    }

    #[test]
    fn test_detection_is_deterministic() {
        let contours = || {
            vec![
                outer(circle_border(80.0, 80.0, 30.0)),
                outer(rectangle_border(200, 20, 230, 120)),
                outer(polygon_border(&[[0.0, 200.0], [40.0, 200.0], [20.0, 170.0]])),
            ]
        };
        let detector = ShapeDetector::default();
        assert_eq!(detector.detect(contours()), detector.detect(contours()));
    }

    #[test]
    fn test_covered_arc_wraps_zero() {
        let angles = vec![350f64.to_radians(), 10f64.to_radians(), 30f64.to_radians()];
        let (start, extent) = covered_arc(angles).expect("Arc");
        assert!((start - 350f64.to_radians()).abs() < 1e-9);
        assert!((extent - 40f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn test_ids_are_dense_after_dropping() {
        let detection = ShapeDetector::default().detect(vec![
            outer(vec![[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]]),
            outer(rectangle_border(10, 10, 40, 90)),
        ]);
        assert_eq!(detection.shapes.len(), 1);
        assert_eq!(detection.shapes[0].id, 0);
        assert_eq!(detection.dropped, 1);
    }
}
