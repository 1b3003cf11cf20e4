use geo_types::{Coord, LineString, Polygon};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Stable index of a shape inside one region's shape list
pub type ShapeId = usize;

/// Stable index of a pattern inside one region's pattern list
pub type PatternId = usize;

/// Axis-aligned box in pixel coordinates (y grows downwards)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Tight box around a point set; `None` for an empty set
    pub fn from_points(points: &[[f64; 2]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut min = *first;
        let mut max = *first;
        for &[x, y] in rest {
            min[0] = min[0].min(x);
            min[1] = min[1].min(y);
            max[0] = max[0].max(x);
            max[1] = max[1].max(y);
        }
        Some(Self::new(min[0], min[1], max[0] - min[0], max[1] - min[1]))
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> [f64; 2] {
        [self.x + self.width / 2.0, self.y + self.height / 2.0]
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Smallest box covering both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        BoundingBox::new(
            x,
            y,
            self.max_x().max(other.max_x()) - x,
            self.max_y().max(other.max_y()) - y,
        )
    }

    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let w = self.max_x().min(other.max_x()) - self.x.max(other.x);
        let h = self.max_y().min(other.max_y()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }

    /// Fraction of `inner` lying inside `self`.
    ///
    /// Degenerate (zero-area) inner boxes count as fully contained when their
    /// extent is inside `self`.
    pub fn containment_of(&self, inner: &BoundingBox) -> f64 {
        let area = inner.area();
        if area <= 0.0 {
            let inside = inner.x >= self.x
                && inner.y >= self.y
                && inner.max_x() <= self.max_x()
                && inner.max_y() <= self.max_y();
            return if inside { 1.0 } else { 0.0 };
        }
        self.intersection_area(inner) / area
    }

    pub fn distance_to_point(&self, [px, py]: [f64; 2]) -> f64 {
        let dx = (self.x - px).max(0.0).max(px - self.max_x());
        let dy = (self.y - py).max(0.0).max(py - self.max_y());
        dx.hypot(dy)
    }
}

/// A traced border before classification
#[derive(Debug, Clone, PartialEq)]
pub struct RawContour {
    pub points: Vec<[f64; 2]>,
    /// Border of a hole rather than of an outer foreground region
    pub is_hole: bool,
}

/// Primitive shape a contour was classified as
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    /// Three-vertex marker or pie sector
    Triangle,
    Point,
    Line,
    Unknown,
}

impl ShapeKind {
    /// Whether the kind takes part in chart classification
    pub fn is_classified(self) -> bool {
        !matches!(self, ShapeKind::Unknown)
    }

    /// Kinds that can mark a series in a line chart
    pub fn is_series_mark(self) -> bool {
        matches!(self, ShapeKind::Line | ShapeKind::Point)
    }

    /// Kinds that can bound a pie sector
    pub fn is_radial_mark(self) -> bool {
        matches!(self, ShapeKind::Line | ShapeKind::Triangle)
    }
}

/// Descriptive measurements of a contour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShapeFeatures {
    /// Length of the closed contour
    pub perimeter: f64,
    /// 4πA/P² measured on the finest approximation; 1.0 for an ideal circle
    pub circularity: f64,
    /// Area over convex hull area
    pub solidity: f64,
    /// Area over bounding box area
    pub extent: f64,
    /// Short side of the minimum rotated rectangle
    pub thickness: f64,
    /// Long side over short side of the minimum rotated rectangle
    pub elongation: f64,
}

/// A classified contour.
///
/// Built once by the shape detector and only read afterwards; patterns and
/// chart verdicts refer to it by [`ShapeId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ShapeCandidate {
    pub id: ShapeId,
    /// Source contour, in tracing order
    pub contour: Vec<[f64; 2]>,
    pub bounding_box: BoundingBox,
    pub centroid: [f64; 2],
    /// Polygon area enclosed by the contour
    pub area: f64,
    /// Bounding box width over height
    pub aspect_ratio: f64,
    /// Vertex count of the approximation that decided `kind`
    pub vertex_count: usize,
    /// Approximation tolerance (fraction of perimeter) that decided `kind`
    pub epsilon: f64,
    pub kind: ShapeKind,
    pub confidence: f64,
    /// Whether the contour bounds a hole inside another foreground region
    pub is_hole: bool,
    /// Smallest shape whose bounding box contains this one
    pub parent: Option<ShapeId>,
    pub features: ShapeFeatures,
    /// Centreline of a line stroke, left to right; one segment for a straight
    /// stroke and one per bend for a polyline
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<[f64; 2]>,
}

impl ShapeCandidate {
    /// Convert the contour to a geo-types polygon
    pub fn to_geo_polygon(&self) -> Polygon<f64> {
        to_polygon(&self.contour)
    }

    /// Distance from the centroid to `point`
    pub fn distance_to(&self, point: [f64; 2]) -> f64 {
        (self.centroid[0] - point[0]).hypot(self.centroid[1] - point[1])
    }
}

pub(crate) fn to_line_string(points: &[[f64; 2]]) -> LineString<f64> {
    LineString::new(points.iter().map(|&[x, y]| Coord { x, y }).collect())
}

pub(crate) fn to_polygon(points: &[[f64; 2]]) -> Polygon<f64> {
    Polygon::new(to_line_string(points), vec![])
}

/// One recognized text fragment supplied by the OCR collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TextRegion {
    pub text: String,
    pub bounding_box: BoundingBox,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl TextRegion {
    pub fn new(text: impl Into<String>, bounding_box: BoundingBox) -> Self {
        Self {
            text: text.into(),
            bounding_box,
            confidence: None,
        }
    }

    pub fn center(&self) -> [f64; 2] {
        self.bounding_box.center()
    }

    /// Numeric reading of the text, tolerating common axis-label adornments
    /// such as `$1,200`, `45%` or `−3`.
    pub fn numeric_value(&self) -> Option<f64> {
        let cleaned: String = self
            .text
            .trim()
            .chars()
            .filter(|c| !matches!(c, ',' | '$' | '€' | '£' | '%' | ' '))
            .map(|c| if c == '−' { '-' } else { c })
            .collect();
        if cleaned.is_empty() {
            return None;
        }
        cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_from_points() {
        let bbox = BoundingBox::from_points(&[[3.0, 4.0], [10.0, 1.0], [5.0, 9.0]])
            .expect("Non-empty point set");
        assert_eq!(bbox, BoundingBox::new(3.0, 1.0, 7.0, 8.0));
        assert_eq!(bbox.center(), [6.5, 5.0]);
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_containment() {
        let outer = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let inner = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        let straddling = BoundingBox::new(90.0, 0.0, 20.0, 10.0);
        assert_eq!(outer.containment_of(&inner), 1.0);
        assert!((outer.containment_of(&straddling) - 0.5).abs() < 1e-9);
        assert_eq!(inner.containment_of(&outer), 0.04);
    }

    #[test]
    fn test_numeric_value() {
        let region = |text: &str| TextRegion::new(text, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(region("40").numeric_value(), Some(40.0));
        assert_eq!(region(" $1,200 ").numeric_value(), Some(1200.0));
        assert_eq!(region("45%").numeric_value(), Some(45.0));
        assert_eq!(region("−2.5").numeric_value(), Some(-2.5));
        assert_eq!(region("Jan").numeric_value(), None);
        assert_eq!(region("").numeric_value(), None);
    }

    #[test]
    fn test_shape_kind_names() {
        assert_eq!(ShapeKind::Rectangle.to_string(), "rectangle");
        assert_eq!("line".parse::<ShapeKind>().ok(), Some(ShapeKind::Line));
        assert!(!ShapeKind::Unknown.is_classified());
    }
}
