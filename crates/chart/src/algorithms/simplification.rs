use geo::{Area, EuclideanDistance, Simplify};
use geo_types::{Line, Point};

use crate::types::{to_line_string, to_polygon};

/// Douglas-Peucker approximation of a closed contour using geo's implementation.
///
/// The ring is closed before simplifying so the start point is treated like
/// any other vertex. The returned vertex list is open (no repeated closing
/// vertex).
pub fn approximate_polygon(points: &[[f64; 2]], tolerance: f64) -> Vec<[f64; 2]> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut ring = to_line_string(points);
    ring.close();
    let simplified = ring.simplify(&tolerance);

    let mut vertices: Vec<[f64; 2]> = simplified.coords().map(|c| [c.x, c.y]).collect();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

/// Douglas-Peucker approximation of an open path; both ends are kept
pub fn approximate_path(points: &[[f64; 2]], tolerance: f64) -> Vec<[f64; 2]> {
    if points.len() < 3 {
        return points.to_vec();
    }
    to_line_string(points)
        .simplify(&tolerance)
        .coords()
        .map(|c| [c.x, c.y])
        .collect()
}

/// Distance from `point` to the nearest segment of the open path through `vertices`
pub fn path_distance(point: [f64; 2], vertices: &[[f64; 2]]) -> f64 {
    match vertices {
        [] => f64::INFINITY,
        [only] => distance(point, *only),
        _ => vertices
            .windows(2)
            .map(|w| Point::from(point).euclidean_distance(&Line::new(w[0], w[1])))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Length of the closed ring through `vertices`
pub fn ring_perimeter(vertices: &[[f64; 2]]) -> f64 {
    if vertices.len() < 2 {
        return 0.0;
    }
    (0..vertices.len())
        .map(|i| distance(vertices[i], vertices[(i + 1) % vertices.len()]))
        .sum()
}

/// Unsigned area enclosed by the closed ring through `vertices`
pub fn ring_area(vertices: &[[f64; 2]]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    to_polygon(vertices).unsigned_area()
}

/// Edge lengths of the closed ring, edge `i` running from vertex `i` to `i + 1`
pub fn side_lengths(vertices: &[[f64; 2]]) -> Vec<f64> {
    (0..vertices.len())
        .map(|i| distance(vertices[i], vertices[(i + 1) % vertices.len()]))
        .collect()
}

/// |cos| of the interior angle at every vertex; 0 for a right angle
pub fn corner_cosines(vertices: &[[f64; 2]]) -> Vec<f64> {
    let n = vertices.len();
    (0..n)
        .map(|i| {
            let prev = vertices[(i + n - 1) % n];
            let here = vertices[i];
            let next = vertices[(i + 1) % n];
            let a = [prev[0] - here[0], prev[1] - here[1]];
            let b = [next[0] - here[0], next[1] - here[1]];
            let norm = a[0].hypot(a[1]) * b[0].hypot(b[1]);
            if norm <= f64::EPSILON {
                1.0
            } else {
                ((a[0] * b[0] + a[1] * b[1]) / norm).abs()
            }
        })
        .collect()
}

/// Whether two non-adjacent edges of the ring properly cross each other.
///
/// Touching and collinear overlaps are not counted: pixel borders touch
/// themselves wherever a region is one pixel wide.
pub fn is_self_intersecting(vertices: &[[f64; 2]]) -> bool {
    let n = vertices.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let (a1, a2) = (vertices[i], vertices[(i + 1) % n]);
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (b1, b2) = (vertices[j], vertices[(j + 1) % n]);
            if segments_cross(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

pub fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

fn orientation(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn segments_cross(a1: [f64; 2], a2: [f64; 2], b1: [f64; 2], b2: [f64; 2]) -> bool {
    let d1 = orientation(b1, b2, a1);
    let d2 = orientation(b1, b2, a2);
    let d3 = orientation(a1, a2, b1);
    let d4 = orientation(a1, a2, b2);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Boundary pixels of an axis-aligned rectangle, clockwise from the top-left
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

    #[test]
    fn test_rectangle_reduces_to_corners() {
        let border = rectangle_border(10, 20, 40, 80);
        for tolerance in [0.5, 2.0, 10.0] {
            let vertices = approximate_polygon(&border, tolerance);
            assert_eq!(vertices.len(), 4, "tolerance {tolerance}");
        }
        let vertices = approximate_polygon(&border, 1.0);
        assert!((ring_area(&vertices) - 30.0 * 60.0).abs() < 1e-9);
        assert!((ring_perimeter(&vertices) - 180.0).abs() < 1e-9);
        assert!(corner_cosines(&vertices).iter().all(|c| *c < 1e-9));
    }

    #[test]
    fn test_circle_keeps_many_vertices_at_fine_tolerance() {
        let circle: Vec<[f64; 2]> = (0..360)
            .map(|d| {
                let t = (d as f64).to_radians();
                [100.0 + 50.0 * t.cos(), 100.0 + 50.0 * t.sin()]
            })
            .collect();
        assert!(approximate_polygon(&circle, 1.0).len() > 8);
        assert!(approximate_polygon(&circle, 30.0).len() <= 4);
    }

    #[test]
    fn test_bow_tie_is_self_intersecting() {
        let bow_tie = [[0.0, 0.0], [10.0, 10.0], [10.0, 0.0], [0.0, 10.0]];
        let square = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        assert!(is_self_intersecting(&bow_tie));
        assert!(!is_self_intersecting(&square));
    }

    #[test]
    fn test_open_path_keeps_bends() {
        let zig_zag: Vec<[f64; 2]> = (0..=120)
            .map(|x| {
                let x = x as f64;
                let y = if x <= 60.0 { 100.0 - x } else { x - 20.0 };
                [x, y]
            })
            .collect();
        let path = approximate_path(&zig_zag, 2.0);
        assert_eq!(path, vec![[0.0, 100.0], [60.0, 40.0], [120.0, 100.0]]);
        assert!(path_distance([60.0, 40.0], &path) < 1e-9);
        assert!((path_distance([0.0, 0.0], &path) - 50.0f64.hypot(50.0)).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(ring_area(&[[0.0, 0.0], [1.0, 1.0]]), 0.0);
        assert_eq!(ring_perimeter(&[[0.0, 0.0]]), 0.0);
        assert_eq!(approximate_polygon(&[[1.0, 1.0]], 1.0).len(), 1);
    }
}
