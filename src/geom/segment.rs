//! Line segment operations on the horizontal plane.
//!
//! Footprint edges are 2D segments. This module answers the questions the
//! adjacency resolver asks about them: how far apart they are, whether they
//! lie on the same line, and which part of one overlaps the other.

use crate::geom::EPS;
use crate::geom::point::Point2D;

/// Directed segment `start -> end`.
#[derive(Debug, Clone, Copy)]
pub struct Segment2D {
    pub start: Point2D,
    pub end: Point2D,
}

impl Segment2D {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Point at parameter `t` (0 = start, 1 = end).
    pub fn point_at(&self, t: f64) -> Point2D {
        Point2D::lerp(self.start, self.end, t)
    }

    /// Parameter of the orthogonal projection of `pt` onto the supporting line.
    ///
    /// Not clamped, so values outside [0, 1] lie beyond the endpoints.
    pub fn project(&self, pt: Point2D) -> f64 {
        let len_sq = Point2D::dot(self.start, self.end, self.end);
        if len_sq < EPS * EPS {
            return 0.;
        }
        Point2D::dot(self.start, pt, self.end) / len_sq
    }
}

/// Calculates the distance between a point and a line segment.
pub fn distance_point_to_segment(pt: Point2D, p1: Point2D, p2: Point2D) -> f64 {
    let seg = Segment2D::new(p1, p2);
    let t = seg.project(pt).clamp(0., 1.);
    pt.distance(&seg.point_at(t))
}

/// Calculates the distance between a point and the infinite line through `p1` and `p2`.
pub fn distance_point_to_line(pt: Point2D, p1: Point2D, p2: Point2D) -> f64 {
    let len = p1.distance(&p2);
    if len < EPS {
        return pt.distance(&p1);
    }
    Point2D::cross(p1, p2, pt).abs() / len
}

/// Checks if two edges lie on a common line within `tol`.
///
/// Both endpoints of the shorter edge must lie within `tol` of the supporting
/// line of the longer one. Measuring against the longer edge keeps the test
/// stable when one edge is much shorter than the other.
pub fn are_edges_collinear(a: &Segment2D, b: &Segment2D, tol: f64) -> bool {
    let (long, short) = if a.length() >= b.length() { (a, b) } else { (b, a) };
    if long.length() < EPS {
        return false;
    }
    distance_point_to_line(short.start, long.start, long.end) <= tol
        && distance_point_to_line(short.end, long.start, long.end) <= tol
}

/// Returns the parameter interval on `a` shared with `b`, if the edges are coincident.
///
/// The edges must be collinear within `tol` and their projections must
/// overlap by more than `tol` (in length units). Touching at a single point
/// or overlapping by less than the tolerance is not an overlap.
pub fn edge_overlap(a: &Segment2D, b: &Segment2D, tol: f64) -> Option<(f64, f64)> {
    if !are_edges_collinear(a, b, tol) {
        return None;
    }
    let ta = a.project(b.start);
    let tb = a.project(b.end);
    let t0 = ta.min(tb).max(0.);
    let t1 = ta.max(tb).min(1.);
    if (t1 - t0) * a.length() <= tol {
        return None;
    }
    Some((t0, t1))
}

/// Checks if two edges are coincident within `tol`.
///
/// True for full containment (both endpoints of one edge within `tol` of the
/// other segment) as well as for partial overlap found through projection.
pub fn edges_coincident(a: &Segment2D, b: &Segment2D, tol: f64) -> bool {
    edge_overlap(a, b, tol).is_some()
}

/// Checks if segments `a1-a2` and `b1-b2` cross or touch within `tol`.
pub fn segments_intersect(a1: Point2D, a2: Point2D, b1: Point2D, b2: Point2D, tol: f64) -> bool {
    let d1 = Point2D::cross(b1, b2, a1);
    let d2 = Point2D::cross(b1, b2, a2);
    let d3 = Point2D::cross(a1, a2, b1);
    let d4 = Point2D::cross(a1, a2, b2);

    // Proper crossing
    if ((d1 > 0. && d2 < 0.) || (d1 < 0. && d2 > 0.))
        && ((d3 > 0. && d4 < 0.) || (d3 < 0. && d4 > 0.))
    {
        return true;
    }

    // Touching (endpoint on the other segment)
    distance_point_to_segment(a1, b1, b2) <= tol
        || distance_point_to_segment(a2, b1, b2) <= tol
        || distance_point_to_segment(b1, a1, a2) <= tol
        || distance_point_to_segment(b2, a1, a2) <= tol
}

/// Intersection point of the supporting lines of two segments.
///
/// Returns the parameters `(t, s)` on `a` and `b`, or `None` for parallel lines.
pub fn line_intersection(a: &Segment2D, b: &Segment2D) -> Option<(f64, f64)> {
    let rx = a.end.x - a.start.x;
    let ry = a.end.y - a.start.y;
    let sx = b.end.x - b.start.x;
    let sy = b.end.y - b.start.y;
    let denom = rx * sy - ry * sx;
    if denom.abs() < EPS {
        return None;
    }
    let qx = b.start.x - a.start.x;
    let qy = b.start.y - a.start.y;
    let t = (qx * sy - qy * sx) / denom;
    let s = (qx * ry - qy * rx) / denom;
    Some((t, s))
}
