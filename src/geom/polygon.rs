//! Simple polygons on the horizontal plane.
//!
//! Polygons are plain vertex slices, closed implicitly (the last vertex
//! connects back to the first). Counter-clockwise winding is canonical.

pub mod boolean;

use crate::geom::EPS;
use crate::geom::point::Point2D;
use crate::geom::segment::{distance_point_to_segment, segments_intersect};

/// Signed shoelace area. Positive for counter-clockwise winding.
pub fn polygon_area(pts: &[Point2D]) -> f64 {
    let n = pts.len();
    if n < 3 {
        return 0.;
    }
    let mut sum = 0.;
    for i in 0..n {
        let p = pts[i];
        let q = pts[(i + 1) % n];
        sum += p.x * q.y - q.x * p.y;
    }
    0.5 * sum
}

/// Returns true if vertices are ordered counter-clockwise.
pub fn is_ccw(pts: &[Point2D]) -> bool {
    polygon_area(pts) > 0.
}

/// Returns the length of the closed boundary.
pub fn perimeter(pts: &[Point2D]) -> f64 {
    let n = pts.len();
    (0..n).map(|i| pts[i].distance(&pts[(i + 1) % n])).sum()
}

/// Area-weighted centroid. Falls back to the vertex average for degenerate input.
pub fn centroid(pts: &[Point2D]) -> Point2D {
    let n = pts.len();
    let area = polygon_area(pts);
    if n == 0 {
        return Point2D::new(0., 0.);
    }
    if area.abs() < EPS {
        let sx: f64 = pts.iter().map(|p| p.x).sum();
        let sy: f64 = pts.iter().map(|p| p.y).sum();
        return Point2D::new(sx / n as f64, sy / n as f64);
    }
    let (mut cx, mut cy) = (0., 0.);
    for i in 0..n {
        let p = pts[i];
        let q = pts[(i + 1) % n];
        let f = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * f;
        cy += (p.y + q.y) * f;
    }
    Point2D::new(cx / (6. * area), cy / (6. * area))
}

/// Checks if a point lies inside a polygon (ray casting).
///
/// Points within `tol` of the boundary count as inside.
pub fn point_in_polygon(ptest: Point2D, pts: &[Point2D], tol: f64) -> bool {
    let n = pts.len();
    if n < 3 {
        return false;
    }

    // Boundary counts as inside
    for i in 0..n {
        if distance_point_to_segment(ptest, pts[i], pts[(i + 1) % n]) <= tol {
            return true;
        }
    }

    // Horizontal ray towards +x, count crossings
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = pts[i];
        let pj = pts[j];
        if (pi.y > ptest.y) != (pj.y > ptest.y) {
            let x_cross = pj.x + (ptest.y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
            if ptest.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Checks if the closed boundary crosses or touches itself.
///
/// Non-adjacent edges must not touch within `tol`. Adjacent edges must not
/// fold back onto each other (a spike).
pub fn is_self_intersecting(pts: &[Point2D], tol: f64) -> bool {
    let n = pts.len();
    if n < 3 {
        return false;
    }
    for i in 0..n {
        let a1 = pts[i];
        let a2 = pts[(i + 1) % n];
        for j in (i + 1)..n {
            let b1 = pts[j];
            let b2 = pts[(j + 1) % n];
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                // Shared vertex is expected; the far endpoints must stay off the other edge
                let (far_a, far_b) = if j == i + 1 { (a1, b2) } else { (a2, b1) };
                if distance_point_to_segment(far_b, a1, a2) <= tol
                    || distance_point_to_segment(far_a, b1, b2) <= tol
                {
                    return true;
                }
            } else if segments_intersect(a1, a2, b1, b2, tol) {
                return true;
            }
        }
    }
    false
}

/// Returns indices of the vertices kept after dropping near-duplicates.
///
/// Vertex `i` is dropped when it lies within `tol` of the next kept vertex,
/// so the edge starting at a kept vertex is always the one of non-zero length.
pub fn dedup_indices(pts: &[Point2D], tol: f64) -> Vec<usize> {
    let n = pts.len();
    let mut kept: Vec<usize> = Vec::new();
    for i in 0..n {
        let next = pts[(i + 1) % n];
        if !pts[i].is_close(&next, tol) {
            kept.push(i);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;

    const TOL: f64 = 0.01;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2D> {
        coords.iter().map(|&c| Point2D::from(c)).collect()
    }

    fn square() -> Vec<Point2D> {
        pts(&[(0., 0.), (1., 0.), (1., 1.), (0., 1.)])
    }

    #[test]
    fn test_signed_area() {
        let sq = square();
        assert!(polygon_area(&sq).is_close(1., 1e-12));
        let mut cw = sq.clone();
        cw.reverse();
        assert!(polygon_area(&cw).is_close(-1., 1e-12));
        assert!(is_ccw(&sq));
        assert!(!is_ccw(&cw));
    }

    #[test]
    fn test_area_l_shape() {
        let l = pts(&[(0., 0.), (2., 0.), (2., 1.), (1., 1.), (1., 2.), (0., 2.)]);
        assert!(polygon_area(&l).is_close(3., 1e-12));
        assert!(perimeter(&l).is_close(8., 1e-12));
    }

    #[test]
    fn test_centroid() {
        let c = centroid(&square());
        assert!(c.is_close(&Point2D::new(0.5, 0.5), 1e-12));
    }

    #[test]
    fn test_point_in_polygon() {
        let sq = square();
        assert!(point_in_polygon(Point2D::new(0.5, 0.5), &sq, TOL));
        assert!(!point_in_polygon(Point2D::new(1.5, 0.5), &sq, TOL));
        // Boundary and vertex count as inside
        assert!(point_in_polygon(Point2D::new(1.0, 0.5), &sq, TOL));
        assert!(point_in_polygon(Point2D::new(0.0, 0.0), &sq, TOL));
        assert!(point_in_polygon(Point2D::new(1.005, 0.5), &sq, TOL));
        assert!(!point_in_polygon(Point2D::new(1.05, 0.5), &sq, TOL));
    }

    #[test]
    fn test_point_in_concave_polygon() {
        let l = pts(&[(0., 0.), (2., 0.), (2., 1.), (1., 1.), (1., 2.), (0., 2.)]);
        assert!(point_in_polygon(Point2D::new(0.5, 1.5), &l, TOL));
        assert!(!point_in_polygon(Point2D::new(1.5, 1.5), &l, TOL));
    }

    #[test]
    fn test_self_intersection() {
        assert!(!is_self_intersecting(&square(), TOL));
        let bowtie = pts(&[(0., 0.), (1., 1.), (1., 0.), (0., 1.)]);
        assert!(is_self_intersecting(&bowtie, TOL));
        let spike = pts(&[(0., 0.), (2., 0.), (1., 0.), (1., 1.)]);
        assert!(is_self_intersecting(&spike, TOL));
        let triangle = pts(&[(0., 0.), (1., 0.), (0., 1.)]);
        assert!(!is_self_intersecting(&triangle, TOL));
    }

    #[test]
    fn test_dedup_indices() {
        let p = pts(&[(0., 0.), (1., 0.), (1.001, 0.), (1., 1.), (0., 1.), (0., 0.)]);
        let kept = dedup_indices(&p, TOL);
        assert_eq!(kept, vec![0, 2, 3, 4]);
    }
}
