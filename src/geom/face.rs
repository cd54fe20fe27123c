//! Planar polygons in 3D.

use crate::geom::point::Point3D;
use crate::geom::vector::Vector;

/// Area-weighted normal of a planar polygon (Newell's method).
///
/// Its length equals the polygon area; its direction follows the
/// right-hand rule over the vertex order.
pub fn vector_area(pts: &[Point3D]) -> Vector {
    let n = pts.len();
    let mut v = Vector::zero();
    for i in 0..n {
        let p = pts[i];
        let q = pts[(i + 1) % n];
        v.dx += (p.y - q.y) * (p.z + q.z);
        v.dy += (p.z - q.z) * (p.x + q.x);
        v.dz += (p.x - q.x) * (p.y + q.y);
    }
    v * 0.5
}

pub fn area(pts: &[Point3D]) -> f64 {
    vector_area(pts).length()
}

/// Unit normal, `None` for degenerate polygons.
pub fn normal(pts: &[Point3D]) -> Option<Vector> {
    vector_area(pts).normalize()
}

/// Vertex average.
pub fn center(pts: &[Point3D]) -> Point3D {
    if pts.is_empty() {
        return Point3D::new(0., 0., 0.);
    }
    let n = pts.len() as f64;
    let (sx, sy, sz) = pts
        .iter()
        .fold((0., 0., 0.), |acc, p| (acc.0 + p.x, acc.1 + p.y, acc.2 + p.z));
    Point3D::new(sx / n, sy / n, sz / n)
}

/// Contribution of a face to the enclosed volume (divergence theorem).
///
/// Summed over all faces of a closed, outward-oriented shell it gives the volume.
pub fn signed_volume_contribution(pts: &[Point3D]) -> f64 {
    let va = vector_area(pts);
    let c = center(pts);
    (c.x * va.dx + c.y * va.dy + c.z * va.dz) / 3.
}

/// Checks whether two faces have the same vertices in any order.
pub fn same_vertices(a: &[Point3D], b: &[Point3D], tol: f64) -> bool {
    a.len() == b.len()
        && a.iter().all(|p| b.iter().any(|q| p.is_close(q, tol)))
        && b.iter().all(|q| a.iter().any(|p| p.is_close(q, tol)))
}

/// Total length of face edges that no other edge runs back along.
///
/// In a closed shell every edge `a -> b` is covered by edges running `b -> a`
/// on the same line, possibly split at T-junctions. Edges shorter than `tol`
/// are ignored.
pub fn unmatched_edge_length(faces: &[&[Point3D]], tol: f64) -> f64 {
    let edges: Vec<(Point3D, Point3D)> = faces
        .iter()
        .flat_map(|pts| {
            let n = pts.len();
            (0..n).map(move |i| (pts[i], pts[(i + 1) % n]))
        })
        .filter(|&(a, b)| (b - a).length() > tol)
        .collect();

    let mut open = 0.;
    for (i, &(a, b)) in edges.iter().enumerate() {
        let len = (b - a).length();
        let u = (b - a) * (1. / len);
        let off_line = |p: Point3D| (p - a).cross(&u).length() > tol;

        // Parameter spans along `a -> b` covered by opposite edges
        let mut spans: Vec<(f64, f64)> = edges
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .filter_map(|(_, &(c, d))| {
                if (d - c).dot(&u) >= 0. || off_line(c) || off_line(d) {
                    return None;
                }
                let lo = (d - a).dot(&u).max(0.);
                let hi = (c - a).dot(&u).min(len);
                (hi > lo).then_some((lo, hi))
            })
            .collect();
        spans.sort_by(|x, y| x.0.total_cmp(&y.0));

        let mut covered = 0.;
        let mut reach = 0_f64;
        for (lo, hi) in spans {
            let lo = lo.max(reach);
            if hi > lo {
                covered += hi - lo;
                reach = hi;
            }
        }
        open += (len - covered).max(0.);
    }
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::IsClose;

    fn unit_square_z(z: f64) -> Vec<Point3D> {
        vec![
            Point3D::new(0., 0., z),
            Point3D::new(1., 0., z),
            Point3D::new(1., 1., z),
            Point3D::new(0., 1., z),
        ]
    }

    #[test]
    fn test_vector_area() {
        let va = vector_area(&unit_square_z(2.));
        assert!(va.is_close(&Vector::new(0., 0., 1.), 1e-12));
        assert!(area(&unit_square_z(2.)).is_close(1., 1e-12));
    }

    #[test]
    fn test_vertical_face_normal() {
        let wall = vec![
            Point3D::new(0., 0., 0.),
            Point3D::new(2., 0., 0.),
            Point3D::new(2., 0., 3.),
            Point3D::new(0., 0., 3.),
        ];
        let n = normal(&wall).unwrap();
        assert!(n.is_close(&Vector::new(0., -1., 0.), 1e-12));
        assert!(area(&wall).is_close(6., 1e-12));
    }

    #[test]
    fn test_same_vertices() {
        let a = unit_square_z(0.);
        let mut b = a.clone();
        b.reverse();
        b.rotate_left(1);
        assert!(same_vertices(&a, &b, 1e-9));
        assert!(!same_vertices(&a, &unit_square_z(1.), 1e-9));
    }

    #[test]
    fn test_unmatched_edges() {
        let plan = |pts: &[(f64, f64)]| -> Vec<Point3D> {
            pts.iter().map(|&(x, y)| Point3D::new(x, y, 0.)).collect()
        };
        let long = plan(&[(0., 0.), (2., 0.), (2., 1.), (0., 1.)]);
        let left = plan(&[(0., 0.), (0., 1.), (1., 1.), (1., 0.)]);
        let right = plan(&[(1., 0.), (1., 1.), (2., 1.), (2., 0.)]);

        // Long edges are covered by two halves each
        let closed = unmatched_edge_length(&[&long[..], &left[..], &right[..]], 1e-9);
        assert!(closed.is_close(0., 1e-12));

        // Half of the bottom and top edges, the right edge, and the middle edge
        let open = unmatched_edge_length(&[&long[..], &left[..]], 1e-9);
        assert!(open.is_close(4., 1e-12));
    }
}
