use crate::geom::face;
use crate::geom::point::{Point2D, Point3D};
use crate::geom::vector::Vector;

/// Orthonormal basis for mapping a planar face to 2D and back.
#[derive(Debug, Clone, Copy)]
pub struct PlaneBasis {
    pub origin: Point3D,
    pub u: Vector,
    pub v: Vector,
}

impl PlaneBasis {
    /// Creates a `PlaneBasis` in the plane of a face.
    ///
    /// The face winding is kept: a face that is counter-clockwise around its
    /// normal projects to a counter-clockwise 2D polygon.
    pub fn from_face(pts: &[Point3D]) -> Option<Self> {
        let origin = *pts.first()?;
        let n = face::normal(pts)?;
        Self::build(origin, n)
    }

    fn build(origin: Point3D, n: Vector) -> Option<Self> {
        let helper = if n.dz.abs() < 0.9 {
            Vector::new(0., 0., 1.)
        } else {
            Vector::new(0., 1., 0.)
        };

        let u = helper.cross(&n).normalize()?;
        let v = n.cross(&u).normalize()?;

        Some(Self { origin, u, v })
    }

    pub fn project(&self, p: Point3D) -> Point2D {
        let r = p - self.origin;
        Point2D::new(r.dot(&self.u), r.dot(&self.v))
    }

    pub fn project_all(&self, pts: &[Point3D]) -> Vec<Point2D> {
        pts.iter().map(|&p| self.project(p)).collect()
    }
}
