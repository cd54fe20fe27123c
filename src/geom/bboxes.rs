use crate::geom::point::Point2D;

/// Axis-aligned rectangle on the horizontal plane.
#[derive(Debug, Clone, Copy)]
pub struct BBox2D {
    pub min: Point2D,
    pub max: Point2D,
}

impl BBox2D {
    /// Returns `None` for an empty point set.
    pub fn from_points(pts: &[Point2D]) -> Option<Self> {
        let first = pts.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in pts.iter().skip(1) {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self { min, max })
    }

    /// Checks whether two boxes overlap or lie within `tol` of each other.
    pub fn overlaps(&self, other: &Self, tol: f64) -> bool {
        // Boxes don't overlap if separated along any axis
        if self.max.x < other.min.x - tol || self.min.x > other.max.x + tol {
            return false;
        }
        if self.max.y < other.min.y - tol || self.min.y > other.max.y + tol {
            return false;
        }
        true
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn depth(&self) -> f64 {
        self.max.y - self.min.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox() {
        let pts = vec![
            Point2D::new(1., -1.),
            Point2D::new(3., 2.),
            Point2D::new(-2., 0.),
        ];
        let bb = BBox2D::from_points(&pts).unwrap();
        assert_eq!(bb.width(), 5.);
        assert_eq!(bb.depth(), 3.);
        assert!(BBox2D::from_points(&[]).is_none());
    }

    #[test]
    fn test_overlaps() {
        let a = BBox2D::from_points(&[Point2D::new(0., 0.), Point2D::new(1., 1.)]).unwrap();
        let b = BBox2D::from_points(&[Point2D::new(1., 0.), Point2D::new(2., 1.)]).unwrap();
        let c = BBox2D::from_points(&[Point2D::new(1.5, 0.), Point2D::new(2., 1.)]).unwrap();
        assert!(a.overlaps(&b, 0.));
        assert!(!a.overlaps(&c, 0.01));
        assert!(a.overlaps(&c, 0.6));
    }
}
