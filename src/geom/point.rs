use crate::geom::vector::Vector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// Point on the horizontal plane.
///
/// There is no `PartialEq`: points are compared with [`Point2D::is_close`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns true if both points are within `tol` of each other.
    pub fn is_close(&self, other: &Self, tol: f64) -> bool {
        self.distance(other) <= tol
    }

    pub fn distance(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Lifts the point to 3D at height `z`.
    pub fn at_z(&self, z: f64) -> Point3D {
        Point3D::new(self.x, self.y, z)
    }

    /// Creates a new point along the edge pt1->pt2 with some relative distance from pt1.
    pub fn lerp(pt1: Self, pt2: Self, t: f64) -> Self {
        Self {
            x: pt1.x + (pt2.x - pt1.x) * t,
            y: pt1.y + (pt2.y - pt1.y) * t,
        }
    }

    /// 2D cross product of vectors `o->a` and `o->b`.
    pub fn cross(o: Self, a: Self, b: Self) -> f64 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    }

    /// Dot product of vectors `o->a` and `o->b`.
    pub fn dot(o: Self, a: Self, b: Self) -> f64 {
        (a.x - o.x) * (b.x - o.x) + (a.y - o.y) * (b.y - o.y)
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2); // Default 2 decimals
        write!(f, "Point2D({:.prec$}, {:.prec$})", self.x, self.y, prec = prec)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Point in 3D space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns true if both points are within `tol` of each other.
    pub fn is_close(&self, other: &Self, tol: f64) -> bool {
        (*self - *other).length() <= tol
    }

    /// Drops the z coordinate.
    pub fn xy(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Creates a new point along the edge pt1->pt2 with some relative distance from pt1.
    pub fn lerp(pt1: Self, pt2: Self, t: f64) -> Self {
        pt1 + (pt2 - pt1) * t
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prec = f.precision().unwrap_or(2); // Default 2 decimals
        write!(
            f,
            "Point3D({:.prec$}, {:.prec$}, {:.prec$})",
            self.x,
            self.y,
            self.z,
            prec = prec
        )
    }
}

impl Add<Vector> for Point3D {
    type Output = Point3D;
    fn add(self, other: Vector) -> Self {
        Self {
            x: self.x + other.dx,
            y: self.y + other.dy,
            z: self.z + other.dz,
        }
    }
}

impl Sub for Point3D {
    type Output = Vector;
    fn sub(self, other: Self) -> Vector {
        Vector::from_points(other, self)
    }
}
