//! Geometry kernel.
//!
//! Tolerance-aware 2D/3D primitives. Every geometric decision takes the
//! caller's tolerance as an argument; `EPS` only guards against division by
//! (numerically) zero.

pub mod bboxes;
pub mod face;
pub mod point;
pub mod polygon;
pub mod projection;
pub mod segment;
pub mod vector;

/// Numerical zero.
pub const EPS: f64 = 1e-12;

/// Tolerance-based comparison of scalars.
pub trait IsClose {
    fn is_close(&self, other: f64, tol: f64) -> bool;
}

impl IsClose for f64 {
    fn is_close(&self, other: f64, tol: f64) -> bool {
        (self - other).abs() <= tol
    }
}
