//! Exact geometric predicates.
//!
//! [`orient3d`] is Shewchuk's adaptive-precision orientation test (via the
//! [`robust`] crate). Its sign is exact for every finite `f64` input, which is
//! what the cavity algorithms rely on: a plain floating-point determinant would
//! misclassify nearly coplanar configurations and break star-shape repair.
//!
//! # Sign convention
//!
//! `orient3d(a, b, c, d)` is positive when `d` lies below the plane through
//! `a`, `b`, `c` (the triangle appearing counter-clockwise from above), negative
//! when it lies above, and zero when the four points are coplanar. Every real
//! tetrahedron `(n0, n1, n2, n3)` stored in a
//! [`TetMesh`](crate::core::tet_mesh::TetMesh) satisfies
//! `orient3d(n0, n1, n2, n3) < 0`.

use crate::geometry::point::Point;
use std::fmt;

/// Represents the orientation of four points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The determinant is negative (the orientation of valid mesh tetrahedra)
    NEGATIVE,
    /// The four points are exactly coplanar
    DEGENERATE,
    /// The determinant is positive
    POSITIVE,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
            Self::POSITIVE => write!(f, "POSITIVE"),
        }
    }
}

/// Exact orientation test returning a value whose sign is robust.
///
/// The magnitude approximates six times the signed volume of the
/// tetrahedron; only the sign is guaranteed.
///
/// # Example
///
/// ```
/// use tetra_cavity::geometry::point::Point;
/// use tetra_cavity::geometry::predicates::orient3d;
///
/// let a = Point::new([0.0, 0.0, 0.0]);
/// let b = Point::new([1.0, 0.0, 0.0]);
/// let c = Point::new([0.0, 1.0, 0.0]);
/// let above = Point::new([0.0, 0.0, 1.0]);
/// let below = Point::new([0.0, 0.0, -1.0]);
/// assert!(orient3d(&a, &b, &c, &above) < 0.0);
/// assert!(orient3d(&a, &b, &c, &below) > 0.0);
/// ```
#[inline]
#[must_use]
pub fn orient3d(a: &Point, b: &Point, c: &Point, d: &Point) -> f64 {
    robust::orient3d(a.into(), b.into(), c.into(), d.into())
}

/// Classifies the result of [`orient3d`].
#[inline]
#[must_use]
pub fn orientation(a: &Point, b: &Point, c: &Point, d: &Point) -> Orientation {
    let det = orient3d(a, b, c, d);
    if det > 0.0 {
        Orientation::POSITIVE
    } else if det < 0.0 {
        Orientation::NEGATIVE
    } else {
        Orientation::DEGENERATE
    }
}
