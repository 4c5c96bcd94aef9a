//! Three-dimensional points used as mesh vertex positions.
//!
//! Points are immutable once created. Coordinates must be finite; use
//! [`Point::try_new`] when the input is not trusted.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur when validating point coordinates.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PointValidationError {
    /// A coordinate is NaN or infinite.
    #[error("Invalid coordinate at index {coordinate_index}: {coordinate_value} is not finite")]
    NonFiniteCoordinate {
        /// Index of the offending coordinate (0 = x, 1 = y, 2 = z).
        coordinate_index: usize,
        /// The offending value.
        coordinate_value: f64,
    },
}

// =============================================================================
// POINT STRUCT DEFINITION
// =============================================================================

/// A position in 3D space.
///
/// # Examples
///
/// ```rust
/// use tetra_cavity::geometry::point::Point;
///
/// let p = Point::new([1.0, 2.0, 3.0]);
/// assert_eq!(p.coords(), &[1.0, 2.0, 3.0]);
/// assert!(Point::try_new([f64::NAN, 0.0, 0.0]).is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Point {
    coords: [f64; 3],
}

impl Point {
    /// Creates a point without validating its coordinates.
    #[inline]
    #[must_use]
    pub const fn new(coords: [f64; 3]) -> Self {
        Self { coords }
    }

    /// Creates a point, rejecting NaN and infinite coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`PointValidationError::NonFiniteCoordinate`] for the first
    /// coordinate that is not finite.
    pub fn try_new(coords: [f64; 3]) -> Result<Self, PointValidationError> {
        let point = Self::new(coords);
        point.validate()?;
        Ok(point)
    }

    /// Checks that every coordinate is finite.
    ///
    /// # Errors
    ///
    /// Returns [`PointValidationError::NonFiniteCoordinate`] for the first
    /// coordinate that is not finite.
    pub fn validate(&self) -> Result<(), PointValidationError> {
        match self.coords.iter().position(|c| !c.is_finite()) {
            Some(coordinate_index) => Err(PointValidationError::NonFiniteCoordinate {
                coordinate_index,
                coordinate_value: self.coords[coordinate_index],
            }),
            None => Ok(()),
        }
    }

    /// Returns the coordinates as an array reference.
    #[inline]
    #[must_use]
    pub const fn coords(&self) -> &[f64; 3] {
        &self.coords
    }

    /// Returns the midpoint of the segment `self`-`other`.
    #[inline]
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        Self::new([
            (self.coords[0] + other.coords[0]) * 0.5,
            (self.coords[1] + other.coords[1]) * 0.5,
            (self.coords[2] + other.coords[2]) * 0.5,
        ])
    }

    /// Returns the squared Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn squared_distance(&self, other: &Self) -> f64 {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

// =============================================================================
// TRAIT IMPLEMENTATIONS
// =============================================================================

impl From<[f64; 3]> for Point {
    #[inline]
    fn from(coords: [f64; 3]) -> Self {
        Self::new(coords)
    }
}

impl From<Point> for [f64; 3] {
    #[inline]
    fn from(point: Point) -> Self {
        point.coords
    }
}

impl From<&Point> for robust::Coord3D<f64> {
    #[inline]
    fn from(point: &Point) -> Self {
        Self {
            x: point.coords[0],
            y: point.coords[1],
            z: point.coords[2],
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.coords[0], self.coords[1], self.coords[2]
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
