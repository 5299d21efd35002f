//! Planar point type used throughout the pipeline.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// A point (or displacement) in 2D Cartesian space, in millimeters.
///
/// Axes follow the sensor convention: x to the right, y upward, origin at
/// the sensor. The same type doubles as a per-frame velocity (mm/frame).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate in millimeters
    pub x: f32,
    /// Y coordinate in millimeters
    pub y: f32,
}

impl Point2D {
    /// Zero point (sensor origin)
    pub const ZERO: Point2D = Point2D { x: 0.0, y: 0.0 };

    /// Create a new point
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Squared distance (faster, avoids sqrt)
    #[inline]
    pub fn distance_squared(&self, other: &Point2D) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Length (magnitude) of this point as a vector from the origin
    #[inline]
    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl Add for Point2D {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Point2D::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point2D {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Point2D::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f32> for Point2D {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Point2D::new(self.x * scalar, self.y * scalar)
    }
}
