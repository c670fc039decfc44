//! Geometric primitives for glyph layout
//!
//! Points, pen offsets and axis-aligned bounding boxes in pixel space.
//! Font space is Y-up: the baseline is y = 0 and ascenders are positive.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Point or displacement in 3D pixel space.
///
/// Pen positions, kerning and glyph advances all use this type; `z` is only
/// non-zero for extruded geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub const ZERO: Vector = Vector {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Point on the z = 0 plane
    #[inline]
    pub const fn xy(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Length of the XY projection
    #[inline]
    pub fn length_xy(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector of the XY projection, or zero for a degenerate input.
    pub fn normalized_xy(self) -> Self {
        let len = self.length_xy();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            Self::xy(self.x / len, self.y / len)
        }
    }

    /// Cross product
    #[inline]
    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Componentwise minimum
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Componentwise maximum
    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }
}

impl Add for Vector {
    type Output = Vector;

    #[inline]
    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vector {
    #[inline]
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vector {
    type Output = Vector;

    #[inline]
    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vector {
    type Output = Vector;

    #[inline]
    fn mul(self, rhs: f32) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vector {
    type Output = Vector;

    #[inline]
    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y, -self.z)
    }
}

/// Axis-aligned bounding box.
///
/// The default box is all zeros, which is also what an empty string measures.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    /// Lower-left-back corner
    pub lower: Vector,
    /// Upper-right-front corner
    pub upper: Vector,
}

impl BBox {
    #[inline]
    pub const fn new(lower: Vector, upper: Vector) -> Self {
        Self { lower, upper }
    }

    /// Box from glyph metrics: bearing relative to the pen plus extent.
    ///
    /// `bearing_y` is the distance from the baseline up to the top edge.
    pub fn from_metrics(bearing_x: f32, bearing_y: f32, width: f32, height: f32) -> Self {
        Self {
            lower: Vector::xy(bearing_x, bearing_y - height),
            upper: Vector::xy(bearing_x + width, bearing_y),
        }
    }

    /// Smallest box containing every point, or the zero box for no points.
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Vector>,
    {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::default();
        };
        iter.fold(Self::new(*first, *first), |bbox, p| {
            Self::new(bbox.lower.min(*p), bbox.upper.max(*p))
        })
    }

    pub fn width(&self) -> f32 {
        self.upper.x - self.lower.x
    }

    pub fn height(&self) -> f32 {
        self.upper.y - self.lower.y
    }

    pub fn depth(&self) -> f32 {
        self.upper.z - self.lower.z
    }

    /// True when the box encloses no area
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 && self.height() <= 0.0
    }

    /// Box shifted by `offset`
    #[inline]
    pub fn translated(self, offset: Vector) -> Self {
        Self {
            lower: self.lower + offset,
            upper: self.upper + offset,
        }
    }

    /// Smallest box containing both
    #[inline]
    pub fn union(self, other: Self) -> Self {
        Self {
            lower: self.lower.min(other.lower),
            upper: self.upper.max(other.upper),
        }
    }

    /// Box with its z range replaced
    pub fn with_depth(self, back: f32, front: f32) -> Self {
        Self {
            lower: Vector::new(self.lower.x, self.lower.y, back),
            upper: Vector::new(self.upper.x, self.upper.y, front),
        }
    }

    /// Flattened to the `[llx, lly, llz, urx, ury, urz]` layout used across the C boundary
    pub fn to_array(self) -> [f32; 6] {
        [
            self.lower.x,
            self.lower.y,
            self.lower.z,
            self.upper.x,
            self.upper.y,
            self.upper.z,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_metrics() {
        let bbox = BBox::from_metrics(1.0, 7.0, 5.0, 9.0);
        assert_eq!(bbox.lower, Vector::xy(1.0, -2.0));
        assert_eq!(bbox.upper, Vector::xy(6.0, 7.0));
        assert!((bbox.width() - 5.0).abs() < 1e-6);
        assert!((bbox.height() - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_bbox_union_and_translate() {
        let a = BBox::from_metrics(0.0, 10.0, 4.0, 10.0);
        let b = a.translated(Vector::xy(10.0, 0.0));
        let u = a.union(b);
        assert_eq!(u.lower, Vector::xy(0.0, 0.0));
        assert_eq!(u.upper, Vector::xy(14.0, 10.0));
    }

    #[test]
    fn test_bbox_from_points() {
        let none: &[Vector] = &[];
        assert_eq!(BBox::from_points(none), BBox::default());
        let pts = [Vector::xy(1.0, 2.0), Vector::xy(-3.0, 5.0), Vector::xy(0.5, -1.0)];
        let bbox = BBox::from_points(&pts);
        assert_eq!(bbox.lower, Vector::xy(-3.0, -1.0));
        assert_eq!(bbox.upper, Vector::xy(1.0, 5.0));
    }

    #[test]
    fn test_default_bbox_is_empty() {
        assert!(BBox::default().is_empty());
        assert_eq!(BBox::default().to_array(), [0.0; 6]);
    }

    #[test]
    fn test_normalized_xy() {
        let n = Vector::xy(3.0, 4.0).normalized_xy();
        assert!((n.x - 0.6).abs() < 1e-6);
        assert!((n.y - 0.8).abs() < 1e-6);
        assert_eq!(Vector::ZERO.normalized_xy(), Vector::ZERO);
    }
}
