//! Numeric helpers shared by the converters
//!
//! This module holds the fixed-point encodings used by legacy mesh data
//! (unit floats stored as bytes, normals stored as shorts) and the geometric
//! helpers used to project polygons into 2D before filling them.

use num_traits::clamp;

use crate::vector_extensions::{Vector2f, Vector3f};

/// Encodes a weight in `[0, 1]` as a byte, clamping out of range input.
///
/// The value is truncated, not rounded, so `1.0` maps to 255 and anything
/// below `1/255` maps to 0.
///
/// # Examples
/// ```
/// use meshcompat_core::math_utils::unit_float_to_uchar_clamp;
/// assert_eq!(unit_float_to_uchar_clamp(1.0), 255);
/// assert_eq!(unit_float_to_uchar_clamp(0.0), 0);
/// assert_eq!(unit_float_to_uchar_clamp(2.5), 255);
/// assert_eq!(unit_float_to_uchar_clamp(-1.0), 0);
/// ```
#[inline]
pub fn unit_float_to_uchar_clamp(value: f32) -> u8 {
    (clamp(value, 0.0, 1.0) * 255.0) as u8
}

/// Inverse of [`unit_float_to_uchar_clamp`].
#[inline]
pub fn uchar_to_unit_float(value: u8) -> f32 {
    f32::from(value) / 255.0
}

/// Narrows a material index to the legacy 16-bit field, saturating at the
/// `i16` range instead of wrapping.
#[inline]
pub fn material_index_to_legacy(value: i32) -> i16 {
    clamp(value, i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Decodes a normal stored as three signed shorts.
#[inline]
pub fn normal_short_to_float(n: [i16; 3]) -> [f32; 3] {
    [
        f32::from(n[0]) * (1.0 / 32767.0),
        f32::from(n[1]) * (1.0 / 32767.0),
        f32::from(n[2]) * (1.0 / 32767.0),
    ]
}

/// Encodes a unit normal as three signed shorts.
#[inline]
pub fn normal_float_to_short(n: [f32; 3]) -> [i16; 3] {
    [
        (n[0] * 32767.0) as i16,
        (n[1] * 32767.0) as i16,
        (n[2] * 32767.0) as i16,
    ]
}

/// Accumulates one Newell term for the edge `v_prev -> v_curr`.
///
/// Summed over all polygon edges this yields a normal that is robust against
/// concave and mildly non-planar polygons.
#[inline]
pub fn add_newell_cross(n: &mut Vector3f, v_prev: [f32; 3], v_curr: [f32; 3]) {
    n.x += (v_prev[1] - v_curr[1]) * (v_prev[2] + v_curr[2]);
    n.y += (v_prev[2] - v_curr[2]) * (v_prev[0] + v_curr[0]);
    n.z += (v_prev[0] - v_curr[0]) * (v_prev[1] + v_curr[1]);
}

/// Newell normal of a closed polygon, `+Z` when the polygon is degenerate.
pub fn polygon_normal<I>(mut coords: I, num_corners: usize) -> Vector3f
where
    I: Iterator<Item = [f32; 3]> + Clone,
{
    let mut normal = Vector3f::default();
    let Some(mut co_prev) = coords.clone().nth(num_corners.saturating_sub(1)) else {
        return Vector3f::new(0.0, 0.0, 1.0);
    };
    for _ in 0..num_corners {
        let Some(co_curr) = coords.next() else {
            break;
        };
        add_newell_cross(&mut normal, co_prev, co_curr);
        co_prev = co_curr;
    }
    if normal.normalize() == 0.0 {
        normal = Vector3f::new(0.0, 0.0, 1.0);
    }
    normal
}

/// Orthonormal 2D basis for projecting points onto the plane of a normal.
///
/// The basis is built around the negated normal, which makes polygons that
/// wind counter-clockwise around `normal` come out with a consistent sign in
/// 2D regardless of which axis dominates.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionBasis {
    u: Vector3f,
    v: Vector3f,
}

impl ProjectionBasis {
    /// `normal` must be unit length.
    pub fn from_normal_negated(normal: Vector3f) -> Self {
        let n = -normal;
        let f = n.x * n.x + n.y * n.y;
        if f > f32::EPSILON {
            let d = 1.0 / f.sqrt();
            let u = Vector3f::new(n.y * d, -n.x * d, 0.0);
            let v = Vector3f::new(-n.z * u.y, n.z * u.x, n.x * u.y - n.y * u.x);
            Self { u, v }
        } else {
            // Normal along the Z axis.
            let u = Vector3f::new(if n.z < 0.0 { -1.0 } else { 1.0 }, 0.0, 0.0);
            let v = Vector3f::new(0.0, 1.0, 0.0);
            Self { u, v }
        }
    }

    #[inline]
    pub fn project(&self, co: [f32; 3]) -> Vector2f {
        let p = Vector3f::from_array(co);
        Vector2f::new(self.u.dot(p), self.v.dot(p))
    }
}
