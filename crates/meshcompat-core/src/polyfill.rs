//! Triangulation of simple 2D polygons by ear clipping.
//!
//! The fill works on local corner indices: triangle `[a, b, c]` refers to the
//! `a`-th, `b`-th and `c`-th input points. Triangles keep the winding of the
//! input polygon. When no ear can be found (self-intersecting or fully
//! degenerate input) the remaining corners are fanned, so a polygon with `n`
//! corners always yields `n - 2` triangles.

use log::{trace, warn};

use crate::vector_extensions::Vector2f;

/// Scratch buffers reused across polygons.
///
/// Call [`FillArena::clear`] between polygons; memory is kept until the
/// arena is dropped.
#[derive(Debug, Default)]
pub struct FillArena {
    projverts: Vec<Vector2f>,
    remaining: Vec<u32>,
    tris: Vec<[u32; 3]>,
}

impl FillArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.projverts.clear();
        self.remaining.clear();
        self.tris.clear();
    }

    /// Appends a projected corner.
    #[inline]
    pub fn push_vert(&mut self, co: Vector2f) {
        self.projverts.push(co);
    }

    pub fn projverts(&self) -> &[Vector2f] {
        &self.projverts
    }

    /// Triangulates the corners pushed since the last clear.
    pub fn fill(&mut self) -> &[[u32; 3]] {
        polyfill_calc(&self.projverts, &mut self.remaining, &mut self.tris);
        &self.tris
    }
}

/// Twice the signed area, positive for counter-clockwise input.
fn signed_area_x2(coords: &[Vector2f]) -> f32 {
    let n = coords.len();
    (0..n).map(|i| coords[i].cross(coords[(i + 1) % n])).sum()
}

#[inline]
fn tri_cross(a: Vector2f, b: Vector2f, c: Vector2f) -> f32 {
    (b - a).cross(c - b)
}

/// Inclusive test: points on the border count as inside.
fn point_in_triangle(p: Vector2f, a: Vector2f, b: Vector2f, c: Vector2f, sign: f32) -> bool {
    let d1 = (b - a).cross(p - a) * sign;
    let d2 = (c - b).cross(p - b) * sign;
    let d3 = (a - c).cross(p - c) * sign;
    d1 >= 0.0 && d2 >= 0.0 && d3 >= 0.0
}

fn is_ear(coords: &[Vector2f], remaining: &[u32], i: usize, sign: f32) -> bool {
    let len = remaining.len();
    let i_prev = remaining[(i + len - 1) % len];
    let i_curr = remaining[i];
    let i_next = remaining[(i + 1) % len];
    let (a, b, c) = (
        coords[i_prev as usize],
        coords[i_curr as usize],
        coords[i_next as usize],
    );

    if tri_cross(a, b, c) * sign <= 0.0 {
        // Reflex or collinear tip.
        return false;
    }

    remaining.iter().all(|&r| {
        if r == i_prev || r == i_curr || r == i_next {
            return true;
        }
        let p = coords[r as usize];
        // Duplicate positions of a tip never block it.
        if p == a || p == b || p == c {
            return true;
        }
        !point_in_triangle(p, a, b, c, sign)
    })
}

/// Triangulates `coords` into `tris`, using `remaining` as scratch.
pub fn polyfill_calc(coords: &[Vector2f], remaining: &mut Vec<u32>, tris: &mut Vec<[u32; 3]>) {
    let n = coords.len();
    tris.clear();
    remaining.clear();
    if n < 3 {
        return;
    }
    tris.reserve(n - 2);
    remaining.extend(0..n as u32);

    let sign = if signed_area_x2(coords) >= 0.0 { 1.0 } else { -1.0 };

    let mut cursor = 0;
    while remaining.len() > 3 {
        let len = remaining.len();
        let Some(i) = (0..len)
            .map(|step| (cursor + step) % len)
            .find(|&i| is_ear(coords, remaining, i, sign))
        else {
            warn!(
                "Ear clipping stuck with {} of {} corners remaining, using fan triangulation",
                len, n
            );
            break;
        };
        tris.push([
            remaining[(i + len - 1) % len],
            remaining[i],
            remaining[(i + 1) % len],
        ]);
        remaining.remove(i);
        // The previous corner may just have become an ear.
        cursor = if i == 0 { remaining.len() - 1 } else { i - 1 };
    }

    let first = remaining[0];
    for pair in remaining[1..].windows(2) {
        tris.push([first, pair[0], pair[1]]);
    }

    trace!("Filled polygon with {} corners into {} triangles", n, tris.len());
    debug_assert_eq!(tris.len(), n - 2);
}
