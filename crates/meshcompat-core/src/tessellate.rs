//! Decomposition of polygons into legacy triangles and quads.
//!
//! Triangles and quads are passed through unchanged. Larger polygons are
//! projected onto the plane of their Newell normal and filled by
//! [`crate::polyfill`], giving `n - 2` triangles each.

use log::debug;

use crate::custom_data::CustomData;
use crate::geometry_indices::PolyIndex;
use crate::math_utils::{material_index_to_legacy, polygon_normal, ProjectionBasis};
use crate::mesh_types::{Face, Loop, Poly, Vertex};
use crate::mface_validate::validate_corners;
use crate::polyfill::FillArena;

/// How a tessellated face was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TessOrigin {
    Triangle,
    /// Copy of a 4-corner polygon. Its `v4` may still be 0 until
    /// [`Tessellation::validate_quads`] runs.
    Quad,
    /// One triangle of a filled n-gon.
    Fill,
}

/// Tessellated faces plus per-face bookkeeping, all arrays parallel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tessellation {
    pub faces: Vec<Face>,
    pub face_to_poly: Vec<PolyIndex>,
    /// Loop of each face corner. The last slot is 0 for triangles; a quad's
    /// fourth loop index is never 0.
    pub loop_indices: Vec<[u32; 4]>,
    pub origins: Vec<TessOrigin>,
}

/// Upper bound on the tessellated face count.
#[inline]
pub fn poly_to_tri_count(num_polys: usize, num_loops: usize) -> usize {
    num_loops.saturating_sub(2 * num_polys)
}

impl Tessellation {
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    fn push(&mut self, face: Face, poly_index: usize, loop_indices: [u32; 4], origin: TessOrigin) {
        self.faces.push(face);
        self.face_to_poly.push(PolyIndex::from(poly_index));
        self.loop_indices.push(loop_indices);
        self.origins.push(origin);
    }

    /// Corner count of face `i` judged by its loop indices, which stay
    /// reliable even while a quad's `v4` is 0.
    #[inline]
    pub fn corner_count(&self, i: usize) -> usize {
        if self.loop_indices[i][3] != 0 {
            4
        } else {
            3
        }
    }

    /// Fixes the corner order of every quad so that no vertex 0 sits in the
    /// third or fourth slot. Corner layers in `fdata` and the loop indices
    /// are rotated along with the vertices.
    pub fn validate_quads(&mut self, mut fdata: Option<&mut CustomData>) {
        for i in 0..self.faces.len() {
            if self.origins[i] != TessOrigin::Quad {
                continue;
            }
            let (_, perm) = validate_corners(&mut self.faces[i], 4);
            if let Some(perm) = perm {
                let old = self.loop_indices[i];
                for j in 0..4 {
                    self.loop_indices[i][j] = old[perm[j]];
                }
                if let Some(fdata) = fdata.as_deref_mut() {
                    fdata.swap_corners(i, &perm);
                }
            }
        }
    }
}

fn face_from_loops(loops: &[Loop], lidx: [u32; 4], corners: usize, poly: &Poly, mat_nr: i16) -> Face {
    let v = |k: usize| if k < corners { loops[lidx[k] as usize].v } else { 0 };
    Face {
        v1: v(0),
        v2: v(1),
        v3: v(2),
        v4: v(3),
        mat_nr,
        flag: poly.flag,
        draw_sides: [false; 4],
    }
}

/// Tessellates all polygons.
///
/// `material_indices` holds one material per polygon; faces get material 0
/// when it is `None`. Polygons with fewer than 3 loops produce nothing.
pub fn tessellate_polys(
    verts: &[Vertex],
    polys: &[Poly],
    loops: &[Loop],
    material_indices: Option<&[i32]>,
) -> Tessellation {
    let capacity = poly_to_tri_count(polys.len(), loops.len());
    let mut tess = Tessellation {
        faces: Vec::with_capacity(capacity),
        face_to_poly: Vec::with_capacity(capacity),
        loop_indices: Vec::with_capacity(capacity),
        origins: Vec::with_capacity(capacity),
    };
    let mut arena: Option<FillArena> = None;
    let mut num_filled = 0;

    for (poly_index, poly) in polys.iter().enumerate() {
        let start = poly.loopstart;
        let mat_nr = material_indices.map_or(0, |m| material_index_to_legacy(m[poly_index]));
        match poly.totloop {
            0..=2 => {}
            3 => {
                let lidx = [start, start + 1, start + 2, 0];
                let face = face_from_loops(loops, lidx, 3, poly, mat_nr);
                tess.push(face, poly_index, lidx, TessOrigin::Triangle);
            }
            4 => {
                let lidx = [start, start + 1, start + 2, start + 3];
                let face = face_from_loops(loops, lidx, 4, poly, mat_nr);
                tess.push(face, poly_index, lidx, TessOrigin::Quad);
            }
            _ => {
                let arena = arena.get_or_insert_with(FillArena::new);
                let poly_loops = &loops[poly.loop_range()];
                let coords = poly_loops.iter().map(|l| verts[l.v as usize].co);

                let normal = polygon_normal(coords.clone(), poly_loops.len());
                let basis = ProjectionBasis::from_normal_negated(normal);
                for co in coords {
                    arena.push_vert(basis.project(co));
                }

                for tri in arena.fill() {
                    let lidx = [start + tri[0], start + tri[1], start + tri[2], 0];
                    let face = face_from_loops(loops, lidx, 3, poly, mat_nr);
                    tess.push(face, poly_index, lidx, TessOrigin::Fill);
                }
                arena.clear();
                num_filled += 1;
            }
        }
    }

    debug!(
        "Tessellated {} polygons into {} faces ({} filled n-gons)",
        polys.len(),
        tess.len(),
        num_filled
    );
    tess
}
