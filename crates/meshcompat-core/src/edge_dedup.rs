//! Derives a duplicate-free edge set from legacy faces.
//!
//! Every face side becomes one raw record keyed by its vertex pair with the
//! smaller index first. After sorting, runs of equal pairs collapse into a
//! single edge.

use log::debug;

use crate::mesh_types::{Edge, EdgeFlag, Face};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EdgeSort {
    v1: u32,
    v2: u32,
    is_loose: bool,
    is_draw: bool,
}

impl EdgeSort {
    fn new(a: u32, b: u32, is_loose: bool, is_draw: bool) -> Self {
        let (v1, v2) = if a < b { (a, b) } else { (b, a) };
        Self {
            v1,
            v2,
            is_loose,
            is_draw,
        }
    }

    #[inline]
    fn key(&self) -> (u32, u32) {
        (self.v1, self.v2)
    }
}

/// Number of raw edge records a face contributes.
#[inline]
fn sides_of(face: &Face) -> usize {
    if face.v4 != 0 {
        4
    } else if face.v3 != 0 {
        3
    } else {
        1
    }
}

fn collect_records(faces: &[Face]) -> Vec<EdgeSort> {
    let total: usize = faces.iter().map(sides_of).sum();
    let mut records = Vec::with_capacity(total);
    for face in faces {
        let verts = face.verts();
        let sides = sides_of(face);
        if sides == 1 {
            // Face with v3 == 0 is a loose edge v1-v2.
            records.push(EdgeSort::new(face.v1, face.v2, true, face.draw_sides[0]));
            continue;
        }
        for k in 0..sides {
            let next = (k + 1) % sides;
            records.push(EdgeSort::new(verts[k], verts[next], false, face.draw_sides[k]));
        }
    }
    records
}

/// Builds the edge set of `faces`.
///
/// Duplicate vertex pairs merge into one edge whose draw state is the OR of
/// all contributing sides. With `use_old_draw_flags` unset every edge is
/// drawn. A merged edge is loose only if all its records came from loose
/// faces. Output is sorted by vertex pair, except that each edge is stored
/// as `(v2, v1)` unless `v1 + 1 == v2`, so that consecutive vertices keep
/// their forward direction.
pub fn calc_edges_from_faces(faces: &[Face], use_old_draw_flags: bool) -> Vec<Edge> {
    let mut records = collect_records(faces);
    if records.is_empty() {
        return Vec::new();
    }
    records.sort_unstable_by_key(EdgeSort::key);

    let mut edges = Vec::new();
    let mut start = 0;
    while start < records.len() {
        let key = records[start].key();
        let mut end = start + 1;
        while end < records.len() && records[end].key() == key {
            end += 1;
        }
        let run = &records[start..end];
        let is_draw = run.iter().any(|r| r.is_draw);
        let is_loose = run.iter().all(|r| r.is_loose);

        let mut flag = EdgeFlag::empty();
        if !use_old_draw_flags || is_draw {
            flag |= EdgeFlag::EDGEDRAW;
        }
        if is_loose {
            flag |= EdgeFlag::LOOSEEDGE;
        }
        let (v1, v2) = key;
        let mut edge = Edge::new(v1, v2);
        edge.flag = flag;
        if v1 + 1 != v2 {
            std::mem::swap(&mut edge.v1, &mut edge.v2);
        }
        edges.push(edge);
        start = end;
    }

    debug!(
        "Derived {} edges from {} faces ({} raw sides)",
        edges.len(),
        faces.len(),
        records.len()
    );
    edges
}
