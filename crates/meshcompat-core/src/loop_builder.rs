//! Polygon and loop construction from legacy faces.

use log::debug;

use crate::edge_hash::EdgeHash;
use crate::mesh_types::{Edge, EdgeFlag, Face, Loop, Poly};

/// Sets the edge of every loop to the edge running to the next corner of
/// its polygon, wrapping from the last corner to the first.
///
/// # Panics
///
/// Panics if a corner pair has no edge in `edge_hash`. Edges and loops are
/// always derived from the same faces, so a miss means corrupted input.
pub fn assign_loop_edges(polys: &[Poly], loops: &mut [Loop], edge_hash: &EdgeHash) {
    for (poly_index, poly) in polys.iter().enumerate() {
        let range = poly.loop_range();
        let corners = &mut loops[range];
        let n = corners.len();
        for i in 0..n {
            let v = corners[i].v;
            let v_next = corners[(i + 1) % n].v;
            let Some(edge) = edge_hash.lookup(v, v_next) else {
                panic!("polygon {} has no edge between vertices {} and {}", poly_index, v, v_next);
            };
            corners[i].e = edge.0;
        }
    }
}

/// Result of [`build_polys_from_faces`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolysFromFaces {
    pub polys: Vec<Poly>,
    pub loops: Vec<Loop>,
    /// Material of each polygon, taken from its face.
    pub material_indices: Vec<i32>,
}

/// Turns every face into a polygon of 3 or 4 loops, in face order.
///
/// Loop edges are looked up in `edges`, which must contain every face side.
/// The obsolete [`EdgeFlag::FGON`] bit is cleared on all edges.
pub fn build_polys_from_faces(faces: &[Face], edges: &mut [Edge]) -> PolysFromFaces {
    let mut edge_hash = EdgeHash::with_capacity(edges.len());
    for (i, edge) in edges.iter_mut().enumerate() {
        edge_hash.insert(edge.v1, edge.v2, i.into());
        edge.flag.remove(EdgeFlag::FGON);
    }

    let total_loops: usize = faces.iter().map(Face::corner_count).sum();
    let mut result = PolysFromFaces {
        polys: Vec::with_capacity(faces.len()),
        loops: Vec::with_capacity(total_loops),
        material_indices: Vec::with_capacity(faces.len()),
    };

    for face in faces {
        let n = face.corner_count();
        result.polys.push(Poly {
            loopstart: result.loops.len() as u32,
            totloop: n as u32,
            mat_nr_legacy: 0,
            flag: face.flag,
        });
        result.material_indices.push(i32::from(face.mat_nr));
        result
            .loops
            .extend(face.verts().iter().take(n).map(|&v| Loop { v, e: 0 }));
    }

    assign_loop_edges(&result.polys, &mut result.loops, &edge_hash);

    debug!(
        "Built {} polygons with {} loops from legacy faces",
        result.polys.len(),
        result.loops.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge_dedup::calc_edges_from_faces;
    use crate::mesh_types::PolyFlag;

    #[test]
    fn test_quad_loops_follow_sides() {
        let faces = [Face::quad(1, 2, 3, 4)];
        let mut edges = calc_edges_from_faces(&faces, false);
        let built = build_polys_from_faces(&faces, &mut edges);

        assert_eq!(built.polys.len(), 1);
        assert_eq!(built.loops.len(), 4);
        let verts: Vec<_> = built.loops.iter().map(|l| l.v).collect();
        assert_eq!(verts, vec![1, 2, 3, 4]);
        for i in 0..4 {
            let e = edges[built.loops[i].e as usize];
            let next = built.loops[(i + 1) % 4].v;
            let mut expected = [built.loops[i].v, next];
            expected.sort_unstable();
            let (a, b) = e.ordered();
            assert_eq!([a, b], expected);
        }
    }

    #[test]
    fn test_face_attributes_carried() {
        let mut face = Face::tri(1, 2, 3);
        face.mat_nr = 3;
        face.flag = PolyFlag::SMOOTH;
        let mut edges = calc_edges_from_faces(&[face], false);
        edges[0].flag |= EdgeFlag::FGON;

        let built = build_polys_from_faces(&[face], &mut edges);
        assert_eq!(built.material_indices, vec![3]);
        assert_eq!(built.polys[0].flag, PolyFlag::SMOOTH);
        assert!(edges.iter().all(|e| !e.flag.contains(EdgeFlag::FGON)));
    }

    #[test]
    #[should_panic(expected = "has no edge")]
    fn test_missing_edge_panics() {
        let polys = [Poly {
            loopstart: 0,
            totloop: 3,
            ..Poly::default()
        }];
        let mut loops = [Loop { v: 0, e: 0 }, Loop { v: 1, e: 0 }, Loop { v: 2, e: 0 }];
        let hash = EdgeHash::from_edges(&[Edge::new(0, 1)]);
        assign_loop_edges(&polys, &mut loops, &hash);
    }
}
