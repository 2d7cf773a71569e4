use meshcompat_core::convert::tessface_calc;
use meshcompat_core::legacy_flags::{HIDE_POLY, MATERIAL_INDEX};
use meshcompat_core::{
    convert, AttrDomain, ConversionDirection, ConvertOptions, Face, LayerType, Mesh, PolyFlag, Vertex,
};
use proptest::prelude::*;

const MAX_VERT: u32 = 12;

fn grid_verts(n: u32) -> Vec<Vertex> {
    (0..n)
        .map(|i| Vertex::new([(i % 4) as f32, (i / 4) as f32, 0.0]))
        .collect()
}

/// Triangle or quad over distinct vertices with random material and flags.
/// Vertex 0 only lands in the first two slots, where legacy faces allow it.
fn arb_face() -> impl Strategy<Value = Face> {
    let verts: Vec<u32> = (0..=MAX_VERT).collect();
    (
        prop::sample::subsequence(verts, 3..=4).prop_shuffle(),
        0i16..8,
        any::<u8>(),
    )
        .prop_map(|(mut vs, mat_nr, bits)| {
            if let Some(zero) = vs.iter().position(|&v| v == 0).filter(|&i| i >= 2) {
                vs.swap(zero, zero - 2);
            }
            let mut face = if vs.len() == 4 {
                Face::quad(vs[0], vs[1], vs[2], vs[3])
            } else {
                Face::tri(vs[0], vs[1], vs[2])
            };
            face.mat_nr = mat_nr;
            face.flag = PolyFlag::from_bits_truncate(bits);
            face
        })
}

/// Fields that survive a trip through polygons.
fn face_key(face: &Face) -> ([u32; 4], i16, PolyFlag) {
    (face.verts(), face.mat_nr, face.flag)
}

#[test]
fn test_quad_with_uvs() {
    let mut mesh = Mesh::from_legacy_faces(grid_verts(4), vec![Face::quad(0, 1, 2, 3)]);
    let uvs = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let layer = mesh.fdata.add_layer_named(LayerType::MTFace, "UVMap", 1);
    if let Some(values) = layer.data.face_uv_mut() {
        values[0] = uvs;
    }
    let options = ConvertOptions::default();

    convert(&mut mesh, ConversionDirection::LegacyToPolys, &options).unwrap();
    assert_eq!(mesh.num_edges(), 4);
    assert_eq!(mesh.num_polys(), 1);
    assert_eq!(mesh.num_loops(), 4);
    let loop_uv = mesh
        .ldata
        .layer(LayerType::MLoopUv)
        .and_then(|l| l.data.uv())
        .unwrap();
    assert_eq!(loop_uv, &uvs[..]);
    // Each loop's edge runs to the next corner.
    for (i, l) in mesh.loops.iter().enumerate() {
        let edge = mesh.edges[l.e as usize];
        let next = mesh.loops[(i + 1) % 4].v;
        assert_eq!(edge.ordered(), (l.v.min(next), l.v.max(next)));
    }

    convert(&mut mesh, ConversionDirection::PolysToLegacy, &options).unwrap();
    assert_eq!(mesh.num_faces(), 1);
    assert_eq!(mesh.faces[0].verts(), [0, 1, 2, 3]);
    let face_uv = mesh
        .fdata
        .layer(LayerType::MTFace)
        .and_then(|l| l.data.face_uv())
        .unwrap();
    assert_eq!(face_uv[0], uvs);
}

#[test]
fn test_hidden_face_survives_round_trip() {
    let mut hidden = Face::tri(1, 2, 3);
    hidden.flag = PolyFlag::HIDE;
    hidden.mat_nr = 2;
    let mut mesh = Mesh::from_legacy_faces(grid_verts(5), vec![hidden, Face::tri(1, 3, 4)]);
    let options = ConvertOptions::default();

    convert(&mut mesh, ConversionDirection::LegacyToPolys, &options).unwrap();
    assert_eq!(
        mesh.attributes.lookup::<bool>(HIDE_POLY, AttrDomain::Face),
        Some(&[true, false][..])
    );
    assert_eq!(
        mesh.attributes.lookup::<i32>(MATERIAL_INDEX, AttrDomain::Face),
        Some(&[2, 0][..])
    );

    convert(&mut mesh, ConversionDirection::PolysToLegacy, &options).unwrap();
    assert_eq!(mesh.faces[0].flag, PolyFlag::HIDE);
    assert_eq!(mesh.faces[0].mat_nr, 2);
    assert!(mesh.faces[1].flag.is_empty());
}

#[test]
fn test_loose_faces_dropped() {
    // The second face only has two corners, so it becomes a loose edge.
    let faces = vec![Face::tri(1, 2, 3), Face::tri(3, 4, 0)];
    let mut mesh = Mesh::from_legacy_faces(grid_verts(5), faces);
    mesh.faces[1].draw_sides[0] = true;

    convert(&mut mesh, ConversionDirection::LegacyToPolys, &ConvertOptions::default()).unwrap();
    assert_eq!(mesh.num_polys(), 1);
    // Three triangle sides plus the loose edge.
    assert_eq!(mesh.num_edges(), 4);
    assert_eq!(mesh.num_faces(), 1);
}

proptest! {
    #[test]
    fn faces_survive_round_trip(faces in prop::collection::vec(arb_face(), 1..30)) {
        let mut mesh = Mesh::from_legacy_faces(grid_verts(MAX_VERT + 1), faces.clone());
        let options = ConvertOptions::default().with_parallel_grain(3);

        convert(&mut mesh, ConversionDirection::LegacyToPolys, &options).unwrap();
        prop_assert_eq!(mesh.num_polys(), faces.len());
        prop_assert!(mesh.validate().is_ok());

        convert(&mut mesh, ConversionDirection::PolysToLegacy, &options).unwrap();
        let before: Vec<_> = faces.iter().map(face_key).collect();
        let after: Vec<_> = mesh.faces.iter().map(face_key).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn quad_polygons_never_end_on_vertex_zero(
        corners in prop::sample::subsequence((0..=MAX_VERT).collect::<Vec<u32>>(), 4).prop_shuffle()
    ) {
        let mut mesh = Mesh::from_polygons(grid_verts(MAX_VERT + 1), &[corners.clone()]);
        tessface_calc(&mut mesh, &ConvertOptions::default()).unwrap();

        prop_assert_eq!(mesh.num_faces(), 1);
        let face = mesh.faces[0].verts();
        prop_assert!(face[2] != 0 && face[3] != 0);
        let rotated = (0..4).any(|k| (0..4).all(|j| face[j] == corners[(j + k) % 4]));
        prop_assert!(rotated, "{:?} is not a rotation of {:?}", face, corners);
    }
}
