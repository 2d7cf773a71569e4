use std::collections::HashSet;

use meshcompat_core::convert::tessface_calc;
use meshcompat_core::tessellate::{tessellate_polys, TessOrigin, Tessellation};
use meshcompat_core::{ConvertOptions, LayerType, Loop, Mesh, Poly, Vertex};
use proptest::prelude::*;

fn single_poly_mesh(coords: &[[f32; 3]]) -> Mesh {
    let verts = coords.iter().map(|&co| Vertex::new(co)).collect();
    let polygon: Vec<u32> = (0..coords.len() as u32).collect();
    Mesh::from_polygons(verts, &[polygon])
}

fn tessellate(mesh: &Mesh) -> Tessellation {
    tessellate_polys(&mesh.verts, &mesh.polys, &mesh.loops, None)
}

/// Checks count, corner coverage and uniqueness of the faces of a single
/// polygon with `n` corners.
fn check_coverage(mesh: &Mesh, tess: &Tessellation, n: usize) -> Result<(), String> {
    let expected = if n <= 4 { 1 } else { n - 2 };
    if tess.len() != expected {
        return Err(format!("{} faces for {} corners", tess.len(), n));
    }
    let mut covered = HashSet::new();
    let mut triples = HashSet::new();
    for i in 0..tess.len() {
        let corners = tess.corner_count(i);
        let mut verts: Vec<u32> = tess.loop_indices[i][..corners]
            .iter()
            .map(|&l| mesh.loops[l as usize].v)
            .collect();
        covered.extend(verts.iter().copied());
        verts.sort_unstable();
        if !triples.insert(verts.clone()) {
            return Err(format!("duplicate face {:?}", verts));
        }
    }
    let all: HashSet<u32> = (0..n as u32).collect();
    if covered != all {
        return Err(format!("covered {:?}", covered));
    }
    Ok(())
}

/// Signed area of the tessellation projected on XY.
fn projected_area(mesh: &Mesh, tess: &Tessellation) -> f32 {
    tess.faces
        .iter()
        .map(|f| {
            let a = mesh.verts[f.v1 as usize].co;
            let b = mesh.verts[f.v2 as usize].co;
            let c = mesh.verts[f.v3 as usize].co;
            ((b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])) * 0.5
        })
        .sum()
}

#[test]
fn test_concave_ngon() {
    // Arrow shape with a deep notch at corner 4.
    let mesh = single_poly_mesh(&[
        [0.0, 0.0, 0.0],
        [4.0, 0.0, 0.0],
        [4.0, 4.0, 0.0],
        [2.0, 4.0, 0.0],
        [2.0, 1.0, 0.0],
        [0.0, 4.0, 0.0],
    ]);
    let tess = tessellate(&mesh);
    check_coverage(&mesh, &tess, 6).unwrap();
    // 4x4 square minus the notch triangle (2,4)-(2,1)-(0,4), area 3.
    assert!((projected_area(&mesh, &tess) - 13.0).abs() < 1e-4);
    assert!(tess.origins.iter().all(|&o| o == TessOrigin::Fill));
}

#[test]
fn test_ngon_facing_down() {
    // Same pentagon wound clockwise seen from +Z.
    let coords = [
        [0.0, 0.0, 0.0],
        [0.0, 2.0, 0.0],
        [1.0, 3.0, 0.0],
        [2.0, 2.0, 0.0],
        [2.0, 0.0, 0.0],
    ];
    let mesh = single_poly_mesh(&coords);
    let tess = tessellate(&mesh);
    check_coverage(&mesh, &tess, 5).unwrap();
    assert!((projected_area(&mesh, &tess) + 5.0).abs() < 1e-4);
}

#[test]
fn test_non_planar_ngon() {
    // Hexagon in a vertical plane with alternating bumps.
    let coords: Vec<[f32; 3]> = (0..6)
        .map(|i| {
            let a = i as f32 * std::f32::consts::TAU / 6.0;
            let bump = if i % 2 == 0 { 0.05 } else { -0.05 };
            [bump, a.cos(), a.sin()]
        })
        .collect();
    let mesh = single_poly_mesh(&coords);
    let tess = tessellate(&mesh);
    check_coverage(&mesh, &tess, 6).unwrap();
}

#[test]
fn test_degenerate_polys_skipped() {
    let verts = vec![Vertex::default(); 3];
    let polys = [
        Poly {
            loopstart: 0,
            totloop: 2,
            ..Poly::default()
        },
        Poly {
            loopstart: 2,
            totloop: 0,
            ..Poly::default()
        },
    ];
    let loops = [Loop { v: 0, e: 0 }, Loop { v: 1, e: 0 }];
    assert!(tessellate_polys(&verts, &polys, &loops, None).is_empty());
}

#[test]
fn test_large_material_index_saturates() {
    let verts = vec![Vertex::default(); 4];
    let mesh = Mesh::from_polygons(verts, &[vec![0, 1, 2], vec![1, 2, 3]]);
    let tess = tessellate_polys(&mesh.verts, &mesh.polys, &mesh.loops, Some(&[40_000, 12]));
    assert_eq!(tess.faces[0].mat_nr, i16::MAX);
    assert_eq!(tess.faces[1].mat_nr, 12);
}

#[test]
fn test_mesh_tessellation_keeps_loop_layers() {
    let mut mesh = single_poly_mesh(&[
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [2.0, 1.0, 0.0],
        [1.0, 2.0, 0.0],
        [0.0, 1.0, 0.0],
    ]);
    mesh.ldata.add_layer_named(LayerType::MLoopUv, "UVMap", 5);
    if let Some(uv) = mesh.ldata.layer_mut(LayerType::MLoopUv).and_then(|l| l.data.uv_mut()) {
        for (i, value) in uv.iter_mut().enumerate() {
            *value = [i as f32, 0.5];
        }
    }
    tessface_calc(&mut mesh, &ConvertOptions::default()).unwrap();

    assert_eq!(mesh.num_faces(), 3);
    let face_uv = mesh
        .fdata
        .layer(LayerType::MTFace)
        .and_then(|l| l.data.face_uv())
        .unwrap();
    for (face, uv) in mesh.faces.iter().zip(face_uv) {
        for (j, v) in face.verts().iter().take(3).enumerate() {
            // Vertex i sits on loop i.
            assert_eq!(uv[j], [*v as f32, 0.5]);
        }
    }
}

/// Simple star-shaped polygon around the origin, optionally bent off its
/// plane by a small amount.
fn arb_star_polygon() -> impl Strategy<Value = Vec<[f32; 3]>> {
    (3usize..16).prop_flat_map(|n| {
        (
            prop::collection::vec(0.2f32..1.0, n),
            prop::collection::vec(-0.02f32..0.02, n),
        )
            .prop_map(move |(radii, bumps)| {
                (0..n)
                    .map(|i| {
                        let a = i as f32 * std::f32::consts::TAU / n as f32;
                        [radii[i] * a.cos(), radii[i] * a.sin(), bumps[i]]
                    })
                    .collect()
            })
    })
}

proptest! {
    #[test]
    fn tessellation_covers_polygon(coords in arb_star_polygon()) {
        let mesh = single_poly_mesh(&coords);
        let tess = tessellate(&mesh);
        if let Err(msg) = check_coverage(&mesh, &tess, coords.len()) {
            prop_assert!(false, "{}", msg);
        }
    }

    #[test]
    fn tessellation_preserves_area(coords in arb_star_polygon()) {
        prop_assume!(coords.len() > 4);
        let flat: Vec<[f32; 3]> = coords.iter().map(|c| [c[0], c[1], 0.0]).collect();
        let mesh = single_poly_mesh(&flat);
        let tess = tessellate(&mesh);

        let n = flat.len();
        let polygon_area: f32 = (0..n)
            .map(|i| {
                let (a, b) = (flat[i], flat[(i + 1) % n]);
                (a[0] * b[1] - b[0] * a[1]) * 0.5
            })
            .sum();
        prop_assert!((projected_area(&mesh, &tess) - polygon_area).abs() < 1e-3);
    }
}
