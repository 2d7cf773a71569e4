//! Mesh-level conversion entry points.
//!
//! These functions sequence the building blocks over a whole [`Mesh`],
//! replacing its element arrays and keeping the face and loop layer
//! directories consistent afterwards.

use log::{debug, warn};

use crate::attribute::{AttrDomain, AttributeReader, AttributeValues};
use crate::custom_data::{LayerData, LayerType};
use crate::edge_dedup::calc_edges_from_faces;
use crate::edge_hash::EdgeHash;
use crate::error::Status;
use crate::layer_convert::{
    add_face_layers_from_loops, add_loop_layers_from_faces, check_matching_legacy_layer_counts,
    corners_to_loops, loops_to_tessdata, update_active_ldata_layers,
};
use crate::legacy_flags::{self, MATERIAL_INDEX};
use crate::loop_builder::{assign_loop_edges, build_polys_from_faces};
use crate::mesh::Mesh;
use crate::options::ConvertOptions;
use crate::tessellate::tessellate_polys;

/// Derives the edges of an old mesh from its legacy faces.
///
/// Existing polygon loops are re-linked to the new edges and loose faces are
/// removed afterwards. A mesh without faces ends up with no edges.
pub fn calc_edges_legacy(mesh: &mut Mesh, options: &ConvertOptions) {
    let edges = calc_edges_from_faces(&mesh.faces, options.get_use_old_draw_flags());
    if edges.is_empty() {
        mesh.edges.clear();
        return;
    }
    let edge_hash = EdgeHash::from_edges(&edges);
    assign_loop_edges(&mesh.polys, &mut mesh.loops, &edge_hash);
    mesh.edges = edges;
    strip_loose_faces(mesh);
}

/// Removes legacy faces with fewer than three vertices (`v3 == 0`).
pub fn strip_loose_faces(mesh: &mut Mesh) {
    let keep: Vec<bool> = mesh.faces.iter().map(|f| f.v3 != 0).collect();
    let num_loose = keep.iter().filter(|&&k| !k).count();
    if num_loose == 0 {
        return;
    }
    mesh.faces.retain(|f| f.v3 != 0);
    mesh.fdata.retain_elements(&keep);
    debug!("Stripped {} loose faces", num_loose);
}

fn faces_to_polys(mesh: &mut Mesh) -> Status {
    mesh.ldata.free();
    mesh.pdata.free();

    let built = build_polys_from_faces(&mesh.faces, &mut mesh.edges);
    let totloop = built.loops.len();
    mesh.ldata.set_len(totloop);
    mesh.pdata.set_len(built.polys.len());

    add_loop_layers_from_faces(&mesh.fdata, &mut mesh.ldata, totloop);
    corners_to_loops(&mesh.fdata, &mut mesh.ldata, &mesh.faces, &built.polys);

    if let Some(origindex) = mesh
        .fdata
        .layer_mut(LayerType::OrigIndex)
        .and_then(|l| l.data.int_mut())
    {
        for (i, index) in origindex.iter_mut().enumerate() {
            *index = i as i32;
        }
    }

    mesh.attributes.insert(
        MATERIAL_INDEX,
        AttrDomain::Face,
        AttributeValues::Int32(built.material_indices),
    )?;
    mesh.polys = built.polys;
    mesh.loops = built.loops;
    Ok(())
}

/// Builds polygons and loops from the legacy faces, one polygon per face.
///
/// Faces must not be loose and every face side needs an edge; run
/// [`calc_edges_legacy`] first on meshes without edges.
pub fn convert_faces_to_polys(mesh: &mut Mesh) -> Status {
    faces_to_polys(mesh)?;
    ensure_tessellation_customdata(mesh);
    Ok(())
}

/// Like [`convert_faces_to_polys`], but also carries the face layer
/// selections (active, render, clone, stencil) over to the loop layers, as
/// needed when upgrading old files.
pub fn do_versions_convert_faces_to_polys(mesh: &mut Mesh) -> Status {
    faces_to_polys(mesh)?;
    update_active_ldata_layers(&mesh.fdata, &mut mesh.ldata);
    ensure_tessellation_customdata(mesh);
    Ok(())
}

/// Drops the legacy faces and their layers.
pub fn tessface_clear(mesh: &mut Mesh) {
    mesh.faces.clear();
    mesh.fdata.free();
}

/// Resets the face layers when their UV or color maps no longer match the
/// loop layers.
///
/// Does nothing for meshes that only have legacy faces, which still need
/// their polygons built from those faces.
pub fn ensure_tessellation_customdata(mesh: &mut Mesh) {
    if !mesh.faces.is_empty() && mesh.polys.is_empty() {
        return;
    }
    let num_uv_loop = mesh.ldata.number_of_layers(LayerType::MLoopUv);
    let num_col_loop = mesh.ldata.number_of_layers(LayerType::PropByteColor);
    let num_uv_face = mesh.fdata.number_of_layers(LayerType::MTFace);
    let num_col_face = mesh.fdata.number_of_layers(LayerType::MCol);

    if num_uv_face != num_uv_loop || num_col_face != num_col_loop {
        tessface_clear(mesh);
        add_face_layers_from_loops(&mut mesh.fdata, &mesh.ldata, mesh.faces.len());
        warn!(
            "Tessellation UV or color layers out of sync, reset them \
             (face UV {} != loop UV {} || face color {} != loop color {})",
            num_uv_face, num_uv_loop, num_col_face, num_col_loop
        );
    }
}

/// Rebuilds the legacy faces from the polygons.
///
/// Faces get an [`LayerType::OrigIndex`] layer pointing back at their
/// polygon, plus one face layer per convertible loop layer.
pub fn tessface_calc(mesh: &mut Mesh, options: &ConvertOptions) -> Status {
    let material_indices =
        match mesh
            .attributes
            .lookup_or_default::<i32>(MATERIAL_INDEX, AttrDomain::Face, mesh.polys.len(), 0)?
        {
            AttributeReader::Span(values) => Some(values),
            AttributeReader::Single(_) => None,
        };
    let mut tess = tessellate_polys(&mesh.verts, &mesh.polys, &mesh.loops, material_indices);

    mesh.fdata.free();
    let origindex = tess.face_to_poly.iter().map(|&p| u32::from(p) as i32).collect();
    mesh.fdata
        .add_layer_with_data(LayerType::OrigIndex, "", LayerData::Int(origindex));
    add_face_layers_from_loops(&mut mesh.fdata, &mesh.ldata, tess.len());
    loops_to_tessdata(&mut mesh.fdata, &mesh.ldata, None, &tess.loop_indices);
    tess.validate_quads(Some(&mut mesh.fdata));
    mesh.faces = tess.faces;

    ensure_tessellation_customdata(mesh);
    if options.get_check_layer_counts() {
        assert!(
            check_matching_legacy_layer_counts(&mesh.fdata, &mesh.ldata, true),
            "face and loop layers out of sync after tessellation"
        );
    }
    Ok(())
}

/// Tessellates only when polygons exist and no legacy faces do.
pub fn tessface_ensure(mesh: &mut Mesh, options: &ConvertOptions) -> Status {
    if !mesh.polys.is_empty() && mesh.faces.is_empty() {
        tessface_calc(mesh, options)?;
    }
    Ok(())
}

/// Writes generic attributes into the legacy element fields.
pub fn convert_attributes_to_legacy_flags(mesh: &mut Mesh, options: &ConvertOptions) -> Status {
    let grain = options.get_parallel_grain();
    legacy_flags::hide_layers_to_flags(mesh, grain)?;
    legacy_flags::selection_layers_to_flags(mesh, grain)?;
    legacy_flags::material_indices_to_polys(mesh, grain)?;
    legacy_flags::bevel_weight_from_layers(mesh, grain)?;
    legacy_flags::edge_crease_from_layers(mesh, grain)?;
    legacy_flags::face_set_from_generic(mesh)
}

/// Creates generic attributes from the legacy element fields.
pub fn convert_legacy_flags_to_attributes(mesh: &mut Mesh, options: &ConvertOptions) -> Status {
    let grain = options.get_parallel_grain();
    legacy_flags::flags_to_hide_layers(mesh, grain)?;
    legacy_flags::flags_to_selection_layers(mesh, grain)?;
    legacy_flags::polys_to_material_indices(mesh, grain)?;
    legacy_flags::bevel_weight_to_layers(mesh, grain)?;
    legacy_flags::edge_crease_to_layers(mesh, grain)?;
    legacy_flags::face_set_to_generic(mesh)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionDirection {
    /// Upgrade a mesh that only has legacy faces and fields.
    LegacyToPolys,
    /// Produce legacy faces and fields for consumers of the old format.
    PolysToLegacy,
}

/// Runs a full conversion in `direction`.
pub fn convert(mesh: &mut Mesh, direction: ConversionDirection, options: &ConvertOptions) -> Status {
    match direction {
        ConversionDirection::LegacyToPolys => {
            legacy_flags::cd_flag_init(mesh);
            if mesh.edges.is_empty() {
                calc_edges_legacy(mesh, options);
            }
            do_versions_convert_faces_to_polys(mesh)?;
            convert_legacy_flags_to_attributes(mesh, options)?;
        }
        ConversionDirection::PolysToLegacy => {
            convert_attributes_to_legacy_flags(mesh, options)?;
            tessface_calc(mesh, options)?;
        }
    }
    debug!(
        "Converted mesh {:?}: {} verts, {} edges, {} polys, {} loops, {} faces",
        direction,
        mesh.num_verts(),
        mesh.num_edges(),
        mesh.num_polys(),
        mesh.num_loops(),
        mesh.num_faces()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custom_data::ActiveLayers;
    use crate::mesh_types::{Face, Vertex};

    fn verts(n: usize) -> Vec<Vertex> {
        (0..n)
            .map(|i| Vertex::new([(i % 3) as f32, (i / 3) as f32, 0.0]))
            .collect()
    }

    #[test]
    fn test_calc_edges_strips_loose_faces() {
        let faces = vec![Face::tri(1, 2, 3), Face::tri(4, 5, 0)];
        let mut mesh = Mesh::from_legacy_faces(verts(6), faces);
        mesh.fdata
            .add_layer_with_data(LayerType::OrigIndex, "", LayerData::Int(vec![10, 11]));
        calc_edges_legacy(&mut mesh, &ConvertOptions::default());

        assert_eq!(mesh.num_edges(), 4);
        assert_eq!(mesh.faces, vec![Face::tri(1, 2, 3)]);
        assert_eq!(mesh.fdata.len(), 1);
        assert_eq!(
            mesh.fdata.layer(LayerType::OrigIndex).and_then(|l| l.data.int()),
            Some(&[10][..])
        );
    }

    #[test]
    fn test_calc_edges_no_faces() {
        let mut mesh = Mesh::from_legacy_faces(verts(3), Vec::new());
        calc_edges_legacy(&mut mesh, &ConvertOptions::default());
        assert_eq!(mesh.num_edges(), 0);
    }

    #[test]
    fn test_versioning_copies_active_layers() {
        let faces = vec![Face::quad(1, 2, 5, 4)];
        let mut mesh = Mesh::from_legacy_faces(verts(6), faces);
        mesh.fdata.add_layer_named(LayerType::MTFace, "A", 1);
        mesh.fdata.add_layer_named(LayerType::MTFace, "B", 1);
        let active = ActiveLayers {
            active: 1,
            render: 1,
            clone: 0,
            stencil: 0,
        };
        mesh.fdata.set_active_layers(LayerType::MTFace, active);
        calc_edges_legacy(&mut mesh, &ConvertOptions::default());
        do_versions_convert_faces_to_polys(&mut mesh).unwrap();

        assert_eq!(mesh.ldata.number_of_layers(LayerType::MLoopUv), 2);
        assert_eq!(mesh.ldata.active_layers(LayerType::MLoopUv), active);
        // Layer counts match, the face layers are kept.
        assert_eq!(mesh.fdata.number_of_layers(LayerType::MTFace), 2);
        assert_eq!(mesh.num_faces(), 1);
    }

    #[test]
    fn test_ensure_resets_out_of_sync_layers() {
        let mut mesh = Mesh::from_polygons(verts(3), &[vec![0, 1, 2]]);
        mesh.faces = vec![Face::tri(1, 2, 0)];
        mesh.fdata.set_len(1);
        mesh.ldata.add_layer_named(LayerType::PropByteColor, "Col", 3);

        ensure_tessellation_customdata(&mut mesh);
        assert!(mesh.faces.is_empty());
        assert_eq!(mesh.fdata.number_of_layers(LayerType::MCol), 1);
    }

    #[test]
    fn test_tessface_ensure_only_when_missing() {
        let options = ConvertOptions::default();
        let mut mesh = Mesh::from_polygons(verts(6), &[vec![0, 1, 4, 3], vec![1, 2, 5]]);
        tessface_ensure(&mut mesh, &options).unwrap();
        assert_eq!(mesh.num_faces(), 2);

        mesh.faces.truncate(1);
        tessface_ensure(&mut mesh, &options).unwrap();
        assert_eq!(mesh.num_faces(), 1);
    }

    #[test]
    fn test_tessface_calc_origindex_and_material() {
        let mut mesh = Mesh::from_polygons(verts(6), &[vec![0, 1, 2, 5, 4], vec![0, 4, 3]]);
        mesh.attributes
            .insert(MATERIAL_INDEX, AttrDomain::Face, AttributeValues::Int32(vec![1, 2]))
            .unwrap();
        tessface_calc(&mut mesh, &ConvertOptions::default()).unwrap();

        assert_eq!(mesh.num_faces(), 4);
        let origindex = mesh.fdata.layer(LayerType::OrigIndex).and_then(|l| l.data.int()).unwrap();
        assert_eq!(origindex, &[0, 0, 0, 1]);
        let mats: Vec<_> = mesh.faces.iter().map(|f| f.mat_nr).collect();
        assert_eq!(mats, vec![1, 1, 1, 2]);
    }
}
