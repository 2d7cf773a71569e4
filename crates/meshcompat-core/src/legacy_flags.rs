//! Migration between legacy element fields and generic attributes.
//!
//! Older data keeps hidden/selected state in flag bits, material indices on
//! polygons and bevel weights or creases as bytes on the elements. The
//! generic form stores each of these as a named attribute. Moving from
//! attributes to legacy fields always writes every element; the reverse
//! direction only creates an attribute when some element holds a
//! non-default value.
//!
//! Element loops are independent per element and run in parallel chunks of
//! `grain` elements.

use rayon::prelude::*;

use crate::attribute::{AttrDomain, AttributeReader, AttributeStore, AttributeValues};
use crate::custom_data::{LayerData, LayerType};
use crate::error::{MeshError, MeshResult, Status};
use crate::math_utils::{material_index_to_legacy, uchar_to_unit_float, unit_float_to_uchar_clamp};
use crate::mesh::Mesh;
use crate::mesh_types::{CdFlag, EdgeFlag, PolyFlag, VertFlag};

pub const HIDE_VERT: &str = ".hide_vert";
pub const HIDE_EDGE: &str = ".hide_edge";
pub const HIDE_POLY: &str = ".hide_poly";
pub const SELECT_VERT: &str = ".select_vert";
pub const SELECT_EDGE: &str = ".select_edge";
pub const SELECT_POLY: &str = ".select_poly";
pub const MATERIAL_INDEX: &str = "material_index";
pub const BEVEL_WEIGHT_VERT: &str = "bevel_weight_vert";
pub const BEVEL_WEIGHT_EDGE: &str = "bevel_weight_edge";
pub const CREASE_EDGE: &str = "crease_edge";
pub const SCULPT_FACE_SET: &str = ".sculpt_face_set";

/// Calls `f` on every element, in parallel chunks of `grain`.
fn parallel_for_each<T, F>(items: &mut [T], grain: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync,
{
    let grain = grain.max(1);
    items
        .par_chunks_mut(grain)
        .enumerate()
        .for_each(|(chunk_index, chunk)| {
            let base = chunk_index * grain;
            for (i, item) in chunk.iter_mut().enumerate() {
                f(base + i, item);
            }
        });
}

fn float_attribute<'a>(
    store: &'a AttributeStore,
    name: &str,
    domain: AttrDomain,
    len: usize,
) -> MeshResult<Option<&'a [f32]>> {
    match store.lookup_or_default::<f32>(name, domain, len, 0.0)? {
        AttributeReader::Span(values) => Ok(Some(values)),
        AttributeReader::Single(_) => Ok(None),
    }
}

// Hide

pub fn hide_layers_to_flags(mesh: &mut Mesh, grain: usize) -> Status {
    let attributes = &mesh.attributes;

    let hide_vert = attributes.lookup_or_default(HIDE_VERT, AttrDomain::Point, mesh.verts.len(), false)?;
    parallel_for_each(&mut mesh.verts, grain, |i, vert| {
        vert.flag.set(VertFlag::HIDE, hide_vert.get(i));
    });

    let hide_edge = attributes.lookup_or_default(HIDE_EDGE, AttrDomain::Edge, mesh.edges.len(), false)?;
    parallel_for_each(&mut mesh.edges, grain, |i, edge| {
        edge.flag.set(EdgeFlag::HIDE, hide_edge.get(i));
    });

    let hide_poly = attributes.lookup_or_default(HIDE_POLY, AttrDomain::Face, mesh.polys.len(), false)?;
    parallel_for_each(&mut mesh.polys, grain, |i, poly| {
        poly.flag.set(PolyFlag::HIDE, hide_poly.get(i));
    });
    Ok(())
}

pub fn flags_to_hide_layers(mesh: &mut Mesh, grain: usize) -> Status {
    let verts = &mesh.verts;
    if verts.iter().any(|v| v.flag.contains(VertFlag::HIDE)) {
        let mut writer = mesh
            .attributes
            .lookup_or_add_for_write_only::<bool>(HIDE_VERT, AttrDomain::Point, verts.len())?;
        parallel_for_each(&mut writer.span, grain, |i, hide| {
            *hide = verts[i].flag.contains(VertFlag::HIDE);
        });
        writer.finish();
    }

    let edges = &mesh.edges;
    if edges.iter().any(|e| e.flag.contains(EdgeFlag::HIDE)) {
        let mut writer = mesh
            .attributes
            .lookup_or_add_for_write_only::<bool>(HIDE_EDGE, AttrDomain::Edge, edges.len())?;
        parallel_for_each(&mut writer.span, grain, |i, hide| {
            *hide = edges[i].flag.contains(EdgeFlag::HIDE);
        });
        writer.finish();
    }

    let polys = &mesh.polys;
    if polys.iter().any(|p| p.flag.contains(PolyFlag::HIDE)) {
        let mut writer = mesh
            .attributes
            .lookup_or_add_for_write_only::<bool>(HIDE_POLY, AttrDomain::Face, polys.len())?;
        parallel_for_each(&mut writer.span, grain, |i, hide| {
            *hide = polys[i].flag.contains(PolyFlag::HIDE);
        });
        writer.finish();
    }
    Ok(())
}

// Selection

pub fn selection_layers_to_flags(mesh: &mut Mesh, grain: usize) -> Status {
    let attributes = &mesh.attributes;

    let select_vert = attributes.lookup_or_default(SELECT_VERT, AttrDomain::Point, mesh.verts.len(), false)?;
    parallel_for_each(&mut mesh.verts, grain, |i, vert| {
        vert.flag.set(VertFlag::SELECT, select_vert.get(i));
    });

    let select_edge = attributes.lookup_or_default(SELECT_EDGE, AttrDomain::Edge, mesh.edges.len(), false)?;
    parallel_for_each(&mut mesh.edges, grain, |i, edge| {
        edge.flag.set(EdgeFlag::SELECT, select_edge.get(i));
    });

    let select_poly = attributes.lookup_or_default(SELECT_POLY, AttrDomain::Face, mesh.polys.len(), false)?;
    parallel_for_each(&mut mesh.polys, grain, |i, poly| {
        poly.flag.set(PolyFlag::FACE_SEL, select_poly.get(i));
    });
    Ok(())
}

pub fn flags_to_selection_layers(mesh: &mut Mesh, grain: usize) -> Status {
    let verts = &mesh.verts;
    if verts.iter().any(|v| v.flag.contains(VertFlag::SELECT)) {
        let mut writer = mesh
            .attributes
            .lookup_or_add_for_write_only::<bool>(SELECT_VERT, AttrDomain::Point, verts.len())?;
        parallel_for_each(&mut writer.span, grain, |i, select| {
            *select = verts[i].flag.contains(VertFlag::SELECT);
        });
        writer.finish();
    }

    let edges = &mesh.edges;
    if edges.iter().any(|e| e.flag.contains(EdgeFlag::SELECT)) {
        let mut writer = mesh
            .attributes
            .lookup_or_add_for_write_only::<bool>(SELECT_EDGE, AttrDomain::Edge, edges.len())?;
        parallel_for_each(&mut writer.span, grain, |i, select| {
            *select = edges[i].flag.contains(EdgeFlag::SELECT);
        });
        writer.finish();
    }

    let polys = &mesh.polys;
    if polys.iter().any(|p| p.flag.contains(PolyFlag::FACE_SEL)) {
        let mut writer = mesh
            .attributes
            .lookup_or_add_for_write_only::<bool>(SELECT_POLY, AttrDomain::Face, polys.len())?;
        parallel_for_each(&mut writer.span, grain, |i, select| {
            *select = polys[i].flag.contains(PolyFlag::FACE_SEL);
        });
        writer.finish();
    }
    Ok(())
}

// Material index

pub fn material_indices_to_polys(mesh: &mut Mesh, grain: usize) -> Status {
    let material_indices =
        mesh.attributes
            .lookup_or_default(MATERIAL_INDEX, AttrDomain::Face, mesh.polys.len(), 0i32)?;
    parallel_for_each(&mut mesh.polys, grain, |i, poly| {
        poly.mat_nr_legacy = material_index_to_legacy(material_indices.get(i));
    });
    Ok(())
}

pub fn polys_to_material_indices(mesh: &mut Mesh, grain: usize) -> Status {
    let polys = &mesh.polys;
    if polys.iter().any(|p| p.mat_nr_legacy != 0) {
        let mut writer = mesh
            .attributes
            .lookup_or_add_for_write_only::<i32>(MATERIAL_INDEX, AttrDomain::Face, polys.len())?;
        parallel_for_each(&mut writer.span, grain, |i, material| {
            *material = i32::from(polys[i].mat_nr_legacy);
        });
        writer.finish();
    }
    Ok(())
}

// Bevel weight and crease

pub fn bevel_weight_from_layers(mesh: &mut Mesh, grain: usize) -> Status {
    match float_attribute(&mesh.attributes, BEVEL_WEIGHT_VERT, AttrDomain::Point, mesh.verts.len())? {
        Some(weights) => parallel_for_each(&mut mesh.verts, grain, |i, vert| {
            vert.bweight_legacy = unit_float_to_uchar_clamp(weights[i]);
        }),
        None => parallel_for_each(&mut mesh.verts, grain, |_, vert| vert.bweight_legacy = 0),
    }
    let any_vert = mesh.verts.iter().any(|v| v.bweight_legacy != 0);
    mesh.cd_flag.set(CdFlag::VERT_BWEIGHT, any_vert);

    match float_attribute(&mesh.attributes, BEVEL_WEIGHT_EDGE, AttrDomain::Edge, mesh.edges.len())? {
        Some(weights) => parallel_for_each(&mut mesh.edges, grain, |i, edge| {
            edge.bweight_legacy = unit_float_to_uchar_clamp(weights[i]);
        }),
        None => parallel_for_each(&mut mesh.edges, grain, |_, edge| edge.bweight_legacy = 0),
    }
    let any_edge = mesh.edges.iter().any(|e| e.bweight_legacy != 0);
    mesh.cd_flag.set(CdFlag::EDGE_BWEIGHT, any_edge);
    Ok(())
}

/// Materializes the bevel weight attributes whose `cd_flag` bit is set and
/// that hold at least one nonzero byte.
pub fn bevel_weight_to_layers(mesh: &mut Mesh, grain: usize) -> Status {
    let verts = &mesh.verts;
    if mesh.cd_flag.contains(CdFlag::VERT_BWEIGHT) && verts.iter().any(|v| v.bweight_legacy != 0) {
        let mut writer = mesh
            .attributes
            .lookup_or_add_for_write_only::<f32>(BEVEL_WEIGHT_VERT, AttrDomain::Point, verts.len())?;
        parallel_for_each(&mut writer.span, grain, |i, weight| {
            *weight = uchar_to_unit_float(verts[i].bweight_legacy);
        });
        writer.finish();
    }

    let edges = &mesh.edges;
    if mesh.cd_flag.contains(CdFlag::EDGE_BWEIGHT) && edges.iter().any(|e| e.bweight_legacy != 0) {
        let mut writer = mesh
            .attributes
            .lookup_or_add_for_write_only::<f32>(BEVEL_WEIGHT_EDGE, AttrDomain::Edge, edges.len())?;
        parallel_for_each(&mut writer.span, grain, |i, weight| {
            *weight = uchar_to_unit_float(edges[i].bweight_legacy);
        });
        writer.finish();
    }
    Ok(())
}

pub fn edge_crease_from_layers(mesh: &mut Mesh, grain: usize) -> Status {
    match float_attribute(&mesh.attributes, CREASE_EDGE, AttrDomain::Edge, mesh.edges.len())? {
        Some(creases) => parallel_for_each(&mut mesh.edges, grain, |i, edge| {
            edge.crease_legacy = unit_float_to_uchar_clamp(creases[i]);
        }),
        None => parallel_for_each(&mut mesh.edges, grain, |_, edge| edge.crease_legacy = 0),
    }
    let any_crease = mesh.edges.iter().any(|e| e.crease_legacy != 0);
    mesh.cd_flag.set(CdFlag::EDGE_CREASE, any_crease);
    Ok(())
}

pub fn edge_crease_to_layers(mesh: &mut Mesh, grain: usize) -> Status {
    let edges = &mesh.edges;
    if mesh.cd_flag.contains(CdFlag::EDGE_CREASE) && edges.iter().any(|e| e.crease_legacy != 0) {
        let mut writer = mesh
            .attributes
            .lookup_or_add_for_write_only::<f32>(CREASE_EDGE, AttrDomain::Edge, edges.len())?;
        parallel_for_each(&mut writer.span, grain, |i, crease| {
            *crease = uchar_to_unit_float(edges[i].crease_legacy);
        });
        writer.finish();
    }
    Ok(())
}

/// Sets `cd_flag` from the legacy bytes of old files, which predate the
/// flag. A non-empty `cd_flag` is left alone.
pub fn cd_flag_init(mesh: &mut Mesh) {
    if !mesh.cd_flag.is_empty() {
        return;
    }
    if mesh.verts.iter().any(|v| v.bweight_legacy != 0) {
        mesh.cd_flag |= CdFlag::VERT_BWEIGHT;
    }
    if mesh.edges.iter().any(|e| e.bweight_legacy != 0) {
        mesh.cd_flag |= CdFlag::EDGE_BWEIGHT;
    }
    if mesh.edges.iter().any(|e| e.crease_legacy != 0) {
        mesh.cd_flag |= CdFlag::EDGE_CREASE;
    }
}

// Face sets

/// Moves legacy sculpt face-set polygon layers into the generic int
/// attribute [`SCULPT_FACE_SET`].
pub fn face_set_to_generic(mesh: &mut Mesh) -> Status {
    for layer in mesh.pdata.take_layers(LayerType::SculptFaceSets) {
        if let LayerData::Int(values) = layer.data {
            mesh.attributes
                .insert(SCULPT_FACE_SET, AttrDomain::Face, AttributeValues::Int32(values))?;
        }
    }
    Ok(())
}

/// Moves the generic [`SCULPT_FACE_SET`] attribute back into a legacy
/// polygon layer of the same name.
pub fn face_set_from_generic(mesh: &mut Mesh) -> Status {
    let Some(attr) = mesh.attributes.get(SCULPT_FACE_SET) else {
        return Ok(());
    };
    if attr.domain != AttrDomain::Face || !matches!(attr.values, AttributeValues::Int32(_)) {
        return Err(MeshError::AttributeTypeMismatch {
            name: SCULPT_FACE_SET.to_string(),
            domain: attr.domain,
        });
    }
    if let Some(attr) = mesh.attributes.take(SCULPT_FACE_SET) {
        if let AttributeValues::Int32(values) = attr.values {
            mesh.pdata
                .add_layer_with_data(LayerType::SculptFaceSets, SCULPT_FACE_SET, LayerData::Int(values));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_types::{Edge, Vertex};

    fn line_mesh(num_verts: usize) -> Mesh {
        let verts = (0..num_verts).map(|i| Vertex::new([i as f32, 0.0, 0.0])).collect();
        let mut mesh = Mesh::from_polygons(verts, &[]);
        mesh.edges = (1..num_verts as u32).map(|i| Edge::new(i - 1, i)).collect();
        mesh
    }

    #[test]
    fn test_parallel_for_each_covers_all_chunks() {
        let mut values = vec![0usize; 10];
        parallel_for_each(&mut values, 3, |i, v| *v = i);
        assert_eq!(values, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_reverse_is_lazy() {
        let mut mesh = line_mesh(4);
        flags_to_hide_layers(&mut mesh, 2).unwrap();
        flags_to_selection_layers(&mut mesh, 2).unwrap();
        polys_to_material_indices(&mut mesh, 2).unwrap();
        assert!(mesh.attributes.is_empty());

        mesh.edges[1].flag |= EdgeFlag::SELECT;
        flags_to_selection_layers(&mut mesh, 2).unwrap();
        assert_eq!(
            mesh.attributes.lookup::<bool>(SELECT_EDGE, AttrDomain::Edge),
            Some(&[false, true, false][..])
        );
        assert!(!mesh.attributes.contains(SELECT_VERT));
    }

    #[test]
    fn test_crease_absent_clears_flag() {
        let mut mesh = line_mesh(3);
        mesh.cd_flag = CdFlag::EDGE_CREASE;
        mesh.edges[0].crease_legacy = 200;
        edge_crease_from_layers(&mut mesh, 8).unwrap();
        assert!(!mesh.cd_flag.contains(CdFlag::EDGE_CREASE));
        assert_eq!(mesh.edges[0].crease_legacy, 0);
    }

    #[test]
    fn test_crease_clamped() {
        let mut mesh = line_mesh(3);
        mesh.attributes
            .insert(CREASE_EDGE, AttrDomain::Edge, AttributeValues::Float(vec![1.5, -0.5]))
            .unwrap();
        edge_crease_from_layers(&mut mesh, 8).unwrap();
        assert_eq!(mesh.edges[0].crease_legacy, 255);
        assert_eq!(mesh.edges[1].crease_legacy, 0);
        assert!(mesh.cd_flag.contains(CdFlag::EDGE_CREASE));
    }

    #[test]
    fn test_cd_flag_init() {
        let mut mesh = line_mesh(3);
        mesh.edges[1].crease_legacy = 4;
        cd_flag_init(&mut mesh);
        assert_eq!(mesh.cd_flag, CdFlag::EDGE_CREASE);

        mesh.verts[0].bweight_legacy = 1;
        cd_flag_init(&mut mesh);
        assert_eq!(mesh.cd_flag, CdFlag::EDGE_CREASE);
    }

    #[test]
    fn test_face_set_round_trip() {
        let verts = (0..3).map(|i| Vertex::new([i as f32, 0.0, 0.0])).collect();
        let mut mesh = Mesh::from_polygons(verts, &[vec![0, 1, 2]]);
        mesh.pdata
            .add_layer_with_data(LayerType::SculptFaceSets, "", LayerData::Int(vec![7]));

        face_set_to_generic(&mut mesh).unwrap();
        assert!(!mesh.pdata.has_layer(LayerType::SculptFaceSets));
        assert_eq!(mesh.attributes.lookup::<i32>(SCULPT_FACE_SET, AttrDomain::Face), Some(&[7][..]));

        face_set_from_generic(&mut mesh).unwrap();
        assert!(!mesh.attributes.contains(SCULPT_FACE_SET));
        let layer = mesh.pdata.layer(LayerType::SculptFaceSets).unwrap();
        assert_eq!(layer.name, SCULPT_FACE_SET);
        assert_eq!(layer.data.int(), Some(&[7][..]));
    }

    #[test]
    fn test_face_set_wrong_type() {
        let mut mesh = line_mesh(2);
        mesh.attributes
            .insert(SCULPT_FACE_SET, AttrDomain::Face, AttributeValues::Float(Vec::new()))
            .unwrap();
        assert!(face_set_from_generic(&mut mesh).is_err());
        assert!(mesh.attributes.contains(SCULPT_FACE_SET));
    }
}
