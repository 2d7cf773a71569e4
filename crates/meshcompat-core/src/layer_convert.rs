//! Conversion of corner layers between tessellated faces and loops.
//!
//! Face layers store the values of all (up to four) corners of a face in one
//! element, loop layers store one corner per element. Layers of the n-th UV
//! or color map on one side always correspond to the n-th one on the other.

use crate::custom_data::{CustomData, LayerType, MCol, MDisps, MLoopCol};
use crate::math_utils::{normal_float_to_short, normal_short_to_float};
use crate::mesh_types::{Face, Poly};

/// Loop layer created for each face layer when polygons are built from
/// faces.
fn loop_type_for_face_layer(layer_type: LayerType) -> Option<LayerType> {
    match layer_type {
        LayerType::MTFace => Some(LayerType::MLoopUv),
        LayerType::MCol => Some(LayerType::PropByteColor),
        LayerType::MDisps => Some(LayerType::MDisps),
        LayerType::TessLoopNormal => Some(LayerType::Normal),
        _ => None,
    }
}

/// Face layer created for each loop layer when faces are tessellated.
fn face_type_for_loop_layer(layer_type: LayerType) -> Option<LayerType> {
    match layer_type {
        LayerType::MLoopUv => Some(LayerType::MTFace),
        LayerType::PropByteColor => Some(LayerType::MCol),
        LayerType::PreviewMLoopCol => Some(LayerType::PreviewMCol),
        LayerType::OrigSpaceMLoop => Some(LayerType::OrigSpace),
        LayerType::Normal => Some(LayerType::TessLoopNormal),
        LayerType::Tangent => Some(LayerType::Tangent),
        _ => None,
    }
}

/// Loop and face layer types that must appear in equal numbers.
const LEGACY_LAYER_PAIRS: [(LayerType, LayerType); 6] = [
    (LayerType::MLoopUv, LayerType::MTFace),
    (LayerType::PropByteColor, LayerType::MCol),
    (LayerType::PreviewMLoopCol, LayerType::PreviewMCol),
    (LayerType::OrigSpaceMLoop, LayerType::OrigSpace),
    (LayerType::Normal, LayerType::TessLoopNormal),
    (LayerType::Tangent, LayerType::Tangent),
];

/// Checks that loop and face layers are in sync, pair by pair.
///
/// Counts are accumulated over the pairs, so an earlier mismatch is never
/// cancelled by a later one. Returns `fallback` when neither side has any
/// of these layers.
pub fn check_matching_legacy_layer_counts(fdata: &CustomData, ldata: &CustomData, fallback: bool) -> bool {
    let mut num_loop = 0;
    let mut num_face = 0;
    for (loop_type, face_type) in LEGACY_LAYER_PAIRS {
        num_loop += ldata.number_of_layers(loop_type);
        num_face += fdata.number_of_layers(face_type);
        if num_loop != num_face {
            return false;
        }
    }
    if num_loop > 0 {
        true
    } else {
        fallback
    }
}

/// Adds an empty loop layer for every convertible face layer, keeping names.
pub fn add_loop_layers_from_faces(fdata: &CustomData, ldata: &mut CustomData, totloop: usize) {
    for layer in fdata.layers() {
        if let Some(loop_type) = loop_type_for_face_layer(layer.layer_type) {
            ldata.add_layer_named(loop_type, &layer.name, totloop);
        }
    }
}

/// Adds an empty face layer for every convertible loop layer, keeping
/// names, and carries the active layer selections over.
pub fn add_face_layers_from_loops(fdata: &mut CustomData, ldata: &CustomData, total: usize) {
    debug_assert!(
        !check_matching_legacy_layer_counts(fdata, ldata, false),
        "face layers already match the loop layers"
    );
    for layer in ldata.layers() {
        if let Some(face_type) = face_type_for_loop_layer(layer.layer_type) {
            fdata.add_layer_named(face_type, &layer.name, total);
        }
    }
    update_active_fdata_layers(fdata, ldata);
}

/// Copies the UV and byte color selections from loop layers to face layers.
pub fn update_active_fdata_layers(fdata: &mut CustomData, ldata: &CustomData) {
    if ldata.has_layer(LayerType::MLoopUv) {
        fdata.set_active_layers(LayerType::MTFace, ldata.active_layers(LayerType::MLoopUv));
    }
    if ldata.has_layer(LayerType::PropByteColor) {
        fdata.set_active_layers(LayerType::MCol, ldata.active_layers(LayerType::PropByteColor));
    }
}

/// Copies the UV and byte color selections from face layers to loop layers.
pub fn update_active_ldata_layers(fdata: &CustomData, ldata: &mut CustomData) {
    if fdata.has_layer(LayerType::MTFace) {
        ldata.set_active_layers(LayerType::MLoopUv, fdata.active_layers(LayerType::MTFace));
    }
    if fdata.has_layer(LayerType::MCol) {
        ldata.set_active_layers(LayerType::PropByteColor, fdata.active_layers(LayerType::MCol));
    }
}

fn faces_to_loops<F: Copy, L>(
    src: &[[F; 4]],
    dst: &mut [L],
    faces: &[Face],
    polys: &[Poly],
    convert: impl Fn(F) -> L,
) {
    for (findex, (face, poly)) in faces.iter().zip(polys).enumerate() {
        let start = poly.loopstart as usize;
        for j in 0..face.corner_count() {
            dst[start + j] = convert(src[findex][j]);
        }
    }
}

fn disps_to_loops(src: &[MDisps], dst: &mut [MDisps], faces: &[Face], polys: &[Poly]) {
    for (findex, (face, poly)) in faces.iter().zip(polys).enumerate() {
        let fd = &src[findex];
        let corners = fd.corners();
        if corners == 0 {
            // Empty grids show up in old files; only a non-empty one is wrong.
            debug_assert_eq!(fd.totdisp, 0);
            continue;
        }
        let side = ((fd.totdisp / corners) as f32).sqrt() as usize;
        let side_sq = side * side;
        let level = side.saturating_sub(1).max(1).ilog2() + 1;
        let start = poly.loopstart as usize;
        for i in 0..face.corner_count() {
            let grid = fd.disps.get(i * side_sq..(i + 1) * side_sq);
            dst[start + i] = MDisps {
                totdisp: side_sq,
                level,
                disps: match grid {
                    Some(grid) => grid.to_vec(),
                    None => vec![[0.0; 3]; side_sq],
                },
            };
        }
    }
}

/// Copies face corner values into the loop layers created by
/// [`add_loop_layers_from_faces`]. `polys` must be the polygons built from
/// `faces`, one per face.
pub fn corners_to_loops(fdata: &CustomData, ldata: &mut CustomData, faces: &[Face], polys: &[Poly]) {
    for i in 0..fdata.number_of_layers(LayerType::MTFace) {
        let src = fdata.layer_n(LayerType::MTFace, i).and_then(|l| l.data.face_uv());
        let dst = ldata.layer_n_mut(LayerType::MLoopUv, i).and_then(|l| l.data.uv_mut());
        if let (Some(src), Some(dst)) = (src, dst) {
            faces_to_loops(src, dst, faces, polys, |uv| uv);
        }
    }

    for i in 0..fdata.number_of_layers(LayerType::MCol) {
        let src = fdata.layer_n(LayerType::MCol, i).and_then(|l| l.data.face_col());
        let dst = ldata.layer_n_mut(LayerType::PropByteColor, i).and_then(|l| l.data.col_mut());
        if let (Some(src), Some(dst)) = (src, dst) {
            faces_to_loops(src, dst, faces, polys, MLoopCol::from);
        }
    }

    let src = fdata.layer(LayerType::TessLoopNormal).and_then(|l| l.data.face_normal());
    let dst = ldata.layer_mut(LayerType::Normal).and_then(|l| l.data.normal_mut());
    if let (Some(src), Some(dst)) = (src, dst) {
        faces_to_loops(src, dst, faces, polys, normal_short_to_float);
    }

    let src = fdata.layer(LayerType::MDisps).and_then(|l| l.data.disps());
    let dst = ldata.layer_mut(LayerType::MDisps).and_then(|l| l.data.disps_mut());
    if let (Some(src), Some(dst)) = (src, dst) {
        disps_to_loops(src, dst, faces, polys);
    }
}

#[inline]
fn tess_corner_count(faces: Option<&[Face]>, loop_indices: &[[u32; 4]], findex: usize) -> usize {
    let is_quad = match faces {
        Some(faces) => faces[findex].v4 != 0,
        None => loop_indices[findex][3] != 0,
    };
    if is_quad {
        4
    } else {
        3
    }
}

fn loops_to_faces<L: Copy, F>(
    src: &[L],
    dst: &mut [[F; 4]],
    faces: Option<&[Face]>,
    loop_indices: &[[u32; 4]],
    convert: impl Fn(L) -> F,
) {
    for (findex, lidx) in loop_indices.iter().enumerate() {
        for j in 0..tess_corner_count(faces, loop_indices, findex) {
            dst[findex][j] = convert(src[lidx[j] as usize]);
        }
    }
}

/// Fills face layers from loop layers through each face's loop indices.
///
/// Quads are detected from `faces[i].v4` when faces are given, otherwise
/// from a non-zero fourth loop index. The second form is the reliable one
/// for freshly tessellated quads whose `v4` may still be 0.
pub fn loops_to_tessdata(
    fdata: &mut CustomData,
    ldata: &CustomData,
    faces: Option<&[Face]>,
    loop_indices: &[[u32; 4]],
) {
    for i in 0..ldata.number_of_layers(LayerType::MLoopUv) {
        let src = ldata.layer_n(LayerType::MLoopUv, i).and_then(|l| l.data.uv());
        let dst = fdata.layer_n_mut(LayerType::MTFace, i).and_then(|l| l.data.face_uv_mut());
        if let (Some(src), Some(dst)) = (src, dst) {
            loops_to_faces(src, dst, faces, loop_indices, |uv| uv);
        }
    }

    for i in 0..ldata.number_of_layers(LayerType::PropByteColor) {
        let src = ldata.layer_n(LayerType::PropByteColor, i).and_then(|l| l.data.col());
        let dst = fdata.layer_n_mut(LayerType::MCol, i).and_then(|l| l.data.face_col_mut());
        if let (Some(src), Some(dst)) = (src, dst) {
            loops_to_faces(src, dst, faces, loop_indices, MCol::from);
        }
    }

    let src = ldata.layer(LayerType::PreviewMLoopCol).and_then(|l| l.data.col());
    let dst = fdata.layer_mut(LayerType::PreviewMCol).and_then(|l| l.data.face_col_mut());
    if let (Some(src), Some(dst)) = (src, dst) {
        loops_to_faces(src, dst, faces, loop_indices, MCol::from);
    }

    let src = ldata.layer(LayerType::OrigSpaceMLoop).and_then(|l| l.data.uv());
    let dst = fdata.layer_mut(LayerType::OrigSpace).and_then(|l| l.data.face_uv_mut());
    if let (Some(src), Some(dst)) = (src, dst) {
        loops_to_faces(src, dst, faces, loop_indices, |uv| uv);
    }

    let src = ldata.layer(LayerType::Normal).and_then(|l| l.data.normal());
    let dst = fdata.layer_mut(LayerType::TessLoopNormal).and_then(|l| l.data.face_normal_mut());
    if let (Some(src), Some(dst)) = (src, dst) {
        loops_to_faces(src, dst, faces, loop_indices, normal_float_to_short);
    }

    // Only the first tangent layer is carried.
    let src = ldata.layer(LayerType::Tangent).and_then(|l| l.data.tangent());
    let dst = fdata.layer_mut(LayerType::Tangent).and_then(|l| l.data.face_tangent_mut());
    if let (Some(src), Some(dst)) = (src, dst) {
        loops_to_faces(src, dst, faces, loop_indices, |t| t);
    }
}
