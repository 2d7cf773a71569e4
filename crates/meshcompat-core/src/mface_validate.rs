//! Repair of legacy face corner order.
//!
//! Legacy consumers read `v4 == 0` as "triangle" and `v3 == 0` as "loose
//! edge", so a face may never hold vertex 0 in those slots. These rules are
//! kept for compatibility with existing data and are not meant to grow.

use crate::custom_data::CustomData;
use crate::mesh_types::Face;

/// Corner permutation moving a zero out of the third slot of a triangle.
pub const TRI_ZERO_ROTATION: [usize; 4] = [1, 2, 0, 3];

/// Corner permutation moving a zero out of the last two slots of a quad.
pub const QUAD_ZERO_ROTATION: [usize; 4] = [2, 3, 0, 1];

/// Validates `face` assuming it has `nr` corners.
///
/// Returns the corner count after repair, or 0 for a bow-tie, plus the
/// permutation that was applied to the corners, if any. New corner `j`
/// holds old corner `perm[j]`.
pub(crate) fn validate_corners(face: &mut Face, mut nr: usize) -> (usize, Option<[usize; 4]>) {
    // Collapse duplicated consecutive corners.
    if (face.v3 != 0 || nr == 4) && face.v3 == face.v4 {
        face.v4 = 0;
        nr = nr.saturating_sub(1);
    }
    if (face.v2 != 0 || face.v4 != 0) && face.v2 == face.v3 {
        face.v3 = face.v4;
        face.v4 = 0;
        nr = nr.saturating_sub(1);
    }
    if face.v1 == face.v2 {
        face.v2 = face.v3;
        face.v3 = face.v4;
        face.v4 = 0;
        nr = nr.saturating_sub(1);
    }

    // Bow-ties have no matching edges, there is nothing sensible to repair.
    let bow_tie = match nr {
        3 => face.v1 == face.v2 || face.v2 == face.v3 || face.v3 == face.v1,
        4 => {
            face.v1 == face.v2
                || face.v2 == face.v3
                || face.v3 == face.v4
                || face.v4 == face.v1
                || face.v1 == face.v3
                || face.v2 == face.v4
        }
        _ => false,
    };
    if bow_tie {
        return (0, None);
    }

    let perm = match nr {
        3 if face.v3 == 0 => TRI_ZERO_ROTATION,
        4 if face.v3 == 0 || face.v4 == 0 => QUAD_ZERO_ROTATION,
        _ => return (nr, None),
    };
    let old = face.verts();
    face.v1 = old[perm[0]];
    face.v2 = old[perm[1]];
    face.v3 = old[perm[2]];
    face.v4 = old[perm[3]];
    (nr, Some(perm))
}

/// Repairs the corner order of face `findex`, which is expected to have
/// `nr` corners, and returns the resulting corner count.
///
/// A return of 0 means the face is a bow-tie and should be dropped. When
/// the corners are rotated, every corner layer of `fdata` is rotated with
/// them.
pub fn mface_index_validate(face: &mut Face, fdata: Option<&mut CustomData>, findex: usize, nr: usize) -> usize {
    let (nr, perm) = validate_corners(face, nr);
    if let (Some(perm), Some(fdata)) = (perm, fdata) {
        fdata.swap_corners(findex, &perm);
    }
    nr
}
