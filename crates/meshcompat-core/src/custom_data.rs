//! Typed per-element layer storage for one mesh domain.
//!
//! A [`CustomData`] holds every layer attached to one domain (tessellated
//! faces, loops or polygons). Tessellated-face layers store all four corners
//! of a face in one element; loop layers store a single corner per element.
//! Layers of the same [`LayerType`] are addressed by their position among
//! layers of that type (`n`), which is also how the active, render, clone and
//! stencil selections refer to them.

use std::collections::BTreeMap;

/// Type tag of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerType {
    // Tessellated face layers.
    MTFace,
    MCol,
    PreviewMCol,
    OrigSpace,
    TessLoopNormal,

    // Loop layers.
    MLoopUv,
    PropByteColor,
    PreviewMLoopCol,
    OrigSpaceMLoop,
    Normal,

    // Valid on more than one domain.
    Tangent,
    MDisps,
    OrigIndex,
    SculptFaceSets,

    /// Layer type this crate does not know how to convert. Such layers are
    /// carried along untouched.
    Unknown(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustomDataDomain {
    /// Legacy tessellated faces.
    Face,
    Loop,
    Poly,
}

/// Byte color as stored on tessellated faces (legacy channel order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MCol {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Byte color as stored on loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MLoopCol {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

// The face color layout keeps red and blue swapped relative to the loop one.
impl From<MCol> for MLoopCol {
    fn from(c: MCol) -> Self {
        Self {
            r: c.b,
            g: c.g,
            b: c.r,
            a: c.a,
        }
    }
}

impl From<MLoopCol> for MCol {
    fn from(c: MLoopCol) -> Self {
        Self {
            a: c.a,
            r: c.b,
            g: c.g,
            b: c.r,
        }
    }
}

/// Multires displacement grids.
///
/// On a tessellated face one `MDisps` holds the grids of all corners back to
/// back; on a loop it holds the grid of that single corner.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MDisps {
    pub totdisp: usize,
    pub level: u32,
    /// Empty when no displacement was ever stored.
    pub disps: Vec<[f32; 3]>,
}

impl MDisps {
    /// Number of corner grids packed in `totdisp` samples.
    ///
    /// Grids have `(2^(lvl-1) + 1)^2` samples; the highest level that divides
    /// the total wins. Returns 0 when nothing fits.
    pub fn corners(&self) -> usize {
        for lvl in (1..=13u32).rev() {
            let side = (1usize << (lvl - 1)) + 1;
            if self.totdisp % (side * side) == 0 {
                return self.totdisp / (side * side);
            }
        }
        0
    }
}

/// Storage of one layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerData {
    /// UV or original-space coordinates for the four corners of a face.
    FaceUv(Vec<[[f32; 2]; 4]>),
    FaceCol(Vec<[MCol; 4]>),
    /// Short-encoded corner normals.
    FaceNormal(Vec<[[i16; 3]; 4]>),
    FaceTangent(Vec<[[f32; 4]; 4]>),
    Uv(Vec<[f32; 2]>),
    Col(Vec<MLoopCol>),
    Normal(Vec<[f32; 3]>),
    Tangent(Vec<[f32; 4]>),
    Disps(Vec<MDisps>),
    Int(Vec<i32>),
    /// Raw bytes of a layer type we don't interpret.
    Opaque { elem_size: usize, bytes: Vec<u8> },
}

macro_rules! typed_accessors {
    ($($get:ident, $get_mut:ident, $variant:ident, $t:ty;)*) => {
        $(
            pub fn $get(&self) -> Option<&[$t]> {
                match self {
                    LayerData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            pub fn $get_mut(&mut self) -> Option<&mut [$t]> {
                match self {
                    LayerData::$variant(v) => Some(v),
                    _ => None,
                }
            }
        )*
    };
}

fn retain_by_mask<T>(values: &mut Vec<T>, keep: &[bool]) {
    let mut i = 0;
    values.retain(|_| {
        let k = keep[i];
        i += 1;
        k
    });
}

fn permute_corners<T: Copy>(corners: &mut [T; 4], corner_indices: &[usize; 4]) {
    let old = *corners;
    for j in 0..4 {
        corners[j] = old[corner_indices[j]];
    }
}

impl LayerData {
    /// Zero-initialized storage for `len` elements of `layer_type` on `domain`.
    pub fn new(layer_type: LayerType, domain: CustomDataDomain, len: usize) -> Self {
        match layer_type {
            LayerType::MTFace | LayerType::OrigSpace => LayerData::FaceUv(vec![[[0.0; 2]; 4]; len]),
            LayerType::MCol | LayerType::PreviewMCol => LayerData::FaceCol(vec![[MCol::default(); 4]; len]),
            LayerType::TessLoopNormal => LayerData::FaceNormal(vec![[[0; 3]; 4]; len]),
            LayerType::MLoopUv | LayerType::OrigSpaceMLoop => LayerData::Uv(vec![[0.0; 2]; len]),
            LayerType::PropByteColor | LayerType::PreviewMLoopCol => {
                LayerData::Col(vec![MLoopCol::default(); len])
            }
            LayerType::Normal => LayerData::Normal(vec![[0.0; 3]; len]),
            LayerType::Tangent => match domain {
                CustomDataDomain::Face => LayerData::FaceTangent(vec![[[0.0; 4]; 4]; len]),
                _ => LayerData::Tangent(vec![[0.0; 4]; len]),
            },
            LayerType::MDisps => LayerData::Disps(vec![MDisps::default(); len]),
            LayerType::OrigIndex | LayerType::SculptFaceSets => LayerData::Int(vec![0; len]),
            LayerType::Unknown(_) => LayerData::Opaque {
                elem_size: 1,
                bytes: vec![0; len],
            },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            LayerData::FaceUv(v) => v.len(),
            LayerData::FaceCol(v) => v.len(),
            LayerData::FaceNormal(v) => v.len(),
            LayerData::FaceTangent(v) => v.len(),
            LayerData::Uv(v) => v.len(),
            LayerData::Col(v) => v.len(),
            LayerData::Normal(v) => v.len(),
            LayerData::Tangent(v) => v.len(),
            LayerData::Disps(v) => v.len(),
            LayerData::Int(v) => v.len(),
            LayerData::Opaque { elem_size, bytes } => {
                if *elem_size == 0 {
                    0
                } else {
                    bytes.len() / elem_size
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    typed_accessors! {
        face_uv, face_uv_mut, FaceUv, [[f32; 2]; 4];
        face_col, face_col_mut, FaceCol, [MCol; 4];
        face_normal, face_normal_mut, FaceNormal, [[i16; 3]; 4];
        face_tangent, face_tangent_mut, FaceTangent, [[f32; 4]; 4];
        uv, uv_mut, Uv, [f32; 2];
        col, col_mut, Col, MLoopCol;
        normal, normal_mut, Normal, [f32; 3];
        tangent, tangent_mut, Tangent, [f32; 4];
        disps, disps_mut, Disps, MDisps;
        int, int_mut, Int, i32;
    }

    /// Keeps element `i` when `keep[i]` is set.
    pub fn retain(&mut self, keep: &[bool]) {
        match self {
            LayerData::FaceUv(v) => retain_by_mask(v, keep),
            LayerData::FaceCol(v) => retain_by_mask(v, keep),
            LayerData::FaceNormal(v) => retain_by_mask(v, keep),
            LayerData::FaceTangent(v) => retain_by_mask(v, keep),
            LayerData::Uv(v) => retain_by_mask(v, keep),
            LayerData::Col(v) => retain_by_mask(v, keep),
            LayerData::Normal(v) => retain_by_mask(v, keep),
            LayerData::Tangent(v) => retain_by_mask(v, keep),
            LayerData::Disps(v) => retain_by_mask(v, keep),
            LayerData::Int(v) => retain_by_mask(v, keep),
            LayerData::Opaque { elem_size, bytes } => {
                if *elem_size == 0 {
                    return;
                }
                let kept: Vec<u8> = bytes
                    .chunks(*elem_size)
                    .zip(keep)
                    .filter(|(_, &k)| k)
                    .flat_map(|(chunk, _)| chunk.iter().copied())
                    .collect();
                *bytes = kept;
            }
        }
    }

    /// Reorders the corners of face element `index` so that new corner `j`
    /// takes the value of old corner `corner_indices[j]`.
    ///
    /// Layers without per-corner data are left alone.
    pub fn swap_corners(&mut self, index: usize, corner_indices: &[usize; 4]) {
        match self {
            LayerData::FaceUv(v) => permute_corners(&mut v[index], corner_indices),
            LayerData::FaceCol(v) => permute_corners(&mut v[index], corner_indices),
            LayerData::FaceNormal(v) => permute_corners(&mut v[index], corner_indices),
            LayerData::FaceTangent(v) => permute_corners(&mut v[index], corner_indices),
            LayerData::Disps(v) => {
                let d = &mut v[index];
                let corners = d.corners();
                if corners == 0 || d.disps.is_empty() {
                    return;
                }
                // A quad permutation moves corner 3 into the second slot.
                let nverts = if corner_indices[1] == 3 { 4 } else { 3 };
                let side_sq = d.totdisp / corners;
                if corners != nverts {
                    // The face changed its corner count; the grids no longer fit.
                    d.totdisp = side_sq * nverts;
                    d.disps = vec![[0.0; 3]; d.totdisp];
                    return;
                }
                let mut swapped = Vec::with_capacity(d.totdisp);
                for &src in corner_indices.iter().take(corners) {
                    match d.disps.get(src * side_sq..(src + 1) * side_sq) {
                        Some(grid) => swapped.extend_from_slice(grid),
                        None => swapped.resize(swapped.len() + side_sq, [0.0; 3]),
                    }
                }
                d.disps = swapped;
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomDataLayer {
    pub layer_type: LayerType,
    pub name: String,
    pub data: LayerData,
}

/// Selected layer of a type for each purpose, as an index among the layers
/// of that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActiveLayers {
    pub active: usize,
    pub render: usize,
    pub clone: usize,
    pub stencil: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomData {
    domain: CustomDataDomain,
    len: usize,
    layers: Vec<CustomDataLayer>,
    active: BTreeMap<LayerType, ActiveLayers>,
}

impl CustomData {
    pub fn new(domain: CustomDataDomain) -> Self {
        Self {
            domain,
            len: 0,
            layers: Vec::new(),
            active: BTreeMap::new(),
        }
    }

    pub fn domain(&self) -> CustomDataDomain {
        self.domain
    }

    /// Element count shared by all layers.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sets the element count of a directory without layers.
    pub fn set_len(&mut self, len: usize) {
        debug_assert!(self.layers.is_empty() || self.len == len);
        self.len = len;
    }

    /// Drops every layer and selection.
    pub fn free(&mut self) {
        self.layers.clear();
        self.active.clear();
        self.len = 0;
    }

    pub fn layers(&self) -> &[CustomDataLayer] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [CustomDataLayer] {
        &mut self.layers
    }

    /// Appends a zero-initialized layer sized for `len` elements.
    pub fn add_layer_named(&mut self, layer_type: LayerType, name: &str, len: usize) -> &mut CustomDataLayer {
        let data = LayerData::new(layer_type, self.domain, len);
        self.add_layer_with_data(layer_type, name, data)
    }

    pub fn add_layer_with_data(&mut self, layer_type: LayerType, name: &str, data: LayerData) -> &mut CustomDataLayer {
        debug_assert!(
            self.layers.is_empty() || data.len() == self.len,
            "layer '{}' has {} elements, directory has {}",
            name,
            data.len(),
            self.len
        );
        self.len = data.len();
        self.layers.push(CustomDataLayer {
            layer_type,
            name: name.to_string(),
            data,
        });
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    pub fn number_of_layers(&self, layer_type: LayerType) -> usize {
        self.layers.iter().filter(|l| l.layer_type == layer_type).count()
    }

    pub fn has_layer(&self, layer_type: LayerType) -> bool {
        self.layers.iter().any(|l| l.layer_type == layer_type)
    }

    /// The `n`-th layer of `layer_type`.
    pub fn layer_n(&self, layer_type: LayerType, n: usize) -> Option<&CustomDataLayer> {
        self.layers.iter().filter(|l| l.layer_type == layer_type).nth(n)
    }

    pub fn layer_n_mut(&mut self, layer_type: LayerType, n: usize) -> Option<&mut CustomDataLayer> {
        self.layers.iter_mut().filter(|l| l.layer_type == layer_type).nth(n)
    }

    /// First layer of `layer_type`.
    pub fn layer(&self, layer_type: LayerType) -> Option<&CustomDataLayer> {
        self.layer_n(layer_type, 0)
    }

    pub fn layer_mut(&mut self, layer_type: LayerType) -> Option<&mut CustomDataLayer> {
        self.layer_n_mut(layer_type, 0)
    }

    pub fn named_layer(&self, layer_type: LayerType, name: &str) -> Option<&CustomDataLayer> {
        self.layers
            .iter()
            .find(|l| l.layer_type == layer_type && l.name == name)
    }

    /// Removes and returns every layer of `layer_type`, along with its
    /// selection.
    pub fn take_layers(&mut self, layer_type: LayerType) -> Vec<CustomDataLayer> {
        let (taken, kept) = std::mem::take(&mut self.layers)
            .into_iter()
            .partition(|l| l.layer_type == layer_type);
        self.layers = kept;
        self.active.remove(&layer_type);
        taken
    }

    pub fn active_layers(&self, layer_type: LayerType) -> ActiveLayers {
        self.active.get(&layer_type).copied().unwrap_or_default()
    }

    pub fn set_active_layers(&mut self, layer_type: LayerType, active: ActiveLayers) {
        self.active.insert(layer_type, active);
    }

    /// Applies a corner permutation to element `index` of every layer.
    pub fn swap_corners(&mut self, index: usize, corner_indices: &[usize; 4]) {
        for layer in &mut self.layers {
            layer.data.swap_corners(index, corner_indices);
        }
    }

    /// Keeps element `i` of every layer when `keep[i]` is set.
    pub fn retain_elements(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.len);
        for layer in &mut self.layers {
            layer.data.retain(keep);
        }
        self.len = keep.iter().filter(|&&k| k).count();
    }
}
