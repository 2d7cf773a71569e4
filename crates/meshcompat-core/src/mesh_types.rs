//! Element types for both mesh representations.
//!
//! Legacy tessellated faces ([`Face`]) hold up to four vertex indices
//! directly. Polygons ([`Poly`]) only describe a range in the shared loop
//! array; each [`Loop`] is one polygon corner.

use bitflags::bitflags;

bitflags! {
    /// Legacy per-vertex state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VertFlag: u8 {
        const SELECT = 1 << 0;
        const HIDE = 1 << 4;
    }
}

bitflags! {
    /// Per-edge state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EdgeFlag: u16 {
        const SELECT = 1 << 0;
        /// Edge is drawn in the viewport.
        const EDGEDRAW = 1 << 1;
        const SEAM = 1 << 2;
        /// Obsolete "fake n-gon" marker, cleared whenever polygons are rebuilt.
        const FGON = 1 << 3;
        const HIDE = 1 << 4;
        /// Edge came from a face with fewer than three vertices.
        const LOOSEEDGE = 1 << 7;
        const SHARP = 1 << 9;
    }
}

bitflags! {
    /// Flag word shared by polygons and legacy faces.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PolyFlag: u8 {
        const SMOOTH = 1 << 0;
        const FACE_SEL = 1 << 1;
        const HIDE = 1 << 4;
    }
}

bitflags! {
    /// Which legacy scalar fields carry meaningful data.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CdFlag: u8 {
        const VERT_BWEIGHT = 1 << 0;
        const EDGE_BWEIGHT = 1 << 1;
        const EDGE_CREASE = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub co: [f32; 3],
    pub flag: VertFlag,
    pub bweight_legacy: u8,
}

impl Vertex {
    pub fn new(co: [f32; 3]) -> Self {
        Self {
            co,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Edge {
    pub v1: u32,
    pub v2: u32,
    pub flag: EdgeFlag,
    pub bweight_legacy: u8,
    pub crease_legacy: u8,
}

impl Edge {
    pub fn new(v1: u32, v2: u32) -> Self {
        Self {
            v1,
            v2,
            ..Self::default()
        }
    }

    /// Vertex pair with the smaller index first.
    #[inline]
    pub fn ordered(&self) -> (u32, u32) {
        if self.v1 < self.v2 {
            (self.v1, self.v2)
        } else {
            (self.v2, self.v1)
        }
    }
}

/// Legacy triangle or quad.
///
/// `v4 == 0` marks a triangle, `v3 == 0` a loose edge. Because vertex 0 is a
/// valid index, tessellation rotates faces so that 0 never lands in those
/// slots (see [`crate::mface_validate`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Face {
    pub v1: u32,
    pub v2: u32,
    pub v3: u32,
    pub v4: u32,
    pub mat_nr: i16,
    pub flag: PolyFlag,
    /// Draw state of each side, side `k` running from corner `k` to the next
    /// corner. Only read while deriving edges from faces.
    pub draw_sides: [bool; 4],
}

impl Face {
    pub fn tri(v1: u32, v2: u32, v3: u32) -> Self {
        Self {
            v1,
            v2,
            v3,
            ..Self::default()
        }
    }

    pub fn quad(v1: u32, v2: u32, v3: u32, v4: u32) -> Self {
        Self {
            v1,
            v2,
            v3,
            v4,
            ..Self::default()
        }
    }

    #[inline]
    pub fn is_quad(&self) -> bool {
        self.v4 != 0
    }

    /// 4 for quads, 3 otherwise.
    #[inline]
    pub fn corner_count(&self) -> usize {
        if self.v4 != 0 {
            4
        } else {
            3
        }
    }

    #[inline]
    pub fn verts(&self) -> [u32; 4] {
        [self.v1, self.v2, self.v3, self.v4]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Poly {
    pub loopstart: u32,
    pub totloop: u32,
    pub mat_nr_legacy: i16,
    pub flag: PolyFlag,
}

impl Poly {
    #[inline]
    pub fn loop_range(&self) -> std::ops::Range<usize> {
        let start = self.loopstart as usize;
        start..start + self.totloop as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Loop {
    /// Vertex at this corner.
    pub v: u32,
    /// Edge from this corner to the next corner of the same polygon.
    pub e: u32,
}
