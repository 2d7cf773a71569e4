use crate::attribute::{AttrDomain, AttributeStore};
use crate::custom_data::{CustomData, CustomDataDomain};
use crate::error::{MeshError, Status};
use crate::mesh_types::{CdFlag, Edge, Face, Loop, Poly, Vertex};

/// A mesh holding both the polygon representation and the legacy
/// tessellated faces.
///
/// Element arrays are public so converters can borrow several of them at
/// once; a conversion replaces whole arrays rather than editing them.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub verts: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub polys: Vec<Poly>,
    pub loops: Vec<Loop>,
    /// Legacy tessellated faces.
    pub faces: Vec<Face>,
    /// Layers on the legacy faces, four corners per element.
    pub fdata: CustomData,
    pub ldata: CustomData,
    pub pdata: CustomData,
    pub attributes: AttributeStore,
    /// Which legacy scalar fields hold meaningful data.
    pub cd_flag: CdFlag,
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            verts: Vec::new(),
            edges: Vec::new(),
            polys: Vec::new(),
            loops: Vec::new(),
            faces: Vec::new(),
            fdata: CustomData::new(CustomDataDomain::Face),
            ldata: CustomData::new(CustomDataDomain::Loop),
            pdata: CustomData::new(CustomDataDomain::Poly),
            attributes: AttributeStore::new(),
            cd_flag: CdFlag::empty(),
        }
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh described only by legacy faces, as read from old files.
    pub fn from_legacy_faces(verts: Vec<Vertex>, faces: Vec<Face>) -> Self {
        let mut mesh = Self {
            verts,
            faces,
            ..Self::default()
        };
        mesh.fdata.set_len(mesh.faces.len());
        mesh
    }

    /// Builds polygons from per-polygon vertex lists. Loop edges are left
    /// at 0 until edges are derived.
    pub fn from_polygons(verts: Vec<Vertex>, polygons: &[Vec<u32>]) -> Self {
        let mut mesh = Self {
            verts,
            ..Self::default()
        };
        for polygon in polygons {
            mesh.polys.push(Poly {
                loopstart: mesh.loops.len() as u32,
                totloop: polygon.len() as u32,
                ..Poly::default()
            });
            mesh.loops.extend(polygon.iter().map(|&v| Loop { v, e: 0 }));
        }
        mesh.ldata.set_len(mesh.loops.len());
        mesh.pdata.set_len(mesh.polys.len());
        mesh
    }

    pub fn num_verts(&self) -> usize {
        self.verts.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn num_polys(&self) -> usize {
        self.polys.len()
    }

    pub fn num_loops(&self) -> usize {
        self.loops.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn domain_size(&self, domain: AttrDomain) -> usize {
        match domain {
            AttrDomain::Point => self.verts.len(),
            AttrDomain::Edge => self.edges.len(),
            AttrDomain::Face => self.polys.len(),
            AttrDomain::Corner => self.loops.len(),
        }
    }

    /// Vertex indices of polygon `poly`, in loop order.
    pub fn poly_verts(&self, poly: usize) -> impl Iterator<Item = u32> + '_ {
        self.loops[self.polys[poly].loop_range()].iter().map(|l| l.v)
    }

    /// Checks index ranges and attribute lengths.
    ///
    /// Conversions assume well-formed input; call this first on data from
    /// untrusted sources.
    pub fn validate(&self) -> Status {
        let num_verts = self.verts.len();
        for (i, face) in self.faces.iter().enumerate() {
            for v in face.verts().into_iter().take(face.corner_count()) {
                if v as usize >= num_verts {
                    return Err(MeshError::VertexOutOfRange {
                        face: i,
                        vertex: v,
                        num_verts,
                    });
                }
            }
        }
        for (i, poly) in self.polys.iter().enumerate() {
            let range = poly.loop_range();
            if range.end > self.loops.len() {
                return Err(MeshError::InvalidPolygon {
                    poly: i,
                    loopstart: poly.loopstart,
                    totloop: poly.totloop,
                });
            }
            for l in &self.loops[range] {
                if l.v as usize >= num_verts {
                    return Err(MeshError::VertexOutOfRange {
                        face: i,
                        vertex: l.v,
                        num_verts,
                    });
                }
            }
        }
        for attr in self.attributes.iter() {
            let expected = self.domain_size(attr.domain);
            if attr.values.len() != expected {
                return Err(MeshError::LayerLengthMismatch {
                    name: attr.name.clone(),
                    expected,
                    actual: attr.values.len(),
                });
            }
        }
        Ok(())
    }
}
