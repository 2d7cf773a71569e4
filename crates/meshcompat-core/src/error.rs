//! Error handling for mesh conversions.
//!
//! Conversions are infallible on well-formed input. The errors below cover
//! the few places where a caller can hand us inconsistent data that is worth
//! reporting instead of panicking on: attribute type clashes and the opt-in
//! structural validation in [`crate::mesh::Mesh::validate`].
//!
//! Broken internal invariants (an edge missing for a loop that was derived
//! from the same faces) are not represented here; they panic.

use thiserror::Error;

use crate::attribute::AttrDomain;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    #[error("face {face} references vertex {vertex}, mesh has {num_verts} vertices")]
    VertexOutOfRange {
        face: usize,
        vertex: u32,
        num_verts: usize,
    },
    #[error("polygon {poly} loop range {loopstart}+{totloop} exceeds the loop array")]
    InvalidPolygon {
        poly: usize,
        loopstart: u32,
        totloop: u32,
    },
    #[error("attribute '{name}' has {actual} values, its domain has {expected} elements")]
    LayerLengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("attribute '{name}' on {domain:?} domain exists with a different value type")]
    AttributeTypeMismatch { name: String, domain: AttrDomain },
}

pub type MeshResult<T> = Result<T, MeshError>;

pub type Status = MeshResult<()>;
