//! Mesh Compatibility Core
//!
//! Conversion between legacy tessellated meshes (triangle and quad faces
//! with per-face corner layers) and polygon meshes built from edges and
//! loops, plus migration of legacy per-element fields to generic attributes.

#![allow(clippy::needless_range_loop)] // Corner loops index several parallel arrays at once

// =============================================================================
// Data model
// =============================================================================

pub mod attribute;
pub mod custom_data;
pub mod error;
pub mod geometry_indices;
pub mod mesh;
pub mod mesh_types;
pub mod options;

// =============================================================================
// Math
// =============================================================================

pub mod math_utils;
pub mod vector_extensions;

// =============================================================================
// Conversion stages
// =============================================================================

pub mod convert;
pub mod edge_dedup;
pub mod edge_hash;
pub mod layer_convert;
pub mod legacy_flags;
pub mod loop_builder;
pub mod mface_validate;
pub mod polyfill;
pub mod tessellate;

pub use attribute::{AttrDomain, AttributeStore, AttributeValues};
pub use convert::{convert, ConversionDirection};
pub use custom_data::{CustomData, CustomDataDomain, LayerData, LayerType};
pub use error::{MeshError, MeshResult, Status};
pub use mesh::Mesh;
pub use mesh_types::{CdFlag, Edge, EdgeFlag, Face, Loop, Poly, PolyFlag, VertFlag, Vertex};
pub use options::ConvertOptions;
