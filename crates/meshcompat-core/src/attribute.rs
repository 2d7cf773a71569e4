//! Named, domain-tagged attribute storage.
//!
//! This is the generic counterpart of the legacy struct fields: every
//! attribute is an array of one value type attached to one domain, looked up
//! by name. Only the capabilities the converters rely on are provided.

use crate::error::{MeshError, MeshResult, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrDomain {
    Point,
    Edge,
    Face,
    Corner,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValues {
    Bool(Vec<bool>),
    Int32(Vec<i32>),
    Float(Vec<f32>),
}

impl AttributeValues {
    pub fn len(&self) -> usize {
        match self {
            AttributeValues::Bool(v) => v.len(),
            AttributeValues::Int32(v) => v.len(),
            AttributeValues::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Value types that can be stored in an [`AttributeStore`].
pub trait AttributeValue: Copy + Default + Send + Sync + 'static {
    fn wrap(values: Vec<Self>) -> AttributeValues;
    fn as_slice(values: &AttributeValues) -> Option<&[Self]>;
}

macro_rules! impl_attribute_value {
    ($t:ty, $variant:ident) => {
        impl AttributeValue for $t {
            fn wrap(values: Vec<Self>) -> AttributeValues {
                AttributeValues::$variant(values)
            }

            fn as_slice(values: &AttributeValues) -> Option<&[Self]> {
                match values {
                    AttributeValues::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

impl_attribute_value!(bool, Bool);
impl_attribute_value!(i32, Int32);
impl_attribute_value!(f32, Float);

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub domain: AttrDomain,
    pub values: AttributeValues,
}

/// Read view returned by [`AttributeStore::lookup_or_default`].
#[derive(Debug, Clone, Copy)]
pub enum AttributeReader<'a, T> {
    Span(&'a [T]),
    /// Attribute is absent; every element reads as the default.
    Single(T),
}

impl<'a, T: Copy> AttributeReader<'a, T> {
    #[inline]
    pub fn get(&self, index: usize) -> T {
        match self {
            AttributeReader::Span(values) => values[index],
            AttributeReader::Single(value) => *value,
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, AttributeReader::Single(_))
    }
}

/// Pending write of a whole attribute.
///
/// The values only land in the store once [`AttributeWriter::finish`] is
/// called; dropping the writer discards them.
pub struct AttributeWriter<'a, T: AttributeValue> {
    store: &'a mut AttributeStore,
    name: String,
    domain: AttrDomain,
    pub span: Vec<T>,
}

impl<'a, T: AttributeValue> AttributeWriter<'a, T> {
    pub fn finish(self) {
        let AttributeWriter {
            store,
            name,
            domain,
            span,
        } = self;
        store.remove(&name);
        store.attributes.push(Attribute {
            name,
            domain,
            values: T::wrap(span),
        });
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeStore {
    attributes: Vec<Attribute>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Typed values of `name` on `domain`, `None` when absent or stored with
    /// another type or domain.
    pub fn lookup<T: AttributeValue>(&self, name: &str, domain: AttrDomain) -> Option<&[T]> {
        self.get(name)
            .filter(|a| a.domain == domain)
            .and_then(|a| T::as_slice(&a.values))
    }

    /// Reads `name`, or `default` for every element when it doesn't exist.
    pub fn lookup_or_default<T: AttributeValue>(
        &self,
        name: &str,
        domain: AttrDomain,
        len: usize,
        default: T,
    ) -> MeshResult<AttributeReader<'_, T>> {
        let Some(attr) = self.get(name).filter(|a| a.domain == domain) else {
            return Ok(AttributeReader::Single(default));
        };
        let values = T::as_slice(&attr.values).ok_or_else(|| MeshError::AttributeTypeMismatch {
            name: name.to_string(),
            domain,
        })?;
        if values.len() != len {
            return Err(MeshError::LayerLengthMismatch {
                name: name.to_string(),
                expected: len,
                actual: values.len(),
            });
        }
        Ok(AttributeReader::Span(values))
    }

    /// Starts a full overwrite of `name`, creating it if needed.
    ///
    /// The writer's span is default-initialized; previous values are not
    /// carried over.
    pub fn lookup_or_add_for_write_only<T: AttributeValue>(
        &mut self,
        name: &str,
        domain: AttrDomain,
        len: usize,
    ) -> MeshResult<AttributeWriter<'_, T>> {
        if let Some(attr) = self.get(name) {
            if attr.domain == domain && T::as_slice(&attr.values).is_none() {
                return Err(MeshError::AttributeTypeMismatch {
                    name: name.to_string(),
                    domain,
                });
            }
        }
        Ok(AttributeWriter {
            store: self,
            name: name.to_string(),
            domain,
            span: vec![T::default(); len],
        })
    }

    /// Adds or replaces `name` with ready-made values.
    pub fn insert(&mut self, name: &str, domain: AttrDomain, values: AttributeValues) -> Status {
        self.remove(name);
        self.attributes.push(Attribute {
            name: name.to_string(),
            domain,
            values,
        });
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|a| a.name != name);
        before != self.attributes.len()
    }

    /// Removes and returns `name`.
    pub fn take(&mut self, name: &str) -> Option<Attribute> {
        let pos = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(pos))
    }
}
