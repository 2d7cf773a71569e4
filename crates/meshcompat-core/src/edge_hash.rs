use std::collections::HashMap;

use crate::geometry_indices::EdgeIndex;
use crate::mesh_types::Edge;

/// Lookup from an unordered vertex pair to the index of its edge.
#[derive(Debug, Clone, Default)]
pub struct EdgeHash {
    map: HashMap<(u32, u32), EdgeIndex>,
}

#[inline]
fn key(v1: u32, v2: u32) -> (u32, u32) {
    if v1 < v2 {
        (v1, v2)
    } else {
        (v2, v1)
    }
}

impl EdgeHash {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }

    pub fn from_edges(edges: &[Edge]) -> Self {
        let mut hash = Self::with_capacity(edges.len());
        for (i, edge) in edges.iter().enumerate() {
            hash.insert(edge.v1, edge.v2, EdgeIndex::from(i));
        }
        hash
    }

    /// Maps the pair to `index`. A later insert of the same pair wins.
    pub fn insert(&mut self, v1: u32, v2: u32, index: EdgeIndex) {
        self.map.insert(key(v1, v2), index);
    }

    pub fn lookup(&self, v1: u32, v2: u32) -> Option<EdgeIndex> {
        self.map.get(&key(v1, v2)).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_unordered() {
        let hash = EdgeHash::from_edges(&[Edge::new(4, 1), Edge::new(1, 2)]);
        assert_eq!(hash.lookup(1, 4), Some(EdgeIndex(0)));
        assert_eq!(hash.lookup(4, 1), Some(EdgeIndex(0)));
        assert_eq!(hash.lookup(2, 1), Some(EdgeIndex(1)));
        assert_eq!(hash.lookup(2, 4), None);
        assert_eq!(hash.len(), 2);
    }
}
