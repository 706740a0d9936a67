//! Map-owned storage for every node ever created.
//!
//! Nodes refer to each other by [`NodeIndex`] rather than by pointer, so
//! the mutual next/back links never form an ownership cycle. Nothing is
//! ever removed: a retired node stays addressable because older versions
//! may still walk through it.

use std::collections::TryReserveError;
use std::ops::{Index, IndexMut};

use super::node::VersionedNode;

/// Stable position of a node in its [`NodeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct NodeIndex(usize);

impl NodeIndex {
    #[cfg(test)]
    pub(crate) const fn new(position: usize) -> Self {
        Self(position)
    }

    pub(crate) const fn get(self) -> usize {
        self.0
    }
}

/// Append-only node storage.
#[derive(Clone, Debug)]
pub(crate) struct NodeArena<K, V> {
    nodes: Vec<VersionedNode<K, V>>,
}

impl<K, V> NodeArena<K, V> {
    pub(crate) const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Ensures the next `additional` pushes will not reallocate.
    pub(crate) fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        self.nodes.try_reserve(additional)
    }

    /// Like [`try_reserve`](Self::try_reserve), but panics on capacity
    /// overflow and aborts on allocator failure.
    pub(crate) fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }

    pub(crate) fn push(&mut self, node: VersionedNode<K, V>) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());
        self.nodes.push(node);
        index
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (NodeIndex, &VersionedNode<K, V>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(position, node)| (NodeIndex(position), node))
    }
}

impl<K, V> Default for NodeArena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Index<NodeIndex> for NodeArena<K, V> {
    type Output = VersionedNode<K, V>;

    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.0]
    }
}

impl<K, V> IndexMut<NodeIndex> for NodeArena<K, V> {
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        &mut self.nodes[index.0]
    }
}
