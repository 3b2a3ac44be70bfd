//! Dyadic interval cache tree
//!
//! Ordered map DyadicInterval → IncrementNode. The tree owns every node;
//! parent/sibling links are keys. Nodes are never removed.
//!
//! Key order puts an interval directly before all of its descendants, so
//! "everything under k" is the contiguous run starting at k.

mod node;
mod traversal;

pub use node::IncrementNode;
pub use traversal::SubtreeCursor;

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::intervals::{DyadicInterval, Resolution};

/// Ordered container of cached increments
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheTree<V> {
    nodes: BTreeMap<DyadicInterval, IncrementNode<V>>,
}

impl<V> Default for CacheTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CacheTree<V> {
    /// Create empty tree
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// Number of cached nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing is cached yet
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Exact lookup
    pub fn find(&self, key: &DyadicInterval) -> Option<&IncrementNode<V>> {
        self.nodes.get(key)
    }

    pub(crate) fn find_mut(&mut self, key: &DyadicInterval) -> Option<&mut IncrementNode<V>> {
        self.nodes.get_mut(key)
    }

    /// Whether `key` is cached
    pub fn contains(&self, key: &DyadicInterval) -> bool {
        self.nodes.contains_key(key)
    }

    /// First entry in key order
    pub fn first(&self) -> Option<(&DyadicInterval, &IncrementNode<V>)> {
        self.nodes.iter().next()
    }

    /// Maximal interval: contains every other key
    ///
    /// The root has the smallest left endpoint and, among equals, the
    /// coarsest power, so it is always the first key.
    pub fn root(&self) -> Option<DyadicInterval> {
        self.first().map(|(key, _)| *key)
    }

    /// Insert a new node
    ///
    /// Panics if `key` is already present: nodes are created exactly once.
    pub fn insert(&mut self, key: DyadicInterval, node: IncrementNode<V>) -> DyadicInterval {
        let previous = self.nodes.insert(key, node);
        assert!(previous.is_none(), "duplicate cache node for {}", key);
        key
    }

    /// All entries nested inside `key` (including `key`), in key order
    pub fn range_under<'a>(
        &'a self,
        key: &DyadicInterval,
    ) -> impl Iterator<Item = (&'a DyadicInterval, &'a IncrementNode<V>)> + 'a {
        let top = *key;
        self.nodes
            .range(top..)
            .take_while(move |(k, _)| top.contains(k))
    }

    /// Smallest key satisfying the lower bound
    pub fn next_key(&self, lower: Bound<DyadicInterval>) -> Option<DyadicInterval> {
        self.nodes
            .range((lower, Bound::Unbounded))
            .next()
            .map(|(k, _)| *k)
    }

    /// A node is a leaf iff its children are not cached
    ///
    /// Children are always inserted in pairs, so the left one decides.
    pub fn is_leaf(&self, key: &DyadicInterval) -> bool {
        !self.nodes.contains_key(&key.left_child())
    }

    /// Accuracy of a cached node
    pub fn accuracy(&self, key: &DyadicInterval) -> Option<Resolution> {
        self.find(key).map(IncrementNode::accuracy)
    }

    /// Parent link of a cached node
    pub fn parent_of(&self, key: &DyadicInterval) -> Option<DyadicInterval> {
        self.find(key).and_then(IncrementNode::parent)
    }

    /// Sibling link of a cached node
    pub fn sibling_of(&self, key: &DyadicInterval) -> Option<DyadicInterval> {
        self.find(key).and_then(IncrementNode::sibling)
    }

    /// Record `left`/`right` as mutual siblings under `parent`
    pub fn link_pair(&mut self, parent: DyadicInterval, left: DyadicInterval, right: DyadicInterval) {
        assert!(
            self.contains(&parent) && parent.contains(&left) && parent.contains(&right),
            "cannot link {} and {} under {}",
            left,
            right,
            parent
        );
        for (node, sibling) in [(left, right), (right, left)] {
            match self.find_mut(&node) {
                Some(entry) => entry.link(parent, sibling),
                None => panic!("linking missing cache node {}", node),
            }
        }
    }

    /// Ordered iteration over all entries
    pub fn iter(&self) -> impl Iterator<Item = (&DyadicInterval, &IncrementNode<V>)> {
        self.nodes.iter()
    }

    /// Digest of the tree shape: keys, accuracies and links
    ///
    /// Values are left out; a refreshed value always comes with a higher
    /// accuracy, which the digest does see.
    pub fn fingerprint(&self) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        for (key, node) in &self.nodes {
            hash_key(&mut hasher, Some(*key));
            hasher.update(&node.accuracy().to_le_bytes());
            hash_key(&mut hasher, node.parent());
            hash_key(&mut hasher, node.sibling());
        }
        hasher.finalize()
    }
}

fn hash_key(hasher: &mut blake3::Hasher, key: Option<DyadicInterval>) {
    match key {
        Some(k) => {
            hasher.update(&[1]);
            hasher.update(&k.offset().to_le_bytes());
            hasher.update(&k.power().to_le_bytes());
        }
        None => {
            hasher.update(&[0]);
        }
    }
}
