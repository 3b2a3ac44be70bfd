//! Cached increment node
//!
//! Node = (value, accuracy, parent key, sibling key)
//! Links are keys into the owning `CacheTree`, never references.

use crate::intervals::{DyadicInterval, Resolution};

/// Cached entry of the dyadic interval tree
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IncrementNode<V> {
    value: V,
    accuracy: Resolution,
    parent: Option<DyadicInterval>,
    sibling: Option<DyadicInterval>,
}

impl<V> IncrementNode<V> {
    /// Unlinked node with the given value and accuracy
    pub fn new(value: V, accuracy: Resolution) -> Self {
        Self {
            value,
            accuracy,
            parent: None,
            sibling: None,
        }
    }

    /// Cached increment
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Resolution at which `value` is currently accurate
    #[inline]
    pub fn accuracy(&self) -> Resolution {
        self.accuracy
    }

    /// Parent key (None for the root)
    pub fn parent(&self) -> Option<DyadicInterval> {
        self.parent
    }

    /// Sibling key (None for the root)
    pub fn sibling(&self) -> Option<DyadicInterval> {
        self.sibling
    }

    /// Replace value with a more accurate one
    ///
    /// Panics if `accuracy` would decrease.
    pub fn refine(&mut self, value: V, accuracy: Resolution) {
        assert!(
            accuracy >= self.accuracy,
            "accuracy regression: {} -> {}",
            self.accuracy,
            accuracy
        );
        self.value = value;
        self.accuracy = accuracy;
    }

    pub(crate) fn link(&mut self, parent: DyadicInterval, sibling: DyadicInterval) {
        self.parent = Some(parent);
        self.sibling = Some(sibling);
    }
}
