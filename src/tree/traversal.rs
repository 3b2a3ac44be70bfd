//! Ordered cursor over the subtree under one interval
//!
//! Keys under an interval form one contiguous run in key order, so the
//! walk needs no stack: the cursor stores only the current key.
//!   advance      → next key in order (descends into children first)
//!   skip_subtree → first key past every descendant of the current key

use std::ops::Bound;

use super::CacheTree;
use crate::intervals::DyadicInterval;

/// Position within the run of keys nested under `root`
#[derive(Debug, Clone, Copy)]
pub struct SubtreeCursor {
    root: DyadicInterval,
    current: Option<DyadicInterval>,
}

impl SubtreeCursor {
    /// Cursor positioned at `root` itself
    pub fn new(root: DyadicInterval) -> Self {
        Self {
            root,
            current: Some(root),
        }
    }

    /// Current key, None once the walk has left the subtree
    pub fn current(&self) -> Option<DyadicInterval> {
        self.current
    }

    /// Reposition onto a key nested under the root
    pub fn seek(&mut self, key: DyadicInterval) {
        debug_assert!(self.root.contains(&key));
        self.current = Some(key);
    }

    /// Step to the next key in order
    pub fn advance<V>(&mut self, tree: &CacheTree<V>) {
        self.current = self.current.and_then(|key| {
            let next = tree.next_key(Bound::Excluded(key));
            self.within_root(next)
        });
    }

    /// Step past the current key and all keys nested under it
    pub fn skip_subtree<V>(&mut self, tree: &CacheTree<V>) {
        self.current = self.current.and_then(|key| {
            let bound = key.following(self.root.power());
            let next = tree.next_key(Bound::Included(bound));
            self.within_root(next)
        });
    }

    fn within_root(&self, key: Option<DyadicInterval>) -> Option<DyadicInterval> {
        key.filter(|k| self.root.contains(k))
    }
}
