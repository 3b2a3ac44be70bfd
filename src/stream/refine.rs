//! Refinement engine
//!
//! ensure(I, r):
//!   1. hit        → I cached with accuracy ≥ r
//!   2. bootstrap  → empty tree: I becomes the root
//!   3. expand     → grow the root by dyadic parents until it contains I
//!   4. descend    → split leaves (or follow children) down to I
//!   5. refine     → walk the subtree under I, splitting leaves below r
//!
//! Every split propagates accuracy upward: a parent is recombined from its
//! children only when their common accuracy beats its own.

use tracing::{debug, trace};

use super::DynamicStream;
use crate::{
    algebra::{AlgebraContext, Alignment, Increment},
    intervals::{DyadicInterval, Resolution},
    tree::{IncrementNode, SubtreeCursor},
    StreamError,
};

impl<V: Increment> DynamicStream<V> {
    /// Cached log-signature over a dyadic interval, refined to `resolution`
    pub fn ensure<C>(
        &self,
        interval: &DyadicInterval,
        resolution: Resolution,
        ctx: &C,
    ) -> Result<V, StreamError>
    where
        C: AlgebraContext<Value = V> + ?Sized,
    {
        self.check_resolution(resolution)?;
        self.check_resolution(interval.power())?;
        self.check_offset(interval, resolution)?;

        // Held for the whole call; helpers below re-enter it.
        let _guard = self.state.lock();
        self.write(|state| state.stats.queries += 1);

        if let Some(accuracy) = self.read(|state| state.tree.accuracy(interval)) {
            if accuracy >= resolution {
                self.write(|state| state.stats.hits += 1);
                trace!(%interval, accuracy, "cache hit");
            } else {
                self.refine_accuracy(ctx, *interval, resolution)?;
            }
            return Ok(self.cached_value(interval));
        }

        let root = match self.read(|state| state.tree.root()) {
            Some(root) => root,
            None => {
                let value = self.fresh_increment(ctx, interval)?;
                self.write(|state| {
                    state
                        .tree
                        .insert(*interval, IncrementNode::new(value, interval.power()))
                });
                debug!(%interval, "bootstrapped root");

                if interval.power() >= resolution {
                    return Ok(self.cached_value(interval));
                }
                *interval
            }
        };

        let mut current = self.expand_root_until_contains(ctx, root, *interval)?;
        while current != *interval {
            current = if self.read(|state| state.tree.is_leaf(&current)) {
                self.insert_children_and_refine(ctx, current, interval)?
            } else {
                let (left, right) = current.children();
                if left.contains(interval) {
                    left
                } else {
                    right
                }
            };
        }

        self.refine_accuracy(ctx, *interval, resolution)?;
        Ok(self.cached_value(interval))
    }

    /// Raise every leaf under `top` to `desired`
    ///
    /// Subtrees already accurate are stepped over in one cursor move.
    fn refine_accuracy<C>(
        &self,
        ctx: &C,
        top: DyadicInterval,
        desired: Resolution,
    ) -> Result<(), StreamError>
    where
        C: AlgebraContext<Value = V> + ?Sized,
    {
        let skip = self.config.skip_accurate_subtrees;
        let mut cursor = SubtreeCursor::new(top);

        while let Some(key) = cursor.current() {
            let (accuracy, leaf) = self.read(|state| {
                let accuracy = state
                    .tree
                    .accuracy(&key)
                    .unwrap_or_else(|| panic!("cursor on missing cache node {}", key));
                (accuracy, state.tree.is_leaf(&key))
            });

            if accuracy >= desired {
                if skip {
                    self.read(|state| cursor.skip_subtree(&state.tree));
                } else {
                    self.read(|state| cursor.advance(&state.tree));
                }
            } else if leaf {
                let next = self.insert_children_and_refine(ctx, key, &key.left_child())?;
                cursor.seek(next);
            } else {
                self.read(|state| cursor.advance(&state.tree));
            }
        }

        debug_assert!(
            self.accuracy_of(&top).map_or(false, |a| a >= desired),
            "refinement of {} stopped short of {}",
            top,
            desired
        );
        Ok(())
    }

    /// Grow the root until it contains `target`
    ///
    /// Each step adds the root's sibling as a fresh neighbour node and the
    /// common parent as the new root, combined from the two halves.
    fn expand_root_until_contains<C>(
        &self,
        ctx: &C,
        root: DyadicInterval,
        target: DyadicInterval,
    ) -> Result<DyadicInterval, StreamError>
    where
        C: AlgebraContext<Value = V> + ?Sized,
    {
        // Dyadic parents never straddle zero.
        if (root.offset() < 0) != (target.offset() < 0) {
            return Err(StreamError::RootUnreachable { root, target });
        }

        let mut root = root;
        while !root.contains(&target) {
            let mut new_root = root;
            new_root.expand_interval();

            let mut neighbour = new_root;
            if root.aligned() {
                neighbour.shrink_to_omitted_end();
            } else {
                neighbour.shrink_to_contained_end();
            }
            debug_assert_ne!(neighbour, root);

            let neighbour_value = self.fresh_increment(ctx, &neighbour)?;
            let (root_value, root_accuracy) = self.read(|state| {
                let node = state
                    .tree
                    .find(&root)
                    .unwrap_or_else(|| panic!("missing root node {}", root));
                (node.value().clone(), node.accuracy())
            });

            let value = ctx.combine(&root_value, &neighbour_value, Alignment::of(&root));
            let accuracy = root_accuracy.min(neighbour.power());
            let (left, right) = if root.aligned() {
                (root, neighbour)
            } else {
                (neighbour, root)
            };

            self.write(|state| {
                state
                    .tree
                    .insert(neighbour, IncrementNode::new(neighbour_value, neighbour.power()));
                state.tree.insert(new_root, IncrementNode::new(value, accuracy));
                state.tree.link_pair(new_root, left, right);
                state.stats.root_expansions += 1;
                state.stats.neighbour_nodes += 1;
            });
            debug!(old_root = %root, %new_root, %neighbour, "expanded root");

            root = new_root;
        }
        Ok(root)
    }

    /// Split `leaf` into two children and return the one containing `target`
    fn insert_children_and_refine<C>(
        &self,
        ctx: &C,
        leaf: DyadicInterval,
        target: &DyadicInterval,
    ) -> Result<DyadicInterval, StreamError>
    where
        C: AlgebraContext<Value = V> + ?Sized,
    {
        assert!(leaf.contains(target), "{} does not contain {}", leaf, target);
        let parent_value = self.read(|state| {
            assert!(state.tree.is_leaf(&leaf), "split of non-leaf {}", leaf);
            state
                .tree
                .find(&leaf)
                .map(|node| node.value().clone())
                .unwrap_or_else(|| panic!("split of missing cache node {}", leaf))
        });

        let (left, right) = leaf.children();
        let (left_value, right_value) = ctx.split_increment(&parent_value, &left, &right)?;

        self.write(|state| {
            state
                .tree
                .insert(left, IncrementNode::new(left_value, left.power()));
            state
                .tree
                .insert(right, IncrementNode::new(right_value, right.power()));
            state.tree.link_pair(leaf, left, right);
            state.stats.splits += 1;
        });
        trace!(%leaf, "split leaf");

        self.update_parents(ctx, left);

        Ok(if left.contains(target) { left } else { right })
    }

    /// Propagate accuracy upward from `start` until a step changes nothing
    fn update_parents<C>(&self, ctx: &C, start: DyadicInterval)
    where
        C: AlgebraContext<Value = V> + ?Sized,
    {
        let mut below = start;
        while let Some(parent) = self.update_parent_accuracy(ctx, below) {
            below = parent;
        }
        trace!(stopped_at = %below, "propagation done");
    }

    /// Recombine the parent of `below` if its children are now more accurate
    ///
    /// Returns the parent when it improved.
    fn update_parent_accuracy<C>(&self, ctx: &C, below: DyadicInterval) -> Option<DyadicInterval>
    where
        C: AlgebraContext<Value = V> + ?Sized,
    {
        let (parent, available, below_value, sibling_value) = self.read(|state| {
            let node = state.tree.find(&below)?;
            let parent = node.parent()?;
            let sibling = node
                .sibling()
                .unwrap_or_else(|| panic!("{} has a parent but no sibling", below));
            let sibling_node = state
                .tree
                .find(&sibling)
                .unwrap_or_else(|| panic!("dangling sibling link {} -> {}", below, sibling));
            let parent_accuracy = state
                .tree
                .accuracy(&parent)
                .unwrap_or_else(|| panic!("dangling parent link {} -> {}", below, parent));

            let available = node.accuracy().min(sibling_node.accuracy());
            if parent_accuracy >= available {
                return None;
            }
            Some((
                parent,
                available,
                node.value().clone(),
                sibling_node.value().clone(),
            ))
        })?;

        let value = ctx.combine(&below_value, &sibling_value, Alignment::of(&below));
        self.write(|state| {
            if let Some(node) = state.tree.find_mut(&parent) {
                node.refine(value, available);
            }
            state.stats.propagations += 1;
        });
        Some(parent)
    }

    fn fresh_increment<C>(&self, ctx: &C, interval: &DyadicInterval) -> Result<V, StreamError>
    where
        C: AlgebraContext<Value = V> + ?Sized,
    {
        let value = ctx.compute_leaf_increment(interval)?;
        self.write(|state| state.stats.fresh_computations += 1);
        Ok(value)
    }

    fn cached_value(&self, interval: &DyadicInterval) -> V {
        self.value_of(interval)
            .unwrap_or_else(|| panic!("missing cache node {}", interval))
    }
}
