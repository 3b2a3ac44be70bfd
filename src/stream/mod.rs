//! Dynamically constructed stream
//!
//! Caches log-signature increments over dyadic intervals in a lazily
//! grown `CacheTree` and answers queries over arbitrary intervals:
//!
//! 1. Real interval → dyadic pieces (injected `Dissector`)
//! 2. Each piece → refinement engine (`ensure`), cached and refined
//! 3. Pieces combined left to right; the combined value is not cached
//!
//! Concurrency: one reentrant lock per stream. `ensure` holds it for its
//! whole run; helpers re-acquire it around each tree access, and never
//! hold a tree borrow across a call into the algebra context.

mod refine;

use std::cell::RefCell;
use std::fmt;

use parking_lot::ReentrantMutex;
use tracing::trace;

use crate::{
    algebra::{AlgebraContext, Increment},
    intervals::{
        Dissector, DyadicDissection, DyadicInterval, Interval, RealInterval, Resolution, MAX_OFFSET,
    },
    stats::CacheStats,
    tree::CacheTree,
    StreamConfig, StreamError,
};

/// Shared mutable state guarded by the stream lock
#[derive(Debug)]
struct StreamState<V> {
    tree: CacheTree<V>,
    stats: CacheStats,
}

/// Log-signature cache over a dynamically refined dyadic tree
pub struct DynamicStream<V> {
    state: ReentrantMutex<RefCell<StreamState<V>>>,
    config: StreamConfig,
    dissector: Box<dyn Dissector>,
}

impl<V: Increment> DynamicStream<V> {
    /// Create an empty stream
    pub fn new(config: StreamConfig) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(StreamState {
                tree: CacheTree::new(),
                stats: CacheStats::default(),
            })),
            config,
            dissector: Box::new(DyadicDissection),
        }
    }

    /// Replace the dissection algorithm used for real intervals
    pub fn with_dissector(mut self, dissector: impl Dissector + 'static) -> Self {
        self.dissector = Box::new(dissector);
        self
    }

    /// Access configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Log-signature over `interval`, accurate to `resolution`
    ///
    /// Dyadic intervals are answered from (and cached in) the tree.
    /// Real intervals are dissected into dyadic pieces first; an empty
    /// real interval yields the context's zero.
    pub fn log_signature<C>(
        &self,
        interval: impl Into<Interval>,
        resolution: Resolution,
        ctx: &C,
    ) -> Result<V, StreamError>
    where
        C: AlgebraContext<Value = V> + ?Sized,
    {
        match interval.into() {
            Interval::Dyadic(dyadic) => self.ensure(&dyadic, resolution, ctx),
            Interval::Real(real) => self.real_log_signature(&real, resolution, ctx),
        }
    }

    fn real_log_signature<C>(
        &self,
        interval: &RealInterval,
        resolution: Resolution,
        ctx: &C,
    ) -> Result<V, StreamError>
    where
        C: AlgebraContext<Value = V> + ?Sized,
    {
        if interval.is_empty() {
            return Ok(ctx.zero());
        }
        self.check_resolution(resolution)?;

        let pieces = self.dissector.dissect(interval, resolution)?;
        trace!(%interval, resolution, pieces = pieces.len(), "dissected query");

        let values = pieces
            .iter()
            .map(|piece| self.ensure(piece, resolution, ctx))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ctx.combine_all(&values))
    }

    /// Number of cached nodes
    pub fn len(&self) -> usize {
        self.read(|state| state.tree.len())
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.read(|state| state.tree.is_empty())
    }

    /// Current root interval
    pub fn root(&self) -> Option<DyadicInterval> {
        self.read(|state| state.tree.root())
    }

    /// Accuracy of a cached interval
    pub fn accuracy_of(&self, key: &DyadicInterval) -> Option<Resolution> {
        self.read(|state| state.tree.accuracy(key))
    }

    /// Cached value of an interval, without refining it
    pub fn value_of(&self, key: &DyadicInterval) -> Option<V> {
        self.read(|state| state.tree.find(key).map(|node| node.value().clone()))
    }

    /// Snapshot of activity counters
    pub fn stats(&self) -> CacheStats {
        self.read(|state| state.stats)
    }

    /// Digest of the tree shape (see `CacheTree::fingerprint`)
    pub fn fingerprint(&self) -> blake3::Hash {
        self.read(|state| state.tree.fingerprint())
    }

    /// Read-only access to the tree under the lock
    ///
    /// The closure may call other read-only stream methods, but not queries.
    pub fn inspect<R>(&self, f: impl FnOnce(&CacheTree<V>) -> R) -> R {
        self.read(|state| f(&state.tree))
    }

    fn check_resolution(&self, resolution: Resolution) -> Result<(), StreamError> {
        if resolution > self.config.max_resolution {
            return Err(StreamError::ResolutionTooFine {
                requested: resolution,
                max: self.config.max_resolution,
            });
        }
        Ok(())
    }

    /// Every node refinement can create under `interval` keeps its offset in [-2^52, 2^52)
    fn check_offset(
        &self,
        interval: &DyadicInterval,
        resolution: Resolution,
    ) -> Result<(), StreamError> {
        let out_of_range = StreamError::OffsetOutOfRange {
            interval: *interval,
            resolution,
        };
        let shift = i64::from(resolution.max(interval.power())) - i64::from(interval.power());
        if shift > 52 {
            return Err(out_of_range);
        }

        let offset = i128::from(interval.offset());
        let first = offset << shift;
        let last = ((offset + 1) << shift) - 1;
        let limit = i128::from(MAX_OFFSET);
        if first < -limit || last >= limit {
            return Err(out_of_range);
        }
        Ok(())
    }

    fn read<R>(&self, f: impl FnOnce(&StreamState<V>) -> R) -> R {
        let guard = self.state.lock();
        let state = guard.borrow();
        f(&state)
    }

    fn write<R>(&self, f: impl FnOnce(&mut StreamState<V>) -> R) -> R {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }
}

impl<V: Increment> Default for DynamicStream<V> {
    fn default() -> Self {
        Self::new(StreamConfig::default())
    }
}

impl<V: Increment> fmt::Debug for DynamicStream<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicStream")
            .field("config", &self.config)
            .field("nodes", &self.len())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
