//! # Dyadic Interval Cache for Log-Signatures
//!
//! This library computes log-signatures of a stream over arbitrary
//! intervals and resolutions, reusing previously computed pieces.
//!
//! ## Core Algorithm
//!
//! 1. **Dyadic keys**: cache entries live on intervals [k·2^-n, (k+1)·2^-n)
//! 2. **Lazy growth**: the root expands by dyadic parents to reach new queries
//! 3. **Splitting**: leaves split into halves on demand, down to the query
//! 4. **Propagation**: parents are recombined once both children improve
//! 5. **Dissection**: general intervals are cut into dyadic pieces and the
//!    cached pieces combined left to right
//!
//! ## Usage Example
//!
//! ```
//! use dyadic_stream::{DynamicStream, LieIncrementPath, RealInterval, StreamConfig};
//!
//! let path = LieIncrementPath::new(2, 2, vec![0.0, 0.5], &[1.0, 0.0, 0.0, 1.0])?;
//! let stream = DynamicStream::new(StreamConfig::default());
//!
//! let lsig = stream.log_signature(RealInterval::new(0.0, 1.0)?, 3, &path)?;
//! assert_eq!(lsig.level1(), &[1.0, 1.0]);
//! # Ok::<(), dyadic_stream::StreamError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

// Core modules
pub mod intervals; // Dyadic and real intervals, dissection
pub mod algebra;   // Increment and context collaborators
pub mod tree;      // Cache tree and node model
pub mod stream;    // Refinement engine and query API
pub mod stats;     // Cache activity counters
pub mod path;      // Concrete Lie-increment path context

// Re-exports for convenience
pub use algebra::{AlgebraContext, Alignment, Increment, TruncatedLie};
pub use intervals::{
    Dissector, DyadicDissection, DyadicInterval, Interval, RealInterval, Resolution, MAX_OFFSET,
};
pub use path::LieIncrementPath;
pub use stats::CacheStats;
pub use stream::DynamicStream;
pub use tree::{CacheTree, IncrementNode};

use thiserror::Error;

/// Finest resolution whose grid points are exact in `f64`
pub const MAX_SUPPORTED_RESOLUTION: Resolution = 52;

/// Configuration parameters for a stream cache
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Finest resolution (and dyadic power) a query may request
    pub max_resolution: Resolution,

    /// Step over subtrees that already meet the requested accuracy
    pub skip_accurate_subtrees: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_resolution: 32,
            skip_accurate_subtrees: true,
        }
    }
}

impl StreamConfig {
    /// Set the finest allowed resolution (0..=52)
    pub fn with_max_resolution(mut self, max_resolution: Resolution) -> Result<Self, StreamError> {
        if !(0..=MAX_SUPPORTED_RESOLUTION).contains(&max_resolution) {
            return Err(StreamError::InvalidConfiguration(format!(
                "max resolution {} outside 0..={}",
                max_resolution, MAX_SUPPORTED_RESOLUTION
            )));
        }
        self.max_resolution = max_resolution;
        Ok(self)
    }

    /// Enable or disable skipping of already accurate subtrees
    pub fn with_subtree_skipping(mut self, enabled: bool) -> Self {
        self.skip_accurate_subtrees = enabled;
        self
    }
}

/// Errors that can occur while querying a stream
#[derive(Error, Debug)]
pub enum StreamError {
    /// General interval with NaN bounds or inverted endpoints
    #[error("invalid interval [{inf}, {sup})")]
    InvalidInterval {
        /// Requested left endpoint
        inf: f64,
        /// Requested right endpoint
        sup: f64,
    },

    /// Requested resolution finer than the configured maximum
    #[error("resolution {requested} exceeds configured maximum {max}")]
    ResolutionTooFine {
        /// Resolution (or dyadic power) that was requested
        requested: Resolution,
        /// Configured maximum
        max: Resolution,
    },

    /// Refining the interval to the requested resolution would produce
    /// offsets beyond `MAX_OFFSET`
    #[error("{interval} at resolution {resolution} reaches offsets beyond 2^52")]
    OffsetOutOfRange {
        /// Interval that was queried
        interval: DyadicInterval,
        /// Resolution that was requested
        resolution: Resolution,
    },

    /// No chain of dyadic parents joins the root and the target
    #[error("root {root} can never contain {target}: they lie on opposite sides of zero")]
    RootUnreachable {
        /// Current root of the cache tree
        root: DyadicInterval,
        /// Interval that was queried
        target: DyadicInterval,
    },

    /// Dissection could not represent the interval
    #[error("dissection failed: {0}")]
    Dissection(String),

    /// Context failed to compute an increment
    #[error("increment computation failed for {interval}: {reason}")]
    Computation {
        /// Interval whose increment was requested
        interval: DyadicInterval,
        /// Context-supplied description
        reason: String,
    },

    /// Configuration invalid
    #[error("invalid stream configuration: {0}")]
    InvalidConfiguration(String),

    /// Path data malformed
    #[error("invalid path data: {0}")]
    InvalidPath(String),
}
