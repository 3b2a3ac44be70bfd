//! Algebra collaborators of the cache
//!
//! The cache never inspects increment values. It only needs:
//! - a fresh increment for a raw dyadic interval
//! - a non-commutative combine, ordered by alignment
//! - a policy for splitting a parent increment into two children
//! - a scalar half-multiply (used by the default split policy)

mod lie;

pub use lie::TruncatedLie;

use std::fmt;

use crate::{intervals::DyadicInterval, StreamError};

/// Which operand comes first in a combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// First operand is the left half: result = a·b
    Aligned,
    /// First operand is the right half: result = b·a
    NotAligned,
}

impl Alignment {
    /// Alignment of a dyadic interval within its parent
    pub fn of(interval: &DyadicInterval) -> Self {
        if interval.aligned() {
            Alignment::Aligned
        } else {
            Alignment::NotAligned
        }
    }
}

/// Algebraic value summarising a path over an interval
pub trait Increment: Clone + fmt::Debug + Send + 'static {
    /// Scalar multiple by ½
    fn halved(&self) -> Self;
}

/// Context computing and combining increments
///
/// Passed explicitly to every query; the cache holds no default context.
/// Every call against one stream must use contexts producing compatible
/// values, since cached increments are reused across calls.
pub trait AlgebraContext: Send + Sync {
    /// Increment type stored in the cache
    type Value: Increment;

    /// Additive identity (log-signature of an empty interval)
    fn zero(&self) -> Self::Value;

    /// Fresh computation with no cached history
    fn compute_leaf_increment(&self, interval: &DyadicInterval)
        -> Result<Self::Value, StreamError>;

    /// Non-commutative product; `order` says whether `a` is the left operand
    fn combine(&self, a: &Self::Value, b: &Self::Value, order: Alignment) -> Self::Value;

    /// Provisional children for a split leaf
    ///
    /// Default: both halves receive half of the parent value.
    fn split_increment(
        &self,
        parent: &Self::Value,
        _left: &DyadicInterval,
        _right: &DyadicInterval,
    ) -> Result<(Self::Value, Self::Value), StreamError> {
        Ok((parent.halved(), parent.halved()))
    }

    /// Left-to-right product of a run of increments
    fn combine_all(&self, values: &[Self::Value]) -> Self::Value {
        values.iter().fold(self.zero(), |acc, value| {
            self.combine(&acc, value, Alignment::Aligned)
        })
    }
}
