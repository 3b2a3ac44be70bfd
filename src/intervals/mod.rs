//! Interval types consumed by the cache
//!
//! - `DyadicInterval`: cache keys, binary subdivision arithmetic
//! - `RealInterval`: arbitrary clopen query intervals [inf, sup)
//! - `Dissector`: decomposition of real intervals into dyadic pieces

mod dissection;
mod dyadic;

pub use dissection::{Dissector, DyadicDissection};
pub use dyadic::DyadicInterval;

use std::fmt;

use crate::StreamError;

/// Dyadic depth at which an increment is considered accurate
pub type Resolution = i32;

/// Largest offset magnitude a cached or grid interval may reach
///
/// Offsets up to 2^52 are exact in `f64` and leave headroom in `i64`.
pub const MAX_OFFSET: i64 = 1 << 52;

/// Half-open real interval `[inf, sup)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RealInterval {
    inf: f64,
    sup: f64,
}

impl RealInterval {
    /// Create interval, rejecting NaN bounds and `inf > sup`
    pub fn new(inf: f64, sup: f64) -> Result<Self, StreamError> {
        if inf.is_nan() || sup.is_nan() || inf > sup {
            return Err(StreamError::InvalidInterval { inf, sup });
        }
        Ok(Self { inf, sup })
    }

    /// Left (included) endpoint
    pub fn inf(&self) -> f64 {
        self.inf
    }

    /// Right (excluded) endpoint
    pub fn sup(&self) -> f64 {
        self.sup
    }

    /// Whether the interval contains no points
    pub fn is_empty(&self) -> bool {
        self.inf >= self.sup
    }
}

impl From<DyadicInterval> for RealInterval {
    fn from(interval: DyadicInterval) -> Self {
        Self {
            inf: interval.inf(),
            sup: interval.sup(),
        }
    }
}

impl fmt::Display for RealInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.inf, self.sup)
    }
}

/// Query interval accepted by `DynamicStream::log_signature`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interval {
    /// Already dyadic: answered straight from the cache tree
    Dyadic(DyadicInterval),
    /// General interval: dissected into dyadic pieces first
    Real(RealInterval),
}

impl From<DyadicInterval> for Interval {
    fn from(interval: DyadicInterval) -> Self {
        Interval::Dyadic(interval)
    }
}

impl From<RealInterval> for Interval {
    fn from(interval: RealInterval) -> Self {
        Interval::Real(interval)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Dyadic(d) => write!(f, "dyadic {}", d),
            Interval::Real(r) => write!(f, "{}", r),
        }
    }
}
