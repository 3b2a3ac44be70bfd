//! Streams of time-stamped Lie increments
//!
//! A path is a sorted list of parameter values, each carrying one
//! increment vector. The log-signature over [a, b) is the BCH product,
//! in parameter order, of the increments whose parameter lies in [a, b).

mod io;

pub use io::read_increment_csv;

use crate::{
    algebra::{AlgebraContext, Alignment, TruncatedLie},
    intervals::DyadicInterval,
    StreamError,
};

/// Piecewise path given by increments at parameter values
#[derive(Debug, Clone)]
pub struct LieIncrementPath {
    width: usize,
    depth: u8,
    params: Vec<f64>,
    increments: Vec<TruncatedLie>,
    exact_refinement: bool,
}

impl LieIncrementPath {
    /// Build from parameters and row-major increment data (`params.len()` rows of `width`)
    pub fn new(
        width: usize,
        depth: u8,
        params: Vec<f64>,
        data: &[f64],
    ) -> Result<Self, StreamError> {
        if width == 0 {
            return Err(StreamError::InvalidPath("width must be > 0".to_string()));
        }
        if !(1..=2).contains(&depth) {
            return Err(StreamError::InvalidPath(format!(
                "unsupported depth {} (expected 1 or 2)",
                depth
            )));
        }
        if data.len() != params.len() * width {
            return Err(StreamError::InvalidPath(format!(
                "expected {} values for {} increments of width {}, got {}",
                params.len() * width,
                params.len(),
                width,
                data.len()
            )));
        }
        if let Some(bad) = params.iter().find(|p| !p.is_finite()) {
            return Err(StreamError::InvalidPath(format!(
                "non-finite parameter {}",
                bad
            )));
        }
        if params.windows(2).any(|w| w[0] > w[1]) {
            return Err(StreamError::InvalidPath(
                "parameters must be non-decreasing".to_string(),
            ));
        }

        let increments = data
            .chunks(width)
            .map(|row| TruncatedLie::from_increment(row, depth))
            .collect();

        Ok(Self {
            width,
            depth,
            params,
            increments,
            exact_refinement: false,
        })
    }

    /// Recompute split children from the raw data instead of halving the parent
    pub fn with_exact_refinement(mut self, enabled: bool) -> Self {
        self.exact_refinement = enabled;
        self
    }

    /// Number of letters
    pub fn width(&self) -> usize {
        self.width
    }

    /// Truncation depth
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Number of increments
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the path has no increments
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Direct BCH product of the increments with parameter in [inf, sup)
    pub fn log_signature_over(&self, inf: f64, sup: f64) -> TruncatedLie {
        let begin = self.params.partition_point(|&p| p < inf);
        let end = self.params.partition_point(|&p| p < sup).max(begin);
        self.increments[begin..end]
            .iter()
            .fold(self.zero(), |acc, incr| acc.bch(incr))
    }
}

impl AlgebraContext for LieIncrementPath {
    type Value = TruncatedLie;

    fn zero(&self) -> TruncatedLie {
        TruncatedLie::zero(self.width, self.depth)
    }

    fn compute_leaf_increment(&self, interval: &DyadicInterval) -> Result<TruncatedLie, StreamError> {
        let (inf, sup) = (interval.inf(), interval.sup());
        if !(inf.is_finite() && sup.is_finite()) {
            return Err(StreamError::Computation {
                interval: *interval,
                reason: format!("endpoints [{}, {}) are not finite", inf, sup),
            });
        }
        Ok(self.log_signature_over(inf, sup))
    }

    fn combine(&self, a: &TruncatedLie, b: &TruncatedLie, order: Alignment) -> TruncatedLie {
        match order {
            Alignment::Aligned => a.bch(b),
            Alignment::NotAligned => b.bch(a),
        }
    }

    fn split_increment(
        &self,
        parent: &TruncatedLie,
        left: &DyadicInterval,
        right: &DyadicInterval,
    ) -> Result<(TruncatedLie, TruncatedLie), StreamError> {
        if self.exact_refinement {
            Ok((
                self.compute_leaf_increment(left)?,
                self.compute_leaf_increment(right)?,
            ))
        } else {
            let half = parent.scaled(0.5);
            Ok((half.clone(), half))
        }
    }
}
