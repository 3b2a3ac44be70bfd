//! Dissection of real intervals into dyadic pieces
//!
//! Endpoints are rounded down onto the grid 2^-r, then the grid range
//! [lo, hi) is covered greedily left to right by the largest aligned
//! dyadic block that fits. Pieces are disjoint, ordered, and never
//! coarser than necessary for alignment.

use super::{DyadicInterval, RealInterval, Resolution, MAX_OFFSET};
use crate::StreamError;

/// Decomposes an arbitrary interval into an ordered run of dyadic intervals
pub trait Dissector: Send + Sync {
    /// Ordered, disjoint dyadic pieces whose union approximates `interval`
    /// at granularity `resolution`
    fn dissect(
        &self,
        interval: &RealInterval,
        resolution: Resolution,
    ) -> Result<Vec<DyadicInterval>, StreamError>;
}

/// Greedy maximal-block dissection on the 2^-resolution grid
#[derive(Debug, Clone, Copy, Default)]
pub struct DyadicDissection;

impl Dissector for DyadicDissection {
    fn dissect(
        &self,
        interval: &RealInterval,
        resolution: Resolution,
    ) -> Result<Vec<DyadicInterval>, StreamError> {
        let scale = 2f64.powi(resolution);
        let lo = grid_point(interval.inf(), scale, resolution)?;
        let hi = grid_point(interval.sup(), scale, resolution)?;

        let mut pieces = Vec::new();
        let mut k = lo;
        while k < hi {
            let mut j = 0u32;
            while j < 62 {
                let block = 1i64 << (j + 1);
                if k & (block - 1) != 0 || k + block > hi {
                    break;
                }
                j += 1;
            }
            pieces.push(DyadicInterval::new(k >> j, resolution - j as Resolution));
            k += 1i64 << j;
        }

        Ok(pieces)
    }
}

fn grid_point(t: f64, scale: f64, resolution: Resolution) -> Result<i64, StreamError> {
    let point = (t * scale).floor();
    if !point.is_finite() || point.abs() > MAX_OFFSET as f64 {
        return Err(StreamError::Dissection(format!(
            "endpoint {} not representable at resolution {}",
            t, resolution
        )));
    }
    Ok(point as i64)
}
