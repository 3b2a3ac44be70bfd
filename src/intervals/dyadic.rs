//! Dyadic interval arithmetic
//!
//! Interval = (offset k, power n) denoting [k·2^-n, (k+1)·2^-n)
//!   Children:  (2k, n+1) and (2k+1, n+1)
//!   Parent:    (⌊k/2⌋, n-1)
//!
//! Key order: by left endpoint, coarser intervals first on ties.
//! Every descendant of an interval therefore sorts directly after it,
//! in one contiguous run.

use std::cmp::Ordering;
use std::fmt;

use super::Resolution;

/// Binary-subdivision interval `[offset·2^-power, (offset+1)·2^-power)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DyadicInterval {
    offset: i64,
    power: Resolution,
}

impl DyadicInterval {
    /// Create interval from offset and power
    pub const fn new(offset: i64, power: Resolution) -> Self {
        Self { offset, power }
    }

    /// Offset k
    #[inline]
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Power n (depth of the subdivision)
    #[inline]
    pub fn power(&self) -> Resolution {
        self.power
    }

    /// Left (included) endpoint
    pub fn inf(&self) -> f64 {
        self.offset as f64 / scale(self.power)
    }

    /// Right (excluded) endpoint
    pub fn sup(&self) -> f64 {
        (self.offset as f64 + 1.0) / scale(self.power)
    }

    /// Whether `other`'s range is a subset of this range
    pub fn contains(&self, other: &DyadicInterval) -> bool {
        if other.power < self.power {
            return false;
        }
        let shift = (other.power - self.power) as u32;
        shr_floor(other.offset, shift) == self.offset
    }

    /// Whether this is the left half of its dyadic parent
    #[inline]
    pub fn aligned(&self) -> bool {
        self.offset & 1 == 0
    }

    /// Shrink in place to the left half
    ///
    /// Panics if the offset overflows `i64`.
    pub fn shrink_interval_left(&mut self) {
        self.offset = self
            .offset
            .checked_mul(2)
            .unwrap_or_else(|| panic!("offset overflow shrinking {:?}", self));
        self.power += 1;
    }

    /// Shrink in place to the right half
    ///
    /// Panics if the offset overflows `i64`.
    pub fn shrink_interval_right(&mut self) {
        self.offset = self
            .offset
            .checked_mul(2)
            .and_then(|doubled| doubled.checked_add(1))
            .unwrap_or_else(|| panic!("offset overflow shrinking {:?}", self));
        self.power += 1;
    }

    /// Grow in place to the unique dyadic parent
    pub fn expand_interval(&mut self) {
        self.offset >>= 1;
        self.power -= 1;
    }

    /// Shrink to the half holding the included (left) endpoint
    ///
    /// Applied to an expanded interval this yields the half that a
    /// right-hand child was not, i.e. its sibling.
    pub fn shrink_to_contained_end(&mut self) {
        self.shrink_interval_left();
    }

    /// Shrink to the half holding the omitted (right) endpoint
    pub fn shrink_to_omitted_end(&mut self) {
        self.shrink_interval_right();
    }

    /// Left child (non-mutating)
    pub fn left_child(&self) -> Self {
        let mut child = *self;
        child.shrink_interval_left();
        child
    }

    /// Right child (non-mutating)
    pub fn right_child(&self) -> Self {
        let mut child = *self;
        child.shrink_interval_right();
        child
    }

    /// Both children: (left, right)
    pub fn children(&self) -> (Self, Self) {
        (self.left_child(), self.right_child())
    }

    /// Dyadic parent (non-mutating)
    pub fn parent(&self) -> Self {
        let mut parent = *self;
        parent.expand_interval();
        parent
    }

    /// The other half of this interval's parent
    pub fn sibling(&self) -> Self {
        Self {
            offset: self.offset ^ 1,
            power: self.power,
        }
    }

    /// Coarsest interval starting where this one ends, no coarser than `floor`
    ///
    /// In key order this is the first possible key after every descendant
    /// of `self`, among intervals at power `floor` or finer.
    pub fn following(&self, floor: Resolution) -> Self {
        let mut next = Self {
            offset: self.offset + 1,
            power: self.power,
        };
        while next.power > floor && next.offset & 1 == 0 {
            next.offset >>= 1;
            next.power -= 1;
        }
        next
    }

    /// Compare left endpoints exactly
    fn cmp_inf(&self, other: &Self) -> Ordering {
        if self.power > other.power {
            return other.cmp_inf(self).reverse();
        }

        let shift = (other.power - self.power) as u32;
        match self.offset.cmp(&shr_floor(other.offset, shift)) {
            Ordering::Equal if low_bits_zero(other.offset, shift) => Ordering::Equal,
            Ordering::Equal => Ordering::Less,
            ord => ord,
        }
    }
}

impl Ord for DyadicInterval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_inf(other).then(self.power.cmp(&other.power))
    }
}

impl PartialOrd for DyadicInterval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DyadicInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.inf(), self.sup())
    }
}

fn scale(power: Resolution) -> f64 {
    2f64.powi(power)
}

/// ⌊x / 2^shift⌋ for any shift
#[inline]
fn shr_floor(x: i64, shift: u32) -> i64 {
    x >> shift.min(63)
}

/// Whether 2^shift divides x
#[inline]
fn low_bits_zero(x: i64, shift: u32) -> bool {
    match shift {
        0 => true,
        1..=63 => x & ((1i64 << shift) - 1) == 0,
        _ => x == 0,
    }
}
