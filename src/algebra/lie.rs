//! Free Lie algebra elements truncated at depth ≤ 2
//!
//! Basis: letters e_1..e_w (level 1), brackets [e_i, e_j] for i < j (level 2).
//! At depth 2 the Baker–Campbell–Hausdorff product is exact:
//!   log(e^x e^y) = x + y + ½[x, y]
//! and associative, so it serves as the combine operator for log-signatures.

use std::fmt;

use super::Increment;

/// Truncated log-signature element
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TruncatedLie {
    width: usize,
    depth: u8,
    level1: Vec<f64>,
    level2: Vec<f64>,
}

impl TruncatedLie {
    /// Zero element over `width` letters
    pub fn zero(width: usize, depth: u8) -> Self {
        assert!((1..=2).contains(&depth), "supported depths are 1 and 2");
        let level2_dim = if depth == 2 { width * width.saturating_sub(1) / 2 } else { 0 };
        Self {
            width,
            depth,
            level1: vec![0.0; width],
            level2: vec![0.0; level2_dim],
        }
    }

    /// Log-signature of a single linear increment (pure level 1)
    pub fn from_increment(increment: &[f64], depth: u8) -> Self {
        let mut lie = Self::zero(increment.len(), depth);
        lie.level1.copy_from_slice(increment);
        lie
    }

    /// Number of letters
    pub fn width(&self) -> usize {
        self.width
    }

    /// Truncation depth
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Level 1 coefficients
    pub fn level1(&self) -> &[f64] {
        &self.level1
    }

    /// Level 2 coefficients in (i, j) lexicographic order, i < j
    pub fn level2(&self) -> &[f64] {
        &self.level2
    }

    /// Coefficient of [e_i, e_j] (antisymmetric in i, j)
    pub fn bracket(&self, i: usize, j: usize) -> f64 {
        if self.depth < 2 || i == j {
            return 0.0;
        }
        if i < j {
            self.level2[self.pair_index(i, j)]
        } else {
            -self.level2[self.pair_index(j, i)]
        }
    }

    /// BCH product self · other, truncated at `self.depth`
    pub fn bch(&self, other: &Self) -> Self {
        assert_eq!(self.width, other.width, "width mismatch in BCH product");
        assert_eq!(self.depth, other.depth, "depth mismatch in BCH product");

        let mut out = self.clone();
        for (a, b) in out.level1.iter_mut().zip(&other.level1) {
            *a += b;
        }
        if self.depth == 2 {
            for (a, b) in out.level2.iter_mut().zip(&other.level2) {
                *a += b;
            }
            for i in 0..self.width {
                for j in (i + 1)..self.width {
                    let commutator =
                        self.level1[i] * other.level1[j] - self.level1[j] * other.level1[i];
                    let idx = self.pair_index(i, j);
                    out.level2[idx] += 0.5 * commutator;
                }
            }
        }
        out
    }

    /// Scalar multiple
    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = self.clone();
        out.level1.iter_mut().for_each(|c| *c *= factor);
        out.level2.iter_mut().for_each(|c| *c *= factor);
        out
    }

    /// Coefficient-wise comparison within `tolerance`
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.width == other.width
            && self.depth == other.depth
            && self
                .coefficients()
                .zip(other.coefficients())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// All coefficients, level 1 then level 2
    pub fn coefficients(&self) -> impl Iterator<Item = f64> + '_ {
        self.level1.iter().chain(self.level2.iter()).copied()
    }

    fn pair_index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < j && j < self.width);
        i * self.width - i * (i + 1) / 2 + (j - i - 1)
    }
}

impl Increment for TruncatedLie {
    fn halved(&self) -> Self {
        self.scaled(0.5)
    }
}

impl fmt::Display for TruncatedLie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, c) in self.level1.iter().enumerate() {
            if *c != 0.0 {
                write!(f, " {}({})", c, i + 1)?;
            }
        }
        for i in 0..self.width {
            for j in (i + 1)..self.width {
                let c = self.bracket(i, j);
                if c != 0.0 {
                    write!(f, " {}([{},{}])", c, i + 1, j + 1)?;
                }
            }
        }
        write!(f, " }}")
    }
}
