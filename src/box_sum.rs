//! Box-plus operators used to combine LLR values at check nodes
//!
//! Each operator is split into three steps so that a check node of degree `d` can be processed
//! with `O(d)` work: `prior` maps an LLR into the domain where combination happens, `sum` combines
//! two values in that domain, and `post` maps the result back to an LLR. The decoder is generic
//! over [`BoxSum`], so every variant gets its own specialized inner loop.

use std::fmt::Debug;

/// Saturation magnitude for LLR values produced by the min-sum and linear variants
pub(crate) const LLR_MAX: f64 = 1e3;

/// Largest magnitude allowed for a hyperbolic-tangent value before mapping back to an LLR
const TANH_MAX: f64 = 1.0 - 1e-12;

/// Number of samples in the correction-term table of the linear variant
const TABLE_LEN: usize = 8;

/// Samples per unit LLR in the correction-term table of the linear variant
const TABLE_GRANULARITY: f64 = 2.0;

/// Box-plus operator split into prior, sum and post steps
pub(crate) trait BoxSum: Clone + Debug + Send + Sync {
    /// Maps an LLR value into the combination domain.
    fn prior(&self, x: f64) -> f64;

    /// Combines two values in the combination domain.
    fn sum(&self, a: f64, b: f64) -> f64;

    /// Maps a value in the combination domain back to an LLR value.
    fn post(&self, x: f64) -> f64;

    /// Returns the neutral element in the combination domain.
    fn identity(&self) -> f64;
}

/// Exact sum-product operator, combining in the hyperbolic-tangent domain
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ExactBoxSum;

impl BoxSum for ExactBoxSum {
    fn prior(&self, x: f64) -> f64 {
        (0.5 * x).tanh()
    }

    fn sum(&self, a: f64, b: f64) -> f64 {
        a * b
    }

    fn post(&self, x: f64) -> f64 {
        let x = x.clamp(-TANH_MAX, TANH_MAX);
        ((1.0 + x) / (1.0 - x)).ln()
    }

    fn identity(&self) -> f64 {
        1.0
    }
}

/// Min-sum approximation
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct MinBoxSum;

impl BoxSum for MinBoxSum {
    fn prior(&self, x: f64) -> f64 {
        x
    }

    fn sum(&self, a: f64, b: f64) -> f64 {
        min_sum(a, b)
    }

    fn post(&self, x: f64) -> f64 {
        x
    }

    fn identity(&self) -> f64 {
        LLR_MAX
    }
}

/// Min-sum with the correction terms taken from a piecewise-linear table
#[derive(Clone, Copy, Debug)]
pub(crate) struct LinearBoxSum {
    /// Table for `x -> ln(1 + exp(-x))`
    table: LinearTable,
}

impl Default for LinearBoxSum {
    fn default() -> Self {
        Self {
            table: LinearTable::new(|x| (-x).exp().ln_1p()),
        }
    }
}

impl BoxSum for LinearBoxSum {
    fn prior(&self, x: f64) -> f64 {
        x
    }

    fn sum(&self, a: f64, b: f64) -> f64 {
        min_sum(a, b) + self.table.eval((a + b).abs()) - self.table.eval((a - b).abs())
    }

    fn post(&self, x: f64) -> f64 {
        x
    }

    fn identity(&self) -> f64 {
        LLR_MAX
    }
}

/// Piecewise-linear interpolation of a function sampled on a uniform grid starting at `0`
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct LinearTable {
    /// Function values at the grid points
    y: [f64; TABLE_LEN],
}

impl LinearTable {
    /// Returns table for a given function.
    pub(crate) fn new(f: impl Fn(f64) -> f64) -> Self {
        let mut y = [0.0; TABLE_LEN];
        for (i, yi) in (0u32 ..).zip(y.iter_mut()) {
            *yi = f(f64::from(i) / TABLE_GRANULARITY);
        }
        Self { y }
    }

    /// Returns interpolated function value for a nonnegative argument (`0` past the last sample).
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::cast_sign_loss)]
    pub(crate) fn eval(&self, x: f64) -> f64 {
        let x = x * TABLE_GRANULARITY;
        let floor = x.floor();
        let i = floor as usize;
        if x.is_nan() || i >= TABLE_LEN - 1 {
            return 0.0;
        }
        (self.y[i + 1] - self.y[i]) * (x - floor) + self.y[i]
    }
}

/// Returns the min-sum combination of two LLR values.
fn min_sum(a: f64, b: f64) -> f64 {
    let min = a.abs().min(b.abs());
    if a.is_sign_negative() ^ b.is_sign_negative() {
        -min
    } else {
        min
    }
}

/// Returns the box-plus combination of two LLR values for a given operator.
#[cfg(test)]
fn box_plus<B: BoxSum>(op: &B, a: f64, b: f64) -> f64 {
    op.post(op.sum(op.prior(a), op.prior(b)))
}
