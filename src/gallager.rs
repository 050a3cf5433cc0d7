//! Gallager's random construction of regular parity-check matrices

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Error, SparseBitMatrix};

/// Returns a random regular parity-check matrix built by Gallager's construction.
///
/// The matrix has `n` columns and `n / wr * wc` rows, arranged in `wc` bands of `n / wr` rows. In
/// the first band, row `i` covers columns `i*wr .. (i+1)*wr`; every other band is a random column
/// permutation of the first. Every row has weight `wr`. If `n` is a multiple of `wr`, every column
/// has weight `wc`; otherwise the `n % wr` columns left uncovered by each band have lower weight.
///
/// # Parameters
///
/// - `n`: Number of columns (codeword length). Must be at least `wr`.
///
/// - `wc`: Column weight. Must be positive.
///
/// - `wr`: Row weight. Must be positive.
///
/// - `seed`: Seed for the random column permutations, or `None` for a nondeterministic seed.
///
/// # Errors
///
/// Returns an error if any of the above conditions on `n`, `wc`, `wr` is violated.
///
/// # Examples
///
/// ```
/// use ldpc_codec::gallager_matrix;
///
/// let h = gallager_matrix(48, 3, 6, Some(0))?;
/// assert_eq!(h.rows(), 24);
/// assert!(h.row_sizes().iter().all(|&w| w == 6));
/// assert!(h.col_sizes(0 .. 24).iter().all(|&w| w == 3));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn gallager_matrix(
    n: usize,
    wc: usize,
    wr: usize,
    seed: Option<u64>,
) -> Result<SparseBitMatrix, Error> {
    if wc == 0 || wr == 0 || n < wr {
        return Err(Error::InvalidInput(format!(
            "Expected positive weights and a length of at least the row weight \
             (found n = {n}, wc = {wc}, wr = {wr})"
        )));
    }
    let band_rows = n / wr;
    let rows: Vec<Vec<usize>> = (0 .. wc * band_rows)
        .map(|r| {
            let i = r % band_rows;
            (i * wr .. (i + 1) * wr).collect()
        })
        .collect();
    let mut h = SparseBitMatrix::from_rows(n, rows)?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    for j in 0 .. n {
        for b in 1 .. wc {
            h.swap_cols(j, rng.random_range(j .. n), b * band_rows .. (b + 1) * band_rows);
        }
    }
    Ok(h)
}
