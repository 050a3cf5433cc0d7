//! Structure of a low-density parity-check (LDPC) code
//!
//! An [`LdpcStructure`] is built once from a parity-check matrix. Construction reorders the
//! columns and rows of the matrix so that the codeword splits into three zones,
//! `[message | D parity | T parity]`, and keeps the sparse blocks needed to compute the parity
//! zones from the message by substitution:
//!
//! - `DC`: one row per D parity bit, giving the message bits it depends on,
//! - `A` and `B`: the message and D parity parts of the first `t_size` checks,
//! - `T`: the lower-triangular T parity part of the same checks (stored transposed).
//!
//! The reordered parity-check matrix is what the decoder operates on, so every parity sequence
//! handled by this crate is expressed in that column order.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Bit, Error, Permutation, SparseBitMatrix};

/// Version of the persisted structure format written by [`LdpcStructure::to_bytes`]
const PERSISTED_VERSION: u32 = 1;

/// Enumeration of belief-propagation decoding algorithms
#[derive(Clone, Eq, Hash, PartialEq, Debug, Copy, Default, Deserialize, Serialize)]
pub enum DecoderAlgo {
    /// Sum-product decoding with exact box-plus (highest complexity, best performance)
    #[default]
    Exact,
    /// Box-plus with a piecewise-linear table for the correction terms
    Linear,
    /// Min-sum decoding (lowest complexity, worst performance)
    Approximate,
}

impl DecoderAlgo {
    /// Returns the name of the variant.
    fn name(self) -> &'static str {
        match self {
            DecoderAlgo::Exact => "Exact",
            DecoderAlgo::Linear => "Linear",
            DecoderAlgo::Approximate => "Approximate",
        }
    }
}

impl std::fmt::Display for DecoderAlgo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} BP decoding", self.name())
    }
}

/// Scaling factor applied to check-node outputs
///
/// A schedule holds either a single value (used in all iterations) or one value per iteration.
/// The default schedule applies to every check degree without an override.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct ScalingFactor {
    /// Schedule for check degrees without an override
    pub default: Vec<f64>,
    /// Schedules for specific check degrees (at least `2`)
    pub by_degree: BTreeMap<usize, Vec<f64>>,
}

impl Default for ScalingFactor {
    fn default() -> Self {
        Self::constant(1.0)
    }
}

impl ScalingFactor {
    /// Returns scaling factor with the same value in all iterations and for all degrees.
    #[must_use]
    pub fn constant(factor: f64) -> Self {
        Self {
            default: vec![factor],
            by_degree: BTreeMap::new(),
        }
    }

    /// Returns scaling factor with one value per iteration, for all degrees.
    #[must_use]
    pub fn per_iteration(schedule: Vec<f64>) -> Self {
        Self {
            default: schedule,
            by_degree: BTreeMap::new(),
        }
    }

    /// Returns scaling factor with an override for checks of a given degree.
    #[must_use]
    pub fn with_degree(mut self, degree: usize, schedule: Vec<f64>) -> Self {
        self.by_degree.insert(degree, schedule);
        self
    }
}

/// Decoder configuration
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct DecoderOptions {
    /// Number of belief-propagation iterations
    pub iterations: u32,
    /// Box-plus variant used in check-node updates
    pub algorithm: DecoderAlgo,
    /// Scaling of check-node outputs
    pub scaling: ScalingFactor,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self::new(50, DecoderAlgo::Exact)
    }
}

impl DecoderOptions {
    /// Returns options with given iteration count and algorithm, and unit scaling.
    #[must_use]
    pub fn new(iterations: u32, algorithm: DecoderAlgo) -> Self {
        Self {
            iterations,
            algorithm,
            scaling: ScalingFactor::default(),
        }
    }

    /// Returns options with given scaling factor.
    #[must_use]
    pub fn with_scaling(mut self, scaling: ScalingFactor) -> Self {
        self.scaling = scaling;
        self
    }
}

/// Puncturing configuration
///
/// Masks are applied cyclically. An empty `mask` keeps all positions, and an empty `syst_mask`
/// applies `mask` to the systematic positions as well.
#[derive(Clone, Eq, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct PunctureOptions {
    /// Mask for the parity positions (`true` means transmitted)
    pub mask: Vec<bool>,
    /// Mask for the systematic positions (`true` means transmitted)
    pub syst_mask: Vec<bool>,
}

/// Structure of an LDPC code together with its decoder configuration
#[derive(Clone, PartialEq, Debug)]
pub struct LdpcStructure {
    /// Reordered parity-check matrix
    pub(crate) checks: SparseBitMatrix,
    /// Message part of the triangular checks
    pub(crate) a: SparseBitMatrix,
    /// D parity part of the triangular checks
    pub(crate) b: SparseBitMatrix,
    /// Transposed T parity part of the triangular checks
    pub(crate) t: SparseBitMatrix,
    /// Message dependencies of the D parity bits
    pub(crate) dc: SparseBitMatrix,
    /// Number of message bits
    pub(crate) msg_size: usize,
    /// Size of the triangular block
    pub(crate) t_size: usize,
    /// Number of checks found to be linearly dependent on the others
    pub(crate) redundant_checks: usize,
    /// Decoder configuration
    pub(crate) decoder_options: DecoderOptions,
    /// Scaling factor for each iteration (outer) and check degree minus two (inner)
    pub(crate) scaling_table: Vec<Vec<f64>>,
}

/// Persisted form of an [`LdpcStructure`]
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
struct PersistedStructure {
    version: u32,
    checks: SparseBitMatrix,
    a: SparseBitMatrix,
    b: SparseBitMatrix,
    t: SparseBitMatrix,
    dc: SparseBitMatrix,
    msg_size: usize,
    t_size: usize,
    redundant_checks: usize,
    decoder_options: DecoderOptions,
}

impl LdpcStructure {
    /// Returns code structure for a given parity-check matrix.
    ///
    /// # Parameters
    ///
    /// - `check_matrix`: Parity-check matrix with `M` rows and `N > M` columns. Rows that are
    ///   linear combinations of other rows are tolerated: each one increases the message size by
    ///   one beyond `N - M`.
    ///
    /// - `decoder_options`: Decoder configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix has no rows, does not have more columns than rows, or
    /// cannot be brought into triangular form, or if the scaling factor in `decoder_options` is
    /// inconsistent with the iteration count.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldpc_codec::{DecoderOptions, LdpcStructure, SparseBitMatrix};
    ///
    /// let h = SparseBitMatrix::from_rows(
    ///     7,
    ///     vec![vec![0, 1, 3, 4], vec![0, 2, 3, 5], vec![1, 2, 3, 6]],
    /// )?;
    /// let structure = LdpcStructure::new(&h, DecoderOptions::default())?;
    /// assert_eq!(structure.msg_size(), 4);
    /// assert_eq!(structure.parity_size(), 7);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(
        check_matrix: &SparseBitMatrix,
        decoder_options: DecoderOptions,
    ) -> Result<Self, Error> {
        if check_matrix.rows() == 0 || check_matrix.rows() >= check_matrix.cols() {
            return Err(Error::InvalidInput(format!(
                "Expected parity-check matrix with more columns than rows (found {} rows, {} columns)",
                check_matrix.rows(),
                check_matrix.cols()
            )));
        }
        let mut h = check_matrix.clone();
        let num_checks = h.rows();
        let num_bits = h.cols();
        let t_size = reorder_columns(&mut h);
        pivot_triangular_rows(&mut h, t_size)?;
        let mut cde = clear_triangular_columns(&h, t_size);
        let (msg_size, num_pivots) = reduce_dense_block(&mut h, &mut cde, t_size);
        let redundant_checks = msg_size - (num_bits - num_checks);
        tracing::debug!(
            num_bits,
            num_checks,
            t_size,
            msg_size,
            "derived generator for parity-check matrix"
        );
        if redundant_checks > 0 {
            tracing::warn!(
                redundant_checks,
                msg_size,
                "parity-check matrix has linearly dependent rows; message size increased"
            );
        }
        let scaling_table = scaling_table(&h, &decoder_options)?;
        Ok(Self {
            dc: cde.submatrix(0 .. num_pivots, 0 .. msg_size),
            a: h.submatrix(0 .. t_size, 0 .. msg_size),
            b: h.submatrix(0 .. t_size, msg_size .. msg_size + num_pivots),
            t: h
                .submatrix(0 .. t_size, num_bits - t_size .. num_bits)
                .transpose(),
            checks: h,
            msg_size,
            t_size,
            redundant_checks,
            decoder_options,
            scaling_table,
        })
    }

    /// Returns number of message bits per block.
    #[must_use]
    pub fn msg_size(&self) -> usize {
        self.msg_size
    }

    /// Returns number of systematic bits per block (the leading parity bits equal to the message).
    #[must_use]
    pub fn syst_size(&self) -> usize {
        self.msg_size
    }

    /// Returns number of parity bits (codeword length) per block.
    #[must_use]
    pub fn parity_size(&self) -> usize {
        self.checks.cols()
    }

    /// Returns number of decoder state values (edges of the Tanner graph) per block.
    #[must_use]
    pub fn state_size(&self) -> usize {
        self.checks.size()
    }

    /// Returns number of parity checks that are linear combinations of other checks.
    #[must_use]
    pub fn redundant_checks(&self) -> usize {
        self.redundant_checks
    }

    /// Returns reordered parity-check matrix.
    #[must_use]
    pub fn checks(&self) -> &SparseBitMatrix {
        &self.checks
    }

    /// Returns number of decoder iterations.
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.decoder_options.iterations
    }

    /// Returns decoding algorithm.
    #[must_use]
    pub fn decoder_algo(&self) -> DecoderAlgo {
        self.decoder_options.algorithm
    }

    /// Returns decoder configuration.
    #[must_use]
    pub fn decoder_options(&self) -> &DecoderOptions {
        &self.decoder_options
    }

    /// Replaces decoder configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaling factor is inconsistent with the iteration count.
    pub fn set_decoder_options(&mut self, decoder_options: DecoderOptions) -> Result<(), Error> {
        self.scaling_table = scaling_table(&self.checks, &decoder_options)?;
        self.decoder_options = decoder_options;
        Ok(())
    }

    /// Returns parity bits (codeword) for a block of message bits.
    ///
    /// # Errors
    ///
    /// Returns an error if `msg.len()` is not equal to `self.msg_size()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldpc_codec::{Bit, DecoderOptions, LdpcStructure, SparseBitMatrix};
    /// use Bit::{One, Zero};
    ///
    /// let h = SparseBitMatrix::from_rows(
    ///     7,
    ///     vec![vec![0, 1, 3, 4], vec![0, 2, 3, 5], vec![1, 2, 3, 6]],
    /// )?;
    /// let structure = LdpcStructure::new(&h, DecoderOptions::default())?;
    /// let parity = structure.encode(&[One, Zero, Zero, One])?;
    /// assert_eq!(parity[.. 4], [One, Zero, Zero, One]);
    /// assert!(structure.check(&parity)?);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn encode(&self, msg: &[Bit]) -> Result<Vec<Bit>, Error> {
        check_len("message", msg.len(), self.msg_size)?;
        let mut parity = vec![Bit::Zero; self.parity_size()];
        self.encode_block(msg, &mut parity);
        Ok(parity)
    }

    /// Returns syndrome of a block of parity bits.
    ///
    /// # Errors
    ///
    /// Returns an error if `parity.len()` is not equal to `self.parity_size()`.
    pub fn syndrome(&self, parity: &[Bit]) -> Result<Vec<Bit>, Error> {
        check_len("parity", parity.len(), self.parity_size())?;
        Ok(self
            .checks
            .iter()
            .map(|row| row.iter().fold(Bit::Zero, |acc, &col| acc.xor(parity[col])))
            .collect())
    }

    /// Returns `true` if a block of parity bits satisfies all parity checks.
    ///
    /// # Errors
    ///
    /// Returns an error if `parity.len()` is not equal to `self.parity_size()`.
    pub fn check(&self, parity: &[Bit]) -> Result<bool, Error> {
        check_len("parity", parity.len(), self.parity_size())?;
        Ok(self.is_codeword(parity))
    }

    /// Returns permutation that selects the transmitted parity positions.
    ///
    /// # Errors
    ///
    /// Returns an error if the masks select no position at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldpc_codec::{DecoderOptions, LdpcStructure, PunctureOptions, SparseBitMatrix};
    ///
    /// let h = SparseBitMatrix::from_rows(
    ///     7,
    ///     vec![vec![0, 1, 3, 4], vec![0, 2, 3, 5], vec![1, 2, 3, 6]],
    /// )?;
    /// let structure = LdpcStructure::new(&h, DecoderOptions::default())?;
    /// let options = PunctureOptions {
    ///     mask: vec![true, false],
    ///     syst_mask: vec![true],
    /// };
    /// let perm = structure.puncturing(&options)?;
    /// assert_eq!(perm.indices(), [0, 1, 2, 3, 4, 6]);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn puncturing(&self, options: &PunctureOptions) -> Result<Permutation, Error> {
        let syst_size = self.syst_size();
        let keep_by_mask = |mask: &[bool], j: usize| mask.is_empty() || mask[j % mask.len()];
        let indices: Vec<usize> = (0 .. self.parity_size())
            .filter(|&i| {
                if options.syst_mask.is_empty() {
                    keep_by_mask(&options.mask, i)
                } else if i < syst_size {
                    keep_by_mask(&options.syst_mask, i)
                } else {
                    keep_by_mask(&options.mask, i - syst_size)
                }
            })
            .collect();
        if indices.is_empty() {
            return Err(Error::InvalidInput(
                "Puncturing masks must keep at least one parity bit".to_string(),
            ));
        }
        Permutation::new(indices, self.parity_size())
    }

    /// Returns persisted form of the structure.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let persisted = PersistedStructure {
            version: PERSISTED_VERSION,
            checks: self.checks.clone(),
            a: self.a.clone(),
            b: self.b.clone(),
            t: self.t.clone(),
            dc: self.dc.clone(),
            msg_size: self.msg_size,
            t_size: self.t_size,
            redundant_checks: self.redundant_checks,
            decoder_options: self.decoder_options.clone(),
        };
        Ok(serde_json::to_vec(&persisted)?)
    }

    /// Returns structure restored from its persisted form.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails, if the format version is unknown, or if the
    /// persisted fields are inconsistent with one another.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldpc_codec::{DecoderOptions, LdpcStructure, SparseBitMatrix};
    ///
    /// let h = SparseBitMatrix::from_rows(
    ///     7,
    ///     vec![vec![0, 1, 3, 4], vec![0, 2, 3, 5], vec![1, 2, 3, 6]],
    /// )?;
    /// let structure = LdpcStructure::new(&h, DecoderOptions::default())?;
    /// let restored = LdpcStructure::from_bytes(&structure.to_bytes()?)?;
    /// assert_eq!(restored, structure);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let persisted: PersistedStructure = serde_json::from_slice(bytes)?;
        match persisted.version {
            PERSISTED_VERSION => Self::from_persisted(persisted),
            version => Err(Error::InvalidInput(format!(
                "Unsupported persisted structure version {version} (expected {PERSISTED_VERSION})"
            ))),
        }
    }

    /// Saves structure to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    /// Loads structure from a file written by [`LdpcStructure::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_bytes(&std::fs::read(path)?)
    }

    /// Writes parity bits for a block of message bits (lengths are not checked).
    pub(crate) fn encode_block(&self, msg: &[Bit], parity: &mut [Bit]) {
        let (syst, rest) = parity.split_at_mut(self.msg_size);
        syst.copy_from_slice(&msg[.. self.msg_size]);
        rest.fill(Bit::Zero);
        let (d, t) = rest.split_at_mut(self.dc.rows());
        for (d_bit, row) in d.iter_mut().zip(self.dc.iter()) {
            for &col in row {
                *d_bit ^= msg[col];
            }
        }
        for (i, (b_row, a_row)) in self.b.iter().zip(self.a.iter()).enumerate() {
            for &col in b_row {
                t[i] ^= d[col];
            }
            for &col in a_row {
                t[i] ^= msg[col];
            }
        }
        for (col, rows) in self.t.iter().enumerate() {
            let bit = t[col];
            for &row in rows.iter().skip(1) {
                t[row] ^= bit;
            }
        }
    }

    /// Returns `true` if a block of parity bits satisfies all parity checks (length not checked).
    pub(crate) fn is_codeword(&self, parity: &[Bit]) -> bool {
        self.checks.iter().all(|row| {
            row.iter()
                .fold(Bit::Zero, |acc, &col| acc.xor(parity[col]))
                == Bit::Zero
        })
    }

    /// Returns scaling factor for a given iteration and check degree (at least `2`). Iterations
    /// past the end of the schedule use its last entry.
    pub(crate) fn scaling_factor(&self, iteration: usize, degree: usize) -> f64 {
        let schedule = &self.scaling_table[iteration.min(self.scaling_table.len() - 1)];
        schedule[degree - 2]
    }

    /// Returns structure from validated persisted fields.
    fn from_persisted(persisted: PersistedStructure) -> Result<Self, Error> {
        let num_bits = persisted.checks.cols();
        let msg_size = persisted.msg_size;
        let t_size = persisted.t_size;
        let num_pivots = persisted.dc.rows();
        if msg_size + num_pivots + t_size != num_bits
            || persisted.checks.rows() + msg_size != num_bits + persisted.redundant_checks
            || (persisted.a.rows(), persisted.a.cols()) != (t_size, msg_size)
            || (persisted.b.rows(), persisted.b.cols()) != (t_size, num_pivots)
            || (persisted.t.rows(), persisted.t.cols()) != (t_size, t_size)
            || persisted.dc.cols() != msg_size
        {
            return Err(Error::InvalidInput(
                "Persisted structure has inconsistent block sizes".to_string(),
            ));
        }
        let scaling_table = scaling_table(&persisted.checks, &persisted.decoder_options)?;
        Ok(Self {
            checks: persisted.checks,
            a: persisted.a,
            b: persisted.b,
            t: persisted.t,
            dc: persisted.dc,
            msg_size: persisted.msg_size,
            t_size: persisted.t_size,
            redundant_checks: persisted.redundant_checks,
            decoder_options: persisted.decoder_options,
            scaling_table,
        })
    }
}

/// Returns error if a sequence length differs from the expected one.
pub(crate) fn check_len(what: &'static str, found: usize, expected: usize) -> Result<(), Error> {
    if found == expected {
        Ok(())
    } else {
        Err(Error::SizeMismatch {
            what,
            expected,
            found,
        })
    }
}

/// Moves columns of minimum weight to the right end of the matrix, one at a time, while moving
/// the rows that contain them to the bottom, until every row has been assigned. Returns the number
/// of columns moved, which is the size of the triangular block.
fn reorder_columns(h: &mut SparseBitMatrix) -> usize {
    let num_rows = h.rows();
    let num_cols = h.cols();
    let mut col_sizes = h.col_sizes(0 .. num_rows);
    let mut max_row = num_rows;
    let mut counted_rows = num_rows;
    for i in (1 ..= num_cols).rev() {
        for r in max_row .. counted_rows {
            for &col in h.row(r) {
                col_sizes[col] -= 1;
            }
        }
        counted_rows = max_row;
        let mut min_idx = None;
        let mut min_weight = usize::MAX;
        for j in (0 .. i).rev() {
            let weight = col_sizes[j];
            if weight >= 1 && weight < min_weight {
                min_idx = Some(j);
                min_weight = weight;
                if weight == 1 {
                    break;
                }
            }
        }
        // Remaining rows are all zero
        let Some(min_idx) = min_idx else {
            return num_cols - i;
        };
        h.swap_cols(min_idx, i - 1, 0 .. num_rows);
        col_sizes.swap(min_idx, i - 1);
        let mut r = 0;
        let mut end = max_row;
        while r < end {
            if h.test(r, i - 1) {
                end -= 1;
                h.swap_rows(r, end);
            } else {
                r += 1;
            }
        }
        max_row = end;
        if max_row == 0 {
            return num_cols - i + 1;
        }
    }
    num_cols
}

/// Swaps rows so that row `i` has a `1` on the diagonal of the triangular block.
fn pivot_triangular_rows(h: &mut SparseBitMatrix, t_size: usize) -> Result<(), Error> {
    let offset = h.cols() - t_size;
    for i in 0 .. t_size {
        if !h.test(i, i + offset) {
            let pivot = (i + 1 .. h.rows())
                .find(|&r| h.test(r, i + offset))
                .ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "No pivot found for column {} of triangular block",
                        i + offset
                    ))
                })?;
            h.swap_rows(i, pivot);
        }
    }
    Ok(())
}

/// Returns the rows below the triangular block, with the triangular-block columns cleared by
/// adding triangular rows.
fn clear_triangular_columns(h: &SparseBitMatrix, t_size: usize) -> SparseBitMatrix {
    let num_cols = h.cols();
    let mut cde = h.submatrix(t_size .. h.rows(), 0 .. num_cols);
    for i in (0 .. t_size).rev() {
        let col = num_cols - t_size + i;
        for r in 0 .. cde.rows() {
            if cde.test(r, col) {
                cde.xor_into_row(r, h.row(i));
            }
        }
    }
    cde
}

/// Reduces the dense block to identity over the D parity columns, swapping columns of `h` and
/// `cde` in lock-step. Columns without a pivot are moved into the message zone. Returns the final
/// message size and the number of pivots found.
fn reduce_dense_block(
    h: &mut SparseBitMatrix,
    cde: &mut SparseBitMatrix,
    t_size: usize,
) -> (usize, usize) {
    let num_cols = h.cols();
    let num_rows = h.rows();
    let mut msg_size = num_cols - num_rows;
    let mut i = 0;
    while i + msg_size + t_size < num_cols {
        let col = i + msg_size;
        if let Some(r) = (i .. cde.rows()).find(|&r| cde.test(r, col)) {
            cde.swap_rows(i, r);
        } else if let Some((r, k)) = (i .. cde.rows()).find_map(|r| cde.first(r).map(|k| (r, k)))
        {
            h.swap_cols(k, col, 0 .. num_rows);
            cde.swap_cols(k, col, 0 .. cde.rows());
            cde.swap_rows(i, r);
        } else {
            h.move_col(col, msg_size);
            cde.move_col(col, msg_size);
            msg_size += 1;
            continue;
        }
        for r in i + 1 .. cde.rows() {
            if cde.test(r, col) {
                cde.xor_rows(r, i);
            }
        }
        i += 1;
    }
    let num_pivots = i;
    for i in (0 .. num_pivots).rev() {
        let col = i + msg_size;
        for r in 0 .. i {
            if cde.test(r, col) {
                cde.xor_rows(r, i);
            }
        }
    }
    (msg_size, num_pivots)
}

/// Returns scaling factor table for each iteration and check degree.
fn scaling_table(
    checks: &SparseBitMatrix,
    decoder_options: &DecoderOptions,
) -> Result<Vec<Vec<f64>>, Error> {
    let scaling = &decoder_options.scaling;
    let iterations = decoder_options.iterations as usize;
    let len = scaling.default.len();
    if len == 0 || (len != 1 && len != iterations) {
        return Err(Error::InvalidInput(format!(
            "Expected scaling factor schedule of length 1 or {iterations} (found {len})"
        )));
    }
    let max_degree = checks.row_sizes().into_iter().max().unwrap_or(0);
    let mut table: Vec<Vec<f64>> = scaling
        .default
        .iter()
        .map(|&factor| vec![factor; max_degree.saturating_sub(1)])
        .collect();
    for (&degree, schedule) in &scaling.by_degree {
        if degree < 2 {
            return Err(Error::InvalidInput(format!(
                "Scaling factor defined for check degree {degree} (must be at least 2)"
            )));
        }
        if schedule.len() != len {
            return Err(Error::InvalidInput(format!(
                "Expected scaling factor schedule of length {len} for degree {degree} (found {})",
                schedule.len()
            )));
        }
        if degree <= max_degree {
            for (row, &factor) in table.iter_mut().zip(schedule) {
                row[degree - 2] = factor;
            }
        }
    }
    Ok(table)
}
