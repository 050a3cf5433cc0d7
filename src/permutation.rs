//! Index mapping between the inner (unpunctured) and outer (transmitted) parity sequences

use serde::{Deserialize, Serialize};

use crate::Error;

/// Selection of inner sequence positions, in a fixed order
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct Permutation {
    /// Length of inner sequence
    pub(crate) input_size: usize,
    /// Inner index for each outer index
    pub(crate) indices: Vec<usize>,
}

impl Permutation {
    /// Returns permutation selecting given positions of an inner sequence.
    ///
    /// # Parameters
    ///
    /// - `indices`: Distinct integers in `[0, input_size)`. If the inner sequence is
    ///   `x[0], x[1], ..., x[input_size-1]`, then the outer sequence is
    ///   `x[indices[0]], x[indices[1]], ..., x[indices[K-1]]`.
    ///
    /// - `input_size`: Length of inner sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if `indices` is empty, contains a repeated value, or contains a value not
    /// less than `input_size`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldpc_codec::Permutation;
    ///
    /// let perm = Permutation::new(vec![0, 3, 2, 5], 6)?;
    /// assert_eq!(perm.output_size(), 4);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(indices: Vec<usize>, input_size: usize) -> Result<Self, Error> {
        if indices.is_empty() {
            return Err(Error::InvalidInput(
                "Permutation must select at least one position".to_string(),
            ));
        }
        let mut seen = vec![false; input_size];
        for &index in &indices {
            if index >= input_size || seen[index] {
                return Err(Error::InvalidInput(format!(
                    "Expected distinct indices in the range [0, {input_size}), found {indices:?}"
                )));
            }
            seen[index] = true;
        }
        Ok(Self {
            input_size,
            indices,
        })
    }

    /// Returns length of inner sequence.
    #[must_use]
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Returns length of outer sequence.
    #[must_use]
    pub fn output_size(&self) -> usize {
        self.indices.len()
    }

    /// Returns inner index for each outer index.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Generates outer sequence given inner sequence.
    ///
    /// # Parameters
    ///
    /// - `input`: Inner sequence.
    ///
    /// - `output`: Buffer for outer sequence (any pre-existing contents will be cleared).
    ///
    /// # Errors
    ///
    /// Returns an error if `input.len()` is not equal to `self.input_size()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldpc_codec::Permutation;
    ///
    /// let perm = Permutation::new(vec![0, 3, 2, 5], 6)?;
    /// let mut output = Vec::new();
    /// perm.permute(&['a', 'b', 'c', 'd', 'e', 'f'], &mut output)?;
    /// assert_eq!(output, ['a', 'd', 'c', 'f']);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn permute<T: Copy>(&self, input: &[T], output: &mut Vec<T>) -> Result<(), Error> {
        if input.len() != self.input_size {
            return Err(Error::SizeMismatch {
                what: "permutation input",
                expected: self.input_size,
                found: input.len(),
            });
        }
        output.clear();
        output.extend(self.indices.iter().map(|&i| input[i]));
        Ok(())
    }

    /// Generates inner sequence given outer sequence, filling unselected positions with
    /// `T::default()` (an erasure, for LLR values).
    ///
    /// # Parameters
    ///
    /// - `output`: Outer sequence.
    ///
    /// - `input`: Buffer for inner sequence (any pre-existing contents will be cleared).
    ///
    /// # Errors
    ///
    /// Returns an error if `output.len()` is not equal to `self.output_size()`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldpc_codec::Permutation;
    ///
    /// let perm = Permutation::new(vec![0, 3, 2, 5], 6)?;
    /// let mut input = Vec::new();
    /// perm.de_permute(&[1.0, 4.0, 3.0, 6.0], &mut input)?;
    /// assert_eq!(input, [1.0, 0.0, 3.0, 4.0, 0.0, 6.0]);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn de_permute<T: Copy + Default>(
        &self,
        output: &[T],
        input: &mut Vec<T>,
    ) -> Result<(), Error> {
        if output.len() != self.indices.len() {
            return Err(Error::SizeMismatch {
                what: "permutation output",
                expected: self.indices.len(),
                found: output.len(),
            });
        }
        input.clear();
        input.resize(self.input_size, T::default());
        self.de_permute_block(output, input);
        Ok(())
    }

    /// Writes outer sequence for one block (lengths are not checked).
    pub(crate) fn permute_block<T: Copy>(&self, input: &[T], output: &mut [T]) {
        for (out, &i) in output.iter_mut().zip(&self.indices) {
            *out = input[i];
        }
    }

    /// Writes inner sequence for one block, erasing unselected positions (lengths are not
    /// checked).
    pub(crate) fn de_permute_block<T: Copy + Default>(&self, output: &[T], input: &mut [T]) {
        input.fill(T::default());
        for (&out, &i) in output.iter().zip(&self.indices) {
            input[i] = out;
        }
    }
}
