//! Batch encoder and decoder for an LDPC code
//!
//! An [`Ldpc`] codec wraps an [`LdpcStructure`], an optional puncturing [`Permutation`] and a
//! work group size. Every batch operation takes `N` blocks concatenated into one slice, splits
//! them into at most `work_group_size` contiguous chunks, and processes the chunks in parallel
//! with [`rayon`]. Each chunk writes to its own range of the output, so results do not depend on
//! the number of workers.
//!
//! # Examples
//!
//! ```
//! use ldpc_codec::{gallager_matrix, DecoderOptions, Ldpc, LdpcStructure};
//!
//! let h = gallager_matrix(96, 3, 6, Some(0))?;
//! let structure = LdpcStructure::new(&h, DecoderOptions::default())?;
//! let codec = Ldpc::new(structure, 0);
//! let num_blocks = 4;
//! let msg = ldpc_codec::utils::random_bits(num_blocks * codec.msg_size(), &mut rand::rng());
//! let parity = codec.encode(&msg)?;
//! assert!(codec.check(&parity)?);
//! let parity_llr: Vec<f64> = ldpc_codec::utils::bpsk_awgn_channel(&parity, 10.0, &mut rand::rng());
//! let msg_hat = codec.decode(&parity_llr)?;
//! assert_eq!(msg_hat, msg);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::num::NonZeroUsize;
use std::ops::Range;

use rayon::prelude::*;

use crate::bp::bp_decoder;
use crate::structure::check_len;
use crate::{Bit, DecoderOptions, Error, LdpcStructure, Permutation, PunctureOptions};

/// Inputs to soft-output decoding, each holding `N` concatenated blocks
#[derive(Clone, Copy, Debug, Default)]
pub struct SoInput<'a> {
    /// Channel LLR values of the transmitted parity bits
    pub parity: &'a [f64],
    /// A-priori LLR values of the systematic bits
    pub syst: Option<&'a [f64]>,
    /// Check-to-bit messages returned by an earlier call
    pub state: Option<&'a [f64]>,
    /// Index of the first iteration of this call in the scaling factor schedule
    pub first_iteration: u32,
    /// Number of iterations of this call (`None` for the configured iteration count)
    pub iterations: Option<u32>,
}

/// Selection of the outputs to be produced by soft-output decoding
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub struct SoOutput {
    /// A-posteriori LLR values of the message bits
    pub msg: bool,
    /// Extrinsic LLR values of the systematic bits
    pub syst: bool,
    /// Extrinsic LLR values of the transmitted parity bits
    pub parity: bool,
    /// Check-to-bit messages, to be passed back as input state
    pub state: bool,
}

impl SoOutput {
    /// Returns selection of every output.
    #[must_use]
    pub fn all() -> Self {
        Self {
            msg: true,
            syst: true,
            parity: true,
            state: true,
        }
    }
}

/// Outputs of soft-output decoding (`None` for outputs that were not selected)
#[derive(Clone, PartialEq, Debug, Default)]
pub struct SoDecoded {
    /// A-posteriori LLR values of the message bits
    pub msg: Option<Vec<f64>>,
    /// Extrinsic LLR values of the systematic bits
    pub syst: Option<Vec<f64>>,
    /// Extrinsic LLR values of the transmitted parity bits
    pub parity: Option<Vec<f64>>,
    /// Check-to-bit messages
    pub state: Option<Vec<f64>>,
}

impl SoDecoded {
    /// Returns empty outputs for a selection.
    fn new(output: &SoOutput) -> Self {
        let empty = |selected: bool| selected.then(Vec::new);
        Self {
            msg: empty(output.msg),
            syst: empty(output.syst),
            parity: empty(output.parity),
            state: empty(output.state),
        }
    }

    /// Appends outputs of later blocks.
    fn append(&mut self, other: Self) {
        let join = |mine: &mut Option<Vec<f64>>, theirs: Option<Vec<f64>>| {
            if let (Some(mine), Some(theirs)) = (mine, theirs) {
                mine.extend(theirs);
            }
        };
        join(&mut self.msg, other.msg);
        join(&mut self.syst, other.syst);
        join(&mut self.parity, other.parity);
        join(&mut self.state, other.state);
    }
}

/// LDPC codec processing batches of blocks in parallel
#[derive(Clone, PartialEq, Debug)]
pub struct Ldpc {
    /// Code structure and decoder configuration
    structure: LdpcStructure,
    /// Selection of transmitted parity bits
    puncturing: Option<Permutation>,
    /// Maximum number of parallel workers (`0` for all available parallelism)
    work_group_size: usize,
}

impl Ldpc {
    /// Returns codec transmitting every parity bit.
    ///
    /// # Parameters
    ///
    /// - `structure`: Code structure.
    ///
    /// - `work_group_size`: Maximum number of blocks chunks processed in parallel, or `0` for all
    ///   available parallelism.
    #[must_use]
    pub fn new(structure: LdpcStructure, work_group_size: usize) -> Self {
        Self {
            structure,
            puncturing: None,
            work_group_size,
        }
    }

    /// Returns codec transmitting a subset of the parity bits.
    ///
    /// # Parameters
    ///
    /// - `structure`: Code structure.
    ///
    /// - `options`: Masks selecting the transmitted parity bits.
    ///
    /// - `work_group_size`: Maximum number of blocks chunks processed in parallel, or `0` for all
    ///   available parallelism.
    ///
    /// # Errors
    ///
    /// Returns an error if the masks select no parity bit.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldpc_codec::{gallager_matrix, DecoderOptions, Ldpc, LdpcStructure, PunctureOptions};
    ///
    /// let h = gallager_matrix(96, 3, 6, Some(0))?;
    /// let structure = LdpcStructure::new(&h, DecoderOptions::default())?;
    /// let options = PunctureOptions {
    ///     mask: vec![true],
    ///     syst_mask: vec![true, false],
    /// };
    /// let codec = Ldpc::with_puncturing(structure, &options, 1)?;
    /// assert_eq!(codec.parity_size(), 96 - codec.syst_size() / 2);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn with_puncturing(
        structure: LdpcStructure,
        options: &PunctureOptions,
        work_group_size: usize,
    ) -> Result<Self, Error> {
        let puncturing = structure.puncturing(options)?;
        Ok(Self {
            structure,
            puncturing: Some(puncturing),
            work_group_size,
        })
    }

    /// Returns number of message bits per block.
    #[must_use]
    pub fn msg_size(&self) -> usize {
        self.structure.msg_size()
    }

    /// Returns number of systematic bits per block.
    #[must_use]
    pub fn syst_size(&self) -> usize {
        self.structure.syst_size()
    }

    /// Returns number of transmitted parity bits per block.
    #[must_use]
    pub fn parity_size(&self) -> usize {
        self.puncturing
            .as_ref()
            .map_or(self.structure.parity_size(), Permutation::output_size)
    }

    /// Returns number of decoder state values per block.
    #[must_use]
    pub fn state_size(&self) -> usize {
        self.structure.state_size()
    }

    /// Returns code structure.
    #[must_use]
    pub fn structure(&self) -> &LdpcStructure {
        &self.structure
    }

    /// Returns selection of transmitted parity bits, if the code is punctured.
    #[must_use]
    pub fn puncturing(&self) -> Option<&Permutation> {
        self.puncturing.as_ref()
    }

    /// Returns maximum number of blocks chunks processed in parallel (`0` for all available
    /// parallelism).
    #[must_use]
    pub fn work_group_size(&self) -> usize {
        self.work_group_size
    }

    /// Sets maximum number of blocks chunks processed in parallel (`0` for all available
    /// parallelism).
    pub fn set_work_group_size(&mut self, work_group_size: usize) {
        self.work_group_size = work_group_size;
    }

    /// Replaces decoder configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the scaling factor is inconsistent with the iteration count.
    pub fn set_decoder_options(&mut self, decoder_options: DecoderOptions) -> Result<(), Error> {
        self.structure.set_decoder_options(decoder_options)
    }

    /// Returns transmitted parity bits for blocks of message bits.
    ///
    /// # Parameters
    ///
    /// - `msg`: Message bits of `N` blocks, concatenated.
    ///
    /// # Returns
    ///
    /// - `parity`: Transmitted parity bits of the `N` blocks, concatenated.
    ///
    /// # Errors
    ///
    /// Returns an error if `msg.len()` is not a positive multiple of `self.msg_size()`.
    pub fn encode(&self, msg: &[Bit]) -> Result<Vec<Bit>, Error> {
        let msg_size = self.msg_size();
        let parity_size = self.parity_size();
        let num_blocks = num_blocks("message", msg.len(), msg_size)?;
        let chunk_blocks = self.chunk_blocks(num_blocks);
        tracing::debug!(num_blocks, chunk_blocks, "encoding batch");
        let mut parity = vec![Bit::Zero; num_blocks * parity_size];
        parity
            .par_chunks_mut(chunk_blocks * parity_size)
            .zip(msg.par_chunks(chunk_blocks * msg_size))
            .for_each(|(parity_chunk, msg_chunk)| {
                let mut inner = vec![Bit::Zero; self.structure.parity_size()];
                for (parity_block, msg_block) in parity_chunk
                    .chunks_exact_mut(parity_size)
                    .zip(msg_chunk.chunks_exact(msg_size))
                {
                    match &self.puncturing {
                        Some(perm) => {
                            self.structure.encode_block(msg_block, &mut inner);
                            perm.permute_block(&inner, parity_block);
                        }
                        None => self.structure.encode_block(msg_block, parity_block),
                    }
                }
            });
        Ok(parity)
    }

    /// Returns decisions on message bits for blocks of transmitted parity bit LLR values.
    ///
    /// # Parameters
    ///
    /// - `parity`: Log-likelihood-ratio (LLR) values of the transmitted parity bits of `N`
    ///   blocks, concatenated, with positive values indicating that `Zero` is more likely.
    ///
    /// # Returns
    ///
    /// - `msg`: Decisions on the message bits of the `N` blocks, concatenated.
    ///
    /// # Errors
    ///
    /// Returns an error if `parity.len()` is not a positive multiple of `self.parity_size()`.
    pub fn decode(&self, parity: &[f64]) -> Result<Vec<Bit>, Error> {
        let msg_size = self.msg_size();
        let parity_size = self.parity_size();
        let num_blocks = num_blocks("parity", parity.len(), parity_size)?;
        let chunk_blocks = self.chunk_blocks(num_blocks);
        tracing::debug!(
            num_blocks,
            chunk_blocks,
            algorithm = %self.structure.decoder_algo(),
            "decoding batch"
        );
        let mut msg = vec![Bit::Zero; num_blocks * msg_size];
        msg.par_chunks_mut(chunk_blocks * msg_size)
            .zip(parity.par_chunks(chunk_blocks * parity_size))
            .for_each(|(msg_chunk, parity_chunk)| {
                let mut decoder = bp_decoder(&self.structure);
                let mut inner = vec![0.0; self.structure.parity_size()];
                for (msg_block, parity_block) in msg_chunk
                    .chunks_exact_mut(msg_size)
                    .zip(parity_chunk.chunks_exact(parity_size))
                {
                    let parity_block = self.inner_llr(parity_block, &mut inner);
                    decoder.decode_block(parity_block, msg_block);
                }
            });
        Ok(msg)
    }

    /// Runs soft-output decoding on blocks of LLR values.
    ///
    /// Every call runs all of its iterations, without stopping early at a codeword. Passing the
    /// `state` output of one call as the `state` input of a second call on the same `parity` and
    /// `syst` inputs continues the message passing where the first call stopped: a call running
    /// iterations `0 .. a` followed by a call with `first_iteration = a` running the remaining
    /// `n - a` iterations gives the same outputs as a single call running `n` iterations.
    ///
    /// # Parameters
    ///
    /// - `input`: Channel LLR values of the transmitted parity bits, with optional a-priori LLR
    ///   values of the systematic bits and optional decoder state, each for `N` blocks.
    ///
    /// - `output`: Selection of the outputs to be produced.
    ///
    /// # Returns
    ///
    /// - `decoded`: Selected outputs for the `N` blocks, concatenated.
    ///
    /// # Errors
    ///
    /// Returns an error if `input.parity.len()` is not a positive multiple of
    /// `self.parity_size()`, or if `input.syst` or `input.state` does not hold the same number of
    /// blocks.
    ///
    /// # Examples
    ///
    /// ```
    /// use ldpc_codec::{gallager_matrix, DecoderOptions, Ldpc, LdpcStructure, SoInput, SoOutput};
    ///
    /// let h = gallager_matrix(96, 3, 6, Some(0))?;
    /// let structure = LdpcStructure::new(&h, DecoderOptions::default())?;
    /// let codec = Ldpc::new(structure, 0);
    /// let parity_llr = vec![2.0; 2 * codec.parity_size()];
    /// let input = SoInput {
    ///     parity: &parity_llr,
    ///     ..SoInput::default()
    /// };
    /// let decoded = codec.so_decode(&input, &SoOutput::all())?;
    /// assert_eq!(decoded.msg.map(|msg| msg.len()), Some(2 * codec.msg_size()));
    /// assert_eq!(decoded.state.map(|state| state.len()), Some(2 * codec.state_size()));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn so_decode(&self, input: &SoInput<'_>, output: &SoOutput) -> Result<SoDecoded, Error> {
        let num_blocks = num_blocks("parity", input.parity.len(), self.parity_size())?;
        if let Some(syst) = input.syst {
            check_len("systematic", syst.len(), num_blocks * self.syst_size())?;
        }
        if let Some(state) = input.state {
            check_len("state", state.len(), num_blocks * self.state_size())?;
        }
        let first = input.first_iteration as usize;
        let count = input.iterations.unwrap_or(self.structure.iterations()) as usize;
        let iterations = first .. first + count;
        let chunk_blocks = self.chunk_blocks(num_blocks);
        tracing::debug!(
            num_blocks,
            chunk_blocks,
            ?iterations,
            algorithm = %self.structure.decoder_algo(),
            "soft-output decoding batch"
        );
        let chunks: Vec<SoDecoded> = (0 .. num_blocks.div_ceil(chunk_blocks))
            .into_par_iter()
            .map(|c| {
                let blocks = c * chunk_blocks .. num_blocks.min((c + 1) * chunk_blocks);
                self.so_decode_chunk(input, output, blocks, iterations.clone())
            })
            .collect();
        let mut decoded = SoDecoded::new(output);
        for chunk in chunks {
            decoded.append(chunk);
        }
        Ok(decoded)
    }

    /// Returns `true` if every block of parity bits satisfies all parity checks.
    ///
    /// # Parameters
    ///
    /// - `parity`: Unpunctured parity bits of `N` blocks, concatenated.
    ///
    /// # Errors
    ///
    /// Returns an error if `parity.len()` is not a positive multiple of the unpunctured block
    /// size `self.structure().parity_size()`.
    pub fn check(&self, parity: &[Bit]) -> Result<bool, Error> {
        let parity_size = self.structure.parity_size();
        let num_blocks = num_blocks("parity", parity.len(), parity_size)?;
        let chunk_blocks = self.chunk_blocks(num_blocks);
        Ok(parity
            .par_chunks(chunk_blocks * parity_size)
            .all(|chunk| {
                chunk
                    .chunks_exact(parity_size)
                    .all(|block| self.structure.is_codeword(block))
            }))
    }

    /// Runs soft-output decoding on a range of blocks.
    fn so_decode_chunk(
        &self,
        input: &SoInput<'_>,
        output: &SoOutput,
        blocks: Range<usize>,
        iterations: Range<usize>,
    ) -> SoDecoded {
        let msg_size = self.msg_size();
        let syst_size = self.syst_size();
        let parity_size = self.parity_size();
        let state_size = self.state_size();
        let mut decoder = bp_decoder(&self.structure);
        let mut inner = vec![0.0; self.structure.parity_size()];
        let mut decoded = SoDecoded::new(output);
        for k in blocks {
            let parity = self.inner_llr(
                &input.parity[k * parity_size .. (k + 1) * parity_size],
                &mut inner,
            );
            let syst = input
                .syst
                .map(|syst| &syst[k * syst_size .. (k + 1) * syst_size]);
            let state = input
                .state
                .map(|state| &state[k * state_size .. (k + 1) * state_size]);
            decoder.so_decode_block(parity, syst, state, iterations.clone());
            if let Some(msg) = &mut decoded.msg {
                let start = msg.len();
                msg.resize(start + msg_size, 0.0);
                decoder.write_msg(&mut msg[start ..]);
            }
            if let Some(syst) = &mut decoded.syst {
                syst.extend_from_slice(&decoder.extrinsic()[.. syst_size]);
            }
            if let Some(parity) = &mut decoded.parity {
                let extrinsic = decoder.extrinsic();
                match &self.puncturing {
                    Some(perm) => parity.extend(perm.indices().iter().map(|&i| extrinsic[i])),
                    None => parity.extend_from_slice(extrinsic),
                }
            }
            if let Some(state) = &mut decoded.state {
                state.extend_from_slice(decoder.state());
            }
        }
        decoded
    }

    /// Returns LLR values of all parity bits of a block, with erasures for punctured bits.
    fn inner_llr<'b>(&self, parity: &'b [f64], inner: &'b mut [f64]) -> &'b [f64] {
        match &self.puncturing {
            Some(perm) => {
                perm.de_permute_block(parity, inner);
                inner
            }
            None => parity,
        }
    }

    /// Returns number of blocks per parallel chunk.
    fn chunk_blocks(&self, num_blocks: usize) -> usize {
        let available = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
        let requested = if self.work_group_size == 0 {
            available
        } else {
            self.work_group_size
        };
        let workers = requested.min(available).min(num_blocks).max(1);
        num_blocks.div_ceil(workers)
    }
}

/// Returns number of blocks in a sequence, or an error if its length is not a positive multiple
/// of the block size.
fn num_blocks(what: &'static str, len: usize, block_size: usize) -> Result<usize, Error> {
    if len == 0 || len % block_size != 0 {
        return Err(Error::SizeMismatch {
            what,
            expected: block_size * (len / block_size).max(1),
            found: len,
        });
    }
    Ok(len / block_size)
}

#[cfg(test)]
mod tests_of_ldpc {
    use float_eq::assert_float_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::{gallager_matrix, utils, DecoderAlgo};

    fn codec_for_test(iterations: u32, algo: DecoderAlgo, work_group_size: usize) -> Ldpc {
        let h = gallager_matrix(120, 3, 6, Some(7)).unwrap();
        let structure = LdpcStructure::new(&h, DecoderOptions::new(iterations, algo)).unwrap();
        Ldpc::new(structure, work_group_size)
    }

    fn noisy_batch(codec: &Ldpc, num_blocks: usize, es_over_n0_db: f64) -> (Vec<Bit>, Vec<f64>) {
        let mut rng = StdRng::seed_from_u64(11);
        let msg = utils::random_bits(num_blocks * codec.msg_size(), &mut rng);
        let parity = codec.encode(&msg).unwrap();
        let parity_llr = utils::bpsk_awgn_channel(&parity, es_over_n0_db, &mut rng);
        (msg, parity_llr)
    }

    #[test]
    fn test_new() {
        let mut codec = codec_for_test(20, DecoderAlgo::Exact, 2);
        assert_eq!(codec.parity_size(), 120);
        assert_eq!(codec.syst_size(), codec.msg_size());
        assert_eq!(codec.state_size(), 360);
        assert_eq!(codec.work_group_size(), 2);
        assert!(codec.puncturing().is_none());
        codec.set_work_group_size(0);
        assert_eq!(codec.work_group_size(), 0);
        assert!(codec
            .set_decoder_options(DecoderOptions::new(5, DecoderAlgo::Linear))
            .is_ok());
        assert_eq!(codec.structure().iterations(), 5);
    }

    #[test]
    fn test_with_puncturing() {
        let structure = codec_for_test(20, DecoderAlgo::Exact, 1).structure;
        // Invalid input
        let options = PunctureOptions {
            mask: vec![false],
            syst_mask: vec![false],
        };
        assert!(Ldpc::with_puncturing(structure.clone(), &options, 1).is_err());
        // Valid input
        let options = PunctureOptions {
            mask: vec![true, true, false],
            syst_mask: vec![],
        };
        let codec = Ldpc::with_puncturing(structure, &options, 1).unwrap();
        assert_eq!(codec.parity_size(), 80);
        assert_eq!(codec.puncturing().map(Permutation::input_size), Some(120));
    }

    #[test]
    fn test_encode() {
        let codec = codec_for_test(20, DecoderAlgo::Exact, 3);
        let msg_size = codec.msg_size();
        // Invalid input
        assert!(codec.encode(&[]).is_err());
        assert!(codec.encode(&vec![Bit::Zero; msg_size + 1]).is_err());
        // Valid input
        let mut rng = StdRng::seed_from_u64(0);
        let msg = utils::random_bits(5 * msg_size, &mut rng);
        let parity = codec.encode(&msg).unwrap();
        assert_eq!(parity.len(), 5 * 120);
        for (msg_block, parity_block) in msg.chunks(msg_size).zip(parity.chunks(120)) {
            assert_eq!(codec.structure().encode(msg_block).unwrap(), parity_block);
        }
        assert!(codec.check(&parity).unwrap());
    }

    #[test]
    fn test_check() {
        let codec = codec_for_test(20, DecoderAlgo::Exact, 0);
        // Invalid input
        assert!(codec.check(&[Bit::Zero; 119]).is_err());
        // Valid input
        let mut parity = vec![Bit::Zero; 3 * 120];
        assert!(codec.check(&parity).unwrap());
        parity[250] = Bit::One;
        assert!(!codec.check(&parity).unwrap());
    }

    #[test]
    fn test_decode() {
        let codec = codec_for_test(30, DecoderAlgo::Exact, 0);
        // Invalid input
        assert!(codec.decode(&[]).is_err());
        assert!(codec.decode(&[1.0; 121]).is_err());
        // Valid input
        let (msg, parity_llr) = noisy_batch(&codec, 6, 8.0);
        assert_eq!(codec.decode(&parity_llr).unwrap(), msg);
    }

    #[test]
    fn test_decode_zero_iterations() {
        let codec = codec_for_test(0, DecoderAlgo::Approximate, 0);
        let (_, parity_llr) = noisy_batch(&codec, 3, -2.0);
        let msg_hat = codec.decode(&parity_llr).unwrap();
        let expected: Vec<Bit> = parity_llr
            .chunks(120)
            .flat_map(|block| utils::bpsk_slicer(&block[.. codec.msg_size()]))
            .collect();
        assert_eq!(msg_hat, expected);
    }

    #[test]
    fn test_so_decode_invalid_inputs() {
        let codec = codec_for_test(10, DecoderAlgo::Exact, 0);
        let parity = vec![1.0; 2 * codec.parity_size()];
        let syst = vec![0.0; codec.syst_size()];
        let state = vec![0.0; 3 * codec.state_size()];
        let output = SoOutput::all();
        assert!(codec.so_decode(&SoInput::default(), &output).is_err());
        let input = SoInput {
            parity: &parity,
            syst: Some(&syst),
            ..SoInput::default()
        };
        assert!(codec.so_decode(&input, &output).is_err());
        let input = SoInput {
            parity: &parity,
            state: Some(&state),
            ..SoInput::default()
        };
        assert!(codec.so_decode(&input, &output).is_err());
    }

    #[test]
    fn test_so_decode_output_selection() {
        let codec = codec_for_test(10, DecoderAlgo::Linear, 0);
        let (_, parity_llr) = noisy_batch(&codec, 3, 2.0);
        let input = SoInput {
            parity: &parity_llr,
            ..SoInput::default()
        };
        let output = SoOutput {
            msg: true,
            parity: true,
            ..SoOutput::default()
        };
        let decoded = codec.so_decode(&input, &output).unwrap();
        assert_eq!(decoded.msg.map(|x| x.len()), Some(3 * codec.msg_size()));
        assert_eq!(decoded.parity.map(|x| x.len()), Some(3 * 120));
        assert!(decoded.syst.is_none());
        assert!(decoded.state.is_none());
    }

    #[test]
    fn test_so_decode_zero_iterations() {
        let codec = codec_for_test(0, DecoderAlgo::Exact, 0);
        let (_, parity_llr) = noisy_batch(&codec, 2, 0.0);
        let syst = vec![0.5; 2 * codec.syst_size()];
        let input = SoInput {
            parity: &parity_llr,
            syst: Some(&syst),
            ..SoInput::default()
        };
        let decoded = codec.so_decode(&input, &SoOutput::all()).unwrap();
        let expected_msg: Vec<f64> = parity_llr
            .chunks(120)
            .flat_map(|block| block[.. codec.msg_size()].iter().map(|x| x + 0.5))
            .collect();
        assert_float_eq!(decoded.msg.unwrap(), expected_msg, abs_all <= 1e-12);
        assert!(decoded.syst.unwrap().iter().all(|&x| x == 0.0));
        assert!(decoded.parity.unwrap().iter().all(|&x| x == 0.0));
        assert!(decoded.state.unwrap().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_so_decode_agrees_with_decode() {
        let codec = codec_for_test(15, DecoderAlgo::Exact, 0);
        let (msg, parity_llr) = noisy_batch(&codec, 4, 6.0);
        let input = SoInput {
            parity: &parity_llr,
            ..SoInput::default()
        };
        let output = SoOutput {
            msg: true,
            ..SoOutput::default()
        };
        let msg_llr = codec.so_decode(&input, &output).unwrap().msg.unwrap();
        assert_eq!(utils::bpsk_slicer(&msg_llr), msg);
        assert_eq!(codec.decode(&parity_llr).unwrap(), msg);
    }

    #[test]
    fn test_so_decode_iteration_override() {
        let codec = codec_for_test(10, DecoderAlgo::Linear, 0);
        let (_, parity_llr) = noisy_batch(&codec, 2, 2.0);
        let input = SoInput {
            parity: &parity_llr,
            ..SoInput::default()
        };
        let mut fewer = codec.clone();
        fewer
            .set_decoder_options(DecoderOptions::new(4, DecoderAlgo::Linear))
            .unwrap();
        let expected = fewer.so_decode(&input, &SoOutput::all()).unwrap();
        let input = SoInput {
            iterations: Some(4),
            ..input
        };
        assert_eq!(codec.so_decode(&input, &SoOutput::all()).unwrap(), expected);
        // No iterations
        let input = SoInput {
            iterations: Some(0),
            ..input
        };
        let decoded = codec.so_decode(&input, &SoOutput::all()).unwrap();
        assert!(decoded.parity.unwrap().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_work_group_size_determinism() {
        let mut codec = codec_for_test(12, DecoderAlgo::Linear, 1);
        let (_, parity_llr) = noisy_batch(&codec, 7, 0.5);
        let input = SoInput {
            parity: &parity_llr,
            ..SoInput::default()
        };
        let reference_msg = codec.decode(&parity_llr).unwrap();
        let reference = codec.so_decode(&input, &SoOutput::all()).unwrap();
        for work_group_size in [0, 2, 3, 7, 16] {
            codec.set_work_group_size(work_group_size);
            assert_eq!(codec.decode(&parity_llr).unwrap(), reference_msg);
            assert_eq!(codec.so_decode(&input, &SoOutput::all()).unwrap(), reference);
        }
    }

    #[test]
    fn test_punctured_codec() {
        let structure = codec_for_test(30, DecoderAlgo::Exact, 0).structure;
        let options = PunctureOptions {
            mask: vec![true, true, true, false],
            syst_mask: vec![true],
        };
        let punctured = Ldpc::with_puncturing(structure.clone(), &options, 0).unwrap();
        let full = Ldpc::new(structure, 0);
        let mut rng = StdRng::seed_from_u64(3);
        let msg = utils::random_bits(2 * full.msg_size(), &mut rng);
        let parity = punctured.encode(&msg).unwrap();
        let full_parity = full.encode(&msg).unwrap();
        let perm = punctured.puncturing().unwrap();
        let mut expected = Vec::new();
        for block in full_parity.chunks(full.parity_size()) {
            let mut outer = Vec::new();
            perm.permute(block, &mut outer).unwrap();
            expected.extend(outer);
        }
        assert_eq!(parity, expected);
        let parity_llr: Vec<f64> = parity
            .iter()
            .map(|&b| if b == Bit::Zero { 6.0 } else { -6.0 })
            .collect();
        assert_eq!(punctured.decode(&parity_llr).unwrap(), msg);
        let input = SoInput {
            parity: &parity_llr,
            ..SoInput::default()
        };
        let decoded = punctured.so_decode(&input, &SoOutput::all()).unwrap();
        assert_eq!(decoded.parity.map(|x| x.len()), Some(parity.len()));
    }
}
