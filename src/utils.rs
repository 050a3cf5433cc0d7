//! # Channel and error-counting helpers for LDPC simulations
//!
//! These functions produce the inputs and score the outputs of an [`Ldpc`](crate::Ldpc) codec
//! over a BPSK-AWGN channel. [`random_bits`] draws message bits for a batch of blocks, and
//! [`bpsk_awgn_channel`] maps transmitted parity bits to channel LLR values in the sign
//! convention used by the decoders (`Zero` is sent as `+1.0` and positive LLR values favour
//! `Zero`). [`bpsk_slicer`] turns soft-output LLR values back into bits with the same tie rule as
//! the decoders, and [`error_count`] compares decoded bits against the transmitted ones.
//!
//! Every random draw comes from a generator passed in by the caller. The simulator seeds one
//! [`StdRng`](rand::rngs::StdRng) per Es/N0 point, which keeps results reproducible when the
//! points run in parallel.
//!
//! # Examples
//!
//! ```
//! use ldpc_codec::{gallager_matrix, utils, DecoderOptions, Ldpc, LdpcStructure};
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let h = gallager_matrix(120, 3, 6, Some(1))?;
//! let codec = Ldpc::new(LdpcStructure::new(&h, DecoderOptions::default())?, 0);
//! let msg = utils::random_bits(4 * codec.msg_size(), &mut rng);
//! let parity_llr = utils::bpsk_awgn_channel(&codec.encode(&msg)?, 1.0, &mut rng);
//! let raw_errors = utils::error_count(&utils::bpsk_slicer(&parity_llr), &codec.encode(&msg)?);
//! let msg_errors = utils::error_count(&codec.decode(&parity_llr)?, &msg);
//! println!("{raw_errors} channel bit errors, {msg_errors} message bit errors");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use rand::Rng;
use rand_distr::StandardNormal;

use crate::Bit;

/// Returns given number of random bits.
///
/// # Parameters
///
/// - `num_bits`: Number of random bits to be generated.
///
/// - `rng`: Random number generator to be used.
///
/// # Returns
///
/// - `bits`: Random bits.
#[must_use]
pub fn random_bits<R: Rng + ?Sized>(num_bits: usize, rng: &mut R) -> Vec<Bit> {
    (0 .. num_bits)
        .map(|_| {
            if rng.random_bool(0.5) {
                Bit::One
            } else {
                Bit::Zero
            }
        })
        .collect()
}

/// Returns LLR values at BPSK-AWGN channel output corresponding to given input bits.
///
/// # Parameters
///
/// - `bits`: Bits to be transmitted over the BPSK-AWGN channel.
///
/// - `es_over_n0_db`: Ratio (dB) of symbol energy to noise power spectral density at the BPSK-AWGN
///   channel output (if the BPSK symbols are `+1.0` and `-1.0`, then the noise variance is
///   `0.5 / 10f64.powf(0.1 * es_over_n0_db)`).
///
/// - `rng`: Random number generator to be used.
///
/// # Returns
///
/// - `bits_llr`: Log-likelihood-ratio (LLR) values at the BPSK-AWGN channel output corresponding
///   to the transmitted bits, with positive values indicating that `Zero` is more likely.
#[must_use]
pub fn bpsk_awgn_channel<R: Rng + ?Sized>(
    bits: &[Bit],
    es_over_n0_db: f64,
    rng: &mut R,
) -> Vec<f64> {
    let es_over_n0 = 10f64.powf(0.1 * es_over_n0_db);
    let noise_std = (0.5 / es_over_n0).sqrt();
    bits.iter()
        .map(|b| match b {
            Bit::Zero => 1f64,
            Bit::One => -1f64,
        })
        .map(|x| 4.0 * es_over_n0 * (x + noise_std * rng.sample::<f64, _>(StandardNormal)))
        .collect()
}

/// Returns BPSK slicer output.
///
/// # Parameters
///
/// - `syms`: Symbols to be sliced. Nonnegative values are mapped to `Zero`, and negative values to
///   `One`.
///
/// # Returns
///
/// - `bits_hat`: Bits obtained by slicing the given symbols.
#[must_use]
pub fn bpsk_slicer(syms: &[f64]) -> Vec<Bit> {
    syms.iter().map(|&x| Bit::from_llr(x)).collect()
}

/// Returns number of errors in a sequence with respect to a reference sequence.
///
/// # Parameters
///
/// - `seq`: Sequence in which errors must be counted.
///
/// - `ref_seq`: Reference sequence to which the given sequence is compared.
///
/// # Returns
///
/// - `err_count`: Number of positions in which the two sequences differ. If they are of different
///   lengths, then the longer sequence is effectively truncated to the length of the shorter one.
pub fn error_count<T: PartialEq>(seq: &[T], ref_seq: &[T]) -> usize {
    ref_seq
        .iter()
        .zip(seq.iter())
        .filter(|&(x, y)| x != y)
        .count()
}
