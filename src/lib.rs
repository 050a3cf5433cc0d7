//! This crate implements encoding and decoding functionality for low-density parity-check (LDPC)
//! codes. A code is defined by a sparse parity-check matrix, from which a systematic encoder is
//! derived by reordering the columns and rows of the matrix into a mostly triangular form. The
//! decoder is based on belief propagation (BP) between the bit and check nodes of the code's
//! Tanner graph, with a choice of exact or approximate box-plus operators at the check nodes.
//!
//! The [`Ldpc`] codec processes batches of blocks in parallel, optionally punctures the
//! transmitted parity bits, and offers a soft-output decoding interface whose state can be carried
//! from one call to the next. The [`utils`] and [`sim`] modules help evaluate code performance
//! over a BPSK-AWGN channel.
//!
//! # Examples
//!
//! ```
//! use ldpc_codec::{gallager_matrix, Bit, DecoderAlgo, DecoderOptions, LdpcStructure};
//!
//! let h = gallager_matrix(2048, 3, 5, Some(0))?;
//! let structure = LdpcStructure::new(&h, DecoderOptions::new(30, DecoderAlgo::Exact))?;
//! let msg = vec![Bit::One; structure.msg_size()];
//! let parity = structure.encode(&msg)?;
//! assert!(structure.check(&parity)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

mod bit_matrix;
mod box_sum;
mod bp;
mod codec;
mod common;
mod gallager;
mod permutation;
pub mod sim;
mod structure;
pub mod utils;

pub use bit_matrix::SparseBitMatrix;
pub use codec::{Ldpc, SoDecoded, SoInput, SoOutput};
pub use common::{Bit, Error};
pub use gallager::gallager_matrix;
pub use permutation::Permutation;
pub use structure::{DecoderAlgo, DecoderOptions, LdpcStructure, PunctureOptions, ScalingFactor};
