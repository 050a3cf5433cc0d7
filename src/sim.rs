//! Simulator to evaluate performance of Gallager LDPC codes over BPSK-AWGN channel
//!
//! Each [`SimParams`] value describes one code, one decoder configuration and one Es/N0 point.
//! Points are simulated in parallel, each with its own random number generator seeded from the
//! caller's generator, and the results of all points are saved to a JSON file.
//!
//! # Examples
//!
//! ```no_run
//! use ldpc_codec::sim::{run_bpsk_awgn_sims, SimParams};
//! use ldpc_codec::{DecoderAlgo, DecoderOptions};
//!
//! let all_params: Vec<SimParams> = [1.0, 1.5, 2.0]
//!     .into_iter()
//!     .map(|es_over_n0_db| SimParams {
//!         n: 1200,
//!         column_weight: 3,
//!         row_weight: 6,
//!         seed: 0,
//!         decoder_options: DecoderOptions::new(30, DecoderAlgo::Linear),
//!         es_over_n0_db,
//!         num_block_errors_min: 50,
//!         num_blocks_per_run: 100,
//!         num_runs_min: 1,
//!         num_runs_max: 20,
//!     })
//!     .collect();
//! run_bpsk_awgn_sims(&all_params, &mut rand::rng(), "results.json")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::BTreeMap;

use itertools::izip;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{gallager_matrix, utils, DecoderOptions, Error, Ldpc, LdpcStructure};

/// Parameters for LDPC code simulation over BPSK-AWGN channel
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct SimParams {
    /// Codeword length of the Gallager code
    pub n: usize,
    /// Column weight of the Gallager parity-check matrix
    pub column_weight: usize,
    /// Row weight of the Gallager parity-check matrix
    pub row_weight: usize,
    /// Seed for the Gallager parity-check matrix
    pub seed: u64,
    /// Decoder configuration
    pub decoder_options: DecoderOptions,
    /// Ratio (dB) of symbol energy to noise power spectral density at BPSK-AWGN channel output
    pub es_over_n0_db: f64,
    /// Desired minimum number of block errors
    pub num_block_errors_min: u32,
    /// Number of blocks to be transmitted per run
    pub num_blocks_per_run: u32,
    /// Minimum number of runs of blocks to be simulated
    pub num_runs_min: u32,
    /// Maximum number of runs of blocks to be simulated
    pub num_runs_max: u32,
}

impl SimParams {
    /// Returns parameters identifying the parity-check matrix.
    fn code_key(&self) -> (usize, usize, usize, u64) {
        (self.n, self.column_weight, self.row_weight, self.seed)
    }
}

/// Results from LDPC code simulation over BPSK-AWGN channel
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct SimResults {
    /// Simulation parameters
    pub params: SimParams,
    /// Number of blocks transmitted
    pub num_blocks: u32,
    /// Number of message bits transmitted
    pub num_info_bits: u64,
    /// Number of message bit errors
    pub num_info_bit_errors: u64,
    /// Number of block errors
    pub num_block_errors: u32,
}

impl SimResults {
    /// Returns initialized simulation results.
    #[must_use]
    pub fn new(params: &SimParams) -> Self {
        Self {
            params: params.clone(),
            num_blocks: 0,
            num_info_bits: 0,
            num_info_bit_errors: 0,
            num_block_errors: 0,
        }
    }

    /// Returns bit error rate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ber(&self) -> f64 {
        if self.num_info_bits > 0 {
            self.num_info_bit_errors as f64 / self.num_info_bits as f64
        } else {
            0.0
        }
    }

    /// Returns block error rate.
    #[must_use]
    pub fn bler(&self) -> f64 {
        if self.num_blocks > 0 {
            f64::from(self.num_block_errors) / f64::from(self.num_blocks)
        } else {
            0.0
        }
    }

    /// Returns `true` iff a run of blocks is now complete.
    #[must_use]
    pub fn run_complete(&self) -> bool {
        self.num_blocks % self.params.num_blocks_per_run == 0
    }

    /// Returns `true` iff the simulation is now complete.
    #[must_use]
    pub fn sim_complete(&self) -> bool {
        let num_runs = self.num_blocks / self.params.num_blocks_per_run;
        self.run_complete()
            && num_runs >= self.params.num_runs_min
            && (self.num_block_errors >= self.params.num_block_errors_min
                || num_runs >= self.params.num_runs_max)
    }

    /// Updates simulation results after a block.
    ///
    /// # Parameters
    ///
    /// - `num_info_bits`: Number of message bits in the block.
    ///
    /// - `num_info_bit_errors`: Number of message bit errors in the block.
    pub fn update_after_block(&mut self, num_info_bits: usize, num_info_bit_errors: usize) {
        self.num_blocks += 1;
        self.num_info_bits += num_info_bits as u64;
        if num_info_bit_errors > 0 {
            self.num_info_bit_errors += num_info_bit_errors as u64;
            self.num_block_errors += 1;
        }
    }
}

/// Runs simulations of Gallager LDPC codes over a BPSK-AWGN channel and saves results to a JSON
/// file.
///
/// # Parameters
///
/// - `all_params`: Parameters for each simulation point. Points sharing the same code parameters
///   share one parity-check matrix.
///
/// - `rng`: Random number generator used to seed each simulation point.
///
/// - `json_filename`: Name of the JSON file to which the results are saved.
///
/// # Errors
///
/// Returns an error if any simulation parameters are invalid, if a code cannot be constructed, or
/// if the results cannot be saved.
pub fn run_bpsk_awgn_sims<R: Rng + ?Sized>(
    all_params: &[SimParams],
    rng: &mut R,
    json_filename: &str,
) -> Result<(), Error> {
    for params in all_params {
        check_sim_params(params)?;
    }
    let mut structures: BTreeMap<(usize, usize, usize, u64), LdpcStructure> = BTreeMap::new();
    for params in all_params {
        if !structures.contains_key(&params.code_key()) {
            let h = gallager_matrix(
                params.n,
                params.column_weight,
                params.row_weight,
                Some(params.seed),
            )?;
            let structure = LdpcStructure::new(&h, params.decoder_options.clone())?;
            structures.insert(params.code_key(), structure);
        }
    }
    let seeds: Vec<u64> = all_params.iter().map(|_| rng.random()).collect();
    let all_results = all_params
        .par_iter()
        .zip(&seeds)
        .map(|(params, &seed)| {
            let mut structure = structures[&params.code_key()].clone();
            structure.set_decoder_options(params.decoder_options.clone())?;
            let codec = Ldpc::new(structure, 0);
            run_bpsk_awgn_sim(params, &codec, &mut StdRng::seed_from_u64(seed))
        })
        .collect::<Result<Vec<SimResults>, Error>>()?;
    save_all_sim_results_to_file(&all_results, json_filename)
}

/// Returns results of the simulation of one code at one Es/N0 point.
fn run_bpsk_awgn_sim(
    params: &SimParams,
    codec: &Ldpc,
    rng: &mut StdRng,
) -> Result<SimResults, Error> {
    let msg_size = codec.msg_size();
    let num_blocks = params.num_blocks_per_run as usize;
    let mut results = SimResults::new(params);
    tracing::info!(
        n = params.n,
        msg_size,
        algorithm = %params.decoder_options.algorithm,
        iterations = params.decoder_options.iterations,
        es_over_n0_db = params.es_over_n0_db,
        "starting simulation"
    );
    while !results.sim_complete() {
        let msg = utils::random_bits(num_blocks * msg_size, rng);
        let parity = codec.encode(&msg)?;
        let parity_llr = utils::bpsk_awgn_channel(&parity, params.es_over_n0_db, rng);
        let msg_hat = codec.decode(&parity_llr)?;
        for (block, block_hat) in izip!(msg.chunks_exact(msg_size), msg_hat.chunks_exact(msg_size))
        {
            results.update_after_block(msg_size, utils::error_count(block_hat, block));
        }
        tracing::debug!(
            es_over_n0_db = params.es_over_n0_db,
            num_blocks = results.num_blocks,
            num_block_errors = results.num_block_errors,
            "run complete"
        );
    }
    tracing::info!(
        es_over_n0_db = params.es_over_n0_db,
        num_blocks = results.num_blocks,
        ber = results.ber(),
        bler = results.bler(),
        "simulation complete"
    );
    Ok(results)
}

/// Saves all simulation results to a JSON file.
fn save_all_sim_results_to_file(
    all_results: &[SimResults],
    json_filename: &str,
) -> Result<(), Error> {
    std::fs::write(json_filename, serde_json::to_string_pretty(all_results)?)?;
    Ok(())
}

/// Checks validity of simulation parameters.
fn check_sim_params(params: &SimParams) -> Result<(), Error> {
    if params.num_blocks_per_run == 0 {
        return Err(Error::InvalidInput(
            "Number of blocks per run cannot be zero".to_string(),
        ));
    }
    if params.num_runs_min > params.num_runs_max {
        return Err(Error::InvalidInput(format!(
            "Minimum number of runs ({}) exceeds maximum number of runs ({})",
            params.num_runs_min, params.num_runs_max
        )));
    }
    Ok(())
}
