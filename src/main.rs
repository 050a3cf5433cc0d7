//! This crate simulates the BER-versus-SNR and BLER-versus-SNR performance of regular Gallager
//! LDPC codes with belief-propagation decoding over a BPSK-AWGN channel. Simulation parameters are
//! specified on the command line, and simulation results are saved to a JSON file.
//!
//! Build the executable with `cargo build --release` and then run `./target/release/ldpc_codec -h`
//! for help on the command-line interface. Progress is logged to standard error; set `RUST_LOG`
//! (for example `RUST_LOG=ldpc_codec=info`) to choose the level of detail.

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

use anyhow::Result;
use clap::parser::ValueSource;
use clap::{crate_name, crate_version, value_parser, Arg, ArgMatches, Command};
use ldpc_codec::sim::{self, SimParams};
use ldpc_codec::{DecoderAlgo, DecoderOptions, ScalingFactor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Main function
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let timer = Instant::now();
    let matches = command_line_parser().get_matches();
    let mut rng = match channel_seed_from_matches(&matches) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let json_filename = &json_filename_from_matches(&matches);
    sim::run_bpsk_awgn_sims(&all_sim_params(&matches), &mut rng, json_filename)?;
    eprintln!("Elapsed time: {:.3?}", timer.elapsed());
    Ok(())
}

/// Returns command line parser.
fn command_line_parser() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about("Evaluates the performance of Gallager LDPC codes over a BPSK-AWGN channel")
        .arg(code_length())
        .arg(column_weight())
        .arg(row_weight())
        .arg(matrix_seed())
        .arg(decoder_algo_name())
        .arg(num_bp_iter())
        .arg(scaling_factor())
        .arg(first_snr_db())
        .arg(snr_step_db())
        .arg(num_snr())
        .arg(num_block_errors_min())
        .arg(num_blocks_per_run())
        .arg(num_runs_min())
        .arg(num_runs_max())
        .arg(channel_seed())
        .arg(json_filename())
}

/// Returns argument for codeword length.
fn code_length() -> Arg {
    Arg::new("code_length")
        .short('l')
        .value_parser(value_parser!(usize))
        .default_value("1200")
        .help("Codeword length")
}

/// Returns argument for column weight of the parity-check matrix.
fn column_weight() -> Arg {
    Arg::new("column_weight")
        .short('c')
        .value_parser(value_parser!(usize))
        .default_value("3")
        .help("Column weight of the parity-check matrix")
}

/// Returns argument for row weight of the parity-check matrix.
fn row_weight() -> Arg {
    Arg::new("row_weight")
        .short('w')
        .value_parser(value_parser!(usize))
        .default_value("6")
        .help("Row weight of the parity-check matrix")
}

/// Returns argument for seed of the parity-check matrix.
fn matrix_seed() -> Arg {
    Arg::new("matrix_seed")
        .short('m')
        .value_parser(value_parser!(u64))
        .default_value("0")
        .help("Seed for the random parity-check matrix")
}

/// Returns argument for decoding algorithm name.
fn decoder_algo_name() -> Arg {
    Arg::new("decoder_algo_name")
        .short('a')
        .value_parser(["Exact", "Linear", "Approximate"])
        .default_value("Exact")
        .help("Decoding algorithm name")
}

/// Returns argument for number of BP iterations.
fn num_bp_iter() -> Arg {
    Arg::new("num_bp_iter")
        .short('t')
        .value_parser(value_parser!(u32))
        .default_value("50")
        .help("Number of belief-propagation iterations")
}

/// Returns argument for scaling factor of check-node outputs.
fn scaling_factor() -> Arg {
    Arg::new("scaling_factor")
        .short('k')
        .value_parser(value_parser!(f64))
        .default_value("1.0")
        .help("Scaling factor for check-node outputs")
}

/// Returns argument for first Es/N0 (dB).
fn first_snr_db() -> Arg {
    Arg::new("first_snr_db")
        .short('r')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("0.0")
        .help("First Es/N0 (dB)")
}

/// Returns argument for Es/N0 step (dB).
fn snr_step_db() -> Arg {
    Arg::new("snr_step_db")
        .short('p')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("0.5")
        .help("Es/N0 step (dB)")
}

/// Returns argument for number of Es/N0 values.
fn num_snr() -> Arg {
    Arg::new("num_snr")
        .short('s')
        .value_parser(value_parser!(u32))
        .default_value("4")
        .help("Number of Es/N0 values")
}

/// Returns argument for desired minimum number of block errors.
fn num_block_errors_min() -> Arg {
    Arg::new("num_block_errors_min")
        .short('e')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Desired minimum number of block errors")
}

/// Returns argument for number of blocks to be transmitted per run.
fn num_blocks_per_run() -> Arg {
    Arg::new("num_blocks_per_run")
        .short('b')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Number of blocks to be transmitted per run")
}

/// Returns argument for minimum number of runs of blocks to be simulated.
fn num_runs_min() -> Arg {
    Arg::new("num_runs_min")
        .short('n')
        .value_parser(value_parser!(u32))
        .default_value("10")
        .help("Minimum number of runs of blocks to be simulated")
}

/// Returns argument for maximum number of runs of blocks to be simulated.
fn num_runs_max() -> Arg {
    Arg::new("num_runs_max")
        .short('x')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Maximum number of runs of blocks to be simulated")
}

/// Returns argument for seed of the channel noise and message bits.
fn channel_seed() -> Arg {
    Arg::new("channel_seed")
        .short('z')
        .value_parser(value_parser!(u64))
        .help("Seed for message bits and channel noise (random if absent)")
}

/// Returns argument for name of JSON file to which results must be saved.
fn json_filename() -> Arg {
    Arg::new("json_filename")
        .short('f')
        .default_value("results.json")
        .help("Name of JSON file to which results must be saved")
}

/// Returns simulation parameters based on command-line arguments.
fn all_sim_params(matches: &ArgMatches) -> Vec<SimParams> {
    let mut num_runs_min = num_runs_min_from_matches(matches);
    let mut num_runs_max = num_runs_max_from_matches(matches);
    if num_runs_min > num_runs_max {
        if let Some(ValueSource::DefaultValue) = matches.value_source("num_runs_min") {
            num_runs_min = num_runs_max;
        }
        if let Some(ValueSource::DefaultValue) = matches.value_source("num_runs_max") {
            num_runs_max = num_runs_min;
        }
    }
    let (n, column_weight, row_weight) = code_params_from_matches(matches);
    let mut all_params = Vec::new();
    for es_over_n0_db in all_es_over_n0_db_from_matches(matches) {
        all_params.push(SimParams {
            n,
            column_weight,
            row_weight,
            seed: matrix_seed_from_matches(matches),
            decoder_options: decoder_options_from_matches(matches),
            es_over_n0_db,
            num_block_errors_min: num_block_errors_min_from_matches(matches),
            num_blocks_per_run: num_blocks_per_run_from_matches(matches),
            num_runs_min,
            num_runs_max,
        });
    }
    // OK to unwrap: All command-line arguments used above have default values, so an error
    // cannot occur in any of the associated functions called above.
    all_params
}

/// Returns codeword length, column weight and row weight.
fn code_params_from_matches(matches: &ArgMatches) -> (usize, usize, usize) {
    (
        *matches.get_one("code_length").unwrap(),
        *matches.get_one("column_weight").unwrap(),
        *matches.get_one("row_weight").unwrap(),
    )
}

/// Returns seed of the parity-check matrix.
fn matrix_seed_from_matches(matches: &ArgMatches) -> u64 {
    *matches.get_one("matrix_seed").unwrap()
}

/// Returns decoder configuration.
fn decoder_options_from_matches(matches: &ArgMatches) -> DecoderOptions {
    let num_bp_iter = *matches.get_one("num_bp_iter").unwrap();
    let scaling_factor = *matches.get_one("scaling_factor").unwrap();
    let algorithm = match matches
        .get_one::<String>("decoder_algo_name")
        .unwrap()
        .as_str()
    {
        "Exact" => DecoderAlgo::Exact,
        "Linear" => DecoderAlgo::Linear,
        "Approximate" => DecoderAlgo::Approximate,
        _ => panic!("Invalid decoding algorithm name"),
    };
    DecoderOptions::new(num_bp_iter, algorithm)
        .with_scaling(ScalingFactor::constant(scaling_factor))
}

/// Returns all Es/N0 (dB) values.
fn all_es_over_n0_db_from_matches(matches: &ArgMatches) -> Vec<f64> {
    let first_snr_db: f64 = *matches.get_one("first_snr_db").unwrap();
    let snr_step_db: f64 = *matches.get_one("snr_step_db").unwrap();
    let num_snr: u32 = *matches.get_one("num_snr").unwrap();
    (0 .. num_snr)
        .map(|n| first_snr_db + snr_step_db * f64::from(n))
        .collect()
}

/// Returns desired minimum number of block errors.
fn num_block_errors_min_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_block_errors_min").unwrap()
}

/// Returns number of blocks to be transmitted per run.
fn num_blocks_per_run_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_blocks_per_run").unwrap()
}

/// Returns minimum number of runs of blocks to be simulated.
fn num_runs_min_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_runs_min").unwrap()
}

/// Returns maximum number of runs of blocks to be simulated.
fn num_runs_max_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_runs_max").unwrap()
}

/// Returns seed of the message bits and channel noise, if given.
fn channel_seed_from_matches(matches: &ArgMatches) -> Option<u64> {
    matches.get_one("channel_seed").copied()
}

/// Returns name of JSON file to which simulation results must be saved.
fn json_filename_from_matches(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("json_filename")
        .unwrap()
        .to_string()
}
