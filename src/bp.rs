//! Belief-propagation decoder operating on the Tanner graph of an LDPC code
//!
//! Messages live on the edges of the graph, one per `1` entry of the parity-check matrix, in
//! row-major order. Check updates scan the edges of a check forward and backward so that each
//! outgoing message combines all other incoming messages in `O(degree)` work; bit updates do the
//! same for the edges meeting at a bit with two passes over the edge list.

use std::ops::Range;

use itertools::izip;

use crate::box_sum::{BoxSum, ExactBoxSum, LinearBoxSum, MinBoxSum};
use crate::{Bit, DecoderAlgo, LdpcStructure};

/// Block decoder interface shared by all box-plus variants
pub(crate) trait BlockDecoder {
    /// Writes hard decisions on the message bits for a block of parity LLR values.
    fn decode_block(&mut self, parity: &[f64], msg: &mut [Bit]);

    /// Runs soft-output decoding on a block over a range of iterations of the scaling schedule,
    /// with no early stop. Results are read back with [`BlockDecoder::extrinsic`],
    /// [`BlockDecoder::state`] and [`BlockDecoder::write_msg`].
    fn so_decode_block(
        &mut self,
        parity: &[f64],
        syst: Option<&[f64]>,
        state: Option<&[f64]>,
        iterations: Range<usize>,
    );

    /// Returns extrinsic LLR value for each parity bit from the last soft-output decoding.
    fn extrinsic(&self) -> &[f64];

    /// Returns check-to-bit messages from the last soft-output decoding.
    fn state(&self) -> &[f64];

    /// Writes a-posteriori LLR values of the message bits from the last soft-output decoding.
    fn write_msg(&self, msg: &mut [f64]);
}

/// Returns decoder for the algorithm configured in a structure.
pub(crate) fn bp_decoder(structure: &LdpcStructure) -> Box<dyn BlockDecoder + '_> {
    match structure.decoder_algo() {
        DecoderAlgo::Exact => Box::new(BpDecoder::new(structure, ExactBoxSum)),
        DecoderAlgo::Linear => Box::new(BpDecoder::new(structure, LinearBoxSum::default())),
        DecoderAlgo::Approximate => Box::new(BpDecoder::new(structure, MinBoxSum)),
    }
}

/// Belief-propagation decoder with scratch buffers reused across blocks
#[derive(Debug)]
pub(crate) struct BpDecoder<'a, B: BoxSum> {
    /// Code structure
    structure: &'a LdpcStructure,
    /// Check-node combination operator
    box_sum: B,
    /// Bit index of each edge
    edge_bits: Vec<usize>,
    /// Number of edges of each check
    check_degrees: Vec<usize>,
    /// Channel (plus systematic) LLR value for each bit
    parity: Vec<f64>,
    /// Accumulated LLR value for each bit
    bit_metrics: Vec<f64>,
    /// Message on each edge
    check_metrics: Vec<f64>,
    /// Scratch value for each edge
    check_metrics_buffer: Vec<f64>,
    /// Hard decision for each bit
    hard_parity: Vec<Bit>,
}

impl<'a, B: BoxSum> BpDecoder<'a, B> {
    /// Returns decoder for a given structure and combination operator.
    pub(crate) fn new(structure: &'a LdpcStructure, box_sum: B) -> Self {
        let checks = structure.checks();
        let num_bits = checks.cols();
        let num_edges = checks.size();
        Self {
            structure,
            box_sum,
            edge_bits: checks.iter().flatten().copied().collect(),
            check_degrees: checks.row_sizes(),
            parity: vec![0.0; num_bits],
            bit_metrics: vec![0.0; num_bits],
            check_metrics: vec![0.0; num_edges],
            check_metrics_buffer: vec![0.0; num_edges],
            hard_parity: vec![Bit::Zero; num_bits],
        }
    }

    /// Sets the message on each edge to the LLR value of its bit.
    fn init_check_metrics(&mut self) {
        for (check, &bit) in self.check_metrics.iter_mut().zip(&self.edge_bits) {
            *check = self.parity[bit];
        }
    }

    /// Runs check and bit updates over a non-empty range of iterations, then the final check
    /// update. With `stop_at_codeword`, the loop ends as soon as the hard decisions form a
    /// codeword.
    fn iterate(&mut self, iterations: Range<usize>, stop_at_codeword: bool) {
        let last = iterations.end - 1;
        for i in iterations.start .. last {
            self.check_update(i);
            self.bit_update();
            if stop_at_codeword && self.hard_decisions_form_codeword() {
                break;
            }
        }
        self.check_update(last);
    }

    /// Returns `true` if the signs of `bit_metrics` satisfy all parity checks.
    fn hard_decisions_form_codeword(&mut self) -> bool {
        for (hard, &llr) in self.hard_parity.iter_mut().zip(&self.bit_metrics) {
            *hard = Bit::from_llr(llr);
        }
        self.structure.is_codeword(&self.hard_parity)
    }

    /// Replaces each bit-to-check message with the combination of all other messages of its check.
    fn check_update(&mut self, iteration: usize) {
        let box_sum = &self.box_sum;
        let mut start = 0;
        for &degree in &self.check_degrees {
            let edges = &mut self.check_metrics[start .. start + degree];
            let buffer = &mut self.check_metrics_buffer[start .. start + degree];
            start += degree;
            if degree == 0 {
                continue;
            }
            if degree == 1 {
                edges[0] = box_sum.post(box_sum.identity());
                continue;
            }
            let sf = self.structure.scaling_factor(iteration, degree);
            let last = degree - 1;
            let mut prod = box_sum.prior(edges[0]);
            for j in 1 .. last {
                buffer[j] = box_sum.prior(edges[j]);
                edges[j] = prod;
                prod = box_sum.sum(prod, buffer[j]);
            }
            buffer[last] = box_sum.prior(edges[last]);
            edges[last] = sf * box_sum.post(prod);
            prod = buffer[last];
            for j in (1 .. last).rev() {
                edges[j] = sf * box_sum.post(box_sum.sum(edges[j], prod));
                prod = box_sum.sum(prod, buffer[j]);
            }
            edges[0] = sf * box_sum.post(prod);
        }
    }

    /// Replaces each check-to-bit message with the channel value plus all other messages of its
    /// bit, leaving the total for each bit in `bit_metrics`.
    fn bit_update(&mut self) {
        self.bit_metrics.fill(0.0);
        for (&bit, check, buffer) in izip!(
            &self.edge_bits,
            &mut self.check_metrics,
            &mut self.check_metrics_buffer
        ) {
            *buffer = *check;
            *check = self.bit_metrics[bit];
            self.bit_metrics[bit] += *buffer;
        }
        self.bit_metrics.copy_from_slice(&self.parity);
        for (&bit, check, &buffer) in izip!(
            &self.edge_bits,
            &mut self.check_metrics,
            &self.check_metrics_buffer
        )
        .rev()
        {
            *check += self.bit_metrics[bit];
            self.bit_metrics[bit] += buffer;
        }
    }

    /// Sets `bit_metrics` to the sum of the check-to-bit messages of each bit.
    fn accumulate_check_metrics(&mut self) {
        self.bit_metrics.fill(0.0);
        for (&bit, &check) in self.edge_bits.iter().zip(&self.check_metrics) {
            self.bit_metrics[bit] += check;
        }
    }
}

impl<B: BoxSum> BlockDecoder for BpDecoder<'_, B> {
    fn decode_block(&mut self, parity: &[f64], msg: &mut [Bit]) {
        self.parity.copy_from_slice(parity);
        let iterations = self.structure.iterations() as usize;
        if iterations > 0 {
            self.init_check_metrics();
            self.iterate(0 .. iterations, true);
            self.accumulate_check_metrics();
        } else {
            self.bit_metrics.fill(0.0);
        }
        for (m, &channel, &extrinsic) in izip!(msg.iter_mut(), &self.parity, &self.bit_metrics) {
            *m = Bit::from_llr(channel + extrinsic);
        }
    }

    fn so_decode_block(
        &mut self,
        parity: &[f64],
        syst: Option<&[f64]>,
        state: Option<&[f64]>,
        iterations: Range<usize>,
    ) {
        self.parity.copy_from_slice(parity);
        if let Some(syst) = syst {
            for (p, &s) in self.parity.iter_mut().zip(syst) {
                *p += s;
            }
        }
        match state {
            Some(state) => self.check_metrics.copy_from_slice(state),
            None => self.check_metrics.fill(0.0),
        }
        if iterations.is_empty() {
            self.bit_metrics.fill(0.0);
            return;
        }
        if state.is_some() {
            self.bit_update();
        } else {
            self.init_check_metrics();
        }
        self.iterate(iterations, false);
        self.accumulate_check_metrics();
    }

    fn extrinsic(&self) -> &[f64] {
        &self.bit_metrics
    }

    fn state(&self) -> &[f64] {
        &self.check_metrics
    }

    fn write_msg(&self, msg: &mut [f64]) {
        for (m, &channel, &extrinsic) in izip!(msg.iter_mut(), &self.parity, &self.bit_metrics) {
            *m = channel + extrinsic;
        }
    }
}

#[cfg(test)]
mod tests_of_bp_decoder {
    use float_eq::assert_float_eq;

    use super::*;
    use crate::{gallager_matrix, DecoderOptions, ScalingFactor, SparseBitMatrix};
    use Bit::{One, Zero};

    fn hamming_structure(algo: DecoderAlgo, iterations: u32) -> LdpcStructure {
        let h = SparseBitMatrix::from_rows(
            7,
            vec![vec![0, 1, 3, 4], vec![0, 2, 3, 5], vec![1, 2, 3, 6]],
        )
        .unwrap();
        LdpcStructure::new(&h, DecoderOptions::new(iterations, algo)).unwrap()
    }

    fn llr_for_bits(bits: &[Bit], magnitude: f64) -> Vec<f64> {
        bits.iter()
            .map(|&b| if b == Zero { magnitude } else { -magnitude })
            .collect()
    }

    #[test]
    fn test_new() {
        let structure = hamming_structure(DecoderAlgo::Exact, 5);
        let decoder = BpDecoder::new(&structure, ExactBoxSum);
        assert_eq!(decoder.edge_bits.len(), 12);
        assert_eq!(decoder.check_degrees, [4, 4, 4]);
        assert_eq!(decoder.parity.len(), 7);
        assert_eq!(decoder.check_metrics.len(), 12);
    }

    #[test]
    fn test_check_update() {
        let h = SparseBitMatrix::from_rows(4, vec![vec![0, 1, 2]]).unwrap();
        let structure =
            LdpcStructure::new(&h, DecoderOptions::new(1, DecoderAlgo::Approximate)).unwrap();
        let mut decoder = BpDecoder::new(&structure, MinBoxSum);
        decoder.check_metrics.copy_from_slice(&[1.0, -2.0, 3.0]);
        decoder.check_update(0);
        assert_float_eq!(decoder.check_metrics, vec![-2.0, 1.0, -1.0], abs_all <= 1e-12);
        // Exact variant on the same check
        let mut decoder = BpDecoder::new(&structure, ExactBoxSum);
        decoder.check_metrics.copy_from_slice(&[1.0, -2.0, 3.0]);
        decoder.check_update(0);
        let exact = |a: f64, b: f64| 2.0 * ((0.5 * a).tanh() * (0.5 * b).tanh()).atanh();
        assert_float_eq!(
            decoder.check_metrics,
            vec![exact(-2.0, 3.0), exact(1.0, 3.0), exact(1.0, -2.0)],
            abs_all <= 1e-9
        );
    }

    #[test]
    fn test_check_update_degree_one() {
        let h = SparseBitMatrix::from_rows(3, vec![vec![1]]).unwrap();
        let structure =
            LdpcStructure::new(&h, DecoderOptions::new(1, DecoderAlgo::Approximate)).unwrap();
        let mut decoder = BpDecoder::new(&structure, MinBoxSum);
        decoder.check_metrics.copy_from_slice(&[-5.0]);
        decoder.check_update(0);
        assert_float_eq!(decoder.check_metrics[0], crate::box_sum::LLR_MAX, abs <= 0.0);
    }

    #[test]
    fn test_bit_update() {
        let structure = hamming_structure(DecoderAlgo::Exact, 5);
        let mut decoder = BpDecoder::new(&structure, ExactBoxSum);
        let parity = [0.5, -1.0, 1.5, -2.0, 2.5, -3.0, 3.5];
        decoder.parity.copy_from_slice(&parity);
        let incoming: Vec<f64> = (0 .. 12).map(|e| 0.25 * f64::from(e) - 1.0).collect();
        decoder.check_metrics.copy_from_slice(&incoming);
        decoder.bit_update();
        let edge_bits = decoder.edge_bits.clone();
        for (e, &bit) in edge_bits.iter().enumerate() {
            let others: f64 = edge_bits
                .iter()
                .zip(&incoming)
                .enumerate()
                .filter(|&(f, (&b, _))| b == bit && f != e)
                .map(|(_, (_, &m))| m)
                .sum();
            assert_float_eq!(decoder.check_metrics[e], parity[bit] + others, abs <= 1e-12);
        }
        for (bit, &p) in parity.iter().enumerate() {
            let total: f64 = edge_bits
                .iter()
                .zip(&incoming)
                .filter(|&(&b, _)| b == bit)
                .map(|(_, &m)| m)
                .sum();
            assert_float_eq!(decoder.bit_metrics[bit], p + total, abs <= 1e-12);
        }
    }

    #[test]
    fn test_decode_block() {
        for algo in [DecoderAlgo::Exact, DecoderAlgo::Linear, DecoderAlgo::Approximate] {
            let structure = hamming_structure(algo, 10);
            let mut decoder = bp_decoder(&structure);
            let msg = [One, Zero, One, One];
            let parity = structure.encode(&msg).unwrap();
            let mut llr = llr_for_bits(&parity, 4.0);
            // One unreliable, wrong bit
            llr[2] = -llr[2] / 8.0;
            let mut msg_hat = [Zero; 4];
            decoder.decode_block(&llr, &mut msg_hat);
            assert_eq!(msg_hat, msg);
        }
    }

    #[test]
    fn test_zero_iterations() {
        let structure = hamming_structure(DecoderAlgo::Exact, 0);
        let mut decoder = bp_decoder(&structure);
        let llr = [1.0, -1.0, -0.5, 2.0, 3.0, -3.0, 1.0];
        let mut msg_hat = [Zero; 4];
        decoder.decode_block(&llr, &mut msg_hat);
        assert_eq!(msg_hat, [Zero, One, One, Zero]);
        let state = [0.5; 12];
        decoder.so_decode_block(&llr, Some(&[1.0, 1.0, 1.0, 1.0]), Some(&state), 0 .. 0);
        assert!(decoder.extrinsic().iter().all(|&x| x == 0.0));
        assert_float_eq!(decoder.state().to_vec(), state.to_vec(), abs_all <= 0.0);
        let mut msg_llr = [0.0; 4];
        decoder.write_msg(&mut msg_llr);
        assert_float_eq!(msg_llr, [2.0, 0.0, 0.5, 3.0], abs_all <= 1e-12);
    }

    #[test]
    fn test_so_decode_block_zero_state() {
        let h = gallager_matrix(120, 3, 6, Some(5)).unwrap();
        let structure =
            LdpcStructure::new(&h, DecoderOptions::new(6, DecoderAlgo::Linear)).unwrap();
        let llr: Vec<f64> = (0 .. 120)
            .map(|k| if k % 7 == 3 { -0.3 } else { 0.8 + 0.01 * f64::from(k) })
            .collect();
        let mut decoder = bp_decoder(&structure);
        decoder.so_decode_block(&llr, None, None, 0 .. 6);
        let extrinsic = decoder.extrinsic().to_vec();
        let state = decoder.state().to_vec();
        let zero_state = vec![0.0; structure.state_size()];
        let zero_syst = vec![0.0; structure.syst_size()];
        decoder.so_decode_block(&llr, Some(&zero_syst), Some(&zero_state), 0 .. 6);
        assert_float_eq!(decoder.extrinsic().to_vec(), extrinsic, abs_all <= 0.0);
        assert_float_eq!(decoder.state().to_vec(), state, abs_all <= 0.0);
    }

    #[test]
    fn test_so_decode_block_split_iterations() {
        let h = gallager_matrix(120, 3, 6, Some(5)).unwrap();
        let schedule = vec![1.0, 0.9, 0.8, 0.85, 0.9, 0.95, 1.0, 1.0];
        let options = DecoderOptions::new(8, DecoderAlgo::Exact)
            .with_scaling(ScalingFactor::per_iteration(schedule));
        let structure = LdpcStructure::new(&h, options).unwrap();
        let msg: Vec<Bit> = (0 .. structure.msg_size())
            .map(|k| if k % 3 == 0 { One } else { Zero })
            .collect();
        let mut llr = llr_for_bits(&structure.encode(&msg).unwrap(), 2.0);
        // A few unreliable, wrong bits, corrected within the first iterations
        for k in [4, 50, 97] {
            llr[k] = -llr[k] / 4.0;
        }
        let mut decoder = bp_decoder(&structure);
        let mut msg_hat = vec![Zero; structure.msg_size()];
        decoder.decode_block(&llr, &mut msg_hat);
        assert_eq!(msg_hat, msg);
        decoder.so_decode_block(&llr, None, None, 0 .. 8);
        let extrinsic = decoder.extrinsic().to_vec();
        let state = decoder.state().to_vec();
        for first in 1 .. 8 {
            decoder.so_decode_block(&llr, None, None, 0 .. first);
            let first_state = decoder.state().to_vec();
            decoder.so_decode_block(&llr, None, Some(&first_state), first .. 8);
            assert_float_eq!(decoder.extrinsic().to_vec(), extrinsic.clone(), abs_all <= 0.0);
            assert_float_eq!(decoder.state().to_vec(), state.clone(), abs_all <= 0.0);
        }
    }

    #[test]
    fn test_so_decode_block_codeword() {
        let structure = hamming_structure(DecoderAlgo::Exact, 4);
        let mut decoder = bp_decoder(&structure);
        let msg = [Zero, One, One, Zero];
        let parity = structure.encode(&msg).unwrap();
        let llr = llr_for_bits(&parity, 3.0);
        decoder.so_decode_block(&llr, None, None, 0 .. 4);
        // Extrinsic information agrees with the channel on a clean codeword
        for (&x, &y) in decoder.extrinsic().iter().zip(&llr) {
            assert!(x * y > 0.0);
        }
        let mut msg_llr = [0.0; 4];
        decoder.write_msg(&mut msg_llr);
        let msg_hat: Vec<Bit> = msg_llr.iter().map(|&x| Bit::from_llr(x)).collect();
        assert_eq!(msg_hat, msg);
    }
}
