//! End-to-end tests of LDPC encoding and decoding

use ldpc_codec::utils::{bpsk_awgn_channel, bpsk_slicer, random_bits};
use ldpc_codec::{
    gallager_matrix, Bit, DecoderAlgo, DecoderOptions, Error, Ldpc, LdpcStructure, Permutation,
    PunctureOptions, ScalingFactor, SoDecoded, SoInput, SoOutput,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn structure_for_test(n: usize, iterations: u32, algo: DecoderAlgo) -> LdpcStructure {
    let h = gallager_matrix(n, 3, 6, Some(3)).unwrap();
    LdpcStructure::new(&h, DecoderOptions::new(iterations, algo)).unwrap()
}

fn noiseless_llr(parity: &[Bit], magnitude: f64) -> Vec<f64> {
    parity
        .iter()
        .map(|&b| if b == Bit::Zero { magnitude } else { -magnitude })
        .collect()
}

#[test]
fn test_gallager_all_ones_scenario() {
    let h = gallager_matrix(2048, 3, 5, Some(0)).unwrap();
    let structure = LdpcStructure::new(&h, DecoderOptions::new(30, DecoderAlgo::Exact)).unwrap();
    assert!(structure.msg_size() >= 2048 - h.rows());
    assert_eq!(structure.msg_size(), 2048 - h.rows() + structure.redundant_checks());
    let msg = vec![Bit::One; structure.msg_size()];
    let parity = structure.encode(&msg).unwrap();
    assert_eq!(parity.len(), 2048);
    assert!(structure
        .syndrome(&parity)
        .unwrap()
        .iter()
        .all(|&b| b == Bit::Zero));
    let codec = Ldpc::new(structure, 0);
    assert_eq!(codec.decode(&noiseless_llr(&parity, 4.0)).unwrap(), msg);
}

#[test]
fn test_encode_produces_codewords() {
    let mut rng = StdRng::seed_from_u64(5);
    for algo in [DecoderAlgo::Exact, DecoderAlgo::Linear, DecoderAlgo::Approximate] {
        let codec = Ldpc::new(structure_for_test(300, 10, algo), 3);
        let msg = random_bits(8 * codec.msg_size(), &mut rng);
        let parity = codec.encode(&msg).unwrap();
        assert!(codec.check(&parity).unwrap());
        // Noiseless decoding recovers the message
        assert_eq!(codec.decode(&noiseless_llr(&parity, 2.0)).unwrap(), msg);
    }
}

#[test]
fn test_puncturing_scenario() {
    let structure = structure_for_test(240, 20, DecoderAlgo::Exact);
    let options = PunctureOptions {
        mask: vec![true, false],
        syst_mask: vec![true],
    };
    let perm: Permutation = structure.puncturing(&options).unwrap();
    let syst_size = structure.syst_size();
    assert_eq!(perm.output_size(), syst_size + (240 - syst_size).div_ceil(2));
    // Inverse on the kept positions
    let mut rng = StdRng::seed_from_u64(8);
    let x: Vec<f64> = (0 .. 240).map(|_| rng.random_range(-5.0 .. 5.0)).collect();
    let mut outer = Vec::new();
    let mut inner = Vec::new();
    perm.permute(&x, &mut outer).unwrap();
    perm.de_permute(&outer, &mut inner).unwrap();
    for &i in perm.indices() {
        assert_eq!(inner[i].to_bits(), x[i].to_bits());
    }
    // Punctured encoding equals permuted unpunctured encoding
    let full = Ldpc::new(structure.clone(), 0);
    let punctured = Ldpc::with_puncturing(structure, &options, 0).unwrap();
    let msg = random_bits(3 * full.msg_size(), &mut rng);
    let full_parity = full.encode(&msg).unwrap();
    let mut expected = Vec::new();
    let mut outer_bits = Vec::new();
    for block in full_parity.chunks(full.parity_size()) {
        perm.permute(block, &mut outer_bits).unwrap();
        expected.extend_from_slice(&outer_bits);
    }
    assert_eq!(punctured.encode(&msg).unwrap(), expected);
}

#[test]
fn test_two_phase_equivalence() {
    let mut rng = StdRng::seed_from_u64(21);
    let total_iterations = 10;
    let schedule: Vec<f64> = (0 .. total_iterations)
        .map(|i| 0.75 + 0.025 * f64::from(i))
        .collect();
    for algo in [DecoderAlgo::Exact, DecoderAlgo::Linear, DecoderAlgo::Approximate] {
        let options = DecoderOptions::new(total_iterations, algo)
            .with_scaling(ScalingFactor::per_iteration(schedule.clone()));
        let h = gallager_matrix(240, 3, 6, Some(3)).unwrap();
        let codec = Ldpc::new(LdpcStructure::new(&h, options).unwrap(), 0);
        let num_blocks = 3;
        let msg = random_bits(num_blocks * codec.msg_size(), &mut rng);
        let parity = codec.encode(&msg).unwrap();
        // Decoding reaches a codeword within a few iterations at the higher noise levels
        for es_over_n0_db in [-8.0, 2.0, 6.0] {
            let parity_llr = bpsk_awgn_channel(&parity, es_over_n0_db, &mut rng);
            let syst: Vec<f64> = (0 .. num_blocks * codec.syst_size())
                .map(|_| rng.random_range(-0.5 .. 0.5))
                .collect();
            let input = SoInput {
                parity: &parity_llr,
                syst: Some(&syst),
                ..SoInput::default()
            };
            let one_phase = codec.so_decode(&input, &SoOutput::all()).unwrap();
            for first in 1 .. total_iterations {
                let state_output = SoOutput {
                    state: true,
                    ..SoOutput::default()
                };
                let first_input = SoInput {
                    iterations: Some(first),
                    ..input
                };
                let state = codec
                    .so_decode(&first_input, &state_output)
                    .unwrap()
                    .state
                    .unwrap();
                let second_input = SoInput {
                    state: Some(&state),
                    first_iteration: first,
                    iterations: Some(total_iterations - first),
                    ..input
                };
                let two_phase = codec.so_decode(&second_input, &SoOutput::all()).unwrap();
                assert_eq!(two_phase, one_phase);
            }
        }
    }
}

#[test]
fn test_zero_state_and_zero_syst_neutrality() {
    let mut rng = StdRng::seed_from_u64(34);
    let codec = Ldpc::new(structure_for_test(180, 8, DecoderAlgo::Linear), 0);
    let num_blocks = 4;
    let msg = random_bits(num_blocks * codec.msg_size(), &mut rng);
    let parity_llr = bpsk_awgn_channel(&codec.encode(&msg).unwrap(), 0.0, &mut rng);
    let zero_syst = vec![0.0; num_blocks * codec.syst_size()];
    let zero_state = vec![0.0; num_blocks * codec.state_size()];
    let reference: SoDecoded = codec
        .so_decode(
            &SoInput {
                parity: &parity_llr,
                ..SoInput::default()
            },
            &SoOutput::all(),
        )
        .unwrap();
    for (syst, state) in [
        (Some(&zero_syst[..]), None),
        (None, Some(&zero_state[..])),
        (Some(&zero_syst[..]), Some(&zero_state[..])),
    ] {
        let input = SoInput {
            parity: &parity_llr,
            syst,
            state,
            ..SoInput::default()
        };
        assert_eq!(codec.so_decode(&input, &SoOutput::all()).unwrap(), reference);
    }
}

#[test]
fn test_size_validation() {
    let codec = Ldpc::new(structure_for_test(120, 5, DecoderAlgo::Exact), 0);
    let is_size_mismatch =
        |result: Result<(), Error>| matches!(result, Err(Error::SizeMismatch { .. }));
    assert!(is_size_mismatch(
        codec.encode(&vec![Bit::Zero; codec.msg_size() + 1]).map(|_| ())
    ));
    assert!(is_size_mismatch(codec.decode(&[]).map(|_| ())));
    assert!(is_size_mismatch(codec.decode(&[0.0; 119]).map(|_| ())));
    assert!(is_size_mismatch(codec.check(&[Bit::Zero; 121]).map(|_| ())));
    let parity = vec![1.0; 2 * codec.parity_size()];
    let state = vec![0.0; codec.state_size()];
    let input = SoInput {
        parity: &parity,
        state: Some(&state),
        ..SoInput::default()
    };
    assert!(is_size_mismatch(
        codec.so_decode(&input, &SoOutput::all()).map(|_| ())
    ));
    let structure = codec.structure();
    assert!(is_size_mismatch(
        structure.encode(&vec![Bit::Zero; structure.msg_size() - 1]).map(|_| ())
    ));
    assert!(is_size_mismatch(structure.check(&[Bit::Zero; 10]).map(|_| ())));
    // A failed call leaves the codec usable
    let msg = vec![Bit::One; codec.msg_size()];
    let parity = codec.encode(&msg).unwrap();
    assert_eq!(codec.decode(&noiseless_llr(&parity, 3.0)).unwrap(), msg);
}

#[test]
fn test_work_group_size_determinism() {
    let mut rng = StdRng::seed_from_u64(55);
    let mut codec = Ldpc::new(structure_for_test(180, 10, DecoderAlgo::Exact), 1);
    let num_blocks = 9;
    let msg = random_bits(num_blocks * codec.msg_size(), &mut rng);
    let parity = codec.encode(&msg).unwrap();
    let parity_llr = bpsk_awgn_channel(&parity, 1.0, &mut rng);
    let msg_hat = codec.decode(&parity_llr).unwrap();
    for work_group_size in [0, 2, 4, 9, 32] {
        codec.set_work_group_size(work_group_size);
        assert_eq!(codec.encode(&msg).unwrap(), parity);
        assert_eq!(codec.decode(&parity_llr).unwrap(), msg_hat);
    }
}

#[test]
fn test_variant_sign_agreement() {
    let mut rng = StdRng::seed_from_u64(89);
    let structure = structure_for_test(300, 30, DecoderAlgo::Exact);
    let num_blocks = 6;
    let msg = random_bits(num_blocks * structure.msg_size(), &mut rng);
    let exact = Ldpc::new(structure.clone(), 0);
    let parity = exact.encode(&msg).unwrap();
    let parity_llr = bpsk_awgn_channel(&parity, 3.0, &mut rng);
    let input = SoInput {
        parity: &parity_llr,
        ..SoInput::default()
    };
    let output = SoOutput {
        msg: true,
        parity: true,
        ..SoOutput::default()
    };
    let exact_decoded = exact.so_decode(&input, &output).unwrap();
    let exact_extrinsic = exact_decoded.parity.unwrap();
    let exact_msg = bpsk_slicer(&exact_decoded.msg.unwrap());
    for algo in [DecoderAlgo::Linear, DecoderAlgo::Approximate] {
        let mut other = structure.clone();
        other
            .set_decoder_options(DecoderOptions::new(30, algo))
            .unwrap();
        let other_msg = Ldpc::new(other, 0).decode(&parity_llr).unwrap();
        let n = structure.parity_size();
        let k = structure.msg_size();
        for b in 0 .. num_blocks {
            let posterior: Vec<f64> = parity_llr[b * n .. (b + 1) * n]
                .iter()
                .zip(&exact_extrinsic[b * n .. (b + 1) * n])
                .map(|(x, y)| x + y)
                .collect();
            if structure.check(&bpsk_slicer(&posterior)).unwrap() {
                assert_eq!(other_msg[b * k .. (b + 1) * k], exact_msg[b * k .. (b + 1) * k]);
            }
        }
    }
}

#[test]
fn test_persisted_structure_decodes_identically() {
    let mut rng = StdRng::seed_from_u64(144);
    let structure = structure_for_test(120, 12, DecoderAlgo::Approximate);
    let bytes = structure.to_bytes().unwrap();
    let restored = LdpcStructure::from_bytes(&bytes).unwrap();
    assert_eq!(restored, structure);
    // A column index beyond the codeword length is rejected on load
    let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    value["checks"]["rows"][0][0] = 1000_usize.into();
    let corrupted = serde_json::to_vec(&value).unwrap();
    assert!(matches!(
        LdpcStructure::from_bytes(&corrupted),
        Err(Error::SerdeReadWriteError(_))
    ));
    let codec = Ldpc::new(structure, 0);
    let restored_codec = Ldpc::new(restored, 0);
    let msg = random_bits(2 * codec.msg_size(), &mut rng);
    let parity_llr = bpsk_awgn_channel(&codec.encode(&msg).unwrap(), 1.0, &mut rng);
    assert_eq!(
        restored_codec.decode(&parity_llr).unwrap(),
        codec.decode(&parity_llr).unwrap()
    );
}
