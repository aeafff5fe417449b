//! Property-based and statistical tests for the BB84 simulator.
//!
//! Every run is driven by a seeded `ChaCha8Rng`, so failures reproduce exactly.

use proptest::prelude::*;
use qkd_sim::protocols::bb84::check_size;
use qkd_sim::{BB84Outcome, BB84Simulator, ProtocolConfig, Sampler};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

fn simulator(num_photons: usize, eavesdrop_prob: f64) -> BB84Simulator {
    BB84Simulator::new(ProtocolConfig::new(num_photons, eavesdrop_prob, 0.11).unwrap())
}

#[test]
fn prop_same_seed_same_output() {
    proptest!(|(seed in any::<u64>(), n in 0usize..300, eve in any::<bool>())| {
        let sim = simulator(n, 0.5);
        let first = sim.simulate(&mut ChaCha8Rng::seed_from_u64(seed), eve);
        let second = sim.simulate(&mut ChaCha8Rng::seed_from_u64(seed), eve);
        prop_assert_eq!(first, second);
    });
}

#[test]
fn prop_lengths_hold() {
    proptest!(|(seed in any::<u64>(), n in 0usize..300, eve in any::<bool>(), p in 0.0f64..=1.0)| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let result = simulator(n, p).run(&mut rng, eve);

        prop_assert_eq!(result.raw_length, n);
        prop_assert_eq!(result.stream.len(), n);
        prop_assert_eq!(result.bob_bits.len(), n);
        prop_assert!(result.sifted_length() <= n);
        prop_assert_eq!(result.sifted.alice.len(), result.sifted.bob.len());

        match &result.security_check {
            None => prop_assert_eq!(&result.outcome, &BB84Outcome::SiftingFailure),
            Some(check) => {
                prop_assert_eq!(check.check_size(), check_size(result.sifted_length()));
                prop_assert_eq!(
                    check.remaining_indices.len(),
                    result.sifted_length() - check.check_size()
                );
                if let Some(key) = result.outcome.key() {
                    prop_assert_eq!(key.len(), check.remaining_indices.len());
                }
            }
        }
    });
}

#[test]
fn prop_check_and_remaining_partition_sifted_range() {
    proptest!(|(seed in any::<u64>(), n in 1usize..300, eve in any::<bool>())| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let result = simulator(n, 0.5).run(&mut rng, eve);

        if let Some(check) = &result.security_check {
            let checked: BTreeSet<usize> = check.check_indices.iter().copied().collect();
            let remaining: BTreeSet<usize> = check.remaining_indices.iter().copied().collect();

            prop_assert_eq!(checked.len(), check.check_indices.len());
            prop_assert!(checked.is_disjoint(&remaining));

            let union: BTreeSet<usize> = checked.union(&remaining).copied().collect();
            let full: BTreeSet<usize> = (0..result.sifted_length()).collect();
            prop_assert_eq!(union, full);
        }
    });
}

#[test]
fn prop_disturbance_only_where_eve_used_wrong_basis() {
    proptest!(|(seed in any::<u64>(), n in 0usize..300, p in 0.0f64..=1.0)| {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let result = simulator(n, p).run(&mut rng, true);
        let interception = result.interception.as_ref().unwrap();
        let stream = &result.stream;

        for i in 0..n {
            let wrong_basis = stream.alice_bases[i] != interception.eve_bases[i];
            prop_assert_eq!(
                interception.error_mask[i],
                interception.intercept_mask[i] && wrong_basis
            );
        }

        // Positions that survived sifting differ only where Eve disturbed the photon.
        for (k, &pos) in result.sifted.positions.iter().enumerate() {
            let differs = result.sifted.alice[k] != result.sifted.bob[k];
            prop_assert_eq!(differs, interception.error_mask[pos]);
        }
    });
}

#[test]
fn zero_photons_fail_sifting_exactly() {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    for eve in [false, true] {
        let (key, justification) = simulator(0, 0.5).simulate(&mut rng, eve);
        assert!(key.is_none());
        assert_eq!(justification, "Key failure due to sifting.");
    }
}

#[test]
fn quiet_channel_keeps_qber_near_zero() {
    let sim = simulator(2000, 0.5);
    let mut low = 0;
    for seed in 0..40 {
        let result = sim.run(&mut ChaCha8Rng::seed_from_u64(seed), false);
        if result.qber().is_some_and(|q| q < 0.05) {
            low += 1;
        }
        assert!(result.outcome.is_secure(), "false rejection with seed {seed}");
    }
    assert!(low >= 38, "only {low} of 40 trials below 5% QBER");
}

// Every intercepted photon measured in the wrong basis reaches Bob flipped, and
// Eve picks the wrong basis half the time, so the expected QBER is p / 2.
fn assert_interception_rejected(eavesdrop_prob: f64, seed: u64) {
    let sim = simulator(2000, eavesdrop_prob);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let summary = Sampler::new(sim).run(&mut rng, true, 40);

    assert!(summary.detection_rate() >= 0.9, "{summary}");
    assert!(
        (summary.mean_qber - eavesdrop_prob / 2.0).abs() < 0.05,
        "mean qber {} at p = {eavesdrop_prob}",
        summary.mean_qber
    );
}

#[test]
fn full_interception_is_rejected() {
    assert_interception_rejected(1.0, 2024);
}

#[test]
fn half_interception_is_rejected() {
    assert_interception_rejected(0.5, 2025);
}

#[test]
fn default_demo_configuration_runs() {
    let sim = BB84Simulator::default();
    assert_eq!(sim.config().num_photons(), 1000);

    let mut rng = ChaCha8Rng::seed_from_u64(77);
    let (key, justification) = sim.simulate(&mut rng, false);
    let key = key.expect("no eavesdropper should yield a key");
    assert!(key.len() > 300);
    assert!(justification.starts_with("✅ Key is SECURE (QBER: 0.00%)"));
}
