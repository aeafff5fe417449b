//! BB84 Quantum Key Distribution Protocol.
//!
//! Alice encodes random bits in one of two conjugate bases, Bob measures each
//! photon in a basis of his own choosing, and both keep only the positions where
//! their bases agree. A random quarter of that sifted key is sacrificed to
//! estimate the Quantum Bit Error Rate (QBER); if it exceeds the configured
//! threshold an eavesdropper is assumed and the key is discarded.
//!
//! The simulation works on classical bit arrays: an intercepting Eve who picks
//! the wrong basis flips the bit Bob would otherwise receive, and a measurement
//! in the wrong basis yields a fair coin.
//!
//! All randomness comes from the generator passed in, so a seeded generator
//! makes every run reproducible.

use crate::core::config::ProtocolConfig;
use crate::core::utils::{
    bernoulli_mask, equal_mask, mask_positions, mismatch_mask, random_bits, select,
};
use crate::protocols::qkd::outcome::BB84Outcome;
use log::{debug, info};
use ndarray::{Array1, Zip};
use rand::Rng;
use rand::seq::index;

/// Alice's bits and bases plus Bob's basis choices, one entry per photon.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotonStream {
    pub alice_bits: Array1<u8>,
    pub alice_bases: Array1<u8>,
    pub bob_bases: Array1<u8>,
}

impl PhotonStream {
    /// Draws all three sequences uniformly, in the order bits, Alice's bases, Bob's bases.
    pub fn prepare<R: Rng + ?Sized>(num_photons: usize, rng: &mut R) -> Self {
        let alice_bits = random_bits(num_photons, rng);
        let alice_bases = random_bits(num_photons, rng);
        let bob_bases = random_bits(num_photons, rng);

        Self::from_parts(alice_bits, alice_bases, bob_bases)
    }

    /// # Panics
    ///
    /// Panics if the three sequences differ in length.
    pub fn from_parts(
        alice_bits: Array1<u8>,
        alice_bases: Array1<u8>,
        bob_bases: Array1<u8>,
    ) -> Self {
        assert_eq!(
            alice_bits.len(),
            alice_bases.len(),
            "alice bits and bases differ in length"
        );
        assert_eq!(
            alice_bits.len(),
            bob_bases.len(),
            "alice and bob streams differ in length"
        );

        Self {
            alice_bits,
            alice_bases,
            bob_bases,
        }
    }

    pub fn len(&self) -> usize {
        self.alice_bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alice_bits.is_empty()
    }

    /// `true` wherever Alice and Bob chose the same basis.
    pub fn basis_match(&self) -> Array1<bool> {
        equal_mask(&self.alice_bases, &self.bob_bases)
    }
}

/// Eve's side of an intercept-resend attack.
#[derive(Debug, Clone, PartialEq)]
pub struct Interception {
    pub eve_bases: Array1<u8>,
    /// Photons Eve measured.
    pub intercept_mask: Array1<bool>,
    /// Photons Eve measured in the wrong basis; only these are disturbed.
    pub error_mask: Array1<bool>,
}

impl Interception {
    /// Draws Eve's bases, then which photons she intercepts.
    pub fn draw<R: Rng + ?Sized>(
        alice_bases: &Array1<u8>,
        eavesdrop_prob: f64,
        rng: &mut R,
    ) -> Self {
        let eve_bases = random_bits(alice_bases.len(), rng);
        let intercept_mask = bernoulli_mask(alice_bases.len(), eavesdrop_prob, rng);

        Self::from_parts(alice_bases, eve_bases, intercept_mask)
    }

    /// # Panics
    ///
    /// Panics if any sequence differs in length from `alice_bases`.
    pub fn from_parts(
        alice_bases: &Array1<u8>,
        eve_bases: Array1<u8>,
        intercept_mask: Array1<bool>,
    ) -> Self {
        assert_eq!(
            intercept_mask.len(),
            alice_bases.len(),
            "intercept mask and alice bases differ in length"
        );

        let wrong_basis = mismatch_mask(alice_bases, &eve_bases);
        let error_mask = Zip::from(&intercept_mask)
            .and(&wrong_basis)
            .map_collect(|&intercepted, &wrong| intercepted && wrong);

        Self {
            eve_bases,
            intercept_mask,
            error_mask,
        }
    }

    pub fn intercepted_count(&self) -> usize {
        self.intercept_mask.iter().filter(|&&m| m).count()
    }

    pub fn disturbed_count(&self) -> usize {
        self.error_mask.iter().filter(|&&m| m).count()
    }

    /// Flips every bit of `bits` under the error mask.
    pub fn apply(&self, bits: &mut Array1<u8>) {
        assert_eq!(
            bits.len(),
            self.error_mask.len(),
            "bit stream and error mask differ in length"
        );
        bits.zip_mut_with(&self.error_mask, |bit, &flip| {
            if flip {
                *bit = 1 - *bit;
            }
        });
    }
}

/// Bob's measurement of the received stream.
///
/// Where his basis matches Alice's he reads the received bit; elsewhere the
/// outcome is a fair coin regardless of what happened in transit. One random
/// draw is consumed per mismatched position, in stream order.
pub fn measure<R: Rng + ?Sized>(
    stream: &PhotonStream,
    received: &Array1<u8>,
    rng: &mut R,
) -> Array1<u8> {
    assert_eq!(
        received.len(),
        stream.len(),
        "received stream and photon stream differ in length"
    );

    let basis_match = stream.basis_match();
    let mut bob_bits = Array1::zeros(stream.len());

    for i in 0..stream.len() {
        bob_bits[i] = if basis_match[i] {
            received[i]
        } else {
            rng.random_range(0..2u8)
        };
    }

    bob_bits
}

/// Alice's and Bob's bits restricted to positions where their bases agree.
#[derive(Debug, Clone, PartialEq)]
pub struct SiftedKey {
    /// Positions in the photon stream that survived sifting, ascending.
    pub positions: Vec<usize>,
    pub alice: Array1<u8>,
    pub bob: Array1<u8>,
}

impl SiftedKey {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Keeps the positions where Alice's and Bob's bases agree.
///
/// Bases are compared directly, standing in for a lossless public
/// reconciliation channel.
pub fn sift(stream: &PhotonStream, bob_bits: &Array1<u8>) -> SiftedKey {
    assert_eq!(
        bob_bits.len(),
        stream.len(),
        "bob bits and photon stream differ in length"
    );

    let positions = mask_positions(&stream.basis_match());
    let alice = select(&stream.alice_bits, &positions);
    let bob = select(bob_bits, &positions);

    SiftedKey {
        positions,
        alice,
        bob,
    }
}

/// Number of sifted bits sacrificed for error estimation.
pub fn check_size(sifted_length: usize) -> usize {
    sifted_length / 4
}

/// Draws `check_size(sifted_length)` distinct indices from `[0, sifted_length)`.
///
/// The result is sorted; the sample itself is uniform without replacement.
pub fn sample_check_indices<R: Rng + ?Sized>(sifted_length: usize, rng: &mut R) -> Vec<usize> {
    let mut indices = index::sample(rng, sifted_length, check_size(sifted_length)).into_vec();
    indices.sort_unstable();
    indices
}

/// Error estimate over a check sample and the split of the sifted key it induces.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityCheck {
    /// Sifted-key indices revealed publicly, ascending.
    pub check_indices: Vec<usize>,
    /// Sifted-key indices kept secret, ascending.
    pub remaining_indices: Vec<usize>,
    /// Check positions where Alice's and Bob's bits disagree.
    pub errors: usize,
    pub qber: f64,
}

impl SecurityCheck {
    /// Compares Alice's and Bob's sifted bits at `check_indices`.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range or repeated.
    pub fn evaluate(sifted: &SiftedKey, check_indices: Vec<usize>) -> Self {
        let sifted_length = sifted.len();
        let mut in_check = vec![false; sifted_length];
        for &i in &check_indices {
            assert!(
                i < sifted_length,
                "check index {i} out of range for sifted length {sifted_length}"
            );
            assert!(!in_check[i], "duplicate check index {i}");
            in_check[i] = true;
        }

        let errors = check_indices
            .iter()
            .filter(|&&i| sifted.alice[i] != sifted.bob[i])
            .count();

        let qber = if check_indices.is_empty() {
            0.0
        } else {
            errors as f64 / check_indices.len() as f64
        };

        let remaining_indices = (0..sifted_length).filter(|&i| !in_check[i]).collect();

        Self {
            check_indices,
            remaining_indices,
            errors,
            qber,
        }
    }

    pub fn check_size(&self) -> usize {
        self.check_indices.len()
    }

    /// Alice's sifted bits outside the check sample, in order.
    pub fn remaining_key(&self, sifted: &SiftedKey) -> Vec<u8> {
        self.remaining_indices
            .iter()
            .map(|&i| sifted.alice[i])
            .collect()
    }
}

/// Everything produced by one protocol run.
#[derive(Debug, Clone, PartialEq)]
pub struct BB84Result {
    pub raw_length: usize,
    pub stream: PhotonStream,
    /// Present only when an eavesdropper was simulated.
    pub interception: Option<Interception>,
    pub bob_bits: Array1<u8>,
    pub sifted: SiftedKey,
    /// Absent when sifting left nothing to check.
    pub security_check: Option<SecurityCheck>,
    pub outcome: BB84Outcome,
}

impl BB84Result {
    pub fn sifted_length(&self) -> usize {
        self.sifted.len()
    }

    pub fn qber(&self) -> Option<f64> {
        self.security_check.as_ref().map(|check| check.qber)
    }

    pub fn into_parts(self) -> (Option<Vec<u8>>, String) {
        self.outcome.into_parts()
    }
}

/// Runs BB84 under a fixed [`ProtocolConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BB84Simulator {
    config: ProtocolConfig,
}

impl BB84Simulator {
    pub fn new(config: ProtocolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Runs the protocol once and returns the key (if accepted) and a justification.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        eavesdropper_present: bool,
    ) -> (Option<Vec<u8>>, String) {
        self.run(rng, eavesdropper_present).into_parts()
    }

    /// Runs the protocol once, keeping every intermediate stage.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R, eavesdropper_present: bool) -> BB84Result {
        let num_photons = self.config.num_photons();

        // Preparation
        let stream = PhotonStream::prepare(num_photons, rng);
        debug!("prepared {num_photons} photons");

        self.run_prepared(stream, rng, eavesdropper_present)
    }

    /// Runs every stage after preparation on an already drawn `stream`.
    ///
    /// The configured photon count is ignored; the run uses `stream.len()`.
    pub fn run_prepared<R: Rng + ?Sized>(
        &self,
        stream: PhotonStream,
        rng: &mut R,
        eavesdropper_present: bool,
    ) -> BB84Result {
        let num_photons = stream.len();

        // Transmission
        let mut received = stream.alice_bits.clone();
        let interception = if eavesdropper_present {
            let interception =
                Interception::draw(&stream.alice_bases, self.config.eavesdrop_prob(), rng);
            interception.apply(&mut received);
            debug!(
                "eve intercepted {} photons, disturbed {}",
                interception.intercepted_count(),
                interception.disturbed_count()
            );
            Some(interception)
        } else {
            None
        };

        // Measurement
        let bob_bits = measure(&stream, &received, rng);

        // Sifting
        let sifted = sift(&stream, &bob_bits);
        debug!("sifted key length {} of {num_photons}", sifted.len());

        if sifted.is_empty() {
            info!("no positions survived sifting");
            return BB84Result {
                raw_length: num_photons,
                stream,
                interception,
                bob_bits,
                sifted,
                security_check: None,
                outcome: BB84Outcome::SiftingFailure,
            };
        }

        // Security check
        let check_indices = sample_check_indices(sifted.len(), rng);
        let check = SecurityCheck::evaluate(&sifted, check_indices);
        debug!(
            "{} errors in {} check bits, {} bits remain",
            check.errors,
            check.check_size(),
            check.remaining_indices.len()
        );

        let outcome = decide(&check, &sifted, self.config.security_threshold());

        BB84Result {
            raw_length: num_photons,
            stream,
            interception,
            bob_bits,
            sifted,
            security_check: Some(check),
            outcome,
        }
    }
}

/// Rejects the key when the QBER is strictly above `security_threshold`.
///
/// A QBER equal to the threshold is accepted.
pub fn decide(
    check: &SecurityCheck,
    sifted: &SiftedKey,
    security_threshold: f64,
) -> BB84Outcome {
    if check.qber > security_threshold {
        info!(
            "QBER {:.4} above threshold {security_threshold:.4}, key discarded",
            check.qber
        );
        BB84Outcome::Intrusion { qber: check.qber }
    } else {
        let key = check.remaining_key(sifted);
        info!("QBER {:.4} accepted, {} key bits", check.qber, key.len());
        BB84Outcome::Secure {
            key,
            qber: check.qber,
        }
    }
}
