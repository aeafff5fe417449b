//! Utility functions for bit streams.
//!
//! This module contains helper functions for:
//! - Drawing uniform bit sequences and Bernoulli masks.
//! - Element-wise comparisons producing boolean masks.
//! - Order-preserving selection of positions under a mask.
//! - Rendering bits as text.

use ndarray::{Array1, Axis, Zip};
use rand::Rng;

/// Draws `len` independent uniform bits in {0, 1}.
pub fn random_bits<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Array1<u8> {
    Array1::from_shape_fn(len, |_| rng.random_range(0..2u8))
}

/// Draws a mask where each entry is `true` independently with probability `p`.
///
/// `p` must already be validated to lie in `[0, 1]`.
pub fn bernoulli_mask<R: Rng + ?Sized>(len: usize, p: f64, rng: &mut R) -> Array1<bool> {
    Array1::from_shape_fn(len, |_| rng.random_bool(p))
}

/// Element-wise equality of two equal-length bit sequences.
pub fn equal_mask(a: &Array1<u8>, b: &Array1<u8>) -> Array1<bool> {
    assert_eq!(a.len(), b.len(), "bit sequences differ in length");
    Zip::from(a).and(b).map_collect(|x, y| x == y)
}

/// Element-wise inequality of two equal-length bit sequences.
pub fn mismatch_mask(a: &Array1<u8>, b: &Array1<u8>) -> Array1<bool> {
    assert_eq!(a.len(), b.len(), "bit sequences differ in length");
    Zip::from(a).and(b).map_collect(|x, y| x != y)
}

/// Indices where `mask` is `true`, in ascending order.
pub fn mask_positions(mask: &Array1<bool>) -> Vec<usize> {
    mask.iter()
        .enumerate()
        .filter_map(|(i, &set)| set.then_some(i))
        .collect()
}

/// Picks `positions` out of `bits`, keeping their order.
pub fn select(bits: &Array1<u8>, positions: &[usize]) -> Array1<u8> {
    bits.select(Axis(0), positions)
}

/// Renders bits as a string of `0`/`1` characters.
pub fn bits_to_string(bits: &[u8]) -> String {
    bits.iter().map(|&b| if b == 0 { '0' } else { '1' }).collect()
}
