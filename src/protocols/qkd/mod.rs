//! Quantum Key Distribution (QKD) Protocols.
//!
//! - **BB84**: prepare-and-measure key distribution over two conjugate bases,
//!   with sampled error-rate estimation to detect an intercept-resend attacker.

pub mod bb84;
pub mod outcome;

pub use outcome::BB84Outcome;
