//! Quantum Cryptography Protocols.
//!
//! This module contains the protocol simulations built on the bit-stream
//! utilities in `core`.

pub mod qkd;
pub use qkd::bb84;
