//! Protocol configuration.
//!
//! A [`ProtocolConfig`] is fixed for the lifetime of a simulator. Every value is
//! checked when the configuration is built, so a simulator can never start
//! drawing randomness with a malformed setup.

use crate::core::errors::{ConfigError, is_probability};

/// Number of photons Alice transmits in the demo configuration.
pub const NUM_PHOTONS: usize = 1000;

/// Probability that Eve intercepts a given photon when she is present.
pub const EAVESDROP_PROB: f64 = 0.5;

/// Highest QBER tolerated before the key is discarded (11%).
pub const SECURITY_THRESHOLD: f64 = 0.11;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtocolConfig {
    /// Photons transmitted per run (N).
    num_photons: usize,
    /// Per-photon interception probability when an eavesdropper is present.
    eavesdrop_prob: f64,
    /// QBER strictly above this value rejects the key.
    security_threshold: f64,
}

impl ProtocolConfig {
    /// Builds a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if either probability lies outside `[0, 1]`
    /// or is NaN. Values are never clamped.
    pub fn new(
        num_photons: usize,
        eavesdrop_prob: f64,
        security_threshold: f64,
    ) -> Result<Self, ConfigError> {
        if !is_probability(eavesdrop_prob) {
            return Err(ConfigError::InvalidEavesdropProbability(eavesdrop_prob));
        }
        if !is_probability(security_threshold) {
            return Err(ConfigError::InvalidSecurityThreshold(security_threshold));
        }

        Ok(Self {
            num_photons,
            eavesdrop_prob,
            security_threshold,
        })
    }

    pub fn with_num_photons(self, num_photons: usize) -> Self {
        Self {
            num_photons,
            ..self
        }
    }

    pub fn with_eavesdrop_prob(self, eavesdrop_prob: f64) -> Result<Self, ConfigError> {
        Self::new(self.num_photons, eavesdrop_prob, self.security_threshold)
    }

    pub fn with_security_threshold(self, security_threshold: f64) -> Result<Self, ConfigError> {
        Self::new(self.num_photons, self.eavesdrop_prob, security_threshold)
    }

    pub fn num_photons(&self) -> usize {
        self.num_photons
    }

    pub fn eavesdrop_prob(&self) -> f64 {
        self.eavesdrop_prob
    }

    pub fn security_threshold(&self) -> f64 {
        self.security_threshold
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            num_photons: NUM_PHOTONS,
            eavesdrop_prob: EAVESDROP_PROB,
            security_threshold: SECURITY_THRESHOLD,
        }
    }
}
