use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid eavesdrop probability: {0}. Must be between 0.0 and 1.0")]
    InvalidEavesdropProbability(f64),

    #[error("Invalid security threshold: {0}. Must be between 0.0 and 1.0")]
    InvalidSecurityThreshold(f64),
}

/// Returns `true` if `p` is a finite probability in `[0, 1]`.
pub(crate) fn is_probability(p: f64) -> bool {
    (0.0..=1.0).contains(&p)
}
