//! Terminal outcomes of a BB84 run and their human-readable justification.

use crate::core::utils::bits_to_string;
use std::fmt;

/// Number of key bits shown in the justification of an accepted key.
pub const KEY_PREVIEW_LEN: usize = 10;

/// Justification returned when no position survives sifting.
pub const SIFTING_FAILURE: &str = "Key failure due to sifting.";

/// How a single protocol run ended.
///
/// Both rejections are ordinary protocol results, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum BB84Outcome {
    /// The sifted key was empty.
    SiftingFailure,
    /// The sampled QBER exceeded the security threshold; the key is discarded.
    Intrusion { qber: f64 },
    /// The sampled QBER was acceptable; `key` holds the unsampled sifted bits.
    Secure { key: Vec<u8>, qber: f64 },
}

impl BB84Outcome {
    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure { .. })
    }

    pub fn key(&self) -> Option<&[u8]> {
        match self {
            Self::Secure { key, .. } => Some(key.as_slice()),
            _ => None,
        }
    }

    /// QBER measured on the check sample, if the run got that far.
    pub fn qber(&self) -> Option<f64> {
        match self {
            Self::SiftingFailure => None,
            Self::Intrusion { qber } | Self::Secure { qber, .. } => Some(*qber),
        }
    }

    pub fn justification(&self) -> String {
        self.to_string()
    }

    /// Splits the outcome into the `(key, justification)` pair handed to callers.
    pub fn into_parts(self) -> (Option<Vec<u8>>, String) {
        let justification = self.justification();
        match self {
            Self::Secure { key, .. } => (Some(key), justification),
            _ => (None, justification),
        }
    }
}

impl fmt::Display for BB84Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SiftingFailure => f.write_str(SIFTING_FAILURE),
            Self::Intrusion { qber } => write!(
                f,
                "🚨 Eavesdropper detected (QBER: {:.2}%). The quantum disturbance proves \
                 intrusion, so the key is discarded and the conversation is cut.",
                qber * 100.0
            ),
            Self::Secure { key, qber } => {
                let preview = bits_to_string(&key[..key.len().min(KEY_PREVIEW_LEN)]);
                write!(
                    f,
                    "✅ Key is SECURE (QBER: {:.2}%). The low error rate confirms no intrusion, \
                     and the remaining key is successfully generated ({preview}...).",
                    qber * 100.0
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sifting_failure_text_is_exact() {
        let (key, text) = BB84Outcome::SiftingFailure.into_parts();
        assert!(key.is_none());
        assert_eq!(text, "Key failure due to sifting.");
    }

    #[test]
    fn intrusion_reports_percentage() {
        let outcome = BB84Outcome::Intrusion { qber: 0.25 };
        assert_eq!(outcome.qber(), Some(0.25));
        let (key, text) = outcome.into_parts();
        assert!(key.is_none());
        assert!(text.starts_with("🚨 Eavesdropper detected (QBER: 25.00%)."));
        assert!(text.ends_with("the conversation is cut."));
    }

    #[test]
    fn secure_previews_ten_bits() {
        let key = vec![1, 0, 1, 1, 0, 0, 1, 0, 1, 1, 1, 1, 0];
        let outcome = BB84Outcome::Secure {
            key: key.clone(),
            qber: 0.0123,
        };
        assert!(outcome.is_secure());
        assert_eq!(outcome.key(), Some(key.as_slice()));
        let (returned, text) = outcome.into_parts();
        assert_eq!(returned, Some(key));
        assert!(text.starts_with("✅ Key is SECURE (QBER: 1.23%)."));
        assert!(text.contains("(1011001011...)"));
    }

    #[test]
    fn short_key_preview() {
        let outcome = BB84Outcome::Secure {
            key: vec![0, 1],
            qber: 0.0,
        };
        assert!(outcome.justification().contains("(01...)"));
        assert!(outcome.justification().contains("QBER: 0.00%"));
    }
}
