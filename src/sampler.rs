use crate::protocols::bb84::{BB84Result, BB84Simulator};
use crate::protocols::qkd::outcome::BB84Outcome;
use log::debug;
use rand::Rng;
use std::fmt;

/// Repeats BB84 runs to measure how often the protocol accepts or rejects.
///
/// The `Sampler` drives a [`BB84Simulator`] many times on a single generator and
/// aggregates the outcomes into a [`TrialSummary`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Sampler {
    /// Simulator run on every trial.
    pub simulator: BB84Simulator,
}

/// Aggregate statistics over a batch of protocol runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrialSummary {
    pub trials: usize,
    pub secure: usize,
    pub intrusions: usize,
    pub sifting_failures: usize,
    /// Mean QBER over runs that reached the security check.
    pub mean_qber: f64,
    pub max_qber: f64,
    /// Mean key length over accepted runs.
    pub mean_key_length: f64,
}

impl TrialSummary {
    /// Fraction of trials that ended without a key.
    pub fn rejection_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        (self.intrusions + self.sifting_failures) as f64 / self.trials as f64
    }

    /// Fraction of trials rejected for a high QBER.
    pub fn detection_rate(&self) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.intrusions as f64 / self.trials as f64
    }
}

impl fmt::Display for TrialSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trials:           {}", self.trials)?;
        writeln!(f, "Secure keys:      {}", self.secure)?;
        writeln!(f, "Intrusions:       {}", self.intrusions)?;
        writeln!(f, "Sifting failures: {}", self.sifting_failures)?;
        writeln!(f, "Mean QBER:        {:.2}%", self.mean_qber * 100.0)?;
        writeln!(f, "Max QBER:         {:.2}%", self.max_qber * 100.0)?;
        writeln!(f, "Mean key length:  {:.1}", self.mean_key_length)?;
        write!(f, "Rejection rate:   {:.2}%", self.rejection_rate() * 100.0)
    }
}

impl Sampler {
    /// Creates a new `Sampler` around `simulator`.
    pub fn new(simulator: BB84Simulator) -> Self {
        Self { simulator }
    }

    /// Runs `num_trials` independent protocol runs.
    ///
    /// # Arguments
    ///
    /// * `rng` - Generator shared by all trials, drawn from sequentially.
    /// * `eavesdropper_present` - Whether Eve is simulated in every trial.
    /// * `num_trials` - Number of runs.
    pub fn run<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        eavesdropper_present: bool,
        num_trials: usize,
    ) -> TrialSummary {
        let mut summary = TrialSummary {
            trials: num_trials,
            ..TrialSummary::default()
        };
        let mut qber_sum = 0.0;
        let mut checked = 0usize;
        let mut key_bits = 0usize;

        for _ in 0..num_trials {
            let result: BB84Result = self.simulator.run(rng, eavesdropper_present);

            if let Some(qber) = result.qber() {
                qber_sum += qber;
                checked += 1;
                summary.max_qber = summary.max_qber.max(qber);
            }

            match &result.outcome {
                BB84Outcome::SiftingFailure => summary.sifting_failures += 1,
                BB84Outcome::Intrusion { .. } => summary.intrusions += 1,
                BB84Outcome::Secure { key, .. } => {
                    summary.secure += 1;
                    key_bits += key.len();
                }
            }
        }

        if checked > 0 {
            summary.mean_qber = qber_sum / checked as f64;
        }
        if summary.secure > 0 {
            summary.mean_key_length = key_bits as f64 / summary.secure as f64;
        }

        debug!(
            "{} trials: {} secure, {} intrusions, {} sifting failures",
            summary.trials, summary.secure, summary.intrusions, summary.sifting_failures
        );

        summary
    }
}
