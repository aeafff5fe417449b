mod core;
pub mod protocols;
mod sampler;

pub use crate::core::{ProtocolConfig, config, errors, utils};
pub use crate::protocols::bb84::{BB84Result, BB84Simulator};
pub use crate::protocols::qkd::BB84Outcome;
pub use crate::sampler::{Sampler, TrialSummary};
