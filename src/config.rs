//! Parameters of the tabular learner.

use crate::error::{Error, Result};

/// Exploration and bootstrap settings for [`QAgent`](crate::agent::qlearning::QAgent).
///
/// ```
/// use tilers::LearnerConfig;
///
/// let config = LearnerConfig::default()
///     .with_epsilon(0.1)
///     .with_alpha(0.9);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearnerConfig {
    /// Probability of picking a random available action while learning.
    pub epsilon: f32,

    /// Weight of the successor's value in the overwrite
    /// `value(s, a) <- r + alpha * value(s', a')`.
    pub alpha: f32,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        LearnerConfig {
            epsilon: 0.2,
            alpha: 0.5,
        }
    }
}

impl LearnerConfig {
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn validate(&self) -> Result<()> {
        check_unit_interval("epsilon", self.epsilon)?;
        check_unit_interval("alpha", self.alpha)
    }
}

fn check_unit_interval(name: &str, value: f32) -> Result<()> {
    // NaN fails the range check too
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::InvalidConfiguration(format!(
            "{} must be in [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}
