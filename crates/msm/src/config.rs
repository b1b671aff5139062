//! Configuration of a Markov state model.

use serde::{Deserialize, Serialize};

use crate::builders::Method;
use crate::error::MsmError;

/// Configuration of a Markov state model.
///
/// Immutable once the model is built. Serialises to the `config` artifact of
/// a saved model.
///
/// # Example
///
/// ```
/// use mdmsm_msm::{Method, MsmConfig};
///
/// let config = MsmConfig::new(5)
///     .with_trim(true)
///     .with_method(Method::Transpose);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MsmConfig {
    lag_time: usize,
    #[serde(default = "default_sliding_window")]
    sliding_window: bool,
    #[serde(default)]
    trim: bool,
    #[serde(default)]
    method: Method,
}

fn default_sliding_window() -> bool {
    true
}

impl MsmConfig {
    /// Creates a configuration with the given lag time.
    ///
    /// Defaults: `sliding_window = true`, `trim = false`,
    /// `method = maximum-likelihood`.
    pub fn new(lag_time: usize) -> Self {
        Self {
            lag_time,
            sliding_window: default_sliding_window(),
            trim: false,
            method: Method::default(),
        }
    }

    /// Sets the lag time in frames.
    pub fn with_lag_time(mut self, lag_time: usize) -> Self {
        self.lag_time = lag_time;
        self
    }

    /// Enables or disables overlapping count windows.
    pub fn with_sliding_window(mut self, sliding_window: bool) -> Self {
        self.sliding_window = sliding_window;
        self
    }

    /// Enables or disables restriction to the largest connected set.
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Sets the probability estimator.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    // --- Accessors ---

    /// Returns the lag time.
    pub fn lag_time(&self) -> usize {
        self.lag_time
    }

    /// Returns whether overlapping windows are counted.
    pub fn sliding_window(&self) -> bool {
        self.sliding_window
    }

    /// Returns whether disconnected states are trimmed.
    pub fn trim(&self) -> bool {
        self.trim
    }

    /// Returns the probability estimator.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), MsmError> {
        if self.lag_time == 0 {
            return Err(MsmError::InvalidLagTime {
                lag_time: self.lag_time,
            });
        }
        Ok(())
    }
}
