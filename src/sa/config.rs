//! Annealing schedule parameters.

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::scheduler::ConstructionMethod;

/// When the annealing loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Termination {
    /// Run exactly this many iterations.
    Iterations(usize),
    /// Run while the temperature is above this value.
    MinTemperature(f64),
}

impl Default for Termination {
    fn default() -> Self {
        Termination::Iterations(100)
    }
}

/// Simulated annealing parameters.
///
/// # Example
///
/// ```
/// use u_procsched::sa::{AnnealingConfig, Termination};
///
/// let config = AnnealingConfig::default()
///     .with_cooling_rate(0.99)
///     .with_termination(Termination::MinTemperature(0.5))
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealingConfig {
    /// Starting temperature.
    pub initial_temperature: f64,
    /// Geometric cooling factor applied after every iteration.
    pub cooling_rate: f64,
    /// Stopping rule.
    pub termination: Termination,
    /// Constructor for the starting schedule.
    pub construction: ConstructionMethod,
    /// RNG seed; `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 1000.0,
            cooling_rate: 0.95,
            termination: Termination::default(),
            construction: ConstructionMethod::default(),
            seed: None,
        }
    }
}

impl AnnealingConfig {
    /// Sets the starting temperature.
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    /// Sets the cooling factor.
    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    /// Sets the stopping rule.
    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }

    /// Sets the starting-schedule constructor.
    pub fn with_construction(mut self, method: ConstructionMethod) -> Self {
        self.construction = method;
        self
    }

    /// Fixes the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks parameter ranges.
    ///
    /// A `MinTemperature` rule needs `cooling_rate < 1` to terminate.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if !(self.initial_temperature.is_finite() && self.initial_temperature > 0.0) {
            return Err(ScheduleError::InvalidConfig(
                "initial_temperature must be positive".into(),
            ));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate <= 1.0) {
            return Err(ScheduleError::InvalidConfig(
                "cooling_rate must be in (0, 1]".into(),
            ));
        }
        if let Termination::MinTemperature(min) = self.termination {
            if !(min.is_finite() && min > 0.0) {
                return Err(ScheduleError::InvalidConfig(
                    "minimum temperature must be positive".into(),
                ));
            }
            if self.cooling_rate >= 1.0 {
                return Err(ScheduleError::InvalidConfig(
                    "cooling_rate must be below 1 with a minimum temperature".into(),
                ));
            }
        }
        Ok(())
    }
}
