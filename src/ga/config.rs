//! Genetic search configuration and the stagnation rule.

use serde::{Deserialize, Serialize};

use super::operators::GeneticOperators;
use crate::error::ScheduleError;
use crate::scheduler::ConstructionMethod;

/// Genetic search parameters.
///
/// # Example
///
/// ```
/// use u_procsched::ga::GaConfig;
///
/// let config = GaConfig::default()
///     .with_population_size(50)
///     .with_max_generations(200)
///     .with_seed(42);
/// assert_eq!(config.elite_count(), 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// Chromosomes per generation.
    pub population_size: usize,
    /// Probability that two selected parents recombine.
    pub crossover_probability: f64,
    /// Probability that a non-elite offspring is mutated.
    pub mutation_probability: f64,
    /// Share of the population copied unchanged, in percent (0..=100).
    pub elitism_percentage: f64,
    /// Generations that always run before stagnation may stop the search.
    pub min_generations: usize,
    /// Best-fitness gain below which a generation counts as stagnant.
    pub min_fitness_improvement: f64,
    /// Hard cap on generations.
    pub max_generations: Option<usize>,
    /// Initial population constructor.
    pub construction: ConstructionMethod,
    /// Selection and mutation strategies.
    pub operators: GeneticOperators,
    /// RNG seed; `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 200,
            crossover_probability: 0.8,
            mutation_probability: 0.5,
            elitism_percentage: 20.0,
            min_generations: 50,
            min_fitness_improvement: 0.001,
            max_generations: None,
            construction: ConstructionMethod::default(),
            operators: GeneticOperators::default(),
            seed: None,
        }
    }
}

impl GaConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the crossover probability.
    pub fn with_crossover_probability(mut self, p: f64) -> Self {
        self.crossover_probability = p;
        self
    }

    /// Sets the mutation probability.
    pub fn with_mutation_probability(mut self, p: f64) -> Self {
        self.mutation_probability = p;
        self
    }

    /// Sets the elitism percentage.
    pub fn with_elitism_percentage(mut self, pct: f64) -> Self {
        self.elitism_percentage = pct;
        self
    }

    /// Sets the stagnation rule.
    pub fn with_stagnation(mut self, min_generations: usize, min_improvement: f64) -> Self {
        self.min_generations = min_generations;
        self.min_fitness_improvement = min_improvement;
        self
    }

    /// Caps the number of generations.
    pub fn with_max_generations(mut self, max: usize) -> Self {
        self.max_generations = Some(max);
        self
    }

    /// Sets the initial population constructor.
    pub fn with_construction(mut self, method: ConstructionMethod) -> Self {
        self.construction = method;
        self
    }

    /// Sets the genetic operators.
    pub fn with_operators(mut self, operators: GeneticOperators) -> Self {
        self.operators = operators;
        self
    }

    /// Fixes the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of elites: `ceil(size * pct / 100)`, at least 1 when `pct > 0`.
    pub fn elite_count(&self) -> usize {
        if self.elitism_percentage <= 0.0 {
            return 0;
        }
        let raw = (self.population_size as f64 * self.elitism_percentage / 100.0).ceil() as usize;
        raw.clamp(1, self.population_size.max(1))
    }

    /// The stagnation rule encoded by this configuration.
    pub fn stagnation(&self) -> StagnationCriterion {
        StagnationCriterion {
            min_generations: self.min_generations,
            min_improvement: self.min_fitness_improvement,
        }
    }

    /// Checks parameter ranges.
    ///
    /// # Errors
    /// [`ScheduleError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.population_size < 2 {
            return Err(ScheduleError::InvalidConfig(
                "population_size must be at least 2".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_probability) {
            return Err(ScheduleError::InvalidConfig(
                "crossover_probability must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_probability) {
            return Err(ScheduleError::InvalidConfig(
                "mutation_probability must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=100.0).contains(&self.elitism_percentage) {
            return Err(ScheduleError::InvalidConfig(
                "elitism_percentage must be in [0, 100]".into(),
            ));
        }
        if !self.min_fitness_improvement.is_finite() || self.min_fitness_improvement < 0.0 {
            return Err(ScheduleError::InvalidConfig(
                "min_fitness_improvement must be a non-negative number".into(),
            ));
        }
        if self.min_fitness_improvement == 0.0 && self.max_generations.is_none() {
            return Err(ScheduleError::InvalidConfig(
                "a zero min_fitness_improvement needs max_generations".into(),
            ));
        }
        if self.max_generations == Some(0) {
            return Err(ScheduleError::InvalidConfig(
                "max_generations must be positive".into(),
            ));
        }
        if let super::operators::SelectionType::Tournament { size: 0 } = self.operators.selection {
            return Err(ScheduleError::InvalidConfig(
                "tournament size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Stops a search once the best fitness stops improving.
///
/// Generation numbers are 1-based. After generation `g` the search stops
/// when `g >= min_generations` and the gain over generation `g - 1` is
/// below `min_improvement`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagnationCriterion {
    /// Generations that always run.
    pub min_generations: usize,
    /// Gain threshold.
    pub min_improvement: f64,
}

impl StagnationCriterion {
    /// Whether the search should stop after `generation`.
    pub fn should_terminate(&self, generation: usize, best: f64, previous_best: f64) -> bool {
        generation >= self.min_generations && best - previous_best < self.min_improvement
    }
}
