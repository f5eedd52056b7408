//! Configurable genetic operators for scheduling.
//!
//! Provides runtime-selectable parent selection and mutation strategies
//! via [`GeneticOperators`]. Crossover is always the two-point ordered
//! crossover.
//!
//! # Usage
//!
//! ```
//! use u_procsched::ga::operators::{GeneticOperators, MutationType, SelectionType};
//!
//! let ops = GeneticOperators::default();
//! assert_eq!(ops.selection, SelectionType::RouletteWheel);
//! assert_eq!(ops.mutation, MutationType::ProcessorSwap);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::chromosome::{
    ScheduleChromosome, order_swap_mutation, ordered_crossover, processor_swap_mutation,
};

/// Parent selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionType {
    /// Fitness-proportionate selection.
    #[default]
    RouletteWheel,
    /// Best of `size` uniformly drawn candidates.
    Tournament {
        /// Number of candidates per tournament.
        size: usize,
    },
}

/// Mutation strategy for scheduling chromosomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MutationType {
    /// Swap the processor labels of two random genes.
    #[default]
    ProcessorSwap,
    /// Swap the positions of two random genes.
    OrderSwap,
}

/// Runtime-selectable genetic operators for the scheduling GA.
///
/// # Example
///
/// ```
/// use u_procsched::ga::operators::{GeneticOperators, MutationType, SelectionType};
///
/// let ops = GeneticOperators {
///     selection: SelectionType::Tournament { size: 3 },
///     mutation: MutationType::OrderSwap,
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeneticOperators {
    /// Parent selection strategy.
    #[serde(default)]
    pub selection: SelectionType,
    /// Mutation strategy.
    #[serde(default)]
    pub mutation: MutationType,
}

impl GeneticOperators {
    /// Selects the index of one parent from an evaluated population.
    ///
    /// Returns `None` only for an empty population.
    pub fn select<R: Rng>(&self, population: &[ScheduleChromosome], rng: &mut R) -> Option<usize> {
        if population.is_empty() {
            return None;
        }
        let index = match self.selection {
            SelectionType::RouletteWheel => roulette_wheel(population, rng),
            SelectionType::Tournament { size } => tournament(population, size, rng),
        };
        Some(index)
    }

    /// Performs two-point ordered crossover.
    pub fn crossover<R: Rng>(
        &self,
        p1: &ScheduleChromosome,
        p2: &ScheduleChromosome,
        rng: &mut R,
    ) -> (ScheduleChromosome, ScheduleChromosome) {
        ordered_crossover(p1, p2, rng)
    }

    /// Performs mutation using the configured strategy.
    pub fn mutate<R: Rng>(&self, chromosome: &mut ScheduleChromosome, rng: &mut R) {
        match self.mutation {
            MutationType::ProcessorSwap => processor_swap_mutation(chromosome, rng),
            MutationType::OrderSwap => order_swap_mutation(chromosome, rng),
        }
    }
}

/// Spins a wheel whose slots are proportional to fitness.
///
/// Falls back to a uniform pick when the fitness total is not a positive
/// finite number.
fn roulette_wheel<R: Rng>(population: &[ScheduleChromosome], rng: &mut R) -> usize {
    let total: f64 = population.iter().map(|c| c.fitness.max(0.0)).sum();
    if !(total.is_finite() && total > 0.0) {
        return rng.random_range(0..population.len());
    }

    let mut spin = rng.random::<f64>() * total;
    for (i, chromosome) in population.iter().enumerate() {
        spin -= chromosome.fitness.max(0.0);
        if spin < 0.0 {
            return i;
        }
    }
    population.len() - 1
}

fn tournament<R: Rng>(population: &[ScheduleChromosome], size: usize, rng: &mut R) -> usize {
    let mut best = rng.random_range(0..population.len());
    for _ in 1..size.max(1) {
        let candidate = rng.random_range(0..population.len());
        if population[candidate].fitness > population[best].fitness {
            best = candidate;
        }
    }
    best
}
