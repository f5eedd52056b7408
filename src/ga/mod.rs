//! GA-based multiprocessor scheduling.
//!
//! A population of processor-annotated task permutations evolves under
//! elitism, fitness-proportionate (or tournament) selection, ordered
//! crossover and processor-swap mutation, until the best fitness stagnates.
//!
//! # Encoding
//!
//! Each chromosome is a [`Solution`](crate::models::Solution): a sequence of
//! `(task, processor)` genes. Filtering by processor yields the queues.
//! Fitness is `1 / makespan`.
//!
//! # Submodules
//!
//! - [`operators`]: Runtime-selectable selection and mutation strategies
//!
//! # Reference
//! - Hou, Ansari & Ren (1994), "A Genetic Algorithm for Multiprocessor Scheduling"
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization and Machine Learning"

mod chromosome;
mod config;
pub mod operators;
mod runner;

pub use chromosome::{
    ScheduleChromosome, fitness_of, order_swap_mutation, ordered_crossover,
    processor_swap_mutation,
};
pub use config::{GaConfig, StagnationCriterion};
pub use runner::{
    GaResult, GenerationObserver, GenerationReport, GeneticSearch, TerminationReason,
};
