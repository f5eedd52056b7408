//! Simulated annealing for multiprocessor scheduling.
//!
//! Works directly on processor queues. Neighbors come from
//! dependency-checked task swaps; energy is the makespan.
//!
//! # Reference
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"

mod config;
pub mod neighbor;
mod runner;

pub use config::{AnnealingConfig, Termination};
pub use runner::{
    AnnealingObserver, AnnealingResult, AnnealingSearch, IterationReport, accept_move,
};
