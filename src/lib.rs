//! Multiprocessor task scheduling with precedence constraints.
//!
//! Assigns tasks with durations and dependencies to identical processors,
//! orders each processor's queue and minimizes the makespan. Two search
//! strategies share one task model and one evaluator.
//!
//! # Modules
//!
//! - **`models`**: `TaskGraph` (immutable task arena), `TaskDeclaration`,
//!   `ProblemDefinition`, `Schedule` (processor queues), `Solution` (gene
//!   sequence)
//! - **`validation`**: Input integrity checks (duplicate names, unknown
//!   dependencies, DAG cycles)
//! - **`scheduler`**: Makespan evaluation, initial construction, KPIs
//! - **`ga`**: Genetic search with elitism and stagnation termination
//! - **`sa`**: Simulated annealing with dependency-checked swaps
//!
//! # Example
//!
//! ```
//! use u_procsched::ga::{GaConfig, GeneticSearch};
//! use u_procsched::models::{ProblemDefinition, TaskDeclaration};
//!
//! let problem = ProblemDefinition::new(2, Vec::new())
//!     .with_task(TaskDeclaration::new("A", 3))
//!     .with_task(TaskDeclaration::new("B", 4).with_dependency("A"))
//!     .with_task(TaskDeclaration::new("C", 3));
//! let graph = problem.build_graph().unwrap();
//!
//! let config = GaConfig::default().with_population_size(20).with_seed(42);
//! let result = GeneticSearch::new(&graph, problem.processors, config)
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! assert_eq!(result.makespan, 7);
//! ```
//!
//! # Logging
//!
//! Progress is reported through the `log` facade; no logger is installed.
//!
//! # References
//!
//! - Graham (1969), "Bounds on Multiprocessing Timing Anomalies"
//! - Hou, Ansari & Ren (1994), "A Genetic Algorithm for Multiprocessor Scheduling"
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"

pub mod error;
pub mod ga;
pub mod models;
pub mod sa;
pub mod scheduler;
pub mod validation;

pub use error::ScheduleError;
