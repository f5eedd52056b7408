//! Scheduling domain models.
//!
//! Provides the data types for multiprocessor scheduling with precedence
//! constraints: the immutable task arena, the input contract, and the two
//! solution representations used by the search strategies.
//!
//! | Type | Role |
//! |------|------|
//! | `Task` / `TaskId` | Immutable task record and its arena index |
//! | `TaskGraph` | Precedence DAG with structural queries |
//! | `TaskDeclaration` / `ProblemDefinition` | Name-based input contract |
//! | `Schedule` | Processor → ordered task queue |
//! | `Solution` / `Gene` | Processor-annotated task permutation (GA encoding) |

mod graph;
mod problem;
mod schedule;
mod solution;
mod task;

pub use graph::{TaskGraph, TaskGraphBuilder};
pub use problem::ProblemDefinition;
pub use schedule::{Schedule, Slot};
pub use solution::{Gene, Solution};
pub use task::{Task, TaskDeclaration, TaskId};
