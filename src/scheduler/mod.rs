//! Schedule evaluation, initial construction and KPIs.
//!
//! Shared by both search strategies:
//!
//! - [`ScheduleEvaluator`]: per-task timings and makespan of a schedule.
//! - [`ConstructionMethod`]: random initial solutions (dependency-aware or
//!   unconstrained).
//! - [`ScheduleKpi`]: makespan, lower bound, gap and utilization.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 5
//! - Graham (1969), "Bounds on Multiprocessing Timing Anomalies"

pub mod construction;
mod evaluator;
mod kpi;

pub use construction::ConstructionMethod;
pub use evaluator::{EvaluationMode, Evaluation, ScheduleEvaluator, TaskTiming};
pub use kpi::{lower_bound, ScheduleKpi};
