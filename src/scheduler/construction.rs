//! Initial solution construction.
//!
//! Both constructors place exactly one task per iteration and therefore
//! finish in N iterations for N tasks.
//!
//! - **Dependency-aware**: picks uniformly among ready tasks (all
//!   dependencies already placed), so every processor queue lists
//!   dependencies before dependents.
//! - **Unconstrained**: random task order, random processors; ordering is
//!   left to the evaluator and the search.

use std::collections::BTreeSet;

use log::trace;
use rand::prelude::IndexedRandom;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;
use crate::models::{Solution, TaskGraph, TaskId};

/// Selects the initial-solution constructor used by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConstructionMethod {
    /// Ready-task-first random construction.
    #[default]
    DependencyAware,
    /// Random order and processors, no precedence pass.
    Unconstrained,
}

impl ConstructionMethod {
    /// Builds one solution with this method.
    pub fn construct<R: Rng>(
        self,
        graph: &TaskGraph,
        processors: usize,
        rng: &mut R,
    ) -> Result<Solution, ScheduleError> {
        match self {
            ConstructionMethod::DependencyAware => dependency_aware(graph, processors, rng),
            ConstructionMethod::Unconstrained => unconstrained(graph, processors, rng),
        }
    }
}

/// Builds a random solution that respects dependency order.
///
/// Each iteration picks a uniformly random ready task, assigns it a
/// uniformly random processor in `0..processors` and appends it.
///
/// # Errors
/// - [`ScheduleError::NoProcessors`] if `processors == 0`.
/// - [`ScheduleError::CyclicDependency`] if no task is ready while tasks
///   remain.
pub fn dependency_aware<R: Rng>(
    graph: &TaskGraph,
    processors: usize,
    rng: &mut R,
) -> Result<Solution, ScheduleError> {
    if processors == 0 {
        return Err(ScheduleError::NoProcessors);
    }

    let mut remaining: BTreeSet<TaskId> = graph.ids().collect();
    let mut solution = Solution::with_capacity(graph.len());

    while !remaining.is_empty() {
        let ready = graph.ready_tasks(&remaining);
        let Some(&task) = ready.choose(rng) else {
            let stuck = remaining
                .first()
                .map(|&id| graph.task(id).name().to_string())
                .unwrap_or_default();
            return Err(ScheduleError::CyclicDependency(stuck));
        };

        let processor = rng.random_range(0..processors);
        trace!("placing {} on processor {processor}", graph.task(task).name());
        solution.push(task, processor);
        remaining.remove(&task);
    }

    Ok(solution)
}

/// Builds a random solution without regard to dependencies.
///
/// # Errors
/// [`ScheduleError::NoProcessors`] if `processors == 0`.
pub fn unconstrained<R: Rng>(
    graph: &TaskGraph,
    processors: usize,
    rng: &mut R,
) -> Result<Solution, ScheduleError> {
    if processors == 0 {
        return Err(ScheduleError::NoProcessors);
    }

    let mut order: Vec<TaskId> = graph.ids().collect();
    order.shuffle(rng);

    let mut solution = Solution::with_capacity(order.len());
    for task in order {
        solution.push(task, rng.random_range(0..processors));
    }
    Ok(solution)
}
