//! Makespan evaluation.
//!
//! Computes per-task start/finish times of a [`Schedule`] and its makespan,
//! honoring both sequential execution on each processor and precedence
//! constraints across processors.
//!
//! # Modes
//!
//! - [`EvaluationMode::Topological`] (default): two passes. First each
//!   queue is put into dependency order: a task moves ahead of
//!   earlier-queued tasks only when a dependency on the same queue forces
//!   it. Then every processor runs its queue in that order, a task waiting
//!   until its cross-processor dependencies have finished. If the queues
//!   wait on each other in a circle, the earliest-queued task whose
//!   dependencies are done runs out of turn. A dependency is always timed
//!   before its dependents.
//! - [`EvaluationMode::SinglePass`]: processors are visited in index order
//!   and each queue in order. A dependency that has not been visited yet
//!   counts as finishing at 0, which under-counts cross-processor delay.
//!
//! [`Evaluation::executed_schedule`] returns the queues in the order they
//! were actually run, which is what a search reports as its result.
//!
//! Time arithmetic saturates at `u64::MAX`.
//!
//! # Complexity
//! Topological: O((N + E) log N + N·P) in the worst case. Single pass: O(N + E).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::models::{Schedule, Slot, Task, TaskGraph, TaskId};

/// How cross-processor dependencies are resolved during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EvaluationMode {
    /// Queue order, repaired only where precedence requires it.
    #[default]
    Topological,
    /// One pass over queues; unvisited dependencies finish at 0.
    SinglePass,
}

/// Timing of one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTiming {
    /// Task id.
    pub task: TaskId,
    /// Processor the task runs on.
    pub processor: usize,
    /// Start time.
    pub start: u64,
    /// Finish time (`start + duration`).
    pub finish: u64,
}

/// Result of evaluating a schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    timings: Vec<Option<TaskTiming>>,
    order: Vec<Vec<TaskId>>,
    makespan: u64,
}

impl Evaluation {
    /// Latest finish time over all tasks.
    #[inline]
    pub fn makespan(&self) -> u64 {
        self.makespan
    }

    /// Timing of a task, if it was scheduled.
    pub fn timing(&self, task: TaskId) -> Option<&TaskTiming> {
        self.timings.get(task.index()).and_then(Option::as_ref)
    }

    /// Finish time of a task, if it was scheduled.
    pub fn finish_time(&self, task: TaskId) -> Option<u64> {
        self.timing(task).map(|t| t.finish)
    }

    /// Timings of all scheduled tasks, in task id order.
    pub fn timings(&self) -> impl Iterator<Item = &TaskTiming> {
        self.timings.iter().flatten()
    }

    /// Timings on one processor, in execution order.
    pub fn processor_timeline(&self, processor: usize) -> Vec<TaskTiming> {
        self.order
            .get(processor)
            .map(|queue| queue.iter().filter_map(|&id| self.timing(id).copied()).collect())
            .unwrap_or_default()
    }

    /// Processor queues in the order the tasks were run.
    pub fn executed_schedule(&self) -> Schedule {
        Schedule::from_queues(self.order.clone())
    }
}

/// Running state shared by both evaluation modes.
struct Timeline {
    available: Vec<u64>,
    finish: Vec<u64>,
    timings: Vec<Option<TaskTiming>>,
    order: Vec<Vec<TaskId>>,
}

impl Timeline {
    fn new(tasks: usize, processors: usize) -> Self {
        Self {
            available: vec![0; processors],
            finish: vec![0; tasks],
            timings: vec![None; tasks],
            order: vec![Vec::new(); processors],
        }
    }

    fn place(&mut self, task: &Task, processor: usize) {
        let deps_finish = task
            .dependencies()
            .iter()
            .map(|dep| self.finish[dep.index()])
            .max()
            .unwrap_or(0);
        let start = deps_finish.max(self.available[processor]);
        let end = start.saturating_add(task.duration());

        let id = task.id();
        self.available[processor] = end;
        self.finish[id.index()] = end;
        self.timings[id.index()] = Some(TaskTiming {
            task: id,
            processor,
            start,
            finish: end,
        });
        self.order[processor].push(id);
    }

    fn into_evaluation(self) -> Evaluation {
        let makespan = self
            .timings
            .iter()
            .flatten()
            .map(|t| t.finish)
            .max()
            .unwrap_or(0);
        Evaluation {
            timings: self.timings,
            order: self.order,
            makespan,
        }
    }
}

/// Schedule evaluator bound to a task graph.
///
/// # Example
/// ```
/// use u_procsched::models::{Schedule, TaskGraph};
/// use u_procsched::scheduler::ScheduleEvaluator;
///
/// let graph = TaskGraph::builder()
///     .with_task("A", 3, [] as [&str; 0]).unwrap()
///     .with_task("B", 4, ["A"]).unwrap()
///     .build();
/// let a = graph.id_of("A").unwrap();
/// let b = graph.id_of("B").unwrap();
///
/// // B is queued first but still has to wait for A.
/// let schedule = Schedule::from_queues(vec![vec![b, a]]);
/// assert_eq!(ScheduleEvaluator::new(&graph).makespan(&schedule), 7);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ScheduleEvaluator<'a> {
    graph: &'a TaskGraph,
    mode: EvaluationMode,
}

impl<'a> ScheduleEvaluator<'a> {
    /// Creates an evaluator using [`EvaluationMode::Topological`].
    pub fn new(graph: &'a TaskGraph) -> Self {
        Self {
            graph,
            mode: EvaluationMode::default(),
        }
    }

    /// Sets the evaluation mode.
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Active evaluation mode.
    pub fn mode(&self) -> EvaluationMode {
        self.mode
    }

    /// The graph this evaluator reads durations and dependencies from.
    pub fn graph(&self) -> &'a TaskGraph {
        self.graph
    }

    /// Makespan of a schedule.
    pub fn makespan(&self, schedule: &Schedule) -> u64 {
        self.evaluate(schedule).makespan()
    }

    /// Per-task timings and makespan of a schedule.
    ///
    /// Tasks missing from the schedule get no timing and count as finishing
    /// at 0 for their dependents.
    pub fn evaluate(&self, schedule: &Schedule) -> Evaluation {
        match self.mode {
            EvaluationMode::Topological => self.evaluate_topological(schedule),
            EvaluationMode::SinglePass => self.evaluate_single_pass(schedule),
        }
    }

    fn evaluate_single_pass(&self, schedule: &Schedule) -> Evaluation {
        let mut timeline = Timeline::new(self.graph.len(), schedule.processor_count());
        for (processor, queue) in schedule.queues().iter().enumerate() {
            for &id in queue {
                if let Some(task) = self.graph.get(id) {
                    timeline.place(task, processor);
                }
            }
        }
        timeline.into_evaluation()
    }

    fn evaluate_topological(&self, schedule: &Schedule) -> Evaluation {
        let n = self.graph.len();
        let queues: Vec<Vec<TaskId>> = schedule
            .queues()
            .iter()
            .map(|queue| self.dependency_ordered(queue))
            .collect();

        // Tasks missing from the schedule count as finished at 0.
        let mut done = vec![true; n];
        for &id in queues.iter().flatten() {
            done[id.index()] = false;
        }

        let mut timeline = Timeline::new(n, queues.len());
        let mut cursor = vec![0usize; queues.len()];
        let mut remaining: usize = queues.iter().map(Vec::len).sum();

        while remaining > 0 {
            let mut progressed = false;
            for (processor, queue) in queues.iter().enumerate() {
                while let Some(&id) = queue.get(cursor[processor]) {
                    if !done[id.index()] {
                        let task = self.graph.task(id);
                        if !deps_done(task, &done) {
                            break;
                        }
                        timeline.place(task, processor);
                        done[id.index()] = true;
                    }
                    cursor[processor] += 1;
                    remaining -= 1;
                    progressed = true;
                }
            }

            if !progressed {
                // Queue heads wait on each other across processors.
                let Some((processor, id)) = self.first_runnable(&queues, &cursor, &done) else {
                    break;
                };
                timeline.place(self.graph.task(id), processor);
                done[id.index()] = true;
            }
        }

        timeline.into_evaluation()
    }

    /// Queue with duplicates and unknown ids dropped, reordered only where
    /// a same-queue dependency is queued after its dependent.
    fn dependency_ordered(&self, queue: &[TaskId]) -> Vec<TaskId> {
        let mut position = vec![None; self.graph.len()];
        let mut entries = Vec::with_capacity(queue.len());
        for &id in queue {
            if let Some(slot) = position.get_mut(id.index()) {
                if slot.is_none() {
                    *slot = Some(entries.len());
                    entries.push(id);
                }
            }
        }

        let mut pending: Vec<usize> = entries
            .iter()
            .map(|&id| {
                self.graph
                    .task(id)
                    .dependencies()
                    .iter()
                    .filter(|dep| position[dep.index()].is_some())
                    .count()
            })
            .collect();
        let mut heap: BinaryHeap<Reverse<usize>> = pending
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == 0)
            .map(|(pos, _)| Reverse(pos))
            .collect();

        let mut ordered = Vec::with_capacity(entries.len());
        while let Some(Reverse(pos)) = heap.pop() {
            let id = entries[pos];
            ordered.push(id);
            for &succ in self.graph.successors(id) {
                if let Some(succ_pos) = position[succ.index()] {
                    pending[succ_pos] -= 1;
                    if pending[succ_pos] == 0 {
                        heap.push(Reverse(succ_pos));
                    }
                }
            }
        }
        ordered
    }

    /// Earliest-queued unfinished task, by `(position, processor)`, whose
    /// dependencies have all finished.
    fn first_runnable(
        &self,
        queues: &[Vec<TaskId>],
        cursor: &[usize],
        done: &[bool],
    ) -> Option<(usize, TaskId)> {
        queues
            .iter()
            .enumerate()
            .flat_map(|(processor, queue)| {
                queue
                    .iter()
                    .enumerate()
                    .skip(cursor[processor])
                    .map(move |(pos, &id)| (pos, processor, id))
            })
            .filter(|&(_, _, id)| !done[id.index()] && deps_done(self.graph.task(id), done))
            .min_by_key(|&(pos, processor, _)| (pos, processor))
            .map(|(_, processor, id)| (processor, id))
    }

    /// Whether `schedule` is a feasible assignment.
    ///
    /// Requires the partition invariant, that the evaluator runs every
    /// queue exactly as written, and for every task:
    /// - each dependency on the same processor is queued before it;
    /// - each dependency on another processor finishes (per this
    ///   evaluator) no later than the task starts.
    pub fn is_valid_assignment(&self, schedule: &Schedule) -> bool {
        if !schedule.is_partition_of(self.graph) {
            return false;
        }

        let slots = schedule.slots(self.graph.len());
        let evaluation = self.evaluate(schedule);
        if evaluation.order.as_slice() != schedule.queues() {
            return false;
        }

        self.graph.tasks().iter().all(|task| {
            let Some(slot) = slots[task.id().index()] else {
                return false;
            };
            task.dependencies().iter().all(|&dep| {
                dependency_satisfied(slot, slots[dep.index()], || {
                    match (evaluation.finish_time(dep), evaluation.timing(task.id())) {
                        (Some(dep_finish), Some(timing)) => dep_finish <= timing.start,
                        _ => false,
                    }
                })
            })
        })
    }
}

fn deps_done(task: &Task, done: &[bool]) -> bool {
    task.dependencies().iter().all(|dep| done[dep.index()])
}

fn dependency_satisfied(
    slot: Slot,
    dep_slot: Option<Slot>,
    cross_processor_ok: impl FnOnce() -> bool,
) -> bool {
    match dep_slot {
        Some((dep_processor, dep_position)) if dep_processor == slot.0 => dep_position < slot.1,
        Some(_) => cross_processor_ok(),
        None => false,
    }
}
