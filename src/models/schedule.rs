//! Schedule (solution) model.
//!
//! A schedule is an ordered partition of all tasks into one queue per
//! processor. Queue order is execution order on that processor.
//!
//! # Invariant
//! Every task of the graph appears in exactly one queue exactly once
//! (checked by [`Schedule::is_partition_of`]).
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};

use super::{TaskGraph, TaskId};

/// Location of a task inside a schedule: `(processor, position)`.
pub type Slot = (usize, usize);

/// Processor queues of a multiprocessor schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    queues: Vec<Vec<TaskId>>,
}

impl Schedule {
    /// Creates a schedule with `processors` empty queues.
    pub fn new(processors: usize) -> Self {
        Self {
            queues: vec![Vec::new(); processors],
        }
    }

    /// Creates a schedule from explicit processor queues.
    pub fn from_queues(queues: Vec<Vec<TaskId>>) -> Self {
        Self { queues }
    }

    /// Number of processors.
    #[inline]
    pub fn processor_count(&self) -> usize {
        self.queues.len()
    }

    /// Queue of processor `processor` (empty if out of range).
    pub fn queue(&self, processor: usize) -> &[TaskId] {
        self.queues
            .get(processor)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All processor queues.
    pub fn queues(&self) -> &[Vec<TaskId>] {
        &self.queues
    }

    /// Appends a task to a processor queue, growing the processor set if needed.
    pub fn push(&mut self, processor: usize, task: TaskId) {
        if processor >= self.queues.len() {
            self.queues.resize_with(processor + 1, Vec::new);
        }
        self.queues[processor].push(task);
    }

    /// Total number of queued tasks.
    pub fn task_count(&self) -> usize {
        self.queues.iter().map(Vec::len).sum()
    }

    /// Finds where a task is queued.
    pub fn locate(&self, task: TaskId) -> Option<Slot> {
        self.queues.iter().enumerate().find_map(|(p, queue)| {
            queue
                .iter()
                .position(|&t| t == task)
                .map(|pos| (p, pos))
        })
    }

    /// Slot of every task, indexed by task index.
    ///
    /// Tasks outside `0..task_count` are ignored; unqueued tasks map to `None`.
    pub fn slots(&self, task_count: usize) -> Vec<Option<Slot>> {
        let mut slots = vec![None; task_count];
        for (p, queue) in self.queues.iter().enumerate() {
            for (pos, task) in queue.iter().enumerate() {
                if let Some(slot) = slots.get_mut(task.index()) {
                    *slot = Some((p, pos));
                }
            }
        }
        slots
    }

    /// Whether every task of `graph` is queued exactly once and nothing else is.
    pub fn is_partition_of(&self, graph: &TaskGraph) -> bool {
        if self.task_count() != graph.len() {
            return false;
        }
        let mut seen = vec![false; graph.len()];
        for task in self.queues.iter().flatten() {
            match seen.get_mut(task.index()) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
        }
        true
    }

    /// Exchanges the tasks at two slots (same or different processors).
    ///
    /// # Panics
    /// Panics if either slot is out of range.
    pub fn swap(&mut self, a: Slot, b: Slot) {
        if a.0 == b.0 {
            self.queues[a.0].swap(a.1, b.1);
        } else {
            let tmp = self.queues[a.0][a.1];
            self.queues[a.0][a.1] = self.queues[b.0][b.1];
            self.queues[b.0][b.1] = tmp;
        }
    }

    /// Task at a slot.
    pub fn task_at(&self, slot: Slot) -> Option<TaskId> {
        self.queues.get(slot.0).and_then(|q| q.get(slot.1)).copied()
    }

    /// Processor → ordered task names (output contract).
    pub fn named_queues<'g>(&self, graph: &'g TaskGraph) -> Vec<Vec<&'g str>> {
        self.queues
            .iter()
            .map(|queue| {
                queue
                    .iter()
                    .filter_map(|&id| graph.get(id).map(|t| t.name()))
                    .collect()
            })
            .collect()
    }
}
