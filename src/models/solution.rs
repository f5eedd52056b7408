//! Gene-sequence solution encoding.
//!
//! A solution is a permutation of all tasks, each annotated with a processor
//! label. Filtering the sequence by processor yields that processor's queue,
//! so relative order matters even between genes on different processors
//! only through the per-processor projection.

use serde::{Deserialize, Serialize};

use super::{Schedule, TaskGraph, TaskId};

/// One `(task, processor)` pair of a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gene {
    /// Task being placed.
    pub task: TaskId,
    /// Processor label in `0..P`.
    pub processor: usize,
}

impl Gene {
    /// Creates a gene.
    pub fn new(task: TaskId, processor: usize) -> Self {
        Self { task, processor }
    }
}

/// Processor-annotated task permutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// Genes in sequence order.
    pub genes: Vec<Gene>,
}

impl Solution {
    /// Creates an empty solution with room for `capacity` genes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            genes: Vec::with_capacity(capacity),
        }
    }

    /// Appends a gene.
    pub fn push(&mut self, task: TaskId, processor: usize) {
        self.genes.push(Gene::new(task, processor));
    }

    /// Number of genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Whether there are no genes.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Processor assigned to `task`, if present.
    pub fn processor_of(&self, task: TaskId) -> Option<usize> {
        self.genes
            .iter()
            .find(|g| g.task == task)
            .map(|g| g.processor)
    }

    /// Decodes into per-processor queues.
    pub fn to_schedule(&self, processors: usize) -> Schedule {
        let mut schedule = Schedule::new(processors);
        for gene in &self.genes {
            schedule.push(gene.processor, gene.task);
        }
        schedule
    }

    /// Whether the genes are a permutation of the graph's tasks with
    /// processor labels in `0..processors`.
    pub fn is_valid(&self, graph: &TaskGraph, processors: usize) -> bool {
        if self.genes.len() != graph.len() {
            return false;
        }
        let mut seen = vec![false; graph.len()];
        for gene in &self.genes {
            if gene.processor >= processors {
                return false;
            }
            match seen.get_mut(gene.task.index()) {
                Some(flag) if !*flag => *flag = true,
                _ => return false,
            }
        }
        true
    }
}

impl From<&Schedule> for Solution {
    /// Encodes a schedule, interleaving queues position by position.
    fn from(schedule: &Schedule) -> Self {
        let mut solution = Solution::with_capacity(schedule.task_count());
        let depth = schedule.queues().iter().map(Vec::len).max().unwrap_or(0);
        for pos in 0..depth {
            for (p, queue) in schedule.queues().iter().enumerate() {
                if let Some(&task) = queue.get(pos) {
                    solution.push(task, p);
                }
            }
        }
        solution
    }
}
