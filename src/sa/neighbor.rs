//! Swap neighborhood for annealing.
//!
//! A move exchanges one task of processor `p` with one task of processor
//! `q` (`p` and `q` drawn with replacement, so they may coincide). The move
//! is kept only if neither affected queue then lists a task ahead of one
//! of its own dependencies; otherwise the schedule is left as it was.

use log::trace;
use rand::Rng;

use crate::models::{Schedule, Slot, TaskGraph, TaskId};

/// Draws a neighbor of `current`.
///
/// Returns an unchanged copy when a drawn queue is empty or the swap would
/// break same-queue dependency order.
pub fn swap_neighbor<R: Rng>(graph: &TaskGraph, current: &Schedule, rng: &mut R) -> Schedule {
    let mut neighbor = current.clone();
    let processors = neighbor.processor_count();
    if processors == 0 {
        return neighbor;
    }

    let p = rng.random_range(0..processors);
    let q = rng.random_range(0..processors);
    let (len_p, len_q) = (neighbor.queue(p).len(), neighbor.queue(q).len());
    if len_p == 0 || len_q == 0 {
        return neighbor;
    }

    let a = (p, rng.random_range(0..len_p));
    let b = (q, rng.random_range(0..len_q));
    if !try_swap(graph, &mut neighbor, a, b) {
        trace!("rejected swap {a:?} <-> {b:?}: dependency order");
    }
    neighbor
}

/// Swaps the tasks at `a` and `b` if both queues stay dependency-ordered.
///
/// Returns whether the swap was applied. On `false` the schedule is
/// unchanged.
pub fn try_swap(graph: &TaskGraph, schedule: &mut Schedule, a: Slot, b: Slot) -> bool {
    if a == b || schedule.task_at(a).is_none() || schedule.task_at(b).is_none() {
        return false;
    }

    schedule.swap(a, b);
    let ordered = respects_dependencies(graph, schedule.queue(a.0))
        && (a.0 == b.0 || respects_dependencies(graph, schedule.queue(b.0)));
    if !ordered {
        schedule.swap(a, b);
    }
    ordered
}

/// Whether every task in `queue` comes after its dependencies that share the queue.
pub fn respects_dependencies(graph: &TaskGraph, queue: &[TaskId]) -> bool {
    let mut position = vec![None; graph.len()];
    for (pos, task) in queue.iter().enumerate() {
        if let Some(slot) = position.get_mut(task.index()) {
            *slot = Some(pos);
        }
    }

    queue.iter().enumerate().all(|(pos, &task)| {
        graph.get(task).map_or(true, |t| {
            t.dependencies().iter().all(|dep| {
                position
                    .get(dep.index())
                    .copied()
                    .flatten()
                    .map_or(true, |d| d < pos)
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskDeclaration;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    // X, A, B with B depending on A.
    fn graph() -> TaskGraph {
        TaskGraph::from_declarations(&[
            TaskDeclaration::new("X", 1),
            TaskDeclaration::new("A", 2),
            TaskDeclaration::new("B", 3).with_dependency("A"),
        ])
        .unwrap()
    }

    fn ids(g: &TaskGraph) -> (TaskId, TaskId, TaskId) {
        (
            g.id_of("X").unwrap(),
            g.id_of("A").unwrap(),
            g.id_of("B").unwrap(),
        )
    }

    #[test]
    fn test_swap_placing_task_before_dependency_is_rejected() {
        let g = graph();
        let (x, a, b) = ids(&g);
        let mut schedule = Schedule::from_queues(vec![vec![x, a], vec![b]]);
        let before = schedule.clone();

        // B would land ahead of A on processor 0.
        assert!(!try_swap(&g, &mut schedule, (0, 0), (1, 0)));
        assert_eq!(schedule, before);
    }

    #[test]
    fn test_cross_processor_swap_is_accepted() {
        let g = graph();
        let (x, a, b) = ids(&g);
        let mut schedule = Schedule::from_queues(vec![vec![x, a], vec![b]]);

        assert!(try_swap(&g, &mut schedule, (0, 1), (1, 0)));
        assert_eq!(schedule.queue(0), &[x, b]);
        assert_eq!(schedule.queue(1), &[a]);
        assert!(schedule.is_partition_of(&g));
    }

    #[test]
    fn test_same_queue_swap_checks_order() {
        let g = graph();
        let (x, a, b) = ids(&g);
        let mut schedule = Schedule::from_queues(vec![vec![a, x, b]]);

        assert!(!try_swap(&g, &mut schedule, (0, 0), (0, 2)));
        assert_eq!(schedule.queue(0), &[a, x, b]);
        assert!(try_swap(&g, &mut schedule, (0, 1), (0, 2)));
        assert_eq!(schedule.queue(0), &[a, b, x]);
    }

    #[test]
    fn test_neighbor_keeps_partition() {
        let g = graph();
        let (x, a, b) = ids(&g);
        let mut current = Schedule::from_queues(vec![vec![a, b], vec![x], Vec::new()]);
        let mut rng = SmallRng::seed_from_u64(42);

        for _ in 0..200 {
            current = swap_neighbor(&g, &current, &mut rng);
            assert!(current.is_partition_of(&g));
            assert!(current.queues().iter().all(|q| respects_dependencies(&g, q)));
        }
    }
}
