//! Task graph (precedence DAG) model.
//!
//! The graph is an arena of immutable [`Task`] records addressed by
//! [`TaskId`]. It answers the structural queries the constructors and
//! evaluators need: readiness, successors, topological order and
//! critical-path length.
//!
//! # Construction
//!
//! - [`TaskGraph::from_declarations`]: batch input; dependencies may refer to
//!   tasks declared later, and cycles are rejected.
//! - [`TaskGraphBuilder`]: incremental input; a dependency must name a task
//!   that was already added, so cycles cannot be expressed.
//!
//! # Reference
//! Kahn (1962), "Topological sorting of large networks"

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use super::{Schedule, Task, TaskDeclaration, TaskId};
use crate::error::ScheduleError;
use crate::scheduler::ScheduleEvaluator;
use crate::validation::{validate_declarations, ValidationError, ValidationErrorKind};

/// Directed acyclic graph of tasks and their dependencies.
///
/// # Example
/// ```
/// use u_procsched::models::TaskGraph;
///
/// let graph = TaskGraph::builder()
///     .with_task("A", 3, [] as [&str; 0]).unwrap()
///     .with_task("B", 4, ["A"]).unwrap()
///     .build();
///
/// assert_eq!(graph.len(), 2);
/// assert_eq!(graph.critical_path_length(), 7);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    successors: Vec<Vec<TaskId>>,
    index: HashMap<String, TaskId>,
}

impl TaskGraph {
    /// Starts an incremental builder.
    pub fn builder() -> TaskGraphBuilder {
        TaskGraphBuilder::new()
    }

    /// Builds a graph from a batch of declarations.
    ///
    /// Dependencies may appear in any order. All declarations are validated
    /// first; any duplicate name, unknown dependency or cycle is reported as
    /// [`ScheduleError::InvalidInput`].
    pub fn from_declarations(declarations: &[TaskDeclaration]) -> Result<Self, ScheduleError> {
        validate_declarations(declarations).map_err(ScheduleError::InvalidInput)?;

        let index: HashMap<String, TaskId> = declarations
            .iter()
            .enumerate()
            .map(|(i, decl)| (decl.name.clone(), TaskId(i)))
            .collect();

        let tasks = declarations
            .iter()
            .enumerate()
            .map(|(i, decl)| {
                let mut deps: Vec<TaskId> = decl
                    .dependencies
                    .iter()
                    .filter_map(|name| index.get(name).copied())
                    .collect();
                deps.sort_unstable();
                deps.dedup();
                Task::new(TaskId(i), decl.name.clone(), decl.duration, deps)
            })
            .collect();

        Ok(Self::assemble(tasks, index))
    }

    fn assemble(tasks: Vec<Task>, index: HashMap<String, TaskId>) -> Self {
        let mut successors = vec![Vec::new(); tasks.len()];
        for task in &tasks {
            for dep in task.dependencies() {
                successors[dep.index()].push(task.id());
            }
        }
        Self {
            tasks,
            successors,
            index,
        }
    }

    /// Number of tasks.
    #[inline]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the graph has no tasks.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// All tasks in declaration order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Task ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.iter().map(Task::id)
    }

    /// Returns the task with the given id.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this graph.
    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.index()]
    }

    /// Returns the task with the given id, if it belongs to this graph.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.index())
    }

    /// Looks up a task id by name.
    pub fn id_of(&self, name: &str) -> Option<TaskId> {
        self.index.get(name).copied()
    }

    /// Tasks that directly depend on `id`.
    pub fn successors(&self, id: TaskId) -> &[TaskId] {
        self.successors
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sum of all task durations, saturating at `u64::MAX`.
    pub fn total_duration(&self) -> u64 {
        self.tasks
            .iter()
            .fold(0u64, |total, task| total.saturating_add(task.duration()))
    }

    /// Whether `id` has no dependency left in `remaining`.
    pub fn is_ready(&self, id: TaskId, remaining: &BTreeSet<TaskId>) -> bool {
        self.task(id)
            .dependencies()
            .iter()
            .all(|dep| !remaining.contains(dep))
    }

    /// Tasks in `remaining` none of whose dependencies are still in `remaining`.
    ///
    /// Returned in ascending id order. An empty result for a non-empty
    /// `remaining` set means the remaining tasks form a cycle.
    pub fn ready_tasks(&self, remaining: &BTreeSet<TaskId>) -> Vec<TaskId> {
        remaining
            .iter()
            .copied()
            .filter(|&id| self.is_ready(id, remaining))
            .collect()
    }

    /// Topological order; ties are broken by declaration order.
    pub fn topological_order(&self) -> Vec<TaskId> {
        let mut pending: Vec<usize> = self.tasks.iter().map(|t| t.dependencies().len()).collect();
        let mut heap: BinaryHeap<Reverse<TaskId>> = self
            .tasks
            .iter()
            .filter(|t| t.is_root())
            .map(|t| Reverse(t.id()))
            .collect();

        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some(Reverse(id)) = heap.pop() {
            order.push(id);
            for &succ in self.successors(id) {
                pending[succ.index()] -= 1;
                if pending[succ.index()] == 0 {
                    heap.push(Reverse(succ));
                }
            }
        }
        order
    }

    /// Length of the longest duration-weighted dependency chain.
    ///
    /// A lower bound on the makespan for any processor count.
    pub fn critical_path_length(&self) -> u64 {
        let mut finish = vec![0u64; self.tasks.len()];
        for id in self.topological_order() {
            let task = self.task(id);
            let ready = task
                .dependencies()
                .iter()
                .map(|dep| finish[dep.index()])
                .max()
                .unwrap_or(0);
            finish[id.index()] = ready.saturating_add(task.duration());
        }
        finish.into_iter().max().unwrap_or(0)
    }

    /// Whether `schedule` is a feasible assignment of this graph.
    ///
    /// See [`ScheduleEvaluator::is_valid_assignment`].
    pub fn is_valid_assignment(&self, schedule: &Schedule) -> bool {
        ScheduleEvaluator::new(self).is_valid_assignment(schedule)
    }
}

/// Incremental task graph builder.
///
/// Mirrors interactive input: each dependency must name a task that was
/// already added. A rejected call leaves the builder unchanged, so the
/// caller can simply ask for the dependency again.
#[derive(Debug, Clone, Default)]
pub struct TaskGraphBuilder {
    tasks: Vec<Task>,
    index: HashMap<String, TaskId>,
}

impl TaskGraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task whose dependencies were all added before it.
    pub fn add_task<I, S>(
        &mut self,
        name: impl Into<String>,
        duration: u64,
        dependencies: I,
    ) -> Result<TaskId, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task name: {name}"),
            ));
        }

        let mut deps = Vec::new();
        for dep in dependencies {
            let dep = dep.as_ref();
            match self.index.get(dep) {
                Some(&id) => deps.push(id),
                None => {
                    return Err(ValidationError::new(
                        ValidationErrorKind::UnknownDependency,
                        format!("Task '{name}' depends on undeclared task '{dep}'"),
                    ))
                }
            }
        }
        deps.sort_unstable();
        deps.dedup();

        let id = TaskId(self.tasks.len());
        self.index.insert(name.clone(), id);
        self.tasks.push(Task::new(id, name, duration, deps));
        Ok(id)
    }

    /// Chaining form of [`add_task`](Self::add_task).
    pub fn with_task<I, S>(
        mut self,
        name: impl Into<String>,
        duration: u64,
        dependencies: I,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_task(name, duration, dependencies)?;
        Ok(self)
    }

    /// Number of tasks added so far.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task has been added.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Finishes the graph.
    pub fn build(self) -> TaskGraph {
        TaskGraph::assemble(self.tasks, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> TaskGraph {
        TaskGraph::from_declarations(&[
            TaskDeclaration::new("A", 3),
            TaskDeclaration::new("B", 4).with_dependency("A"),
            TaskDeclaration::new("C", 2).with_dependency("A"),
            TaskDeclaration::new("D", 1).with_dependencies(["B", "C"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_declarations() {
        let g = diamond();
        assert_eq!(g.len(), 4);
        let d = g.id_of("D").unwrap();
        assert_eq!(g.task(d).dependencies().len(), 2);
        assert_eq!(g.successors(g.id_of("A").unwrap()).len(), 2);
        assert_eq!(g.total_duration(), 10);
    }

    #[test]
    fn test_from_declarations_rejects_cycle() {
        let err = TaskGraph::from_declarations(&[
            TaskDeclaration::new("A", 1).with_dependency("B"),
            TaskDeclaration::new("B", 1).with_dependency("A"),
        ])
        .unwrap_err();
        match err {
            ScheduleError::InvalidInput(errors) => assert!(errors
                .iter()
                .any(|e| e.kind == ValidationErrorKind::CyclicDependency)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ready_tasks() {
        let g = diamond();
        let all: BTreeSet<TaskId> = g.ids().collect();
        assert_eq!(g.ready_tasks(&all), vec![g.id_of("A").unwrap()]);

        let mut remaining = all.clone();
        remaining.remove(&g.id_of("A").unwrap());
        assert_eq!(
            g.ready_tasks(&remaining),
            vec![g.id_of("B").unwrap(), g.id_of("C").unwrap()]
        );
    }

    #[test]
    fn test_topological_order() {
        let g = diamond();
        let order: Vec<&str> = g
            .topological_order()
            .into_iter()
            .map(|id| g.task(id).name())
            .collect();
        assert_eq!(order, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_critical_path() {
        // A(3) → B(4) → D(1)
        assert_eq!(diamond().critical_path_length(), 8);
    }

    #[test]
    fn test_builder_rejects_forward_reference() {
        let mut builder = TaskGraph::builder();
        builder.add_task("A", 1, [] as [&str; 0]).unwrap();

        let err = builder.add_task("B", 2, ["C"]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::UnknownDependency);
        // Builder is unchanged and can be retried
        assert_eq!(builder.len(), 1);
        builder.add_task("B", 2, ["A"]).unwrap();

        let g = builder.build();
        assert_eq!(g.len(), 2);
        assert_eq!(g.task(g.id_of("B").unwrap()).dependencies(), &[TaskId(0)]);
    }

    #[test]
    fn test_builder_rejects_duplicate() {
        let err = TaskGraph::builder()
            .with_task("A", 1, [] as [&str; 0])
            .unwrap()
            .with_task("A", 1, [] as [&str; 0])
            .unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::DuplicateId);
    }

    #[test]
    fn test_empty_graph() {
        let g = TaskGraph::builder().build();
        assert!(g.is_empty());
        assert_eq!(g.critical_path_length(), 0);
        assert!(g.topological_order().is_empty());
    }
}
