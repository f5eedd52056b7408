//! Task model.
//!
//! A task is an indivisible unit of work with a fixed duration and a set of
//! prerequisite tasks. Tasks are immutable once their graph is built; solutions
//! refer to them through [`TaskId`] indices into the owning
//! [`TaskGraph`](super::TaskGraph) arena.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 1

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense index of a task inside its [`TaskGraph`](super::TaskGraph).
///
/// Ids are assigned in declaration order starting at 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub(crate) usize);

impl TaskId {
    /// Position of the task in the graph arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A task to be scheduled.
///
/// Owned by a [`TaskGraph`](super::TaskGraph). The processor assignment is
/// not part of the task; it belongs to a solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    id: TaskId,
    name: String,
    duration: u64,
    dependencies: Vec<TaskId>,
}

impl Task {
    pub(crate) fn new(id: TaskId, name: String, duration: u64, dependencies: Vec<TaskId>) -> Self {
        Self {
            id,
            name,
            duration,
            dependencies,
        }
    }

    /// Arena index.
    #[inline]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Unique task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Processing time in abstract time units.
    #[inline]
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// Tasks that must finish before this one may start.
    pub fn dependencies(&self) -> &[TaskId] {
        &self.dependencies
    }

    /// Whether this task has no prerequisites.
    pub fn is_root(&self) -> bool {
        self.dependencies.is_empty()
    }
}

/// A user-declared task, before name resolution.
///
/// This is the input contract: tasks are declared by name, and dependencies
/// refer to other declarations by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDeclaration {
    /// Unique task name.
    pub name: String,
    /// Processing time.
    pub duration: u64,
    /// Names of prerequisite tasks.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl TaskDeclaration {
    /// Creates a declaration without dependencies.
    pub fn new(name: impl Into<String>, duration: u64) -> Self {
        Self {
            name: name.into(),
            duration,
            dependencies: Vec::new(),
        }
    }

    /// Adds a prerequisite by name.
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// Adds several prerequisites by name.
    pub fn with_dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(names.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_builder() {
        let decl = TaskDeclaration::new("C", 7)
            .with_dependency("A")
            .with_dependencies(["B"]);

        assert_eq!(decl.name, "C");
        assert_eq!(decl.duration, 7);
        assert_eq!(decl.dependencies, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_declaration_from_json_defaults_dependencies() {
        let decl: TaskDeclaration =
            serde_json::from_str(r#"{ "name": "A", "duration": 3 }"#).unwrap();
        assert_eq!(decl, TaskDeclaration::new("A", 3));
    }

    #[test]
    fn test_task_accessors() {
        let task = Task::new(TaskId(2), "B".into(), 4, vec![TaskId(0)]);
        assert_eq!(task.id().index(), 2);
        assert_eq!(task.name(), "B");
        assert_eq!(task.duration(), 4);
        assert_eq!(task.dependencies(), &[TaskId(0)]);
        assert!(!task.is_root());
        assert_eq!(task.id().to_string(), "#2");
    }
}
