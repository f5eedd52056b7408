//! Problem definition (input contract).
//!
//! Bundles task declarations with a processor count so that a complete
//! problem can be deserialized by an input collaborator (JSON, CLI, ...).

use serde::{Deserialize, Serialize};

use super::{TaskDeclaration, TaskGraph};
use crate::error::ScheduleError;
use crate::validation::validate_problem;

/// A multiprocessor scheduling problem.
///
/// # Example
/// ```
/// use u_procsched::models::ProblemDefinition;
///
/// let json = r#"{
///     "processors": 2,
///     "tasks": [
///         { "name": "A", "duration": 3 },
///         { "name": "B", "duration": 4, "dependencies": ["A"] }
///     ]
/// }"#;
/// let problem: ProblemDefinition = serde_json::from_str(json).unwrap();
/// let graph = problem.build_graph().unwrap();
/// assert_eq!(graph.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDefinition {
    /// Number of identical processors.
    pub processors: usize,
    /// Declared tasks.
    pub tasks: Vec<TaskDeclaration>,
}

impl ProblemDefinition {
    /// Creates a problem definition.
    pub fn new(processors: usize, tasks: Vec<TaskDeclaration>) -> Self {
        Self { processors, tasks }
    }

    /// Adds a task declaration.
    pub fn with_task(mut self, task: TaskDeclaration) -> Self {
        self.tasks.push(task);
        self
    }

    /// Validates the whole problem and builds its task graph.
    pub fn build_graph(&self) -> Result<TaskGraph, ScheduleError> {
        validate_problem(self).map_err(ScheduleError::InvalidInput)?;
        TaskGraph::from_declarations(&self.tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_graph() {
        let problem = ProblemDefinition::new(2, Vec::new())
            .with_task(TaskDeclaration::new("A", 3))
            .with_task(TaskDeclaration::new("B", 4).with_dependency("A"));

        let graph = problem.build_graph().unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.critical_path_length(), 7);
    }

    #[test]
    fn test_build_graph_rejects_zero_processors() {
        let problem = ProblemDefinition::new(0, vec![TaskDeclaration::new("A", 1)]);
        assert!(matches!(
            problem.build_graph(),
            Err(ScheduleError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_serde_roundtrip() {
        let problem = ProblemDefinition::new(3, vec![TaskDeclaration::new("A", 5)]);
        let json = serde_json::to_string(&problem).unwrap();
        let back: ProblemDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(problem, back);
    }
}
