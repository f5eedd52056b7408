//! Error types for the scheduling engine.
//!
//! Input problems are reported through [`ValidationError`] lists (see
//! [`crate::validation`]) so that every defect in a declaration set is
//! surfaced at once. [`ScheduleError`] is the top-level error returned by
//! graph construction, solution construction and both search strategies.
//!
//! Stagnation, rejected annealing moves and infeasible neighbors are
//! ordinary outcomes and never produce an error.

use thiserror::Error;

use crate::validation::ValidationError;

/// Top-level error returned by the scheduling engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    /// Task declarations failed validation.
    #[error("invalid input: {}", join_messages(.0))]
    InvalidInput(Vec<ValidationError>),

    /// A search was requested over an empty task graph.
    #[error("no tasks provided, task graph is empty")]
    NoTasks,

    /// The processor count is zero.
    #[error("processor count must be at least 1")]
    NoProcessors,

    /// Every task has zero duration, so `1 / makespan` is undefined.
    #[error("all task durations are zero, makespan-based fitness is undefined")]
    DegenerateFitness,

    /// Construction found no ready task while tasks remained.
    #[error("cyclic dependency detected involving task '{0}'")]
    CyclicDependency(String),

    /// A search parameter is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A caller-supplied schedule is not a partition of the task graph.
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_invalid_input_display_joins_messages() {
        let err = ScheduleError::InvalidInput(vec![
            ValidationError::new(ValidationErrorKind::DuplicateId, "Duplicate task name: A"),
            ValidationError::new(ValidationErrorKind::EmptyProblem, "No tasks declared"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid input: Duplicate task name: A; No tasks declared"
        );
    }

    #[test]
    fn test_cycle_display() {
        let err = ScheduleError::CyclicDependency("B".into());
        assert!(err.to_string().contains("'B'"));
    }
}
