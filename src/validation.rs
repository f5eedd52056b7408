//! Input validation for scheduling problems.
//!
//! Checks structural integrity of task declarations before a task graph
//! is built. Detects:
//! - Duplicate task names
//! - Dependencies on undeclared tasks
//! - Circular dependencies (DAG validation)
//! - Empty problems and a zero processor count
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::models::{ProblemDefinition, TaskDeclaration};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two tasks share the same name.
    DuplicateId,
    /// A task depends on a name that was never declared (or, for
    /// incremental input, not declared yet).
    UnknownDependency,
    /// Dependency graph contains a cycle.
    CyclicDependency,
    /// No tasks were declared.
    EmptyProblem,
    /// Processor count is zero.
    NoProcessors,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a complete problem (declarations plus processor count).
pub fn validate_problem(problem: &ProblemDefinition) -> ValidationResult {
    let mut errors = match validate_declarations(&problem.tasks) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    if problem.processors == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NoProcessors,
            "Processor count must be at least 1",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates a set of task declarations.
///
/// Checks:
/// 1. At least one task is declared
/// 2. No duplicate task names
/// 3. All dependency references point to declared tasks (in any order)
/// 4. No circular dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_declarations(tasks: &[TaskDeclaration]) -> ValidationResult {
    let mut errors = Vec::new();

    if tasks.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyProblem,
            "No tasks declared",
        ));
    }

    let mut names = HashSet::new();
    for task in tasks {
        if !names.insert(task.name.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate task name: {}", task.name),
            ));
        }
    }

    for task in tasks {
        for dep in &task.dependencies {
            if !names.contains(dep.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownDependency,
                    format!("Task '{}' depends on unknown task '{}'", task.name, dep),
                ));
            }
        }
    }

    if let Some(cycle_err) = detect_cycles(tasks) {
        errors.push(cycle_err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the dependency graph using DFS.
///
/// Roots are visited in declaration order so the reported task is stable.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(tasks: &[TaskDeclaration]) -> Option<ValidationError> {
    // dependency → dependents
    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for task in tasks {
        for dep in &task.dependencies {
            adj.entry(dep.as_str()).or_default().push(task.name.as_str());
        }
    }

    let mut visited = HashSet::new();
    let mut in_stack = HashSet::new();

    for task in tasks {
        let node = task.name.as_str();
        if !visited.contains(node) && has_cycle_dfs(node, &adj, &mut visited, &mut in_stack) {
            return Some(ValidationError::new(
                ValidationErrorKind::CyclicDependency,
                format!("Circular dependency detected involving task '{node}'"),
            ));
        }
    }

    None
}

fn has_cycle_dfs<'a>(
    node: &'a str,
    adj: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    in_stack: &mut HashSet<&'a str>,
) -> bool {
    visited.insert(node);
    in_stack.insert(node);

    if let Some(neighbors) = adj.get(node) {
        for &next in neighbors {
            if in_stack.contains(next) {
                return true; // Back edge → cycle
            }
            if !visited.contains(next) && has_cycle_dfs(next, adj, visited, in_stack) {
                return true;
            }
        }
    }

    in_stack.remove(node);
    false
}
