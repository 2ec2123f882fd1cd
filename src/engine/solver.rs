//! Solver contract: configuration, status, solution and errors.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{BoolVar, CpModel};

/// Outcome class of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// A solution was found and proven optimal.
    Optimal,
    /// A solution was found; optimality was not proven.
    Feasible,
    /// The model was proven to have no solution.
    Infeasible,
    /// The time limit elapsed before any solution was found.
    Timeout,
    /// The search stopped for another reason without a solution.
    Unknown,
}

impl SolveStatus {
    /// Whether a valuation accompanies this status.
    #[inline]
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Timeout => "TIMEOUT",
            SolveStatus::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Search parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Wall-clock budget for the whole solve call.
    pub time_limit: Duration,
    /// Number of parallel search workers (hint, at least one is used).
    pub num_workers: usize,
    /// Seed for the diversified workers.
    pub random_seed: u64,
    /// Optional cap on search nodes per worker.
    pub node_limit: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit: Duration::from_secs(60),
            num_workers: 8,
            random_seed: 0,
            node_limit: None,
        }
    }
}

impl SolverConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time limit.
    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Sets the worker count.
    pub fn with_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Caps the number of search nodes per worker.
    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }
}

/// Result of a solve call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpSolution {
    /// Outcome class.
    pub status: SolveStatus,
    /// Objective value of the returned valuation.
    pub objective: Option<i64>,
    /// One value per declared variable; empty unless `status.has_solution()`.
    values: Vec<bool>,
}

impl CpSolution {
    /// A solution carrying a valuation.
    pub fn with_values(status: SolveStatus, objective: i64, values: Vec<bool>) -> Self {
        Self {
            status,
            objective: Some(objective),
            values,
        }
    }

    /// A solution without valuation (infeasible, timeout, unknown).
    pub fn without_values(status: SolveStatus) -> Self {
        Self {
            status,
            objective: None,
            values: Vec::new(),
        }
    }

    /// Whether a valuation is available.
    pub fn is_solution_found(&self) -> bool {
        self.status.has_solution() && !self.values.is_empty()
    }

    /// Checks that the valuation covers exactly `num_vars` variables.
    ///
    /// # Errors
    /// `ValuationSizeMismatch` when the lengths differ.
    pub fn check_valuation(&self, num_vars: usize) -> Result<(), EngineError> {
        if self.values.len() == num_vars {
            Ok(())
        } else {
            Err(EngineError::ValuationSizeMismatch {
                expected: num_vars,
                actual: self.values.len(),
            })
        }
    }

    /// Value of `var`; `None` when no valuation is available or the variable
    /// belongs to a different model.
    pub fn value(&self, var: BoolVar) -> Option<bool> {
        self.values.get(var.index()).copied()
    }

    /// Full valuation in declaration order.
    pub fn values(&self) -> &[bool] {
        &self.values
    }
}

/// Unexpected engine faults. Distinct from "no solution".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A constraint or objective references a variable the model never declared.
    #[error("constraint references undeclared variable {0}")]
    UndeclaredVariable(BoolVar),
    /// A search worker panicked.
    #[error("search worker {worker} panicked")]
    WorkerPanicked { worker: usize },
    /// Coefficients or bounds do not fit the engine's 32-bit rows.
    #[error("coefficient magnitude exceeds the engine's integer range")]
    CoefficientOverflow,
    /// A solution carries a valuation of the wrong length.
    #[error("engine returned {actual} values for a model of {expected} variables")]
    ValuationSizeMismatch { expected: usize, actual: usize },
}

/// A solving engine.
///
/// Implementations accept any [`CpModel`] and return once a status is known
/// or the configured time limit has elapsed.
pub trait CpSolver {
    /// Engine name.
    fn name(&self) -> &'static str;

    /// Solves `model` within the limits of `config`.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> Result<CpSolution, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_has_solution() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::Feasible.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::Timeout.has_solution());
        assert!(!SolveStatus::Unknown.has_solution());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SolveStatus::Timeout.to_string(), "TIMEOUT");
        assert_eq!(SolveStatus::Optimal.to_string(), "OPTIMAL");
    }

    #[test]
    fn test_solution_without_values() {
        let s = CpSolution::without_values(SolveStatus::Infeasible);
        assert!(!s.is_solution_found());
        assert!(s.objective.is_none());
        assert!(s.values().is_empty());
    }

    #[test]
    fn test_check_valuation_length() {
        let s = CpSolution::with_values(SolveStatus::Feasible, 0, vec![true; 3]);
        assert!(s.check_valuation(3).is_ok());
        assert_eq!(
            s.check_valuation(5),
            Err(EngineError::ValuationSizeMismatch {
                expected: 5,
                actual: 3
            })
        );
    }

    #[test]
    fn test_config_builder() {
        let c = SolverConfig::new()
            .with_time_limit(Duration::from_secs(5))
            .with_workers(2)
            .with_random_seed(7)
            .with_node_limit(100);
        assert_eq!(c.time_limit, Duration::from_secs(5));
        assert_eq!(c.num_workers, 2);
        assert_eq!(c.random_seed, 7);
        assert_eq!(c.node_limit, Some(100));
    }
}
