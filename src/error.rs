//! Pipeline errors.

use thiserror::Error;

use crate::engine::{EngineError, SolveStatus};
use crate::models::ParseIdleModeError;
use crate::validation::ValidationError;

/// Failure of a scheduling run.
///
/// `NoFeasibleSolution` is an expected outcome at this problem size; callers
/// branch on it rather than treat it as a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// Malformed input, reported before any variable is built.
    #[error("invalid parameter '{parameter}': {message}")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: String,
        /// What is wrong with it.
        message: String,
    },
    /// The engine returned without a usable assignment.
    #[error("no feasible schedule found (solver status {status})")]
    NoFeasibleSolution {
        /// Engine status (`Infeasible`, `Timeout` or `Unknown`).
        status: SolveStatus,
    },
    /// The engine itself failed.
    #[error("solving engine failed: {0}")]
    EngineFailure(#[from] EngineError),
}

impl ScheduleError {
    /// Creates an `InvalidParameter` error.
    pub fn invalid(parameter: impl Into<String>, message: impl Into<String>) -> Self {
        ScheduleError::InvalidParameter {
            parameter: parameter.into(),
            message: message.into(),
        }
    }
}

impl ScheduleError {
    /// Logs every validation problem and reports the first one.
    pub(crate) fn from_validation(errors: Vec<ValidationError>) -> Self {
        for e in &errors {
            tracing::error!(parameter = e.parameter, "{}", e.message);
        }
        errors
            .into_iter()
            .next()
            .map(ScheduleError::from)
            .unwrap_or_else(|| ScheduleError::invalid("params", "validation failed"))
    }
}

impl From<ValidationError> for ScheduleError {
    fn from(e: ValidationError) -> Self {
        ScheduleError::invalid(e.parameter, e.message)
    }
}

impl From<ParseIdleModeError> for ScheduleError {
    fn from(e: ParseIdleModeError) -> Self {
        ScheduleError::invalid("idle_mode", e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = ScheduleError::invalid("slots_per_heat", "must be at least 1");
        assert_eq!(
            e.to_string(),
            "invalid parameter 'slots_per_heat': must be at least 1"
        );

        let e = ScheduleError::NoFeasibleSolution {
            status: SolveStatus::Timeout,
        };
        assert_eq!(e.to_string(), "no feasible schedule found (solver status TIMEOUT)");
    }

    #[test]
    fn test_unknown_mode_is_invalid_parameter() {
        let e: ScheduleError = "strict"
            .parse::<crate::models::IdleMode>()
            .map_err(ScheduleError::from)
            .unwrap_err();
        assert!(matches!(e, ScheduleError::InvalidParameter { ref parameter, .. } if parameter == "idle_mode"));
    }

    #[test]
    fn test_engine_error_is_distinct() {
        let e: ScheduleError = EngineError::WorkerPanicked { worker: 2 }.into();
        assert!(matches!(e, ScheduleError::EngineFailure(_)));
        assert!(e.to_string().contains("worker 2"));
    }
}
