//! Input validation for tournament parameters.
//!
//! Checks the parameters of a scheduling run before any model variable is
//! built. Detects:
//! - Non-positive driver, car or slot counts
//! - Duplicate or blank car labels
//! - Non-positive idle penalty weight
//! - A zero solving budget
//!
//! All problems are collected; the caller decides how to report them.

use std::collections::HashSet;
use std::fmt;

use crate::engine::SolverConfig;
use crate::models::{TournamentParams, HEAT_WEIGHT};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Name of the offending parameter.
    pub parameter: &'static str,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A count that must be at least one is zero.
    NonPositiveCount,
    /// The car roster is empty.
    EmptyRoster,
    /// Two cars share the same label.
    DuplicateCar,
    /// A car label is empty or whitespace.
    BlankCarLabel,
    /// A weight that must be positive is not.
    NonPositiveWeight,
    /// The solving budget is zero.
    ZeroTimeLimit,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, parameter: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            parameter,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.parameter, self.message)
    }
}

/// Validates the parameters of a scheduling run.
///
/// Checks:
/// 1. At least one driver
/// 2. A non-empty roster of distinct, non-blank car labels
/// 3. At least one slot per heat
/// 4. A positive idle penalty weight
///
/// Slots above the car count and penalty weights at or above the per-heat
/// weight are legal; they are only logged.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_params(params: &TournamentParams) -> ValidationResult {
    let mut errors = Vec::new();

    if params.num_drivers == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NonPositiveCount,
            "num_drivers",
            "at least one driver is required",
        ));
    }

    if params.cars.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRoster,
            "car_roster",
            "at least one car is required",
        ));
    }

    let mut labels = HashSet::new();
    for car in &params.cars {
        if car.label.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::BlankCarLabel,
                "car_roster",
                "car labels must not be blank",
            ));
        } else if !labels.insert(car.label.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateCar,
                "car_roster",
                format!("duplicate car label: {}", car.label),
            ));
        }
    }

    if params.slots_per_heat == 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NonPositiveCount,
            "slots_per_heat",
            "at least one slot per heat is required",
        ));
    }

    if params.idle_penalty_weight <= 0 {
        errors.push(ValidationError::new(
            ValidationErrorKind::NonPositiveWeight,
            "idle_penalty_weight",
            format!("must be positive, got {}", params.idle_penalty_weight),
        ));
    }

    if params.slots_per_heat > params.num_cars() && !params.cars.is_empty() {
        tracing::warn!(
            slots = params.slots_per_heat,
            cars = params.num_cars(),
            "slots per heat exceed the car count; extra capacity is unusable"
        );
    }
    if params.idle_penalty_weight >= HEAT_WEIGHT {
        tracing::warn!(
            weight = params.idle_penalty_weight,
            heat_weight = HEAT_WEIGHT,
            "idle penalty outweighs a heat; the schedule may grow to avoid idle windows"
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates the solving budget.
pub fn validate_solver_config(config: &SolverConfig) -> ValidationResult {
    if config.time_limit.is_zero() {
        return Err(vec![ValidationError::new(
            ValidationErrorKind::ZeroTimeLimit,
            "time_limit_seconds",
            "solving budget must be positive",
        )]);
    }
    Ok(())
}
