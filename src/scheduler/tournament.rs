//! End-to-end tournament scheduler.
//!
//! # Pipeline
//!
//! 1. Validate parameters and solving budget.
//! 2. Build the heat model (variables, structural and fairness constraints,
//!    objective).
//! 3. Solve with the configured engine.
//! 4. Extract the schedule and compute its KPIs.
//!
//! Every stage returns a typed result; nothing is partially populated on
//! failure.

use std::time::{Duration, Instant};

use crate::cp::HeatCpBuilder;
use crate::engine::{CpSolver, PortfolioSolver, SolveStatus, SolverConfig};
use crate::error::ScheduleError;
use crate::models::{Schedule, TournamentParams};
use crate::validation::validate_solver_config;

use super::ScheduleKpi;

/// Input container for one scheduling run.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    /// Tournament parameters.
    pub params: TournamentParams,
    /// Engine limits.
    pub solver: SolverConfig,
}

impl ScheduleRequest {
    /// Creates a request with the default engine limits.
    pub fn new(params: TournamentParams) -> Self {
        Self {
            params,
            solver: SolverConfig::default(),
        }
    }

    /// Sets the engine limits.
    pub fn with_solver_config(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    /// The schedule.
    pub schedule: Schedule,
    /// Its indicators.
    pub kpi: ScheduleKpi,
    /// Engine status (`Optimal` or `Feasible`).
    pub status: SolveStatus,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
}

/// Runs validation, model building, solving and extraction.
///
/// # Example
///
/// ```
/// use u_race::engine::SolverConfig;
/// use u_race::models::{IdleMode, TournamentParams};
/// use u_race::scheduler::{ScheduleRequest, TournamentScheduler};
///
/// let params = TournamentParams::new(2, ["Red", "Blue"], 2).with_idle_mode(IdleMode::Off);
/// let request = ScheduleRequest::new(params)
///     .with_solver_config(SolverConfig::new().with_workers(1));
///
/// let outcome = TournamentScheduler::new().schedule_request(&request).unwrap();
/// assert_eq!(outcome.schedule.heat_count(), 2);
/// assert!(outcome.kpi.satisfies_structure());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TournamentScheduler<S = PortfolioSolver> {
    solver: S,
}

impl TournamentScheduler<PortfolioSolver> {
    /// Creates a scheduler backed by the Pumpkin portfolio.
    pub fn new() -> Self {
        Self {
            solver: PortfolioSolver::new(),
        }
    }
}

impl<S: CpSolver> TournamentScheduler<S> {
    /// Creates a scheduler backed by `solver`.
    pub fn with_solver(solver: S) -> Self {
        Self { solver }
    }

    /// Schedules a request.
    pub fn schedule_request(&self, request: &ScheduleRequest) -> Result<ScheduleOutcome, ScheduleError> {
        self.schedule(&request.params, &request.solver)
    }

    /// Schedules a tournament.
    pub fn schedule(
        &self,
        params: &TournamentParams,
        config: &SolverConfig,
    ) -> Result<ScheduleOutcome, ScheduleError> {
        let started = Instant::now();
        validate_solver_config(config).map_err(ScheduleError::from_validation)?;

        // Building validates the parameters.
        let builder = HeatCpBuilder::new(params);
        let heat = builder.build()?;
        tracing::info!(
            drivers = params.num_drivers,
            cars = params.num_cars(),
            slots = params.slots_per_heat,
            mode = %params.idle_mode,
            min_heats = params.min_heats(),
            max_heats = params.max_heats(),
            vars = heat.model.num_vars(),
            engine = self.solver.name(),
            "scheduling tournament"
        );

        let result = builder.solve_built(heat, &self.solver, config);
        let (schedule, solution) = match result {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(error = %e, "no schedule produced");
                return Err(e);
            }
        };

        let kpi = ScheduleKpi::calculate(&schedule, params);
        let elapsed = started.elapsed();
        tracing::info!(
            status = %solution.status,
            objective = ?solution.objective,
            heats = kpi.heat_count,
            wasted_slots = kpi.wasted_slots,
            idle_violations = kpi.idle_violations,
            elapsed_ms = elapsed.as_millis() as u64,
            "schedule found"
        );

        Ok(ScheduleOutcome {
            schedule,
            kpi,
            status: solution.status,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CpModel, CpSolution, EngineError};
    use crate::models::IdleMode;

    struct GivesUp(SolveStatus);

    impl CpSolver for GivesUp {
        fn name(&self) -> &'static str {
            "gives-up"
        }

        fn solve(&self, _: &CpModel, _: &SolverConfig) -> Result<CpSolution, EngineError> {
            Ok(CpSolution::without_values(self.0))
        }
    }

    struct Crashes;

    impl CpSolver for Crashes {
        fn name(&self) -> &'static str {
            "crashes"
        }

        fn solve(&self, _: &CpModel, _: &SolverConfig) -> Result<CpSolution, EngineError> {
            Err(EngineError::WorkerPanicked { worker: 0 })
        }
    }

    /// Claims a solution but returns a valuation for three variables only.
    struct Truncates;

    impl CpSolver for Truncates {
        fn name(&self) -> &'static str {
            "truncates"
        }

        fn solve(&self, _: &CpModel, _: &SolverConfig) -> Result<CpSolution, EngineError> {
            Ok(CpSolution::with_values(SolveStatus::Feasible, 0, vec![true; 3]))
        }
    }

    fn small() -> TournamentParams {
        TournamentParams::new(2, ["Red", "Blue"], 2).with_idle_mode(IdleMode::Off)
    }

    #[test]
    fn test_schedule_small() {
        let outcome = TournamentScheduler::new()
            .schedule(&small(), &SolverConfig::new().with_workers(1))
            .unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.kpi.heat_count, 2);
        assert_eq!(outcome.kpi.wasted_slots, 0);
    }

    #[test]
    fn test_invalid_params_fail_fast() {
        let p = TournamentParams::new(2, ["Red", "Red"], 2);
        let err = TournamentScheduler::with_solver(Crashes)
            .schedule(&p, &SolverConfig::new())
            .unwrap_err();
        // The engine is never reached.
        assert!(matches!(err, ScheduleError::InvalidParameter { ref parameter, .. } if parameter == "car_roster"));
    }

    #[test]
    fn test_zero_time_limit_is_invalid() {
        let config = SolverConfig::new().with_time_limit(Duration::ZERO);
        let err = TournamentScheduler::new().schedule(&small(), &config).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidParameter { ref parameter, .. } if parameter == "time_limit_seconds"));
    }

    #[test]
    fn test_engine_give_up_is_no_solution() {
        let err = TournamentScheduler::with_solver(GivesUp(SolveStatus::Timeout))
            .schedule(&small(), &SolverConfig::new())
            .unwrap_err();
        assert_eq!(
            err,
            ScheduleError::NoFeasibleSolution {
                status: SolveStatus::Timeout
            }
        );
    }

    #[test]
    fn test_engine_fault_is_propagated() {
        let err = TournamentScheduler::with_solver(Crashes)
            .schedule(&small(), &SolverConfig::new())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::EngineFailure(_)));
    }

    #[test]
    fn test_truncated_valuation_is_engine_fault() {
        let err = TournamentScheduler::with_solver(Truncates)
            .schedule(&small(), &SolverConfig::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::EngineFailure(EngineError::ValuationSizeMismatch { actual: 3, .. })
        ));
    }

    #[test]
    fn test_schedule_request() {
        let request = ScheduleRequest::new(small())
            .with_solver_config(SolverConfig::new().with_workers(2));
        let outcome = TournamentScheduler::new().schedule_request(&request).unwrap();
        assert!(outcome.kpi.satisfies_structure());
    }
}
