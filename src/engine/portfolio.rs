//! Parallel portfolio of Pumpkin workers.
//!
//! Every worker owns a Pumpkin solver over the whole model, with its own
//! variable order, and publishes improvements to one [`SharedIncumbent`].
//! The first worker that exhausts its search space proves the incumbent
//! optimal (or the model infeasible) and raises the stop flag for the others.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use super::incumbent::SharedIncumbent;
use super::model::CpModel;
use super::search::{CompiledModel, LcgWorker, SearchContext, WorkerOutcome, WorkerReport};
use super::solver::{CpSolution, CpSolver, EngineError, SolveStatus, SolverConfig};

/// Reference [`CpSolver`] running `num_workers` scoped search threads.
///
/// Worker 0 creates the variables in declaration order, which makes a
/// single-worker solve deterministic.
///
/// # Example
/// ```
/// use u_race::engine::{CpModel, CpSolver, LinearExpr, PortfolioSolver, SolveStatus, SolverConfig};
///
/// let mut model = CpModel::new("toy");
/// let a = model.new_bool_var("a");
/// let b = model.new_bool_var("b");
/// model.add_eq(LinearExpr::sum([a, b]), 1);
/// model.minimize(LinearExpr::weighted_sum([(a, 2), (b, 1)]));
///
/// let solution = PortfolioSolver::new()
///     .solve(&model, &SolverConfig::new().with_workers(1))
///     .unwrap();
/// assert_eq!(solution.status, SolveStatus::Optimal);
/// assert_eq!(solution.objective, Some(1));
/// assert_eq!(solution.value(b), Some(true));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PortfolioSolver;

impl PortfolioSolver {
    /// Creates the solver.
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for PortfolioSolver {
    fn name(&self) -> &'static str {
        "portfolio-pumpkin"
    }

    fn solve(&self, model: &CpModel, config: &SolverConfig) -> Result<CpSolution, EngineError> {
        let compiled = CompiledModel::compile(model)?;
        let workers = config.num_workers.max(1);
        let started = Instant::now();
        tracing::debug!(
            model = model.name(),
            vars = compiled.num_vars(),
            constraints = model.num_constraints(),
            rows = compiled.num_rows(),
            workers,
            "portfolio solve started"
        );

        let incumbent = SharedIncumbent::new();
        let stop = AtomicBool::new(false);
        let ctx = SearchContext {
            incumbent: &incumbent,
            stop: &stop,
            deadline: started.checked_add(config.time_limit),
            node_limit: config.node_limit,
        };

        let reports = run_workers(&compiled, &ctx, workers, config.random_seed)?;

        let proven = reports
            .iter()
            .any(|r| r.outcome == WorkerOutcome::Exhausted);
        let timed_out = reports
            .iter()
            .any(|r| r.outcome == WorkerOutcome::TimedOut);
        let nodes: u64 = reports.iter().map(|r| r.nodes).sum();

        let solution = match incumbent.into_inner() {
            Some(best) => {
                let status = if proven {
                    SolveStatus::Optimal
                } else {
                    SolveStatus::Feasible
                };
                CpSolution::with_values(status, best.objective, best.values)
            }
            None if proven => CpSolution::without_values(SolveStatus::Infeasible),
            None if timed_out => CpSolution::without_values(SolveStatus::Timeout),
            None => CpSolution::without_values(SolveStatus::Unknown),
        };

        tracing::debug!(
            status = %solution.status,
            objective = ?solution.objective,
            nodes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "portfolio solve finished"
        );
        Ok(solution)
    }
}

fn run_workers(
    compiled: &CompiledModel,
    ctx: &SearchContext<'_>,
    workers: usize,
    seed: u64,
) -> Result<Vec<WorkerReport>, EngineError> {
    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let order = compiled.decision_order(worker, seed);
                scope.spawn(move || {
                    let report = LcgWorker::new(compiled, &order).run(ctx);
                    if report.outcome == WorkerOutcome::Exhausted {
                        ctx.stop.store(true, Ordering::Relaxed);
                    }
                    tracing::trace!(
                        worker,
                        outcome = ?report.outcome,
                        nodes = report.nodes,
                        solutions = report.solutions,
                        "worker finished"
                    );
                    report
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(worker, handle)| {
                handle
                    .join()
                    .map_err(|_| EngineError::WorkerPanicked { worker })
            })
            .collect()
    })
}
