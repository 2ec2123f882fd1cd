//! Search worker backed by the Pumpkin lazy clause generation solver.
//!
//! # Algorithm
//! 1. Compile the model once into `Σ coef·x ≤ rhs` rows over 0/1 variables.
//!    A `lb ≤ expr ≤ ub` row yields up to two inequalities, a clause becomes
//!    `Σ literals ≥ 1`, and enforcement literals are folded in as a big-M
//!    term sized to the row's slack.
//! 2. Every worker posts the rows into its own Pumpkin solver, creating the
//!    variables in the worker's decision order.
//! 3. Optimization is linear SAT-UNSAT: after each solution the objective row
//!    is tightened to "strictly better than the best known valuation" (also
//!    picking up solutions of other workers) and the solver is called again.
//!    An unsatisfiable call proves the incumbent optimal, or the model
//!    infeasible when there is no incumbent.
//!
//! # Reference
//! - Stuckey (2010), "Lazy Clause Generation: Combining the Power of SAT and CP
//!   (and MIP?) Solving"
//! - Eén & Sörensson (2006), "Translating Pseudo-Boolean Constraints into SAT"

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use pumpkin_core::constraints::{self, Constraint as _};
use pumpkin_core::results::{ProblemSolution, SatisfactionResult};
use pumpkin_core::termination::TerminationCondition;
use pumpkin_core::variables::{DomainId, TransformableVariable};
use pumpkin_core::Solver;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::incumbent::SharedIncumbent;
use super::model::{BoolVar, Constraint, CpModel, Literal};
use super::solver::EngineError;

/// `Σ coef·x ≤ rhs` over variable indices, duplicates merged.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Inequality {
    terms: Vec<(usize, i32)>,
    rhs: i32,
}

/// Model flattened into inequalities, shared read-only by all workers.
#[derive(Debug, Clone)]
pub(crate) struct CompiledModel {
    num_vars: usize,
    rows: Vec<Inequality>,
    /// Set when a row without variables can never hold.
    trivially_infeasible: bool,
    objective: Option<Vec<(usize, i32)>>,
    objective_constant: i64,
    /// Strategy variables, in strategy order.
    strategy_order: Vec<usize>,
    /// Remaining variables in declaration order.
    default_order: Vec<usize>,
}

impl CompiledModel {
    pub(crate) fn compile(model: &CpModel) -> Result<Self, EngineError> {
        let num_vars = model.num_vars();
        let mut compiled = Self {
            num_vars,
            rows: Vec::new(),
            trivially_infeasible: false,
            objective: None,
            objective_constant: 0,
            strategy_order: Vec::new(),
            default_order: Vec::new(),
        };

        for constraint in model.constraints() {
            match constraint {
                Constraint::Linear(lin) => {
                    let terms = index_terms(lin.expr().normalized(), num_vars)?;
                    let enforcement = check_literals(lin.enforcement(), num_vars)?;
                    let (min_activity, max_activity) = activity_range(&terms)?;

                    if lin.upper_bound() < max_activity {
                        compiled.push_guarded(&terms, lin.upper_bound(), max_activity, &enforcement)?;
                    }
                    if lin.lower_bound() > min_activity {
                        let negated: Vec<(usize, i64)> = terms.iter().map(|&(v, c)| (v, -c)).collect();
                        let rhs = lin
                            .lower_bound()
                            .checked_neg()
                            .ok_or(EngineError::CoefficientOverflow)?;
                        let max_negated = min_activity
                            .checked_neg()
                            .ok_or(EngineError::CoefficientOverflow)?;
                        compiled.push_guarded(&negated, rhs, max_negated, &enforcement)?;
                    }
                }
                Constraint::BoolOr(lits) => {
                    let lits = check_literals(lits, num_vars)?;
                    // Σ pos - Σ neg ≥ 1 - |neg|, written as ≤.
                    let negatives = lits.iter().filter(|l| l.is_negated()).count() as i64;
                    let terms = lits
                        .iter()
                        .map(|l| (l.var().index(), if l.is_negated() { 1 } else { -1 }))
                        .collect();
                    compiled.push_row(terms, negatives - 1)?;
                }
            }
        }

        if let Some(expr) = model.objective() {
            let terms = index_terms(expr.normalized(), num_vars)?;
            activity_range(&terms)?;
            compiled.objective = Some(narrow_terms(terms)?);
            compiled.objective_constant = expr.constant();
        }

        let mut placed = vec![false; num_vars];
        for strategy in model.decision_strategies() {
            for var in &strategy.vars {
                let v = var.index();
                if v >= num_vars {
                    return Err(EngineError::UndeclaredVariable(*var));
                }
                if !placed[v] {
                    placed[v] = true;
                    compiled.strategy_order.push(v);
                }
            }
        }
        compiled.default_order = (0..num_vars).filter(|&v| !placed[v]).collect();

        Ok(compiled)
    }

    pub(crate) fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub(crate) fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Adds `Σ terms ≤ rhs`, active only when every enforcement literal holds.
    ///
    /// `max_activity` is the largest value `Σ terms` can take; the slack
    /// `max_activity - rhs` is the big-M coefficient of each literal.
    fn push_guarded(
        &mut self,
        terms: &[(usize, i64)],
        rhs: i64,
        max_activity: i64,
        enforcement: &[Literal],
    ) -> Result<(), EngineError> {
        let mut row = terms.to_vec();
        let mut rhs = rhs;
        if !enforcement.is_empty() {
            let slack = max_activity
                .checked_sub(rhs)
                .ok_or(EngineError::CoefficientOverflow)?;
            for lit in enforcement {
                if lit.is_negated() {
                    // slack·(1 - x)
                    row.push((lit.var().index(), -slack));
                } else {
                    row.push((lit.var().index(), slack));
                    rhs = rhs.checked_add(slack).ok_or(EngineError::CoefficientOverflow)?;
                }
            }
        }
        self.push_row(merge_terms(row), rhs)
    }

    fn push_row(&mut self, terms: Vec<(usize, i64)>, rhs: i64) -> Result<(), EngineError> {
        let (min_activity, max_activity) = activity_range(&terms)?;
        if max_activity <= rhs {
            return Ok(());
        }
        if terms.is_empty() || min_activity > rhs {
            self.trivially_infeasible = true;
            return Ok(());
        }
        self.rows.push(Inequality {
            terms: narrow_terms(terms)?,
            rhs: narrow(rhs)?,
        });
        Ok(())
    }

    /// Decision order of worker `worker`. Worker 0 keeps declaration order;
    /// the others shuffle the non-strategy variables with a seeded RNG.
    pub(crate) fn decision_order(&self, worker: usize, seed: u64) -> Vec<usize> {
        let mut order = self.strategy_order.clone();
        let mut rest = self.default_order.clone();
        if worker > 0 {
            let mut rng =
                ChaCha8Rng::seed_from_u64(seed ^ (worker as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
            rest.shuffle(&mut rng);
        }
        order.extend(rest);
        order
    }

    /// Full objective value (constant included) of a complete valuation.
    pub(crate) fn objective_value(&self, values: &[bool]) -> i64 {
        let activity: i64 = self.objective.as_ref().map_or(0, |terms| {
            terms
                .iter()
                .filter(|(v, _)| values[*v])
                .map(|&(_, c)| i64::from(c))
                .sum()
        });
        activity + self.objective_constant
    }

    /// Objective-row bound that only admits valuations strictly better than
    /// `objective`.
    fn strict_bound(&self, objective: i64) -> i32 {
        let bound = objective
            .saturating_sub(self.objective_constant)
            .saturating_sub(1);
        bound.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }
}

fn index_terms(terms: Vec<(BoolVar, i64)>, num_vars: usize) -> Result<Vec<(usize, i64)>, EngineError> {
    terms
        .into_iter()
        .map(|(v, c)| {
            if v.index() < num_vars {
                Ok((v.index(), c))
            } else {
                Err(EngineError::UndeclaredVariable(v))
            }
        })
        .collect()
}

fn check_literals(literals: &[Literal], num_vars: usize) -> Result<Vec<Literal>, EngineError> {
    literals
        .iter()
        .map(|&lit| {
            if lit.var().index() < num_vars {
                Ok(lit)
            } else {
                Err(EngineError::UndeclaredVariable(lit.var()))
            }
        })
        .collect()
}

/// Smallest and largest value of `Σ coef·x` over 0/1 valuations.
fn activity_range(terms: &[(usize, i64)]) -> Result<(i64, i64), EngineError> {
    let mut min_activity = 0i64;
    let mut max_activity = 0i64;
    for &(_, c) in terms {
        let bound = if c < 0 { &mut min_activity } else { &mut max_activity };
        *bound = bound.checked_add(c).ok_or(EngineError::CoefficientOverflow)?;
    }
    Ok((min_activity, max_activity))
}

fn merge_terms(mut terms: Vec<(usize, i64)>) -> Vec<(usize, i64)> {
    terms.sort_by_key(|&(v, _)| v);
    let mut merged: Vec<(usize, i64)> = Vec::with_capacity(terms.len());
    for (v, c) in terms {
        match merged.last_mut() {
            Some((last, acc)) if *last == v => *acc += c,
            _ => merged.push((v, c)),
        }
    }
    merged.retain(|&(_, c)| c != 0);
    merged
}

fn narrow(value: i64) -> Result<i32, EngineError> {
    i32::try_from(value).map_err(|_| EngineError::CoefficientOverflow)
}

fn narrow_terms(terms: Vec<(usize, i64)>) -> Result<Vec<(usize, i32)>, EngineError> {
    terms
        .into_iter()
        .map(|(v, c)| Ok((v, narrow(c)?)))
        .collect()
}

/// Limits and shared state visible to every worker.
#[derive(Debug)]
pub(crate) struct SearchContext<'a> {
    pub incumbent: &'a SharedIncumbent,
    pub stop: &'a AtomicBool,
    /// `None` when the time limit does not fit in an `Instant`.
    pub deadline: Option<Instant>,
    pub node_limit: Option<u64>,
}

/// Why a worker returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerOutcome {
    /// Search space exhausted under the worker's bound.
    Exhausted,
    /// Deadline reached.
    TimedOut,
    /// Another worker raised the stop flag.
    Stopped,
    /// Node limit reached.
    NodeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WorkerReport {
    pub outcome: WorkerOutcome,
    pub nodes: u64,
    pub solutions: u64,
}

/// Termination condition polled by Pumpkin at every search step.
struct Limits<'a> {
    ctx: &'a SearchContext<'a>,
    nodes: u64,
    reason: Option<WorkerOutcome>,
}

impl TerminationCondition for Limits<'_> {
    fn should_stop(&mut self) -> bool {
        self.nodes += 1;
        let reason = if self.ctx.stop.load(Ordering::Relaxed) {
            Some(WorkerOutcome::Stopped)
        } else if self.ctx.node_limit.is_some_and(|limit| self.nodes >= limit) {
            Some(WorkerOutcome::NodeLimit)
        } else if self.ctx.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(WorkerOutcome::TimedOut)
        } else {
            None
        };
        self.reason = reason;
        reason.is_some()
    }
}

enum Step {
    Found(Vec<bool>),
    Exhausted,
    Interrupted,
}

/// A single search worker owning one Pumpkin solver.
pub(crate) struct LcgWorker<'a> {
    model: &'a CompiledModel,
    solver: Solver,
    /// Pumpkin variable of every model variable, by model index.
    domains: Vec<DomainId>,
    solutions: u64,
}

impl<'a> LcgWorker<'a> {
    /// Creates the solver variables in `order`, which must list every
    /// variable once.
    pub(crate) fn new(model: &'a CompiledModel, order: &[usize]) -> Self {
        let mut solver = Solver::default();
        let mut slots: Vec<Option<DomainId>> = vec![None; model.num_vars];
        for &v in order {
            slots[v] = Some(solver.new_bounded_integer(0, 1));
        }
        let domains: Vec<DomainId> = slots.into_iter().flatten().collect();
        debug_assert_eq!(domains.len(), model.num_vars, "decision order is not a permutation");
        Self {
            model,
            solver,
            domains,
            solutions: 0,
        }
    }

    /// Runs the search until exhaustion or a limit.
    pub(crate) fn run(&mut self, ctx: &SearchContext<'_>) -> WorkerReport {
        let mut limits = Limits {
            ctx,
            nodes: 0,
            reason: None,
        };
        let outcome = self.search(&mut limits);
        WorkerReport {
            outcome,
            nodes: limits.nodes,
            solutions: self.solutions,
        }
    }

    fn search(&mut self, limits: &mut Limits<'_>) -> WorkerOutcome {
        if self.model.trivially_infeasible {
            return WorkerOutcome::Exhausted;
        }
        for row in &self.model.rows {
            if !post_le(&mut self.solver, &self.domains, &row.terms, row.rhs) {
                return WorkerOutcome::Exhausted;
            }
        }

        let mut brancher = self.solver.default_brancher();
        loop {
            // Pick up improvements published by any worker.
            let shared = limits.ctx.incumbent.upper_bound();
            if shared != i64::MAX {
                let Some(objective) = self.model.objective.as_ref() else {
                    // Every solution is optimal for a pure feasibility model.
                    return WorkerOutcome::Exhausted;
                };
                let bound = self.model.strict_bound(shared);
                if !post_le(&mut self.solver, &self.domains, objective, bound) {
                    return WorkerOutcome::Exhausted;
                }
            }

            let step = match self.solver.satisfy(&mut brancher, limits) {
                SatisfactionResult::Satisfiable(satisfiable) => {
                    let solution = satisfiable.solution();
                    Step::Found(
                        self.domains
                            .iter()
                            .map(|&d| solution.get_integer_value(d) == 1)
                            .collect(),
                    )
                }
                SatisfactionResult::Unsatisfiable(..) => Step::Exhausted,
                _ => Step::Interrupted,
            };

            match step {
                Step::Found(values) => {
                    self.solutions += 1;
                    let objective = self.model.objective_value(&values);
                    if limits.ctx.incumbent.try_install(objective, &values) {
                        tracing::trace!(objective, nodes = limits.nodes, "incumbent improved");
                    }
                }
                Step::Exhausted => return WorkerOutcome::Exhausted,
                Step::Interrupted => return limits.reason.unwrap_or(WorkerOutcome::Stopped),
            }
        }
    }
}

/// Posts `Σ coef·x ≤ rhs`; `false` when the solver detects a conflict at the
/// root.
fn post_le(solver: &mut Solver, domains: &[DomainId], terms: &[(usize, i32)], rhs: i32) -> bool {
    if terms.is_empty() {
        return rhs >= 0;
    }
    let scaled: Vec<_> = terms.iter().map(|&(v, c)| domains[v].scaled(c)).collect();
    let tag = solver.new_constraint_tag();
    constraints::less_than_or_equals(scaled, rhs, tag)
        .post(solver)
        .is_ok()
}
