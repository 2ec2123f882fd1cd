//! Pseudo-boolean constraint model.
//!
//! A `CpModel` holds boolean decision variables, linear constraints over
//! integer-weighted sums of those variables (optionally enforced only when a
//! set of literals holds), disjunctive clauses and a single linear objective
//! to minimize. The model is plain data: it performs no search.
//!
//! # Reference
//! - Roussel & Manquinho (2009), "Pseudo-Boolean and Cardinality Constraints",
//!   Handbook of Satisfiability, Ch. 22

use std::fmt;
use std::ops::Not;

/// A boolean decision variable, identified by its declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(usize);

impl BoolVar {
    /// Declaration index of the variable.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Not for BoolVar {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal::negative(self)
    }
}

impl fmt::Display for BoolVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    var: BoolVar,
    negated: bool,
}

impl Literal {
    /// The positive literal `var`.
    pub fn positive(var: BoolVar) -> Self {
        Self {
            var,
            negated: false,
        }
    }

    /// The negative literal `¬var`.
    pub fn negative(var: BoolVar) -> Self {
        Self { var, negated: true }
    }

    /// Underlying variable.
    #[inline]
    pub fn var(self) -> BoolVar {
        self.var
    }

    /// Whether this is `¬var`.
    #[inline]
    pub fn is_negated(self) -> bool {
        self.negated
    }

    /// Truth value of the literal given the value of its variable.
    #[inline]
    pub fn eval(self, value: bool) -> bool {
        value != self.negated
    }
}

impl From<BoolVar> for Literal {
    fn from(var: BoolVar) -> Self {
        Literal::positive(var)
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal {
            var: self.var,
            negated: !self.negated,
        }
    }
}

/// An integer-weighted sum of boolean variables plus a constant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(BoolVar, i64)>,
    constant: i64,
}

impl LinearExpr {
    /// Creates the empty expression `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// `Σ vars` with unit coefficients.
    pub fn sum<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = BoolVar>,
    {
        Self {
            terms: vars.into_iter().map(|v| (v, 1)).collect(),
            constant: 0,
        }
    }

    /// `Σ coef·var`.
    pub fn weighted_sum<I>(terms: I) -> Self
    where
        I: IntoIterator<Item = (BoolVar, i64)>,
    {
        Self {
            terms: terms.into_iter().collect(),
            constant: 0,
        }
    }

    /// Adds `coef·var`.
    pub fn add_term(&mut self, var: BoolVar, coef: i64) -> &mut Self {
        self.terms.push((var, coef));
        self
    }

    /// Adds every term of `other`, each multiplied by `factor`.
    pub fn add_scaled(&mut self, other: &LinearExpr, factor: i64) -> &mut Self {
        self.terms
            .extend(other.terms.iter().map(|&(v, c)| (v, c * factor)));
        self.constant += other.constant * factor;
        self
    }

    /// Adds a constant offset.
    pub fn add_constant(&mut self, value: i64) -> &mut Self {
        self.constant += value;
        self
    }

    /// Builder form of [`add_term`](Self::add_term).
    pub fn with_term(mut self, var: BoolVar, coef: i64) -> Self {
        self.add_term(var, coef);
        self
    }

    /// Terms as written (duplicates not merged).
    pub fn terms(&self) -> &[(BoolVar, i64)] {
        &self.terms
    }

    /// Constant offset.
    pub fn constant(&self) -> i64 {
        self.constant
    }

    /// Whether the expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression under a full valuation.
    pub fn evaluate(&self, value_of: impl Fn(BoolVar) -> bool) -> i64 {
        self.constant
            + self
                .terms
                .iter()
                .filter(|(v, _)| value_of(*v))
                .map(|(_, c)| *c)
                .sum::<i64>()
    }

    /// Merges duplicate variables and drops zero coefficients.
    pub(crate) fn normalized(&self) -> Vec<(BoolVar, i64)> {
        let mut terms = self.terms.clone();
        terms.sort_by_key(|(v, _)| *v);
        let mut merged: Vec<(BoolVar, i64)> = Vec::with_capacity(terms.len());
        for (v, c) in terms {
            match merged.last_mut() {
                Some((last, acc)) if *last == v => *acc += c,
                _ => merged.push((v, c)),
            }
        }
        merged.retain(|(_, c)| *c != 0);
        merged
    }
}

impl From<BoolVar> for LinearExpr {
    fn from(var: BoolVar) -> Self {
        LinearExpr::new().with_term(var, 1)
    }
}

/// `lb ≤ Σ coef·var ≤ ub`, active only when every enforcement literal holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    expr: LinearExpr,
    lb: i64,
    ub: i64,
    enforcement: Vec<Literal>,
}

impl LinearConstraint {
    /// Makes the constraint conditional on `literal` (conjunctive with any
    /// literal already attached).
    pub fn only_enforce_if(&mut self, literal: impl Into<Literal>) -> &mut Self {
        self.enforcement.push(literal.into());
        self
    }

    /// Constrained expression.
    pub fn expr(&self) -> &LinearExpr {
        &self.expr
    }

    /// Lower bound on the expression.
    pub fn lower_bound(&self) -> i64 {
        self.lb
    }

    /// Upper bound on the expression.
    pub fn upper_bound(&self) -> i64 {
        self.ub
    }

    /// Enforcement literals (empty means always active).
    pub fn enforcement(&self) -> &[Literal] {
        &self.enforcement
    }

    /// Whether a full valuation satisfies this constraint.
    pub fn is_satisfied(&self, value_of: impl Fn(BoolVar) -> bool + Copy) -> bool {
        let active = self
            .enforcement
            .iter()
            .all(|lit| lit.eval(value_of(lit.var())));
        if !active {
            return true;
        }
        let activity = self.expr.evaluate(value_of);
        activity >= self.lb && activity <= self.ub
    }
}

/// A model constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Bounded linear sum, possibly conditional.
    Linear(LinearConstraint),
    /// At least one literal must hold.
    BoolOr(Vec<Literal>),
}

impl Constraint {
    /// Whether a full valuation satisfies this constraint.
    pub fn is_satisfied(&self, value_of: impl Fn(BoolVar) -> bool + Copy) -> bool {
        match self {
            Constraint::Linear(lin) => lin.is_satisfied(value_of),
            Constraint::BoolOr(lits) => lits.iter().any(|l| l.eval(value_of(l.var()))),
        }
    }
}

/// Value tried first when the search branches on a strategy variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSelection {
    /// Try `false` first.
    MinValue,
    /// Try `true` first.
    MaxValue,
}

/// Variables the search branches on first, in the given order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionStrategy {
    /// Branching order.
    pub vars: Vec<BoolVar>,
    /// First value tried for every variable of the strategy.
    pub value: ValueSelection,
}

/// A pseudo-boolean minimization model.
///
/// # Example
/// ```
/// use u_race::engine::{CpModel, LinearExpr};
///
/// let mut model = CpModel::new("toy");
/// let a = model.new_bool_var("a");
/// let b = model.new_bool_var("b");
/// model.add_eq(LinearExpr::sum([a, b]), 1);
/// model.minimize(LinearExpr::from(a));
/// assert_eq!(model.num_vars(), 2);
/// assert_eq!(model.num_constraints(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    name: String,
    var_names: Vec<String>,
    constraints: Vec<Constraint>,
    objective: Option<LinearExpr>,
    strategies: Vec<DecisionStrategy>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares a boolean variable.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        let var = BoolVar(self.var_names.len());
        self.var_names.push(name.into());
        var
    }

    /// Adds `lb ≤ expr ≤ ub`. The expression constant is folded into the bounds.
    pub fn add_linear(&mut self, expr: LinearExpr, lb: i64, ub: i64) -> &mut LinearConstraint {
        let constant = expr.constant;
        let expr = LinearExpr {
            terms: expr.terms,
            constant: 0,
        };
        self.constraints.push(Constraint::Linear(LinearConstraint {
            expr,
            lb: lb.saturating_sub(constant),
            ub: ub.saturating_sub(constant),
            enforcement: Vec::new(),
        }));
        match self.constraints.last_mut() {
            Some(Constraint::Linear(lin)) => lin,
            _ => unreachable!("a linear constraint was just pushed"),
        }
    }

    /// Adds `expr == value`.
    pub fn add_eq(&mut self, expr: LinearExpr, value: i64) -> &mut LinearConstraint {
        self.add_linear(expr, value, value)
    }

    /// Adds `expr ≤ value`.
    pub fn add_le(&mut self, expr: LinearExpr, value: i64) -> &mut LinearConstraint {
        self.add_linear(expr, i64::MIN, value)
    }

    /// Adds `expr ≥ value`.
    pub fn add_ge(&mut self, expr: LinearExpr, value: i64) -> &mut LinearConstraint {
        self.add_linear(expr, value, i64::MAX)
    }

    /// Adds the clause `l1 ∨ l2 ∨ …`.
    pub fn add_bool_or<I, L>(&mut self, literals: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        self.constraints.push(Constraint::BoolOr(
            literals.into_iter().map(Into::into).collect(),
        ));
    }

    /// Adds `a ⇒ b`.
    pub fn add_implication(&mut self, a: impl Into<Literal>, b: impl Into<Literal>) {
        let a = a.into();
        self.add_bool_or([!a, b.into()]);
    }

    /// Sets the objective to minimize, replacing any previous one.
    pub fn minimize(&mut self, expr: LinearExpr) {
        self.objective = Some(expr);
    }

    /// Registers a branching hint.
    pub fn add_decision_strategy(&mut self, vars: Vec<BoolVar>, value: ValueSelection) {
        self.strategies.push(DecisionStrategy { vars, value });
    }

    /// Number of declared variables.
    pub fn num_vars(&self) -> usize {
        self.var_names.len()
    }

    /// Number of constraints.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Name given to a variable at declaration.
    pub fn var_name(&self, var: BoolVar) -> Option<&str> {
        self.var_names.get(var.index()).map(String::as_str)
    }

    /// All constraints in declaration order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Objective, if one was set.
    pub fn objective(&self) -> Option<&LinearExpr> {
        self.objective.as_ref()
    }

    /// Branching hints in registration order.
    pub fn decision_strategies(&self) -> &[DecisionStrategy] {
        &self.strategies
    }
}

impl fmt::Display for CpModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CpModel({}: {} vars, {} constraints)",
            self.name,
            self.num_vars(),
            self.num_constraints()
        )
    }
}
