//! Pseudo-boolean constraint engine.
//!
//! - [`CpModel`]: boolean variables, linear constraints with enforcement
//!   literals, clauses and a minimization objective
//! - [`CpSolver`]: the contract any solving engine implements
//! - [`PortfolioSolver`]: default engine, parallel Pumpkin (lazy clause
//!   generation) workers sharing one incumbent
//!
//! # Reference
//! - Roussel & Manquinho (2009), "Pseudo-Boolean and Cardinality Constraints"

mod incumbent;
mod model;
mod portfolio;
mod search;
mod solver;

pub use incumbent::{Incumbent, SharedIncumbent};
pub use model::{
    BoolVar, Constraint, CpModel, DecisionStrategy, LinearConstraint, LinearExpr, Literal,
    ValueSelection,
};
pub use portfolio::PortfolioSolver;
pub use solver::{CpSolution, CpSolver, EngineError, SolveStatus, SolverConfig};
