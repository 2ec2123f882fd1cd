//! Objective of the heat model.
//!
//! ```text
//! minimize  HEAT_WEIGHT·Σ y(h)
//!         + Σ (slots·y(h) − seats(h))          wasted slots
//!         + idle_penalty_weight·Σ violations   soft mode only
//! ```
//!
//! Collected per variable this is `(HEAT_WEIGHT + slots)` per heat-used
//! variable, `−1` per assignment variable and the penalty per violation.

use crate::engine::{CpModel, LinearExpr};
use crate::models::{IdleMode, TournamentParams, HEAT_WEIGHT};

use super::vars::VariableSpace;

/// Builds the objective expression.
pub fn objective_expr(vars: &VariableSpace, params: &TournamentParams) -> LinearExpr {
    let slots = params.slots_per_heat as i64;
    let mut expr = LinearExpr::new();

    for h in 0..vars.num_heats() {
        expr.add_term(vars.heat_used(h), HEAT_WEIGHT + slots);
        for x in vars.heat_assignments(h) {
            expr.add_term(x, -1);
        }
    }

    if params.idle_mode == IdleMode::Soft {
        for &v in vars.idle_violations() {
            expr.add_term(v, params.idle_penalty_weight);
        }
    }
    expr
}

/// Installs the objective in `model`.
pub fn set_objective(model: &mut CpModel, vars: &VariableSpace, params: &TournamentParams) {
    model.minimize(objective_expr(vars, params));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BoolVar;

    #[test]
    fn test_coefficients() {
        let p = TournamentParams::new(2, ["Red", "Blue"], 2)
            .with_idle_mode(IdleMode::Soft)
            .with_max_idle_heats(0)
            .with_horizon_buffer(1)
            .with_idle_penalty_weight(7);
        let mut model = CpModel::new("t");
        let vars = VariableSpace::allocate(&mut model, &p).unwrap();
        let expr = objective_expr(&vars, &p);

        let coef = |v: BoolVar| {
            expr.terms()
                .iter()
                .find(|(var, _)| *var == v)
                .map(|(_, c)| *c)
        };
        assert_eq!(coef(vars.heat_used(0)), Some(1002));
        assert_eq!(coef(vars.assignment(1, 0, 2)), Some(-1));
        assert_eq!(coef(vars.idle_violation(1, 1)), Some(7));
        assert_eq!(coef(vars.pairing(0, 1, 0)), None);
    }

    #[test]
    fn test_value_of_two_heat_schedule() {
        let p = TournamentParams::new(2, ["Red", "Blue"], 2).with_idle_mode(IdleMode::Off);
        let mut model = CpModel::new("t");
        let vars = VariableSpace::allocate(&mut model, &p).unwrap();
        let expr = objective_expr(&vars, &p);
        let truth = [
            vars.heat_used(0),
            vars.heat_used(1),
            vars.assignment(0, 0, 0),
            vars.assignment(1, 1, 0),
            vars.assignment(0, 1, 1),
            vars.assignment(1, 0, 1),
        ];
        // 2 heats, no wasted slots
        assert_eq!(expr.evaluate(|v| truth.contains(&v)), 2000);
    }

    #[test]
    fn test_violations_ignored_outside_soft_mode() {
        let p = TournamentParams::new(2, ["Red"], 1).with_idle_mode(IdleMode::Hard);
        let mut model = CpModel::new("t");
        let vars = VariableSpace::allocate(&mut model, &p).unwrap();
        set_objective(&mut model, &vars, &p);
        let terms = model.objective().unwrap().terms().len();
        // one term per heat-used and per assignment variable
        assert_eq!(terms, vars.num_heats() * 3);
    }
}
