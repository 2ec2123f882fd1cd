//! Structural constraints every valid schedule satisfies.
//!
//! 1. Each driver drives each car in exactly one heat.
//! 2. A driver takes at most one car per heat.
//! 3. A car takes at most one driver per heat.
//! 4. A heat holds at most `slots` seats when used and at least one seat
//!    when used; an unused heat holds none.
//! 5. Used heats form a prefix of the horizon.
//! 6. Each driver pair meets in one or two heats.
//! 7. `p(d1,d2,h) = races(d1,h) ∧ races(d2,h)` via AND-linearization.
//!
//! Plus the implied cut `slots·Σy ≥ drivers·cars`, which follows from 1 and 4
//! and lets propagation discard horizons that are too short.
//!
//! The pairing linearization emits `3·pairs·heats` rows; growth is quadratic
//! in the driver count.

use crate::engine::{CpModel, LinearExpr};
use crate::models::TournamentParams;

use super::vars::VariableSpace;

/// Adds the structural constraints; returns how many were added.
pub fn add_structural_constraints(
    model: &mut CpModel,
    vars: &VariableSpace,
    params: &TournamentParams,
) -> usize {
    let before = model.num_constraints();
    let nd = vars.num_drivers();
    let nc = vars.num_cars();
    let nh = vars.num_heats();
    let slots = params.slots_per_heat as i64;

    // 1. exactly once
    for d in 0..nd {
        for c in 0..nc {
            model.add_eq(LinearExpr::sum((0..nh).map(|h| vars.assignment(d, c, h))), 1);
        }
    }

    // 2. one car per driver per heat
    for d in 0..nd {
        for h in 0..nh {
            model.add_le(LinearExpr::sum(vars.races(d, h)), 1);
        }
    }

    // 3. one driver per car per heat
    for c in 0..nc {
        for h in 0..nh {
            model.add_le(LinearExpr::sum((0..nd).map(|d| vars.assignment(d, c, h))), 1);
        }
    }

    // 4. capacity and heat-usage linkage
    for h in 0..nh {
        let seats = LinearExpr::sum(vars.heat_assignments(h));
        let y = vars.heat_used(h);
        model.add_le(seats.clone().with_term(y, -slots), 0);
        model.add_ge(seats.with_term(y, -1), 0);
    }

    // 5. prefix
    for h in 0..nh.saturating_sub(1) {
        model.add_implication(vars.heat_used(h + 1), vars.heat_used(h));
    }

    // Implied capacity cut.
    model.add_ge(
        LinearExpr::weighted_sum(vars.heat_used_vars().iter().map(|&y| (y, slots))),
        (nd * nc) as i64,
    );

    // 6 and 7. pairing
    for d1 in 0..nd {
        for d2 in (d1 + 1)..nd {
            for h in 0..nh {
                let p = vars.pairing(d1, d2, h);
                let r1 = LinearExpr::sum(vars.races(d1, h));
                let r2 = LinearExpr::sum(vars.races(d2, h));

                // p ≤ r1, p ≤ r2
                let mut upper1 = LinearExpr::from(p);
                upper1.add_scaled(&r1, -1);
                model.add_le(upper1, 0);
                let mut upper2 = LinearExpr::from(p);
                upper2.add_scaled(&r2, -1);
                model.add_le(upper2, 0);

                // p ≥ r1 + r2 - 1
                let mut lower = LinearExpr::from(p);
                lower.add_scaled(&r1, -1).add_scaled(&r2, -1);
                model.add_ge(lower, -1);
            }
            model.add_linear(
                LinearExpr::sum((0..nh).map(|h| vars.pairing(d1, d2, h))),
                1,
                2,
            );
        }
    }

    model.num_constraints() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BoolVar;
    use crate::models::IdleMode;

    fn build(params: &TournamentParams) -> (CpModel, VariableSpace, usize) {
        let mut model = CpModel::new("t");
        let vars = VariableSpace::allocate(&mut model, params).unwrap();
        let added = add_structural_constraints(&mut model, &vars, params);
        (model, vars, added)
    }

    fn satisfied(model: &CpModel, truth: &[BoolVar]) -> bool {
        model
            .constraints()
            .iter()
            .all(|c| c.is_satisfied(|v| truth.contains(&v)))
    }

    #[test]
    fn test_constraint_count() {
        let p = TournamentParams::new(3, ["Red", "Blue"], 2).with_idle_mode(IdleMode::Off);
        let (model, _, added) = build(&p);
        let (nd, nc, nh) = (3, 2, 8);
        let pairs = 3;
        let expected = nd * nc          // exactly once
            + nd * nh                   // driver per heat
            + nc * nh                   // car per heat
            + 2 * nh                    // capacity + linkage
            + (nh - 1)                  // prefix
            + 1                         // capacity cut
            + pairs * (3 * nh + 1);     // pairing
        assert_eq!(added, expected);
        assert_eq!(model.num_constraints(), expected);
    }

    #[test]
    fn test_two_driver_swap_satisfies_structure() {
        let p = TournamentParams::new(2, ["Red", "Blue"], 2).with_idle_mode(IdleMode::Off);
        let (model, vars, _) = build(&p);
        let truth = vec![
            vars.assignment(0, 0, 0),
            vars.assignment(1, 1, 0),
            vars.assignment(0, 1, 1),
            vars.assignment(1, 0, 1),
            vars.heat_used(0),
            vars.heat_used(1),
            vars.pairing(0, 1, 0),
            vars.pairing(0, 1, 1),
        ];
        assert!(satisfied(&model, &truth));
    }

    #[test]
    fn test_gap_in_used_heats_is_rejected() {
        let p = TournamentParams::new(2, ["Red", "Blue"], 2).with_idle_mode(IdleMode::Off);
        let (model, vars, _) = build(&p);
        // Same seats, but in heats 0 and 2.
        let truth = vec![
            vars.assignment(0, 0, 0),
            vars.assignment(1, 1, 0),
            vars.assignment(0, 1, 2),
            vars.assignment(1, 0, 2),
            vars.heat_used(0),
            vars.heat_used(2),
            vars.pairing(0, 1, 0),
            vars.pairing(0, 1, 2),
        ];
        assert!(!satisfied(&model, &truth));
    }

    #[test]
    fn test_pairs_must_meet() {
        let p = TournamentParams::new(2, ["Red", "Blue"], 2).with_idle_mode(IdleMode::Off);
        let (model, vars, _) = build(&p);
        // Drivers never share a heat.
        let truth = vec![
            vars.assignment(0, 0, 0),
            vars.assignment(0, 1, 1),
            vars.assignment(1, 0, 2),
            vars.assignment(1, 1, 3),
            vars.heat_used(0),
            vars.heat_used(1),
            vars.heat_used(2),
            vars.heat_used(3),
        ];
        assert!(!satisfied(&model, &truth));
    }

    #[test]
    fn test_pairing_cannot_be_claimed_without_both_drivers() {
        let p = TournamentParams::new(2, ["Red", "Blue"], 2).with_idle_mode(IdleMode::Off);
        let (model, vars, _) = build(&p);
        let truth = vec![
            vars.assignment(0, 0, 0),
            vars.assignment(1, 1, 0),
            vars.assignment(0, 1, 1),
            vars.assignment(1, 0, 2),
            vars.heat_used(0),
            vars.heat_used(1),
            vars.heat_used(2),
            vars.pairing(0, 1, 0),
            // Claimed but D2 does not race in heat 1.
            vars.pairing(0, 1, 1),
        ];
        assert!(!satisfied(&model, &truth));
    }
}
