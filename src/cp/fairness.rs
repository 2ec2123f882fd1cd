//! Idle-window fairness constraints.
//!
//! A window is `window_size = max_idle_heats + 1` consecutive heats starting
//! at `s`, for every `s` with `s + window_size ≤ horizon`. A window only
//! matters when its last heat is used; windows reaching past the end of the
//! schedule are inert.
//!
//! - `Off`: nothing is added.
//! - `Hard`: `Σ races(d, window) ≥ 1`, enforced only if the last heat is used.
//! - `Soft`: `no_race(d,s) ⇔ Σ races(d, window) = 0` and
//!   `violation(d,s) ⇔ last_used ∧ no_race(d,s)`; violations are priced by
//!   the objective.

use crate::engine::{CpModel, LinearExpr};
use crate::models::{IdleMode, TournamentParams};

use super::vars::VariableSpace;

/// Adds the idle-window constraints for `params.idle_mode`; returns how many
/// were added.
pub fn add_fairness_constraints(
    model: &mut CpModel,
    vars: &VariableSpace,
    params: &TournamentParams,
) -> usize {
    let before = model.num_constraints();
    match params.idle_mode {
        IdleMode::Off => {}
        IdleMode::Hard => add_hard_windows(model, vars),
        IdleMode::Soft => add_soft_windows(model, vars),
    }
    model.num_constraints() - before
}

/// Window starts `s` with `s + window_size ≤ horizon`.
fn window_starts(vars: &VariableSpace) -> std::ops::Range<usize> {
    let ws = vars.window_size();
    let nh = vars.num_heats();
    if nh >= ws {
        0..(nh - ws + 1)
    } else {
        0..0
    }
}

fn add_hard_windows(model: &mut CpModel, vars: &VariableSpace) {
    let ws = vars.window_size();
    for d in 0..vars.num_drivers() {
        for s in window_starts(vars) {
            let last_used = vars.heat_used(s + ws - 1);
            model
                .add_ge(LinearExpr::sum(vars.races_between(d, s, s + ws)), 1)
                .only_enforce_if(last_used);
        }
    }
}

fn add_soft_windows(model: &mut CpModel, vars: &VariableSpace) {
    let ws = vars.window_size();
    for d in 0..vars.num_drivers() {
        for s in window_starts(vars) {
            let last_used = vars.heat_used(s + ws - 1);
            let no_race = vars.no_race(d, s);
            let violation = vars.idle_violation(d, s);
            let races = LinearExpr::sum(vars.races_between(d, s, s + ws));

            model.add_eq(races.clone(), 0).only_enforce_if(no_race);
            model.add_ge(races, 1).only_enforce_if(!no_race);

            model.add_implication(violation, last_used);
            model.add_implication(violation, no_race);
            model.add_bool_or([!last_used, !no_race, violation.into()]);
        }
    }
}
