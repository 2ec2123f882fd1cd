//! Decoding of an engine valuation into a [`Schedule`].

use crate::engine::CpSolution;
use crate::error::ScheduleError;
use crate::models::{DriverId, Heat, Schedule, Seat, TournamentParams};

use super::vars::VariableSpace;

/// Builds the schedule from a solved valuation.
///
/// Only heats whose heat-used variable is true are returned, in index order;
/// seats are ordered by driver, then by car. A status without a solution
/// yields `NoFeasibleSolution` carrying the engine status. A solution whose
/// valuation does not cover the variable space is an engine fault. Neither
/// case produces an empty or partial schedule.
pub fn extract_schedule(
    vars: &VariableSpace,
    params: &TournamentParams,
    solution: &CpSolution,
) -> Result<Schedule, ScheduleError> {
    if !solution.status.has_solution() {
        return Err(ScheduleError::NoFeasibleSolution {
            status: solution.status,
        });
    }
    solution.check_valuation(vars.len())?;
    let value = |v| solution.value(v) == Some(true);

    let mut schedule = Schedule::new();
    schedule.status = Some(solution.status);
    schedule.objective = solution.objective;

    for h in 0..vars.num_heats() {
        if !value(vars.heat_used(h)) {
            continue;
        }
        let mut heat = Heat::new(h);
        for d in 0..vars.num_drivers() {
            for (c, car) in params.cars.iter().enumerate() {
                if value(vars.assignment(d, c, h)) {
                    heat.seats.push(Seat::new(DriverId(d), c, car.label.clone()));
                }
            }
        }
        schedule.add_heat(heat);
    }

    Ok(schedule)
}
