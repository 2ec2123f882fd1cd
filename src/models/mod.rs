//! Tournament domain models.
//!
//! Provides the input parameters of a heat-scheduling run and the schedule
//! it produces.
//!
//! # Domain Mappings
//!
//! | u-race | Meaning |
//! |--------|---------|
//! | DriverId | Participant, displayed `D1`, `D2`, ... |
//! | Car | Vehicle of the roster, identified by a label |
//! | Heat | One race with up to `slots_per_heat` cars on track |
//! | Seat | One (driver, car) pair inside a heat |

mod params;
mod roster;
mod schedule;

pub use params::{
    IdleMode, ParseIdleModeError, TournamentParams, DEFAULT_IDLE_PENALTY,
    DEFAULT_MAX_IDLE_HEATS, HEAT_WEIGHT,
};
pub use roster::{Car, DriverId};
pub use schedule::{Heat, Schedule, Seat};
