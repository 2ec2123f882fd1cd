//! Tournament scheduler and KPI evaluation.
//!
//! # Scheduler
//!
//! `TournamentScheduler` validates the parameters, builds the heat model,
//! hands it to a `CpSolver` and decodes the schedule. The Pumpkin portfolio is
//! the default; any engine honoring the `CpSolver` contract can be plugged in.
//!
//! # KPI
//!
//! `ScheduleKpi` computes heat count, wasted slots, pair meetings and idle
//! statistics, and re-checks the structural rules on the finished schedule.

mod kpi;
mod tournament;

pub use kpi::ScheduleKpi;
pub use tournament::{ScheduleOutcome, ScheduleRequest, TournamentScheduler};
