//! Race heat scheduling.
//!
//! Builds the heat schedule of a karting-style tournament: every driver drives
//! every car exactly once, heats are capped at the slots available on track,
//! every pair of drivers shares one or two heats, and (optionally) nobody sits
//! out too many heats in a row. The problem is encoded as a pseudo-boolean
//! constraint model that minimizes the number of heats first and empty slots
//! second.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `DriverId`, `Car`, `TournamentParams`,
//!   `IdleMode`, `Schedule`, `Heat`, `Seat`
//! - **`validation`**: Input integrity checks (counts, car roster, weights)
//! - **`engine`**: Boolean CP model and the Pumpkin-backed portfolio solver
//! - **`cp`**: Tournament formulation (variables, constraints, objective,
//!   schedule extraction)
//! - **`scheduler`**: End-to-end pipeline and schedule KPIs
//! - **`publish`**: CSV and console views of a schedule
//! - **`config`**: TOML configuration
//!
//! # Example
//!
//! ```
//! use u_race::engine::SolverConfig;
//! use u_race::models::{IdleMode, TournamentParams};
//! use u_race::scheduler::TournamentScheduler;
//!
//! let params = TournamentParams::new(3, ["Red", "Blue"], 2)
//!     .with_idle_mode(IdleMode::Hard)
//!     .with_max_idle_heats(1);
//! let outcome = TournamentScheduler::new()
//!     .schedule(&params, &SolverConfig::new().with_workers(1))
//!     .unwrap();
//!
//! assert_eq!(outcome.schedule.heat_count(), 3);
//! assert!(outcome.kpi.meets_idle_bound(1));
//! ```
//!
//! # References
//!
//! - Rossi, van Beek & Walsh (2006), "Handbook of Constraint Programming"
//! - Kendall et al. (2010), "Scheduling in Sports: An Annotated Bibliography"

pub mod config;
pub mod cp;
pub mod engine;
pub mod error;
pub mod models;
pub mod publish;
pub mod scheduler;
pub mod validation;

pub use error::ScheduleError;
