//! Tournament parameters.
//!
//! Immutable input of one scheduling run: roster sizes, heat capacity and
//! the idle-fairness policy. The heat horizon is derived from these values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::Car;

/// Weight of one used heat in the objective.
pub const HEAT_WEIGHT: i64 = 1000;

/// Default penalty per idle-window violation (soft mode).
pub const DEFAULT_IDLE_PENALTY: i64 = 500;

/// Default longest run of heats a driver may sit out.
pub const DEFAULT_MAX_IDLE_HEATS: usize = 3;

/// Idle-fairness policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleMode {
    /// Every window whose last heat is used must contain a race per driver.
    Hard,
    /// Idle windows are allowed but penalized in the objective.
    #[default]
    Soft,
    /// No idle-fairness constraints.
    Off,
}

impl IdleMode {
    /// Extra heats added on top of `min_heats` when no override is given.
    pub fn default_horizon_buffer(self) -> usize {
        match self {
            IdleMode::Off => 5,
            IdleMode::Hard | IdleMode::Soft => 8,
        }
    }

    /// Lowercase name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            IdleMode::Hard => "hard",
            IdleMode::Soft => "soft",
            IdleMode::Off => "off",
        }
    }
}

impl fmt::Display for IdleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown idle mode string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown idle mode '{0}' (expected hard, soft or off)")]
pub struct ParseIdleModeError(pub String);

impl FromStr for IdleMode {
    type Err = ParseIdleModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hard" => Ok(IdleMode::Hard),
            "soft" => Ok(IdleMode::Soft),
            "off" => Ok(IdleMode::Off),
            _ => Err(ParseIdleModeError(s.to_string())),
        }
    }
}

/// Input of one scheduling run.
///
/// # Example
/// ```
/// use u_race::models::{IdleMode, TournamentParams};
///
/// let params = TournamentParams::new(18, ["Red", "Green", "Blue", "Yellow", "Orange", "White"], 6)
///     .with_idle_mode(IdleMode::Hard);
/// assert_eq!(params.min_heats(), 18);
/// assert_eq!(params.max_heats(), 26);
/// assert_eq!(params.window_size(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentParams {
    /// Number of drivers.
    pub num_drivers: usize,
    /// Car roster, in column order.
    pub cars: Vec<Car>,
    /// Cars on track per heat.
    pub slots_per_heat: usize,
    /// Longest run of heats a driver may sit out.
    pub max_idle_heats: usize,
    /// Idle-fairness policy.
    pub idle_mode: IdleMode,
    /// Objective weight of one idle violation (soft mode).
    pub idle_penalty_weight: i64,
    /// Overrides [`IdleMode::default_horizon_buffer`].
    pub horizon_buffer: Option<usize>,
}

impl TournamentParams {
    /// Creates parameters with default fairness settings.
    pub fn new<I, C>(num_drivers: usize, cars: I, slots_per_heat: usize) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Car>,
    {
        Self {
            num_drivers,
            cars: cars.into_iter().map(Into::into).collect(),
            slots_per_heat,
            max_idle_heats: DEFAULT_MAX_IDLE_HEATS,
            idle_mode: IdleMode::default(),
            idle_penalty_weight: DEFAULT_IDLE_PENALTY,
            horizon_buffer: None,
        }
    }

    /// Sets the longest allowed idle run.
    pub fn with_max_idle_heats(mut self, max_idle_heats: usize) -> Self {
        self.max_idle_heats = max_idle_heats;
        self
    }

    /// Sets the fairness policy.
    pub fn with_idle_mode(mut self, mode: IdleMode) -> Self {
        self.idle_mode = mode;
        self
    }

    /// Sets the soft-mode violation weight.
    pub fn with_idle_penalty_weight(mut self, weight: i64) -> Self {
        self.idle_penalty_weight = weight;
        self
    }

    /// Overrides the horizon buffer.
    pub fn with_horizon_buffer(mut self, buffer: usize) -> Self {
        self.horizon_buffer = Some(buffer);
        self
    }

    /// Number of cars.
    #[inline]
    pub fn num_cars(&self) -> usize {
        self.cars.len()
    }

    /// Seats to fill: every driver drives every car once.
    pub fn total_seats(&self) -> usize {
        self.num_drivers * self.num_cars()
    }

    /// `ceil(total_seats / slots_per_heat)`; 0 when `slots_per_heat` is 0.
    pub fn min_heats(&self) -> usize {
        if self.slots_per_heat == 0 {
            return 0;
        }
        self.total_seats().div_ceil(self.slots_per_heat)
    }

    /// Heat horizon: `min_heats` plus the buffer.
    pub fn max_heats(&self) -> usize {
        let buffer = self
            .horizon_buffer
            .unwrap_or_else(|| self.idle_mode.default_horizon_buffer());
        self.min_heats() + buffer
    }

    /// Heats per idle window (`max_idle_heats + 1`).
    pub fn window_size(&self) -> usize {
        self.max_idle_heats + 1
    }

    /// Number of unordered driver pairs.
    pub fn num_pairs(&self) -> usize {
        self.num_drivers * self.num_drivers.saturating_sub(1) / 2
    }

    /// Car labels in roster order.
    pub fn car_labels(&self) -> Vec<&str> {
        self.cars.iter().map(|c| c.label.as_str()).collect()
    }
}
