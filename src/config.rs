//! Tournament configuration loaded from TOML.
//!
//! Every section and key is optional; missing values fall back to the
//! standard tournament (18 drivers, six cars, six slots, soft fairness).
//!
//! ```
//! use u_race::config::TournamentConfig;
//! use u_race::models::IdleMode;
//!
//! let config = TournamentConfig::from_toml_str(r#"
//!     [tournament]
//!     num_drivers = 8
//!     cars = ["Red", "Blue", "Green"]
//!     slots_per_heat = 3
//!
//!     [fairness]
//!     mode = "hard"
//!     max_idle_heats = 2
//!
//!     [solver]
//!     time_limit_seconds = 30
//!
//!     [logging]
//!     level = "debug"
//!     file = "logs/u-race.log"
//! "#).unwrap();
//!
//! let params = config.params();
//! assert_eq!(params.num_drivers, 8);
//! assert_eq!(params.idle_mode, IdleMode::Hard);
//! assert_eq!(config.solver_config().time_limit.as_secs(), 30);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::SolverConfig;
use crate::models::{IdleMode, TournamentParams, DEFAULT_IDLE_PENALTY, DEFAULT_MAX_IDLE_HEATS};

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TournamentConfig {
    /// Roster and heat capacity.
    pub tournament: TournamentSection,
    /// Idle-fairness policy.
    pub fairness: FairnessSection,
    /// Engine limits.
    pub solver: SolverSection,
    /// Export targets.
    pub output: OutputSection,
    /// Log level and JSON log file.
    pub logging: LoggingSection,
}

/// `[tournament]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TournamentSection {
    pub num_drivers: usize,
    pub cars: Vec<String>,
    pub slots_per_heat: usize,
}

impl Default for TournamentSection {
    fn default() -> Self {
        Self {
            num_drivers: 18,
            cars: ["Red", "Green", "Blue", "Yellow", "Orange", "White"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            slots_per_heat: 6,
        }
    }
}

/// `[fairness]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FairnessSection {
    /// `hard`, `soft` or `off`.
    pub mode: IdleMode,
    pub max_idle_heats: usize,
    pub penalty_weight: i64,
    /// Overrides the mode's default horizon buffer.
    pub horizon_buffer: Option<usize>,
}

impl Default for FairnessSection {
    fn default() -> Self {
        Self {
            mode: IdleMode::default(),
            max_idle_heats: DEFAULT_MAX_IDLE_HEATS,
            penalty_weight: DEFAULT_IDLE_PENALTY,
            horizon_buffer: None,
        }
    }
}

/// `[solver]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSection {
    pub time_limit_seconds: f64,
    pub num_workers: usize,
    pub random_seed: u64,
    pub node_limit: Option<u64>,
}

impl Default for SolverSection {
    fn default() -> Self {
        Self {
            time_limit_seconds: 60.0,
            num_workers: 8,
            random_seed: 0,
            node_limit: None,
        }
    }
}

/// `[output]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub heats_csv: Option<PathBuf>,
    pub drivers_csv: Option<PathBuf>,
    pub print_schedule: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            heats_csv: Some(PathBuf::from("tournament_heats.csv")),
            drivers_csv: Some(PathBuf::from("tournament_drivers.csv")),
            print_schedule: false,
        }
    }
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `info` or
    /// `u_race=debug`.
    pub level: String,
    /// JSON-lines log file, appended to. Parent directories are created.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl TournamentConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Loads `path`, or the defaults when the file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file missing, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Tournament parameters described by this configuration.
    ///
    /// Value ranges are checked by
    /// [`validate_params`](crate::validation::validate_params).
    pub fn params(&self) -> TournamentParams {
        let mut params = TournamentParams::new(
            self.tournament.num_drivers,
            self.tournament.cars.iter().map(String::as_str),
            self.tournament.slots_per_heat,
        )
        .with_idle_mode(self.fairness.mode)
        .with_max_idle_heats(self.fairness.max_idle_heats)
        .with_idle_penalty_weight(self.fairness.penalty_weight);
        params.horizon_buffer = self.fairness.horizon_buffer;
        params
    }

    /// Engine limits described by this configuration.
    ///
    /// Non-positive (or NaN) time limits become zero and are rejected by
    /// validation; limits too large to represent saturate.
    pub fn solver_config(&self) -> SolverConfig {
        let seconds = self.solver.time_limit_seconds;
        let time_limit = if seconds > 0.0 {
            Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        let config = SolverConfig::new()
            .with_time_limit(time_limit)
            .with_workers(self.solver.num_workers)
            .with_random_seed(self.solver.random_seed);
        match self.solver.node_limit {
            Some(limit) => config.with_node_limit(limit),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_standard_tournament() {
        let config = TournamentConfig::new();
        let params = config.params();
        assert_eq!(params.num_drivers, 18);
        assert_eq!(params.num_cars(), 6);
        assert_eq!(params.car_labels()[3], "Yellow");
        assert_eq!(params.slots_per_heat, 6);
        assert_eq!(params.idle_mode, IdleMode::Soft);
        assert_eq!(params.max_idle_heats, 3);

        let solver = config.solver_config();
        assert_eq!(solver.time_limit, Duration::from_secs(60));
        assert_eq!(solver.num_workers, 8);

        assert_eq!(
            config.output.heats_csv.as_deref(),
            Some(Path::new("tournament_heats.csv"))
        );
        assert_eq!(
            config.output.drivers_csv.as_deref(),
            Some(Path::new("tournament_drivers.csv"))
        );
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = TournamentConfig::from_toml_str("").unwrap();
        assert_eq!(config, TournamentConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = TournamentConfig::from_toml_str(
            r#"
            [fairness]
            mode = "off"
            horizon_buffer = 2

            [solver]
            time_limit_seconds = 1.5
            node_limit = 1000
            "#,
        )
        .unwrap();
        let params = config.params();
        assert_eq!(params.idle_mode, IdleMode::Off);
        assert_eq!(params.horizon_buffer, Some(2));
        assert_eq!(params.num_drivers, 18);

        let solver = config.solver_config();
        assert_eq!(solver.time_limit, Duration::from_millis(1500));
        assert_eq!(solver.node_limit, Some(1000));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = TournamentConfig::from_toml_str("[fairness]\nmode = \"strict\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(ref e) if e.to_string().contains("strict")));
    }

    #[test]
    fn test_logging_section() {
        assert_eq!(TournamentConfig::default().logging.level, "info");
        assert!(TournamentConfig::default().logging.file.is_none());

        let config = TournamentConfig::from_toml_str(
            "[logging]\nlevel = \"u_race=trace\"\nfile = \"logs/app.log\"\n",
        )
        .unwrap();
        assert_eq!(config.logging.level, "u_race=trace");
        assert_eq!(config.logging.file.as_deref(), Some(Path::new("logs/app.log")));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = TournamentConfig::from_toml_str("[tournament]\ndrivers = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_negative_time_limit_becomes_zero() {
        let config = TournamentConfig::from_toml_str("[solver]\ntime_limit_seconds = -3.0\n").unwrap();
        assert_eq!(config.solver_config().time_limit, Duration::ZERO);

        let config = TournamentConfig::from_toml_str("[solver]\ntime_limit_seconds = 1e300\n").unwrap();
        assert_eq!(config.solver_config().time_limit, Duration::MAX);
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = TournamentConfig::new();
        config.tournament.num_drivers = 5;
        config.output.print_schedule = true;
        config.fairness.mode = IdleMode::Hard;
        config.logging.file = Some(PathBuf::from("u-race.log"));
        let text = config.to_toml_string().unwrap();
        let back = TournamentConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = TournamentConfig::load_or_default("/nonexistent/u-race.toml").unwrap();
        assert_eq!(config, TournamentConfig::default());
        assert!(matches!(
            TournamentConfig::load("/nonexistent/u-race.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
