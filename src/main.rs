use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use u_race::config::{LoggingSection, TournamentConfig};
use u_race::models::IdleMode;
use u_race::publish::{ConsoleReport, DriversCsv, HeatsCsv};
use u_race::scheduler::TournamentScheduler;
use u_race::ScheduleError;

fn cli() -> Command {
    Command::new("u-race")
        .about("Builds a race heat schedule and exports it as CSV")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("TOML configuration file")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("drivers")
                .long("drivers")
                .value_name("N")
                .help("Number of drivers")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("slots")
                .long("slots")
                .value_name("N")
                .help("Drivers on track per heat")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .value_name("MODE")
                .help("Idle fairness mode")
                .value_parser(
                    PossibleValuesParser::new(["hard", "soft", "off"])
                        .try_map(|mode| mode.parse::<IdleMode>()),
                ),
        )
        .arg(
            Arg::new("max-idle")
                .long("max-idle")
                .value_name("N")
                .help("Maximum consecutive heats a driver may sit out")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("penalty")
                .long("penalty")
                .value_name("WEIGHT")
                .help("Objective weight of one idle violation (soft mode)")
                .value_parser(value_parser!(i64)),
        )
        .arg(
            Arg::new("time-limit")
                .long("time-limit")
                .value_name("SECONDS")
                .help("Wall-clock budget of the solver")
                .value_parser(value_parser!(f64)),
        )
        .arg(
            Arg::new("workers")
                .long("workers")
                .value_name("N")
                .help("Solver worker threads")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("heats-csv")
                .long("heats-csv")
                .value_name("PATH")
                .help("Output path of the heats view")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("drivers-csv")
                .long("drivers-csv")
                .value_name("PATH")
                .help("Output path of the drivers view")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("print")
                .long("print")
                .help("Print the schedule to the console")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("FILTER")
                .help("Log filter used when RUST_LOG is not set"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .value_name("PATH")
                .help("Append JSON-lines logs to this file")
                .value_parser(value_parser!(PathBuf)),
        )
}

fn main() {
    let matches = cli().get_matches();
    let result = load_config(&matches).and_then(|config| {
        init_logging(&config.logging)?;
        run(&config)
    });
    if let Err(e) = result {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn load_config(matches: &ArgMatches) -> Result<TournamentConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => TournamentConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => TournamentConfig::default(),
    };
    apply_overrides(&mut config, matches);
    Ok(config)
}

/// Installs a text layer on stderr and, when a file is configured, a
/// JSON-lines layer appending to that file.
fn init_logging(logging: &LoggingSection) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .with_context(|| format!("invalid log level '{}'", logging.level))?;

    let json = match &logging.file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("creating log directory {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(json)
        .try_init()
        .context("installing the log subscriber")?;
    Ok(())
}

fn run(config: &TournamentConfig) -> Result<()> {
    let params = config.params();
    let solver = config.solver_config();

    let outcome = match TournamentScheduler::new().schedule(&params, &solver) {
        Ok(outcome) => outcome,
        Err(ScheduleError::NoFeasibleSolution { status }) => {
            bail!("no feasible schedule found (solver status {status}); try a longer time limit or a looser fairness mode")
        }
        Err(e) => return Err(anyhow!(e)),
    };

    println!(
        "{} heats for {} drivers ({}), {} empty slots, {} idle violations, solved in {:.1}s",
        outcome.kpi.heat_count,
        params.num_drivers,
        outcome.status,
        outcome.kpi.wasted_slots,
        outcome.kpi.idle_violations,
        outcome.elapsed.as_secs_f64()
    );

    if config.output.print_schedule {
        ConsoleReport::new(&outcome.schedule)
            .print()
            .context("printing schedule")?;
    }

    let cars = params.car_labels();
    let mut failed = 0;
    if let Some(path) = &config.output.heats_csv {
        match HeatsCsv::to_file(&outcome.schedule, cars.as_slice(), path) {
            Ok(()) => println!("Full schedule of heats exported to {}", path.display()),
            Err(e) => {
                eprintln!("Full schedule of heats was NOT exported: {e}");
                failed += 1;
            }
        }
    }
    if let Some(path) = &config.output.drivers_csv {
        match DriversCsv::to_file(&outcome.schedule, path) {
            Ok(()) => println!("Driver schedule exported to {}", path.display()),
            Err(e) => {
                eprintln!("Driver schedule was NOT exported: {e}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} export(s) failed");
    }
    Ok(())
}

fn apply_overrides(config: &mut TournamentConfig, matches: &ArgMatches) {
    if let Some(&n) = matches.get_one::<usize>("drivers") {
        config.tournament.num_drivers = n;
    }
    if let Some(&n) = matches.get_one::<usize>("slots") {
        config.tournament.slots_per_heat = n;
    }
    if let Some(&mode) = matches.get_one::<IdleMode>("mode") {
        config.fairness.mode = mode;
    }
    if let Some(&n) = matches.get_one::<usize>("max-idle") {
        config.fairness.max_idle_heats = n;
    }
    if let Some(&w) = matches.get_one::<i64>("penalty") {
        config.fairness.penalty_weight = w;
    }
    if let Some(&s) = matches.get_one::<f64>("time-limit") {
        config.solver.time_limit_seconds = s;
    }
    if let Some(&n) = matches.get_one::<usize>("workers") {
        config.solver.num_workers = n;
    }
    if let Some(path) = matches.get_one::<PathBuf>("heats-csv") {
        config.output.heats_csv = Some(path.clone());
    }
    if let Some(path) = matches.get_one::<PathBuf>("drivers-csv") {
        config.output.drivers_csv = Some(path.clone());
    }
    if matches.get_flag("print") {
        config.output.print_schedule = true;
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.logging.level = level.clone();
    }
    if let Some(path) = matches.get_one::<PathBuf>("log-file") {
        config.logging.file = Some(path.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn test_overrides() {
        let matches = cli()
            .try_get_matches_from([
                "u-race", "--drivers", "8", "--mode", "hard", "--time-limit", "2.5", "--print",
                "--log-file", "logs/run.log",
            ])
            .unwrap();
        let mut config = TournamentConfig::default();
        apply_overrides(&mut config, &matches);
        assert_eq!(config.tournament.num_drivers, 8);
        assert_eq!(config.fairness.mode, IdleMode::Hard);
        assert_eq!(config.logging.file, Some(PathBuf::from("logs/run.log")));
        assert_eq!(config.solver.time_limit_seconds, 2.5);
        assert!(config.output.print_schedule);
        // Untouched values keep their defaults.
        assert_eq!(config.tournament.slots_per_heat, 6);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(cli().try_get_matches_from(["u-race", "--mode", "strict"]).is_err());
    }
}
