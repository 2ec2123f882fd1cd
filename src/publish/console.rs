//! Human-readable schedule listing.

use std::fmt;
use std::io::{self, Write};

use crate::models::Schedule;

/// Console listing of a schedule.
///
/// ```text
///
/// Heat 1 (2 drivers)
///   Red     → D1
///   Blue    → D3
/// ```
pub struct ConsoleReport<'a> {
    schedule: &'a Schedule,
}

impl<'a> ConsoleReport<'a> {
    /// Wraps a schedule for display.
    pub fn new(schedule: &'a Schedule) -> Self {
        Self { schedule }
    }

    /// Writes the listing to `writer`.
    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write!(writer, "{self}")?;
        writer.flush()
    }

    /// Prints the listing to stdout.
    pub fn print(&self) -> io::Result<()> {
        tracing::info!(heats = self.schedule.heat_count(), "printing schedule");
        self.write(io::stdout().lock())
    }
}

impl fmt::Display for ConsoleReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for heat in &self.schedule.heats {
            writeln!(f)?;
            writeln!(f, "Heat {} ({} drivers)", heat.number(), heat.len())?;
            for seat in &heat.seats {
                writeln!(f, "  {:7} → {}", seat.car_label, seat.driver)?;
            }
        }
        Ok(())
    }
}
