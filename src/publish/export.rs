//! CSV views of a schedule.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use super::ExportError;
use crate::models::Schedule;

/// Full schedule, one row per heat and one column per car.
///
/// # Example
///
/// ```
/// use u_race::models::{DriverId, Heat, Schedule, Seat};
/// use u_race::publish::HeatsCsv;
///
/// let mut schedule = Schedule::new();
/// schedule.add_heat(Heat::new(0).with_seat(Seat::new(DriverId(1), 1, "Blue")));
///
/// let csv = HeatsCsv::to_string(&schedule, &["Red", "Blue"]);
/// assert_eq!(csv, "Heat,Red,Blue\nHeat 1,,D2\n");
/// ```
pub struct HeatsCsv;

impl HeatsCsv {
    /// Renders the heats view. `cars` are the roster labels in roster order.
    pub fn to_string<S: AsRef<str>>(schedule: &Schedule, cars: &[S]) -> String {
        render(|buf| Self::write(schedule, cars, buf))
    }

    /// Writes the heats view to a writer.
    pub fn write<S: AsRef<str>, W: Write>(schedule: &Schedule, cars: &[S], writer: W) -> io::Result<()> {
        let mut out = csv::Writer::from_writer(writer);

        // Header
        out.write_record(std::iter::once("Heat").chain(cars.iter().map(|c| c.as_ref())))?;

        for heat in &schedule.heats {
            let label = format!("Heat {}", heat.number());
            let drivers: Vec<String> = (0..cars.len())
                .map(|car| heat.driver_in(car).map(|d| d.label()).unwrap_or_default())
                .collect();
            out.write_record(std::iter::once(label.as_str()).chain(drivers.iter().map(String::as_str)))?;
        }

        out.flush()
    }

    /// Writes the heats view to a file, replacing any previous content.
    pub fn to_file<S: AsRef<str>>(
        schedule: &Schedule,
        cars: &[S],
        path: impl AsRef<Path>,
    ) -> Result<(), ExportError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), heats = schedule.heat_count(), "exporting heats view");
        write_file(path, |w| Self::write(schedule, cars, w))
    }
}

/// Per-driver listing, one row per seat.
///
/// # Example
///
/// ```
/// use u_race::models::{DriverId, Heat, Schedule, Seat};
/// use u_race::publish::DriversCsv;
///
/// let mut schedule = Schedule::new();
/// schedule.add_heat(Heat::new(0).with_seat(Seat::new(DriverId(0), 0, "Red")));
///
/// assert_eq!(DriversCsv::to_string(&schedule), "Driver,Heat,Car\nD1,Heat 1,Red\n");
/// ```
pub struct DriversCsv;

impl DriversCsv {
    /// Renders the drivers view in race order.
    pub fn to_string(schedule: &Schedule) -> String {
        render(|buf| Self::write(schedule, buf))
    }

    /// Writes the drivers view to a writer.
    pub fn write<W: Write>(schedule: &Schedule, writer: W) -> io::Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(["Driver", "Heat", "Car"])?;

        for heat in &schedule.heats {
            let label = format!("Heat {}", heat.number());
            for seat in &heat.seats {
                let driver = seat.driver.label();
                out.write_record([driver.as_str(), label.as_str(), seat.car_label.as_str()])?;
            }
        }

        out.flush()
    }

    /// Writes the drivers view to a file, replacing any previous content.
    pub fn to_file(schedule: &Schedule, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), seats = schedule.seat_count(), "exporting drivers view");
        write_file(path, |w| Self::write(schedule, w))
    }
}

fn write_file<F>(path: &Path, render: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let result = File::create(path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        render(&mut writer)?;
        writer.flush()
    });
    result.map_err(|source| {
        tracing::error!(path = %path.display(), error = %source, "export failed");
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Renders a view into memory. Every record of a view has the same width,
/// so writing to a buffer cannot fail.
fn render<F>(write: F) -> String
where
    F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
{
    let mut buf = Vec::new();
    match write(&mut buf) {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(e) => {
            tracing::error!(error = %e, "rendering view failed");
            String::new()
        }
    }
}
