//! Schedule publishing.
//!
//! Renders a finished [`Schedule`](crate::models::Schedule) as the two CSV
//! views handed to race officials and drivers, or as a console listing.
//!
//! | View | Header | Row |
//! |------|--------|-----|
//! | Heats | `Heat,<car labels>` | `Heat N,<driver per car or empty>` |
//! | Drivers | `Driver,Heat,Car` | `D3,Heat N,Red` |
//!
//! Every view can be rendered to a `String`, written to any `io::Write`, or
//! written to a file path. Quoting follows RFC 4180 via the `csv` writer.

mod console;
mod export;

pub use console::ConsoleReport;
pub use export::{DriversCsv, HeatsCsv};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Publishing error.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The output file could not be created or written.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExportError {
    /// Path of the output that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            ExportError::Io { path, .. } => path,
        }
    }
}
