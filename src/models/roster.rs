//! Driver and car identities.
//!
//! Drivers are anonymous indices `0..num_drivers`; cars carry a display
//! label (usually a color). Both are immutable for a tournament.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A driver, identified by its zero-based index.
///
/// Displayed one-based as `D1`, `D2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DriverId(pub usize);

impl DriverId {
    /// Zero-based index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    /// Display label (`D{index+1}`).
    pub fn label(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{}", self.0 + 1)
    }
}

/// A car of the roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Car {
    /// Display label (e.g., "Red").
    pub label: String,
}

impl Car {
    /// Creates a car with the given label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl From<&str> for Car {
    fn from(label: &str) -> Self {
        Car::new(label)
    }
}

impl From<String> for Car {
    fn from(label: String) -> Self {
        Car::new(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_label_is_one_based() {
        assert_eq!(DriverId(0).label(), "D1");
        assert_eq!(DriverId(17).to_string(), "D18");
        assert_eq!(DriverId(4).index(), 4);
    }

    #[test]
    fn test_car_from_str() {
        let c: Car = "Red".into();
        assert_eq!(c.label, "Red");
        assert_eq!(c.to_string(), "Red");
    }

    #[test]
    fn test_driver_ordering() {
        let mut ds = vec![DriverId(3), DriverId(0), DriverId(1)];
        ds.sort();
        assert_eq!(ds, vec![DriverId(0), DriverId(1), DriverId(3)]);
    }
}
