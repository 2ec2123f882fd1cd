//! Schedule (solution) model.
//!
//! A schedule is the ordered list of used heats. Each heat lists the seats
//! filled in it, one `(driver, car)` pair per seat, ordered by driver and then
//! by car roster position.

use serde::{Deserialize, Serialize};

use super::DriverId;
use crate::engine::SolveStatus;

/// A complete heat schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Used heats, in race order.
    pub heats: Vec<Heat>,
    /// Engine status the schedule was extracted from.
    pub status: Option<SolveStatus>,
    /// Objective value of the underlying solution.
    pub objective: Option<i64>,
}

/// One heat of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heat {
    /// Zero-based heat index.
    pub index: usize,
    /// Filled seats.
    pub seats: Vec<Seat>,
}

/// A driver occupying a car during a heat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    /// Driver.
    pub driver: DriverId,
    /// Roster index of the car.
    pub car: usize,
    /// Car label (denormalized for output).
    pub car_label: String,
}

impl Seat {
    /// Creates a seat.
    pub fn new(driver: DriverId, car: usize, car_label: impl Into<String>) -> Self {
        Self {
            driver,
            car,
            car_label: car_label.into(),
        }
    }
}

impl Heat {
    /// Creates an empty heat.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            seats: Vec::new(),
        }
    }

    /// Adds a seat.
    pub fn with_seat(mut self, seat: Seat) -> Self {
        self.seats.push(seat);
        self
    }

    /// One-based heat number, as displayed.
    pub fn number(&self) -> usize {
        self.index + 1
    }

    /// Number of drivers on track.
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Whether no seat is filled.
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Whether `driver` races in this heat.
    pub fn contains(&self, driver: DriverId) -> bool {
        self.seats.iter().any(|s| s.driver == driver)
    }

    /// Driver in car `car`, if any.
    pub fn driver_in(&self, car: usize) -> Option<DriverId> {
        self.seats.iter().find(|s| s.car == car).map(|s| s.driver)
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a heat.
    pub fn add_heat(&mut self, heat: Heat) {
        self.heats.push(heat);
    }

    /// Number of heats.
    pub fn heat_count(&self) -> usize {
        self.heats.len()
    }

    /// Total seats filled across all heats.
    pub fn seat_count(&self) -> usize {
        self.heats.iter().map(Heat::len).sum()
    }

    /// Whether used heats are numbered `0..heat_count` without gaps.
    pub fn is_contiguous(&self) -> bool {
        self.heats.iter().enumerate().all(|(i, h)| h.index == i)
    }

    /// Heats a driver races in, with the car, in race order.
    pub fn heats_for_driver(&self, driver: DriverId) -> Vec<(usize, &Seat)> {
        self.heats
            .iter()
            .flat_map(|h| {
                h.seats
                    .iter()
                    .filter(move |s| s.driver == driver)
                    .map(move |s| (h.index, s))
            })
            .collect()
    }

    /// Per-heat participation of `driver` (`true` = races).
    pub fn participation(&self, driver: DriverId) -> Vec<bool> {
        self.heats.iter().map(|h| h.contains(driver)).collect()
    }

    /// Number of heats both drivers race in.
    pub fn meetings(&self, a: DriverId, b: DriverId) -> usize {
        self.heats
            .iter()
            .filter(|h| h.contains(a) && h.contains(b))
            .count()
    }
}
