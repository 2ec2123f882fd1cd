//! Decision-variable space of the heat model.
//!
//! Every variable family is stored in a flat `Vec<BoolVar>` addressed by an
//! index function, so lookups never hash:
//!
//! | Family | Key | Flat index |
//! |--------|-----|------------|
//! | assignment | (d, c, h) | `(d·C + c)·H + h` |
//! | heat used | h | `h` |
//! | pairing | (d1 < d2, h) | `pair(d1, d2)·H + h` |
//! | no race / idle violation | (d, s) | `d·W + s` |
//!
//! `pair(d1, d2)` is the row-major index of the strict upper triangle.

use crate::engine::{BoolVar, CpModel};
use crate::error::ScheduleError;
use crate::models::{IdleMode, TournamentParams};

/// All decision variables of one model, with their index functions.
#[derive(Debug, Clone)]
pub struct VariableSpace {
    num_drivers: usize,
    num_cars: usize,
    num_heats: usize,
    window_size: usize,
    num_windows: usize,
    assignment: Vec<BoolVar>,
    heat_used: Vec<BoolVar>,
    pairing: Vec<BoolVar>,
    no_race: Vec<BoolVar>,
    idle_violation: Vec<BoolVar>,
}

impl VariableSpace {
    /// Declares every variable of the heat model in `model`.
    ///
    /// Idle-window variables are only declared in [`IdleMode::Soft`].
    ///
    /// # Errors
    /// `InvalidParameter` when there are no drivers, no cars or no slots.
    pub fn allocate(model: &mut CpModel, params: &TournamentParams) -> Result<Self, ScheduleError> {
        if params.num_drivers < 1 {
            return Err(ScheduleError::invalid("num_drivers", "must be at least 1"));
        }
        if params.num_cars() < 1 {
            return Err(ScheduleError::invalid("car_roster", "must contain at least one car"));
        }
        if params.slots_per_heat < 1 {
            return Err(ScheduleError::invalid("slots_per_heat", "must be at least 1"));
        }

        let num_drivers = params.num_drivers;
        let num_cars = params.num_cars();
        let num_heats = params.max_heats();
        let window_size = params.window_size();
        let num_windows = if params.idle_mode == IdleMode::Soft && num_heats >= window_size {
            num_heats - window_size + 1
        } else {
            0
        };

        let mut assignment = Vec::with_capacity(num_drivers * num_cars * num_heats);
        for d in 0..num_drivers {
            for c in 0..num_cars {
                for h in 0..num_heats {
                    assignment.push(model.new_bool_var(format!("x_d{d}_c{c}_h{h}")));
                }
            }
        }

        let heat_used = (0..num_heats)
            .map(|h| model.new_bool_var(format!("y_h{h}")))
            .collect();

        let mut pairing = Vec::with_capacity(params.num_pairs() * num_heats);
        for d1 in 0..num_drivers {
            for d2 in (d1 + 1)..num_drivers {
                for h in 0..num_heats {
                    pairing.push(model.new_bool_var(format!("p_{d1}_{d2}_h{h}")));
                }
            }
        }

        let mut no_race = Vec::with_capacity(num_drivers * num_windows);
        let mut idle_violation = Vec::with_capacity(num_drivers * num_windows);
        for d in 0..num_drivers {
            for s in 0..num_windows {
                no_race.push(model.new_bool_var(format!("noRace_d{d}_s{s}")));
                idle_violation.push(model.new_bool_var(format!("idleViol_d{d}_s{s}")));
            }
        }

        Ok(Self {
            num_drivers,
            num_cars,
            num_heats,
            window_size,
            num_windows,
            assignment,
            heat_used,
            pairing,
            no_race,
            idle_violation,
        })
    }

    /// Number of drivers.
    pub fn num_drivers(&self) -> usize {
        self.num_drivers
    }

    /// Number of cars.
    pub fn num_cars(&self) -> usize {
        self.num_cars
    }

    /// Heat horizon.
    pub fn num_heats(&self) -> usize {
        self.num_heats
    }

    /// Heats per idle window.
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Idle windows per driver (soft mode only, else 0).
    pub fn num_windows(&self) -> usize {
        self.num_windows
    }

    /// Driver `d` drives car `c` in heat `h`.
    #[inline]
    pub fn assignment(&self, d: usize, c: usize, h: usize) -> BoolVar {
        debug_assert!(d < self.num_drivers && c < self.num_cars && h < self.num_heats);
        self.assignment[(d * self.num_cars + c) * self.num_heats + h]
    }

    /// Heat `h` is used.
    #[inline]
    pub fn heat_used(&self, h: usize) -> BoolVar {
        self.heat_used[h]
    }

    /// All heat-used variables, in heat order.
    pub fn heat_used_vars(&self) -> &[BoolVar] {
        &self.heat_used
    }

    /// Drivers `d1 < d2` both race in heat `h`.
    #[inline]
    pub fn pairing(&self, d1: usize, d2: usize, h: usize) -> BoolVar {
        debug_assert!(d1 < d2 && d2 < self.num_drivers && h < self.num_heats);
        self.pairing[self.pair_index(d1, d2) * self.num_heats + h]
    }

    /// Driver `d` has no race in the window starting at heat `s`.
    #[inline]
    pub fn no_race(&self, d: usize, s: usize) -> BoolVar {
        debug_assert!(d < self.num_drivers && s < self.num_windows);
        self.no_race[d * self.num_windows + s]
    }

    /// The window starting at `s` is a counted idle violation for driver `d`.
    #[inline]
    pub fn idle_violation(&self, d: usize, s: usize) -> BoolVar {
        debug_assert!(d < self.num_drivers && s < self.num_windows);
        self.idle_violation[d * self.num_windows + s]
    }

    /// All idle-violation variables.
    pub fn idle_violations(&self) -> &[BoolVar] {
        &self.idle_violation
    }

    /// Row-major index of `(d1, d2)` in the strict upper triangle.
    #[inline]
    pub fn pair_index(&self, d1: usize, d2: usize) -> usize {
        d1 * (2 * self.num_drivers - d1 - 1) / 2 + (d2 - d1 - 1)
    }

    /// Assignment variables of driver `d` in heat `h` (one per car).
    pub fn races(&self, d: usize, h: usize) -> impl Iterator<Item = BoolVar> + '_ {
        (0..self.num_cars).map(move |c| self.assignment(d, c, h))
    }

    /// Assignment variables of driver `d` over heats `from..to`.
    pub fn races_between(&self, d: usize, from: usize, to: usize) -> impl Iterator<Item = BoolVar> + '_ {
        (from..to).flat_map(move |h| self.races(d, h))
    }

    /// Every assignment variable of heat `h`.
    pub fn heat_assignments(&self, h: usize) -> impl Iterator<Item = BoolVar> + '_ {
        (0..self.num_drivers).flat_map(move |d| self.races(d, h))
    }

    /// Total declared variables.
    pub fn len(&self) -> usize {
        self.assignment.len()
            + self.heat_used.len()
            + self.pairing.len()
            + self.no_race.len()
            + self.idle_violation.len()
    }

    /// Whether no variable was declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
