//! Schedule quality metrics (KPIs).
//!
//! Computes tournament indicators from a finished schedule and re-checks
//! the structural rules independently of the model that produced it.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Heat count | Number of used heats |
//! | Wasted slots | `heats·slots − seats` |
//! | Utilization | `seats / (heats·slots)` |
//! | Pair meetings | Heats shared by each driver pair (min / max) |
//! | Longest idle run | Longest stretch of heats a driver sits out |
//! | Idle violations | Windows of `max_idle_heats + 1` heats without a race |

use crate::models::{DriverId, Schedule, TournamentParams};

/// Tournament schedule indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleKpi {
    /// Used heats.
    pub heat_count: usize,
    /// Filled seats.
    pub seat_count: usize,
    /// Empty slots across all heats.
    pub wasted_slots: usize,
    /// Fraction of slots filled (0.0..1.0).
    pub utilization: f64,
    /// Fewest heats any driver pair shares (0 without pairs).
    pub min_pair_meetings: usize,
    /// Most heats any driver pair shares.
    pub max_pair_meetings: usize,
    /// Pairs that never share a heat.
    pub pairs_never_met: usize,
    /// Pairs sharing more than two heats.
    pub pairs_over_bound: usize,
    /// Longest run of consecutive heats without a race, over all drivers.
    pub longest_idle_run: usize,
    /// Per-driver longest idle run.
    pub idle_run_by_driver: Vec<usize>,
    /// `(driver, window)` pairs with no race inside the window.
    pub idle_violations: usize,
    /// `(driver, car)` combinations not driven exactly once.
    pub seat_coverage_errors: usize,
    /// Heats that are empty, over capacity, or seat a driver or car twice.
    pub heat_conflicts: usize,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule and its parameters.
    pub fn calculate(schedule: &Schedule, params: &TournamentParams) -> Self {
        let nd = params.num_drivers;
        let nc = params.num_cars();
        let heat_count = schedule.heat_count();
        let seat_count = schedule.seat_count();
        let capacity = heat_count * params.slots_per_heat;

        // Seat coverage and per-heat conflicts
        let mut drives = vec![0usize; nd * nc];
        let mut heat_conflicts = 0;
        for heat in &schedule.heats {
            let mut driver_seen = vec![false; nd];
            let mut car_seen = vec![false; nc];
            let mut conflict = heat.is_empty() || heat.len() > params.slots_per_heat;
            for seat in &heat.seats {
                let d = seat.driver.index();
                if d >= nd || seat.car >= nc {
                    conflict = true;
                    continue;
                }
                drives[d * nc + seat.car] += 1;
                conflict |= std::mem::replace(&mut driver_seen[d], true);
                conflict |= std::mem::replace(&mut car_seen[seat.car], true);
            }
            if conflict {
                heat_conflicts += 1;
            }
        }
        let seat_coverage_errors = drives.iter().filter(|&&n| n != 1).count();

        // Pair meetings
        let participation: Vec<Vec<bool>> = (0..nd)
            .map(|d| schedule.participation(DriverId(d)))
            .collect();
        let mut min_pair_meetings = usize::MAX;
        let mut max_pair_meetings = 0;
        let mut pairs_never_met = 0;
        let mut pairs_over_bound = 0;
        for d1 in 0..nd {
            for d2 in (d1 + 1)..nd {
                let met = participation[d1]
                    .iter()
                    .zip(&participation[d2])
                    .filter(|(a, b)| **a && **b)
                    .count();
                min_pair_meetings = min_pair_meetings.min(met);
                max_pair_meetings = max_pair_meetings.max(met);
                if met == 0 {
                    pairs_never_met += 1;
                }
                if met > 2 {
                    pairs_over_bound += 1;
                }
            }
        }
        if min_pair_meetings == usize::MAX {
            min_pair_meetings = 0;
        }

        // Idle runs and windows
        let window = params.window_size();
        let idle_run_by_driver: Vec<usize> = participation.iter().map(|p| longest_idle_run(p)).collect();
        let idle_violations = participation
            .iter()
            .map(|p| {
                if p.len() < window {
                    0
                } else {
                    p.windows(window).filter(|w| !w.contains(&true)).count()
                }
            })
            .sum();

        Self {
            heat_count,
            seat_count,
            wasted_slots: capacity.saturating_sub(seat_count),
            utilization: if capacity == 0 {
                0.0
            } else {
                seat_count as f64 / capacity as f64
            },
            min_pair_meetings,
            max_pair_meetings,
            pairs_never_met,
            pairs_over_bound,
            longest_idle_run: idle_run_by_driver.iter().copied().max().unwrap_or(0),
            idle_run_by_driver,
            idle_violations,
            seat_coverage_errors,
            heat_conflicts,
        }
    }

    /// Whether every driver drives every car once, no heat is over capacity
    /// or double-booked, and every pair meets once or twice.
    pub fn satisfies_structure(&self) -> bool {
        self.seat_coverage_errors == 0
            && self.heat_conflicts == 0
            && self.pairs_never_met == 0
            && self.pairs_over_bound == 0
    }

    /// Whether no driver sits out more than `max_idle_heats` heats in a row.
    pub fn meets_idle_bound(&self, max_idle_heats: usize) -> bool {
        self.longest_idle_run <= max_idle_heats
    }
}

fn longest_idle_run(participation: &[bool]) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for &races in participation {
        if races {
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}
