use std::collections::HashMap;

use chrono::NaiveDate;

use super::domain::{Driver, DriverId, TimeSlot};

/// In-memory job counts per driver, per day and per slot within a day.
///
/// A tracker is seeded from the roster at the start of a run and owned by
/// that run; nothing else mutates it. Counts only ever grow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacityTracker {
    per_day: HashMap<(DriverId, NaiveDate), u32>,
    per_slot: HashMap<(DriverId, NaiveDate, TimeSlot), u32>,
    reservations: u32,
}

impl CapacityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed counts from the loads each driver already has committed.
    pub fn from_roster(drivers: &[Driver]) -> Self {
        let mut tracker = Self::new();
        for driver in drivers {
            for load in &driver.committed {
                let day = tracker
                    .per_day
                    .entry((driver.id.clone(), load.date))
                    .or_insert(0);
                *day = day.saturating_add(load.jobs);
                let in_slot = tracker
                    .per_slot
                    .entry((driver.id.clone(), load.date, load.slot))
                    .or_insert(0);
                *in_slot = in_slot.saturating_add(load.jobs);
            }
        }
        tracker
    }

    pub fn count_for_day(&self, driver: &DriverId, date: NaiveDate) -> u32 {
        self.per_day
            .get(&(driver.clone(), date))
            .copied()
            .unwrap_or(0)
    }

    pub fn count_for_slot(&self, driver: &DriverId, date: NaiveDate, slot: TimeSlot) -> u32 {
        self.per_slot
            .get(&(driver.clone(), date, slot))
            .copied()
            .unwrap_or(0)
    }

    /// Commit one job to the driver, bumping the day and slot counters together.
    pub fn reserve(&mut self, driver: &DriverId, date: NaiveDate, slot: TimeSlot) {
        let day = self.per_day.entry((driver.clone(), date)).or_insert(0);
        *day = day.saturating_add(1);
        let in_slot = self
            .per_slot
            .entry((driver.clone(), date, slot))
            .or_insert(0);
        *in_slot = in_slot.saturating_add(1);
        self.reservations = self.reservations.saturating_add(1);
    }

    /// Reservations made on this tracker since it was seeded.
    pub fn reservations(&self) -> u32 {
        self.reservations
    }
}
