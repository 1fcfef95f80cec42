use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::capacity::CapacityTracker;
use super::domain::{Driver, Job, RegionCoverage};
use super::policy::{AssignmentConfig, HardConstraint};

/// Outcome of a single hard constraint for one (job, driver) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOutcome {
    Passed,
    Failed,
    /// Disabled by policy; counts as a pass.
    Skipped,
}

/// Per-constraint outcomes plus the overall verdict, kept together so the
/// debug view can show exactly which rule excluded a driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardConstraintResult {
    pub outcomes: BTreeMap<HardConstraint, RuleOutcome>,
    pub all_pass: bool,
}

impl HardConstraintResult {
    pub fn outcome(&self, constraint: HardConstraint) -> RuleOutcome {
        self.outcomes
            .get(&constraint)
            .copied()
            .unwrap_or(RuleOutcome::Skipped)
    }

    pub fn failed(&self) -> Vec<HardConstraint> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| **outcome == RuleOutcome::Failed)
            .map(|(constraint, _)| *constraint)
            .collect()
    }
}

/// Stateless evaluator for the five hard eligibility rules.
pub struct ConstraintEvaluator;

impl ConstraintEvaluator {
    pub fn evaluate(
        job: &Job,
        driver: &Driver,
        tracker: &CapacityTracker,
        config: &AssignmentConfig,
    ) -> HardConstraintResult {
        let mut outcomes = BTreeMap::new();

        for constraint in HardConstraint::ALL {
            let outcome = if !config.is_enforced(constraint) {
                RuleOutcome::Skipped
            } else if check(constraint, job, driver, tracker) {
                RuleOutcome::Passed
            } else {
                RuleOutcome::Failed
            };
            outcomes.insert(constraint, outcome);
        }

        let all_pass = outcomes
            .values()
            .all(|outcome| *outcome != RuleOutcome::Failed);

        HardConstraintResult { outcomes, all_pass }
    }
}

fn check(constraint: HardConstraint, job: &Job, driver: &Driver, tracker: &CapacityTracker) -> bool {
    match constraint {
        HardConstraint::ActiveDriver => driver.is_active,
        HardConstraint::WorkingHours => driver.works_at(job.pickup_slot.start_hour()),
        HardConstraint::RegionMatch => {
            driver.coverage(job.pickup_region) != RegionCoverage::Uncovered
        }
        HardConstraint::VehicleMatch => job
            .required_vehicle
            .map_or(true, |required| driver.vehicle_type.satisfies(required)),
        HardConstraint::SlotCapacity => {
            let in_slot = tracker.count_for_slot(&driver.id, job.pickup_date, job.pickup_slot);
            let today = tracker.count_for_day(&driver.id, job.pickup_date);
            in_slot < driver.max_jobs_per_slot && today < driver.max_jobs_per_day
        }
    }
}
