use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::capacity::CapacityTracker;
use super::constraints::{ConstraintEvaluator, HardConstraintResult};
use super::domain::{Driver, DriverId, Job, RegionCoverage};
use super::policy::{AssignmentConfig, SoftRule};

const PRIMARY_REGION_SCORE: f64 = 1.0;
const SECONDARY_REGION_SCORE: f64 = 0.6;

/// Full evaluation of one driver for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub driver_id: DriverId,
    pub hard_constraints: HardConstraintResult,
    /// Component value in `[0, 1]` for each enabled soft rule. Empty for
    /// drivers that failed a hard constraint.
    pub components: BTreeMap<SoftRule, f64>,
    pub total_score: f64,
    pub count_for_day: u32,
}

impl ScoreResult {
    pub fn eligible(&self) -> bool {
        self.hard_constraints.all_pass
    }
}

/// Facts about the candidate pool that individual scores depend on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringContext {
    /// Mean `count_for_day` across the hard-constraint-eligible drivers.
    pub average_day_load: f64,
}

pub struct ScoringEngine;

impl ScoringEngine {
    /// Weighted composite for a driver that passed every enabled hard constraint.
    pub fn score(
        job: &Job,
        driver: &Driver,
        hard_constraints: HardConstraintResult,
        tracker: &CapacityTracker,
        config: &AssignmentConfig,
        context: ScoringContext,
    ) -> ScoreResult {
        let count_for_day = tracker.count_for_day(&driver.id, job.pickup_date);
        let mut components = BTreeMap::new();
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;

        for (rule, weight) in config.active_soft_rules() {
            let value = match rule {
                SoftRule::RegionScore => region_score(driver.coverage(job.pickup_region)),
                SoftRule::LoadBalanceScore => load_balance_score(count_for_day, driver.max_jobs_per_day),
                SoftRule::FairnessScore => fairness_score(count_for_day, context.average_day_load),
            };
            components.insert(rule, value);
            weighted_sum += weight * value;
            weight_total += weight;
        }

        let total_score = if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            0.0
        };

        ScoreResult {
            driver_id: driver.id.clone(),
            hard_constraints,
            components,
            total_score,
            count_for_day,
        }
    }

    /// Evaluate every driver for the job against the tracker's current counts.
    ///
    /// Ineligible drivers are returned with their constraint breakdown and a
    /// zero score so callers can explain the exclusion. Fairness is averaged
    /// over the eligible drivers only.
    pub fn score_candidates(
        job: &Job,
        drivers: &[Driver],
        tracker: &CapacityTracker,
        config: &AssignmentConfig,
    ) -> Vec<ScoreResult> {
        let evaluated: Vec<(&Driver, HardConstraintResult)> = drivers
            .iter()
            .map(|driver| {
                (
                    driver,
                    ConstraintEvaluator::evaluate(job, driver, tracker, config),
                )
            })
            .collect();

        let eligible_loads: Vec<u32> = evaluated
            .iter()
            .filter(|(_, hard)| hard.all_pass)
            .map(|(driver, _)| tracker.count_for_day(&driver.id, job.pickup_date))
            .collect();
        let average_day_load = if eligible_loads.is_empty() {
            0.0
        } else {
            eligible_loads.iter().map(|load| f64::from(*load)).sum::<f64>()
                / eligible_loads.len() as f64
        };
        let context = ScoringContext { average_day_load };

        evaluated
            .into_iter()
            .map(|(driver, hard)| {
                if hard.all_pass {
                    Self::score(job, driver, hard, tracker, config, context)
                } else {
                    ScoreResult {
                        driver_id: driver.id.clone(),
                        hard_constraints: hard,
                        components: BTreeMap::new(),
                        total_score: 0.0,
                        count_for_day: tracker.count_for_day(&driver.id, job.pickup_date),
                    }
                }
            })
            .collect()
    }
}

fn region_score(coverage: RegionCoverage) -> f64 {
    match coverage {
        RegionCoverage::Primary => PRIMARY_REGION_SCORE,
        RegionCoverage::Secondary => SECONDARY_REGION_SCORE,
        RegionCoverage::Uncovered => 0.0,
    }
}

fn load_balance_score(count_for_day: u32, max_jobs_per_day: u32) -> f64 {
    if max_jobs_per_day == 0 {
        return 0.0;
    }
    (1.0 - f64::from(count_for_day) / f64::from(max_jobs_per_day)).clamp(0.0, 1.0)
}

fn fairness_score(count_for_day: u32, average_day_load: f64) -> f64 {
    (1.0 - f64::from(count_for_day) / (1.0 + average_day_load)).clamp(0.0, 1.0)
}
