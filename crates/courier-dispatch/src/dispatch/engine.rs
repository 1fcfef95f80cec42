use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::batch::{BatchAutoAssigner, BatchRun};
use super::capacity::CapacityTracker;
use super::constraints::ConstraintEvaluator;
use super::decision::{diagnose, AssignmentDecision};
use super::domain::{AssignmentMode, Driver, Job};
use super::policy::AssignmentConfig;
use super::scoring::{ScoreResult, ScoringEngine};
use super::selection::AssignmentSelector;
use super::validation::{
    validate_driver, validate_job, validate_jobs, validate_roster, ValidationError,
};

/// Entry point for every allocation path, bound to one policy snapshot.
#[derive(Debug, Clone)]
pub struct DispatchEngine {
    config: AssignmentConfig,
}

impl DispatchEngine {
    pub fn new(config: AssignmentConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        if config.active_soft_rules().is_empty() {
            warn!("no soft rules enabled; selection falls back to load and driver id");
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &AssignmentConfig {
        &self.config
    }

    /// Batch auto-assign over a fresh tracker seeded from the roster.
    pub fn run_for_pending(
        &self,
        jobs: &[Job],
        drivers: &[Driver],
    ) -> Result<BatchRun, ValidationError> {
        self.run_inner(jobs, drivers, None)
    }

    /// As [`Self::run_for_pending`], checking `cancel` before each job.
    pub fn run_for_pending_until(
        &self,
        jobs: &[Job],
        drivers: &[Driver],
        cancel: &CancellationToken,
    ) -> Result<BatchRun, ValidationError> {
        self.run_inner(jobs, drivers, Some(cancel))
    }

    fn run_inner(
        &self,
        jobs: &[Job],
        drivers: &[Driver],
        cancel: Option<&CancellationToken>,
    ) -> Result<BatchRun, ValidationError> {
        if drivers.is_empty() {
            return Err(ValidationError::EmptyRoster);
        }
        validate_roster(drivers)?;
        validate_jobs(jobs)?;

        let tracker = CapacityTracker::from_roster(drivers);
        Ok(BatchAutoAssigner::new(&self.config, tracker).run(jobs, drivers, cancel))
    }

    /// Operator-chosen assignment. Skips scoring but still refuses a driver
    /// that fails an enforced hard constraint, and reserves on success.
    pub fn assign_one(
        &self,
        job: &Job,
        driver: &Driver,
        tracker: &mut CapacityTracker,
        mode: AssignmentMode,
    ) -> Result<AssignmentDecision, ValidationError> {
        validate_job(job)?;
        validate_driver(driver)?;
        if !job.status.awaits_assignment() {
            return Err(ValidationError::NotAwaitingAssignment {
                job: job.id.clone(),
                status: job.status.label(),
            });
        }

        let hard = ConstraintEvaluator::evaluate(job, driver, tracker, &self.config);
        let decision = if hard.all_pass {
            tracker.reserve(&driver.id, job.pickup_date, job.pickup_slot);
            AssignmentDecision::assigned(job.id.clone(), driver.id.clone(), mode, None)
        } else {
            AssignmentDecision::unassigned(job.id.clone(), mode, diagnose(&[&hard]))
        };

        debug!(
            job_id = %job.id,
            driver_id = %driver.id,
            accepted = decision.is_assigned(),
            "manual assignment evaluated"
        );
        Ok(decision)
    }

    /// Per-driver breakdown for the debug view. Never reserves.
    pub fn preview_scores(
        &self,
        job: &Job,
        drivers: &[Driver],
        tracker: &CapacityTracker,
    ) -> Result<Vec<ScoreResult>, ValidationError> {
        validate_job(job)?;
        validate_roster(drivers)?;

        let mut scores = ScoringEngine::score_candidates(job, drivers, tracker, &self.config);
        AssignmentSelector::sort_for_display(&mut scores);
        Ok(scores)
    }
}

/// One-shot batch run for callers that do not keep an engine around.
pub fn run_for_pending(
    jobs: &[Job],
    drivers: &[Driver],
    config: &AssignmentConfig,
) -> Result<BatchRun, ValidationError> {
    DispatchEngine::new(config.clone())?.run_for_pending(jobs, drivers)
}
