use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::capacity::CapacityTracker;
use super::decision::{diagnose, AssignmentDecision, FailureReason};
use super::domain::{AssignmentMode, Driver, Job};
use super::policy::{AssignmentConfig, HardConstraint};
use super::scoring::ScoringEngine;
use super::selection::AssignmentSelector;

/// Aggregate counts for operator dashboards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub assigned: usize,
    pub unassigned: usize,
    /// Jobs in the input that were not awaiting assignment.
    pub skipped: usize,
    pub by_reason: BTreeMap<FailureReason, usize>,
    pub cancelled: bool,
}

impl BatchSummary {
    fn record(&mut self, decision: &AssignmentDecision) {
        self.processed += 1;
        match decision.failure_reason {
            None => self.assigned += 1,
            Some(reason) => {
                self.unassigned += 1;
                *self.by_reason.entry(reason).or_insert(0) += 1;
            }
        }
    }
}

/// Everything a batch produced. The tracker reflects every reservation made
/// during the run and is handed back for inspection before it is dropped.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub decisions: Vec<AssignmentDecision>,
    pub summary: BatchSummary,
    pub tracker: CapacityTracker,
}

/// Walks the pending queue oldest first, reserving capacity after every
/// successful pick so later jobs see the load earlier ones added.
pub struct BatchAutoAssigner<'a> {
    config: &'a AssignmentConfig,
    tracker: CapacityTracker,
}

impl<'a> BatchAutoAssigner<'a> {
    pub fn new(config: &'a AssignmentConfig, tracker: CapacityTracker) -> Self {
        Self { config, tracker }
    }

    pub fn run(
        mut self,
        jobs: &[Job],
        drivers: &[Driver],
        cancel: Option<&CancellationToken>,
    ) -> BatchRun {
        let mut queue: Vec<&Job> = jobs.iter().collect();
        queue.sort_by(|left, right| {
            left.created_at
                .cmp(&right.created_at)
                .then_with(|| left.id.cmp(&right.id))
        });

        let candidates: Vec<Driver> = if self.config.is_enforced(HardConstraint::ActiveDriver) {
            drivers.iter().filter(|driver| driver.is_active).cloned().collect()
        } else {
            drivers.to_vec()
        };

        let mut decisions = Vec::with_capacity(queue.len());
        let mut summary = BatchSummary::default();

        for job in queue {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                summary.cancelled = true;
                info!(
                    decided = decisions.len(),
                    "batch auto-assign cancelled between jobs"
                );
                break;
            }

            if !job.status.awaits_assignment() {
                summary.skipped += 1;
                continue;
            }

            let decision = self.decide(job, &candidates);
            debug!(
                job_id = %job.id,
                driver_id = ?decision.driver_id,
                reason = ?decision.failure_reason,
                "batch decision"
            );
            summary.record(&decision);
            decisions.push(decision);
        }

        info!(
            assigned = summary.assigned,
            unassigned = summary.unassigned,
            skipped = summary.skipped,
            "batch auto-assign finished"
        );

        BatchRun {
            decisions,
            summary,
            tracker: self.tracker,
        }
    }

    fn decide(&mut self, job: &Job, candidates: &[Driver]) -> AssignmentDecision {
        if !self.config.auto_assign_enabled {
            return AssignmentDecision::unassigned(
                job.id.clone(),
                AssignmentMode::Auto,
                FailureReason::ConfigDisabled,
            );
        }

        let scores = ScoringEngine::score_candidates(job, candidates, &self.tracker, self.config);

        match AssignmentSelector::best_candidate(&scores) {
            Some(best) => {
                self.tracker
                    .reserve(&best.driver_id, job.pickup_date, job.pickup_slot);
                AssignmentDecision::assigned(
                    job.id.clone(),
                    best.driver_id.clone(),
                    AssignmentMode::Auto,
                    Some(best.total_score),
                )
            }
            None => {
                let results: Vec<_> = scores.iter().map(|score| &score.hard_constraints).collect();
                AssignmentDecision::unassigned(
                    job.id.clone(),
                    AssignmentMode::Auto,
                    diagnose(&results),
                )
            }
        }
    }
}
