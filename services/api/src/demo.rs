use crate::infra::{demo_snapshot, load_snapshot, FilePolicySource, InMemoryDispatchRepository};
use chrono::{Local, NaiveDate};
use clap::Args;
use courier_dispatch::dispatch::{
    BatchRun, DispatchService, DispatchSnapshot, JobId, RuleOutcome, ScoreResult,
};
use courier_dispatch::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

type CliService = DispatchService<InMemoryDispatchRepository, FilePolicySource>;

#[derive(Args, Debug)]
pub(crate) struct AssignArgs {
    /// JSON snapshot holding `jobs` and `drivers`
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Assignment policy JSON. Defaults to the built-in weights.
    #[arg(long)]
    pub(crate) policy: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct PreviewArgs {
    /// JSON snapshot holding `jobs` and `drivers`
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Job to score against the roster
    #[arg(long)]
    pub(crate) job: String,
    /// Assignment policy JSON. Defaults to the built-in weights.
    #[arg(long)]
    pub(crate) policy: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Pickup date for the seeded queue (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

fn build_service(snapshot: DispatchSnapshot, policy: Option<PathBuf>) -> CliService {
    DispatchService::new(
        Arc::new(InMemoryDispatchRepository::from_snapshot(snapshot)),
        Arc::new(FilePolicySource::new(policy)),
    )
}

pub(crate) fn run_assign(args: AssignArgs) -> Result<(), AppError> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let service = build_service(snapshot, args.policy);
    let run = service.run_for_pending()?;
    render_batch(&run);
    Ok(())
}

pub(crate) fn run_preview(args: PreviewArgs) -> Result<(), AppError> {
    let snapshot = load_snapshot(&args.snapshot)?;
    let service = build_service(snapshot, args.policy);
    let job_id = JobId(args.job);
    let scores = service.preview_scores(&job_id)?;
    println!("Scoring preview for {}", job_id);
    render_scores(&scores);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let snapshot = demo_snapshot(date);
    println!(
        "Courier dispatch demo for {} ({} jobs, {} drivers)",
        date,
        snapshot.jobs.len(),
        snapshot.drivers.len()
    );

    let preview_job = snapshot.jobs.first().map(|job| job.id.clone());
    let service = build_service(snapshot, None);

    if let Some(job_id) = preview_job {
        println!("\nScoring preview for {}", job_id);
        render_scores(&service.preview_scores(&job_id)?);
    }

    println!("\nBatch auto-assign");
    let run = service.run_for_pending()?;
    render_batch(&run);
    Ok(())
}

fn render_batch(run: &BatchRun) {
    let summary = &run.summary;
    println!(
        "- {} processed | {} assigned | {} unassigned | {} skipped{}",
        summary.processed,
        summary.assigned,
        summary.unassigned,
        summary.skipped,
        if summary.cancelled { " | cancelled" } else { "" }
    );
    for (reason, count) in &summary.by_reason {
        println!("  - {}: {}", reason.code(), count);
    }
    println!("Decisions:");
    for decision in &run.decisions {
        println!("  - {}", decision.summary());
    }
}

fn render_scores(scores: &[ScoreResult]) {
    if scores.is_empty() {
        println!("  (no drivers on the roster)");
        return;
    }
    for score in scores {
        if score.eligible() {
            let components = score
                .components
                .iter()
                .map(|(rule, value)| format!("{}={:.3}", rule.key(), value))
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  - {}: {:.3} (day load {}) [{}]",
                score.driver_id, score.total_score, score.count_for_day, components
            );
        } else {
            let failed = score
                .hard_constraints
                .outcomes
                .iter()
                .filter(|(_, outcome)| **outcome == RuleOutcome::Failed)
                .map(|(constraint, _)| constraint.key())
                .collect::<Vec<_>>()
                .join(", ");
            println!("  - {}: ineligible ({})", score.driver_id, failed);
        }
    }
}
