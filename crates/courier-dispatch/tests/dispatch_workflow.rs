//! End-to-end scenarios through the public engine facade, fed from the same
//! JSON snapshot layout the CLI reads.

use courier_dispatch::dispatch::{
    run_for_pending, AssignmentConfig, DispatchEngine, DispatchSnapshot, DriverId, FailureReason,
    JobId, Region,
};

fn snapshot(raw: &str) -> DispatchSnapshot {
    serde_json::from_str(raw).expect("snapshot parses")
}

fn driver_json(id: &str, region: &str, max_per_day: u32, committed_today: u32) -> String {
    let committed = if committed_today == 0 {
        "[]".to_string()
    } else {
        format!(r#"[{{ "date": "2025-06-02", "slot": "13:00-15:00", "jobs": {committed_today} }}]"#)
    };
    format!(
        r#"{{
            "id": "{id}",
            "primary_region": "{region}",
            "vehicle_type": "van",
            "is_active": true,
            "max_jobs_per_day": {max_per_day},
            "max_jobs_per_slot": {max_per_day},
            "work_day_start_hour": 7,
            "work_day_end_hour": 19,
            "committed": {committed}
        }}"#
    )
}

fn job_json(id: &str, region: &str, created_at: &str) -> String {
    format!(
        r#"{{
            "id": "{id}",
            "pickup_region": "{region}",
            "pickup_date": "2025-06-02",
            "pickup_slot": "10:00-12:00",
            "status": "pending-assignment",
            "created_at": "{created_at}"
        }}"#
    )
}

#[test]
fn region_match_beats_larger_capacity_elsewhere() {
    let snapshot = snapshot(&format!(
        r#"{{ "jobs": [{}], "drivers": [{}, {}] }}"#,
        job_json("J1", "central", "2025-06-01T09:00:00Z"),
        driver_json("A", "central", 2, 0),
        driver_json("B", "east", 5, 0),
    ));

    let run = run_for_pending(&snapshot.jobs, &snapshot.drivers, &AssignmentConfig::default())
        .expect("valid snapshot");

    assert_eq!(run.decisions[0].driver_id, Some(DriverId("A".to_string())));
}

#[test]
fn full_driver_leaves_job_pending_with_no_capacity() {
    let snapshot = snapshot(&format!(
        r#"{{ "jobs": [{}], "drivers": [{}] }}"#,
        job_json("J1", "central", "2025-06-01T09:00:00Z"),
        driver_json("A", "central", 1, 1),
    ));

    let run = run_for_pending(&snapshot.jobs, &snapshot.drivers, &AssignmentConfig::default())
        .expect("valid snapshot");

    assert_eq!(run.decisions[0].driver_id, None);
    assert_eq!(run.decisions[0].failure_reason, Some(FailureReason::NoCapacity));
}

#[test]
fn batch_of_three_fills_two_slots_in_creation_order() {
    let snapshot = snapshot(&format!(
        r#"{{ "jobs": [{}, {}, {}], "drivers": [{}] }}"#,
        job_json("J3", "central", "2025-06-01T09:30:00Z"),
        job_json("J1", "central", "2025-06-01T09:00:00Z"),
        job_json("J2", "central", "2025-06-01T09:10:00Z"),
        driver_json("A", "central", 2, 0),
    ));

    let run = run_for_pending(&snapshot.jobs, &snapshot.drivers, &AssignmentConfig::default())
        .expect("valid snapshot");

    let outcome: Vec<_> = run
        .decisions
        .iter()
        .map(|decision| (decision.job_id.clone(), decision.driver_id.clone()))
        .collect();
    assert_eq!(
        outcome,
        vec![
            (JobId("J1".to_string()), Some(DriverId("A".to_string()))),
            (JobId("J2".to_string()), Some(DriverId("A".to_string()))),
            (JobId("J3".to_string()), None),
        ]
    );
    assert_eq!(run.decisions[2].failure_reason, Some(FailureReason::NoCapacity));
    let date = snapshot.jobs[0].pickup_date;
    assert_eq!(run.tracker.count_for_day(&DriverId("A".to_string()), date), 2);
}

#[test]
fn underscored_region_codes_match_hyphenated_ones() {
    let snapshot = snapshot(&format!(
        r#"{{ "jobs": [{}], "drivers": [{}] }}"#,
        job_json("J1", "north-east", "2025-06-01T09:00:00Z"),
        driver_json("A", "north_east", 3, 0),
    ));

    assert_eq!(snapshot.drivers[0].primary_region, Region::NorthEast);
    let engine = DispatchEngine::new(AssignmentConfig::default()).expect("default policy");
    let run = engine
        .run_for_pending(&snapshot.jobs, &snapshot.drivers)
        .expect("valid snapshot");
    assert!(run.decisions[0].is_assigned());
}

#[test]
fn identical_inputs_give_identical_runs() {
    let raw = format!(
        r#"{{ "jobs": [{}, {}], "drivers": [{}, {}, {}] }}"#,
        job_json("J1", "central", "2025-06-01T09:00:00Z"),
        job_json("J2", "central", "2025-06-01T09:05:00Z"),
        driver_json("C", "central", 3, 1),
        driver_json("A", "central", 3, 1),
        driver_json("B", "central", 3, 0),
    );
    let first = snapshot(&raw);
    let second = snapshot(&raw);

    let left = run_for_pending(&first.jobs, &first.drivers, &AssignmentConfig::default())
        .expect("valid snapshot");
    let right = run_for_pending(&second.jobs, &second.drivers, &AssignmentConfig::default())
        .expect("valid snapshot");

    assert_eq!(left.decisions, right.decisions);
    assert_eq!(left.decisions[0].driver_id, Some(DriverId("B".to_string())));
}
