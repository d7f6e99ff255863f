// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn truncate_leaves_short_output_untouched() {
    assert_eq!(truncate_output("hello"), "hello");
}

#[test]
fn truncate_caps_long_output() {
    let big = "a".repeat(STEP_OUTPUT_CAP_BYTES + 100);
    let truncated = truncate_output(&big);
    assert!(truncated.len() < big.len());
    assert!(truncated.ends_with("...[truncated]"));
}

#[test]
fn aggregate_succeeds_when_all_steps_pass() {
    let results = vec![
        StepResult { exit_code: 0, stdout: "ok1".into(), stderr: String::new() },
        StepResult { exit_code: 0, stdout: "ok2".into(), stderr: String::new() },
    ];
    let outcome = aggregate_results(&results);
    assert_eq!(outcome.status, JobStatus::Succeeded);
    assert_eq!(outcome.exit_code, 0);
}

#[test]
fn aggregate_fails_on_first_nonzero_exit() {
    let results = vec![
        StepResult { exit_code: 0, stdout: "ok".into(), stderr: String::new() },
        StepResult { exit_code: 7, stdout: String::new(), stderr: "boom".into() },
    ];
    let outcome = aggregate_results(&results);
    assert_eq!(outcome.status, JobStatus::Failed);
    assert_eq!(outcome.exit_code, 7);
}

#[test]
fn job_status_display_matches_wire_values() {
    assert_eq!(JobStatus::InProgress.to_string(), "IN_PROGRESS");
}
