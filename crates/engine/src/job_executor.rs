// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Executor (spec §4.8): polls for the next queued job, runs its step
//! list against a process-local handler registry, and reports the
//! aggregate outcome. The handler registry is a name-keyed dispatch table,
//! concretely grounded in the reference codebase's effect-dispatch-by-name
//! convention (`oj-core/src/effect.rs`'s `name()`-keyed `Effect` enum).

use dsup_adapters::CloudClient;
use dsup_core::{aggregate_results, Clock, Job, JobStatus, JobStep, RetryTable, StepResult};
use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

const JOBS_POLL_RETRY_KEY: &str = "cloud:jobs-poll";

type StepHandler = Box<dyn Fn(Vec<String>) -> BoxFuture<'static, StepResult> + Send + Sync>;

pub struct JobExecutor<C: Clock> {
    cloud: Arc<CloudClient>,
    retries: RetryTable<C>,
    handlers: HashMap<&'static str, StepHandler>,
}

impl<C: Clock> JobExecutor<C> {
    pub fn new(cloud: Arc<CloudClient>, clock: C) -> Self {
        let mut handlers: HashMap<&'static str, StepHandler> = HashMap::new();
        handlers.insert("shell", Box::new(|args| Box::pin(run_shell(args))));
        handlers.insert(
            "restart_service",
            Box::new(|_args| Box::pin(not_implemented("restart_service"))),
        );
        handlers.insert(
            "reboot_device",
            Box::new(|_args| Box::pin(not_implemented("reboot_device"))),
        );
        Self {
            cloud,
            retries: RetryTable::new(clock),
            handlers,
        }
    }

    pub async fn run(&self, poll_interval: Duration, shutdown: CancellationToken) {
        loop {
            if !self.retries.is_gated(JOBS_POLL_RETRY_KEY) {
                self.poll_once().await;
            }
            tokio::select! {
                _ = shutdown.cancelled() => return,
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }
    }

    async fn poll_once(&self) {
        match self.cloud.next_job().await {
            Ok(Some(job)) => {
                self.retries.clear(JOBS_POLL_RETRY_KEY);
                self.execute_job(job).await;
            }
            Ok(None) => self.retries.clear(JOBS_POLL_RETRY_KEY),
            Err(err) => {
                tracing::warn!(error = %err, "job poll failed");
                self.retries.record_failure(JOBS_POLL_RETRY_KEY, err.to_string());
            }
        }
    }

    /// Runs a job's step list sequentially, one job at a time (spec §4.8).
    /// Jobs are never persisted: a supervisor restart mid-job simply drops
    /// this task, and the cloud resolves the hung job on its own timeout.
    async fn execute_job(&self, job: Job) {
        if let Err(err) = self
            .cloud
            .patch_job_status(job.id.as_str(), JobStatus::InProgress, None, None, None, None)
            .await
        {
            tracing::warn!(job_id = %job.id, error = %err, "failed to mark job in-progress");
        }

        let mut results = Vec::with_capacity(job.document.len());
        for step in &job.document {
            let result = self.run_step(step).await;
            tracing::info!(job_id = %job.id, step = %step.name, handler = %step.handler, exit_code = result.exit_code, "job step completed");
            results.push(result);
        }

        let outcome = aggregate_results(&results);
        if let Err(err) = self
            .cloud
            .patch_job_status(
                job.id.as_str(),
                outcome.status,
                Some(outcome.exit_code),
                Some(&outcome.stdout),
                Some(&outcome.stderr),
                None,
            )
            .await
        {
            tracing::error!(job_id = %job.id, error = %err, "failed to report job outcome");
        }
    }

    async fn run_step(&self, step: &JobStep) -> StepResult {
        match self.handlers.get(step.handler.as_str()) {
            Some(handler) => handler(step.args.clone()).await.truncated(),
            None => StepResult {
                exit_code: 127,
                stdout: String::new(),
                stderr: format!("no handler registered for {:?}", step.handler),
            },
        }
    }
}

async fn run_shell(args: Vec<String>) -> StepResult {
    let Some((program, rest)) = args.split_first() else {
        return StepResult {
            exit_code: 1,
            stdout: String::new(),
            stderr: "shell handler requires at least one argument".into(),
        };
    };

    let output = Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(output) => StepResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Err(err) => StepResult {
            exit_code: -1,
            stdout: String::new(),
            stderr: format!("failed to spawn shell step: {err}"),
        },
    }
}

async fn not_implemented(handler: &'static str) -> StepResult {
    StepResult {
        exit_code: 1,
        stdout: String::new(),
        stderr: format!("handler {handler:?} is not yet implemented"),
    }
}

#[cfg(test)]
#[path = "job_executor_tests.rs"]
mod tests;
