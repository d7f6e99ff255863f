// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

struct StubExecRunner {
    exit_code: i64,
}

#[async_trait]
impl ExecRunner for StubExecRunner {
    async fn exec(&self, _container_id: &str, _command: &[String]) -> Result<i64, ProbeError> {
        Ok(self.exit_code)
    }
}

#[tokio::test]
async fn tcp_probe_fails_against_closed_port() {
    let checker = ProbeChecker::new();
    let runner = StubExecRunner { exit_code: 0 };
    // Port 1 is reserved and should not accept connections in a test sandbox.
    let result = checker
        .check(&ProbeKind::Tcp { port: 1 }, "127.0.0.1", "c1", 1, &runner)
        .await
        .unwrap();
    assert!(!result);
}

#[tokio::test]
async fn exec_probe_success_on_zero_exit() {
    let checker = ProbeChecker::new();
    let runner = StubExecRunner { exit_code: 0 };
    let kind = ProbeKind::Exec { command: vec!["true".into()] };
    assert!(checker.check(&kind, "", "c1", 1, &runner).await.unwrap());
}

#[tokio::test]
async fn exec_probe_failure_on_nonzero_exit() {
    let checker = ProbeChecker::new();
    let runner = StubExecRunner { exit_code: 1 };
    let kind = ProbeKind::Exec { command: vec!["false".into()] };
    assert!(!checker.check(&kind, "", "c1", 1, &runner).await.unwrap());
}
