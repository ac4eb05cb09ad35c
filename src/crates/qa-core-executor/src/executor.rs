//! `ScriptExecutor`: workspace preparation → command assembly → process
//! launch → result parsing → artifact harvest, producing a terminal
//! [`ExecutionRecord`] and its derived [`TestReport`] (spec.md §4.7).

use std::time::Duration;

use qa_core_tooling::config::ExecutorSettings;
use qa_core_utils::{ExecutionConfig, ExecutionRecord, ExecutionStatus, ScriptArtifact, TestReport, TestTotals};

use crate::{command, harvest, parse, process, workspace};

pub struct ScriptExecutor {
    settings: ExecutorSettings,
}

impl ScriptExecutor {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self { settings }
    }

    /// Runs every script in one pytest invocation and returns the terminal
    /// `ExecutionRecord` alongside the `TestReport` derived from it. Never
    /// returns an `Err`: every failure mode (workspace, launch, timeout) is
    /// captured as a `Failed` terminal record instead, since a report is
    /// always emitted (spec.md B2/B3). `on_line`, when given, receives every
    /// non-empty stdout/stderr line as the process produces it (spec.md
    /// §4.7 step 4), so a caller can stream them onto the bus while this
    /// call is still in flight.
    pub async fn execute(
        &self,
        session_id: &str,
        scripts: &[ScriptArtifact],
        config: &ExecutionConfig,
        on_line: Option<process::LineSender>,
    ) -> (ExecutionRecord, TestReport) {
        let mut record = ExecutionRecord::new(session_id, serde_json::json!(config))
            .with_environment(config.env.clone());

        let root = workspace::resolve_workspace_root(&self.settings);
        let prepared = match workspace::prepare(&root, session_id, scripts).await {
            Ok(p) => p,
            Err(e) => {
                record
                    .transition(ExecutionStatus::Failed, None, None, Some(e.to_string()))
                    .ok();
                let report = TestReport::from_execution(&record, TestTotals::default());
                return (record, report);
            }
        };

        record.mark_running().ok();

        let planned = command::build_command(
            &prepared.script_paths,
            &prepared.work_dir,
            &prepared.execution_dir,
            config,
        )
        .await;

        let timeout = Duration::from_secs(
            config
                .timeout_secs
                .unwrap_or(self.settings.execution_timeout_secs),
        );

        let output = match process::run_process(
            &planned.program,
            &planned.args,
            &prepared.work_dir,
            &config.env,
            timeout,
            on_line,
        )
        .await
        {
            Ok(out) => out,
            Err(e) => {
                let artifacts = harvest::harvest_artifacts(&prepared.execution_dir);
                record.artifacts = artifacts;
                record
                    .transition(ExecutionStatus::Failed, None, None, Some(e.to_string()))
                    .ok();
                let report = TestReport::from_execution(&record, TestTotals::default());
                return (record, report);
            }
        };

        for line in output.stdout.lines() {
            record.append_log(format!("[stdout] {line}")).ok();
        }
        for line in output.stderr.lines() {
            record.append_log(format!("[stderr] {line}")).ok();
        }

        let artifacts = harvest::harvest_artifacts(&prepared.execution_dir);

        if output.timed_out {
            record.artifacts = artifacts;
            record
                .transition(
                    ExecutionStatus::Failed,
                    None,
                    None,
                    Some("execution timeout".to_string()),
                )
                .ok();
            let report = TestReport::from_execution(&record, TestTotals::default());
            return (record, report);
        }

        let totals = parse::parse_totals(
            &output.stdout,
            planned.json_report.as_deref(),
            &planned.junit_report,
        );

        let status = if output.return_code == 0 {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };
        let error = if output.return_code != 0 {
            Some(if output.stderr.trim().is_empty() {
                format!("pytest exited with code {}", output.return_code)
            } else {
                output.stderr.clone()
            })
        } else {
            None
        };

        record.artifacts = artifacts;
        record
            .transition(
                status,
                Some(output.return_code),
                Some(planned.junit_report.clone()),
                error,
            )
            .ok();

        let report = TestReport::from_execution(&record, totals);
        (record, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(root: std::path::PathBuf) -> ExecutorSettings {
        ExecutorSettings {
            workspace_root: Some(root),
            execution_timeout_secs: 30,
            batch_id: None,
        }
    }

    fn passing_script() -> ScriptArtifact {
        ScriptArtifact {
            name: "test_ok.py".to_string(),
            relative_path: "test_ok.py".to_string(),
            content: "def test_ok():\n    assert True\n".to_string(),
            dependencies: Vec::new(),
            test_case_ids: Vec::new(),
            framework: "pytest".to_string(),
        }
    }

    #[tokio::test]
    async fn test_execute_records_failure_on_bad_workspace() {
        // Using a path that cannot be created (a file as a parent) forces
        // `workspace::prepare` to error.
        let bad_root = std::env::temp_dir().join(format!("qa-core-executor-exec-file-{}", qa_core_utils::new_id()));
        std::fs::write(&bad_root, "not a directory").unwrap();

        let executor = ScriptExecutor::new(settings(bad_root.clone()));
        let (record, report) = executor
            .execute("session-x", &[passing_script()], &ExecutionConfig::default(), None)
            .await;

        assert!(matches!(record.status, ExecutionStatus::Failed));
        assert_eq!(report.totals.total, 0);

        std::fs::remove_file(&bad_root).ok();
    }

    #[tokio::test]
    async fn test_execute_is_always_terminal() {
        let root = std::env::temp_dir().join(format!("qa-core-executor-exec-{}", qa_core_utils::new_id()));
        let executor = ScriptExecutor::new(settings(root.clone()));
        let (record, _report) = executor
            .execute("session-y", &[passing_script()], &ExecutionConfig::default(), None)
            .await;

        assert!(record.status.is_terminal());
        std::fs::remove_dir_all(&root).ok();
    }
}
