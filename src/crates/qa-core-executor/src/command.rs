//! Test command assembly.
//!
//! Grounded on `_build_test_command`/`_add_report_options` in
//! `original_source/.../script_executor_agent.py`: a base `pytest` invocation,
//! one argument per script path (relative to the work directory when
//! possible), always a JUnit XML report, and a best-effort JSON report flag
//! when the `pytest-json-report` plugin is detected on the PATH.

use std::path::{Path, PathBuf};

use qa_core_utils::ExecutionConfig;

/// Result of `build_command`: the argv to launch plus where the JSON/JUnit
/// reports will land once the process exits.
pub struct PlannedCommand {
    pub program: String,
    pub args: Vec<String>,
    pub junit_report: PathBuf,
    pub json_report: Option<PathBuf>,
}

pub async fn build_command(
    script_paths: &[PathBuf],
    work_dir: &Path,
    execution_dir: &Path,
    config: &ExecutionConfig,
) -> PlannedCommand {
    let mut args = vec!["-m".to_string(), "pytest".to_string()];

    if script_paths.is_empty() {
        args.push(".".to_string());
    } else {
        for path in script_paths {
            let rel = path.strip_prefix(work_dir).unwrap_or(path);
            args.push(rel.to_string_lossy().into_owned());
        }
    }

    args.push("-v".to_string());

    let junit_report = execution_dir.join("junit.xml");
    args.push("--junitxml".to_string());
    args.push(junit_report.to_string_lossy().into_owned());

    let json_report = if detect_plugin("pytest-json-report").await {
        let path = execution_dir.join("report.json");
        args.push("--json-report".to_string());
        args.push("--json-report-file".to_string());
        args.push(path.to_string_lossy().into_owned());
        Some(path)
    } else {
        tracing::debug!("pytest-json-report not detected, skipping JSON report flag");
        None
    };

    args.extend(config.runner_args.iter().cloned());

    PlannedCommand {
        program: "python".to_string(),
        args,
        junit_report,
        json_report,
    }
}

/// Best-effort plugin presence check: does a `pip show <plugin>` resolve on
/// PATH. Never fails command assembly; an absent tool just means the plugin
/// is skipped.
async fn detect_plugin(plugin: &str) -> bool {
    if which::which("python").is_err() {
        return false;
    }
    tokio::process::Command::new("python")
        .args(["-m", "pip", "show", plugin])
        .output()
        .await
        .map(|out| out.status.success())
        .unwrap_or(false)
}
