//! Workspace resolution and script materialization.
//!
//! Grounded on `_prepare_execution_environment` in
//! `original_source/.../script_executor_agent.py`: a per-session reports
//! directory plus one file per script artifact, both created ahead of the
//! process launch.

use std::path::{Path, PathBuf};

use qa_core_tooling::config::ExecutorSettings;
use qa_core_utils::ScriptArtifact;

use crate::error::ExecutorError;

/// Resolution order: `PLAYWRIGHT_WORKSPACE` (via `ExecutorSettings::workspace_root`,
/// already read from the env by `CoreConfig::from_env`) → bundled `./workspace`
/// next to the executable → the OS temp directory.
pub fn resolve_workspace_root(settings: &ExecutorSettings) -> PathBuf {
    if let Some(root) = &settings.workspace_root {
        return root.clone();
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let bundled = dir.join("workspace");
            if bundled.exists() {
                return bundled;
            }
        }
    }
    std::env::temp_dir()
}

pub struct PreparedWorkspace {
    pub work_dir: PathBuf,
    pub execution_dir: PathBuf,
    pub script_paths: Vec<PathBuf>,
}

/// Creates `<root>/scripts/<session_id>/` for the scripts and
/// `<root>/reports/<session_id>/` for executor output, writes every script
/// artifact's content to its path, then makes a best-effort attempt to
/// install each artifact's declared `dependencies` into the work dir
/// (spec.md §4.7 step 1). A failed or skipped install is logged and never
/// turns into an `Err` — the runner may still succeed without it.
pub async fn prepare(
    root: &Path,
    session_id: &str,
    scripts: &[ScriptArtifact],
) -> Result<PreparedWorkspace, ExecutorError> {
    let work_dir = root.join("scripts").join(session_id);
    let execution_dir = root.join("reports").join(session_id);
    std::fs::create_dir_all(&work_dir)
        .map_err(|e| ExecutorError::Workspace(format!("create work dir: {e}")))?;
    std::fs::create_dir_all(&execution_dir)
        .map_err(|e| ExecutorError::Workspace(format!("create execution dir: {e}")))?;

    let mut script_paths = Vec::with_capacity(scripts.len());
    for script in scripts {
        let path = work_dir.join(&script.relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ExecutorError::Workspace(format!("create script parent: {e}")))?;
        }
        std::fs::write(&path, &script.content)
            .map_err(|e| ExecutorError::Workspace(format!("write script: {e}")))?;
        script_paths.push(path);
    }

    install_dependencies(&work_dir, scripts).await;

    Ok(PreparedWorkspace {
        work_dir,
        execution_dir,
        script_paths,
    })
}

/// Best-effort `pip install` of every unique dependency declared across
/// `scripts`, run in `work_dir` so a `requirements.txt` materialised
/// alongside the script is picked up by relative path. Mirrors the
/// report-plugin detection in `command::detect_plugin`: absence of `python`
/// or a failed install is logged at `debug!` and never aborts workspace
/// preparation.
async fn install_dependencies(work_dir: &Path, scripts: &[ScriptArtifact]) {
    let mut deps: Vec<&str> = scripts
        .iter()
        .flat_map(|s| s.dependencies.iter().map(String::as_str))
        .collect();
    deps.sort_unstable();
    deps.dedup();

    if deps.is_empty() {
        return;
    }

    if which::which("python").is_err() {
        tracing::debug!("python not on PATH, skipping dependency install");
        return;
    }

    let mut cmd = tokio::process::Command::new("python");
    cmd.args(["-m", "pip", "install"]).args(&deps).current_dir(work_dir);

    match cmd.output().await {
        Ok(out) if out.status.success() => {
            tracing::debug!(count = deps.len(), "installed script dependencies");
        }
        Ok(out) => {
            tracing::debug!(
                stderr = %String::from_utf8_lossy(&out.stderr),
                "dependency install exited non-zero, continuing without it"
            );
        }
        Err(e) => {
            tracing::debug!(error = %e, "failed to launch dependency install, continuing without it");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_workspace_root_defaults_to_temp_dir() {
        let settings = ExecutorSettings {
            workspace_root: None,
            execution_timeout_secs: 600,
            batch_id: None,
        };
        let root = resolve_workspace_root(&settings);
        assert!(root.exists() || root == std::env::temp_dir());
    }

    #[test]
    fn test_resolve_workspace_root_honors_explicit_override() {
        let settings = ExecutorSettings {
            workspace_root: Some(PathBuf::from("/tmp/explicit-workspace")),
            execution_timeout_secs: 600,
            batch_id: None,
        };
        assert_eq!(
            resolve_workspace_root(&settings),
            PathBuf::from("/tmp/explicit-workspace")
        );
    }

    #[tokio::test]
    async fn test_prepare_writes_every_script() {
        let tmp = std::env::temp_dir().join(format!("qa-core-executor-test-{}", qa_core_utils::new_id()));
        let scripts = vec![ScriptArtifact {
            name: "test_generated.py".to_string(),
            relative_path: "test_generated.py".to_string(),
            content: "def test_ok():\n    assert True\n".to_string(),
            dependencies: Vec::new(),
            test_case_ids: Vec::new(),
            framework: "pytest".to_string(),
        }];
        let prepared = prepare(&tmp, "session-1", &scripts).await.unwrap();
        assert_eq!(prepared.script_paths.len(), 1);
        assert!(prepared.script_paths[0].exists());
        std::fs::remove_dir_all(&tmp).ok();
    }

    #[tokio::test]
    async fn test_prepare_skips_install_when_no_dependencies_declared() {
        // No dependencies declared means `install_dependencies` returns
        // immediately without touching the network or PATH.
        let tmp = std::env::temp_dir().join(format!("qa-core-executor-test-nodeps-{}", qa_core_utils::new_id()));
        let scripts = vec![ScriptArtifact {
            name: "test_generated.py".to_string(),
            relative_path: "test_generated.py".to_string(),
            content: "def test_ok():\n    assert True\n".to_string(),
            dependencies: Vec::new(),
            test_case_ids: Vec::new(),
            framework: "pytest".to_string(),
        }];
        let prepared = prepare(&tmp, "session-2", &scripts).await.unwrap();
        assert!(prepared.work_dir.exists());
        std::fs::remove_dir_all(&tmp).ok();
    }
}
