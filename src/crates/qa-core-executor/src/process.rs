//! Process launch with captured stdout/stderr and a timeout.
//!
//! Grounded on `_execute_command` in `original_source/.../script_executor_agent.py`
//! (platform branch: async subprocess on Unix, synchronous `subprocess.run`
//! dispatched off-thread on Windows to dodge `NotImplementedError` from
//! Tokio's process reactor) and on the `tokio::process::Command` +
//! `tokio::time::timeout` wrapping `.output()` idiom in
//! `hi-youichi-loom/graphweave/src/tools/bash/mod.rs`. `kill_on_drop(true)`
//! means a timeout's dropped future kills the child without an explicit
//! `.kill()` call. stdout/stderr are drained line-by-line concurrently with
//! the child's run (spec.md §4.7 step 4), each non-empty line forwarded
//! through `on_line` tagged with its category, so a caller can publish a
//! `StreamResponse` per line as it arrives rather than after the process
//! exits.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::ExecutorError;

/// `(category, line)` pairs, category being `"stdout"` or `"stderr"`.
pub type LineSender = UnboundedSender<(String, String)>;

pub struct ProcessOutput {
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: i64,
    pub timed_out: bool,
}

/// Runs `program args` in `cwd`, merging `env` over the current process
/// environment, capturing stdout/stderr line-by-line, and bounding the whole
/// run by `timeout`. On elapse the child is killed and `timed_out` is set;
/// the caller still gets whatever was captured up to that point. `on_line`,
/// when given, receives every non-empty line as it is read.
pub async fn run_process(
    program: &str,
    args: &[String],
    cwd: &Path,
    env: &HashMap<String, String>,
    timeout: Duration,
    on_line: Option<LineSender>,
) -> Result<ProcessOutput, ExecutorError> {
    #[cfg(windows)]
    {
        run_process_blocking(program, args, cwd, env, timeout, on_line).await
    }
    #[cfg(not(windows))]
    {
        run_process_async(program, args, cwd, env, timeout, on_line).await
    }
}

/// Reads `reader` line-by-line until EOF, forwarding every non-empty line
/// through `on_line` tagged with `category`, and returns everything read
/// joined back with newlines (so callers that only want the buffered text,
/// like `parse::parse_totals`, see the same content as before streaming was
/// added).
async fn drain_lines(
    reader: impl AsyncRead + Unpin,
    category: &'static str,
    on_line: Option<LineSender>,
) -> String {
    let mut lines = BufReader::new(reader).lines();
    let mut collected = String::new();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !line.is_empty() {
                    if let Some(sender) = &on_line {
                        let _ = sender.send((category.to_string(), line.clone()));
                    }
                }
                collected.push_str(&line);
                collected.push('\n');
            }
            _ => break,
        }
    }
    collected
}

#[cfg(not(windows))]
async fn run_process_async(
    program: &str,
    args: &[String],
    cwd: &Path,
    env: &HashMap<String, String>,
    timeout: Duration,
    on_line: Option<LineSender>,
) -> Result<ProcessOutput, ExecutorError> {
    let started = std::time::Instant::now();

    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .envs(env)
        .kill_on_drop(true)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    let mut child = cmd
        .spawn()
        .map_err(|e| ExecutorError::Launch(format!("{program}: {e}")))?;

    let stdout = child.stdout.take().expect("stdout was piped");
    let stderr = child.stderr.take().expect("stderr was piped");

    let stdout_task = tokio::spawn(drain_lines(stdout, "stdout", on_line.clone()));
    let stderr_task = tokio::spawn(drain_lines(stderr, "stderr", on_line));

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => {
            let stdout = stdout_task.await.unwrap_or_default();
            let stderr = stderr_task.await.unwrap_or_default();
            Ok(ProcessOutput {
                return_code: status.code().unwrap_or(-1),
                stdout,
                stderr,
                duration_ms: started.elapsed().as_millis() as i64,
                timed_out: false,
            })
        }
        Ok(Err(e)) => Err(ExecutorError::Launch(e.to_string())),
        Err(_) => {
            child.start_kill().ok();
            stdout_task.abort();
            stderr_task.abort();
            Ok(ProcessOutput {
                return_code: -1,
                stdout: String::new(),
                stderr: String::new(),
                duration_ms: started.elapsed().as_millis() as i64,
                timed_out: true,
            })
        }
    }
}

#[cfg(windows)]
async fn run_process_blocking(
    program: &str,
    args: &[String],
    cwd: &Path,
    env: &HashMap<String, String>,
    timeout: Duration,
    on_line: Option<LineSender>,
) -> Result<ProcessOutput, ExecutorError> {
    let program = program.to_string();
    let args = args.to_vec();
    let cwd = cwd.to_path_buf();
    let env = env.clone();

    let handle = tokio::task::spawn_blocking(move || {
        let started = std::time::Instant::now();
        let output = std::process::Command::new(&program)
            .args(&args)
            .current_dir(&cwd)
            .envs(&env)
            .output();
        (output, started.elapsed())
    });

    // `std::process::Command::output()` has no concurrent-read hook, so the
    // Windows fallback can only tag lines after the fact rather than as they
    // arrive — still best-effort per spec.md §9, just not truly streamed.
    let emit_captured = |on_line: &Option<LineSender>, category: &'static str, text: &str| {
        if let Some(sender) = on_line {
            for line in text.lines().filter(|l| !l.is_empty()) {
                let _ = sender.send((category.to_string(), line.to_string()));
            }
        }
    };

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok((Ok(output), elapsed))) => {
            let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            emit_captured(&on_line, "stdout", &stdout);
            emit_captured(&on_line, "stderr", &stderr);
            Ok(ProcessOutput {
                return_code: output.status.code().unwrap_or(-1),
                stdout,
                stderr,
                duration_ms: elapsed.as_millis() as i64,
                timed_out: false,
            })
        }
        Ok(Ok((Err(e), _))) => Err(ExecutorError::Launch(format!("{program}: {e}"))),
        Ok(Err(e)) => Err(ExecutorError::Launch(format!("blocking task join: {e}"))),
        Err(_) => Ok(ProcessOutput {
            return_code: -1,
            stdout: String::new(),
            stderr: String::new(),
            duration_ms: timeout.as_millis() as i64,
            timed_out: true,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_process_captures_stdout() {
        let out = run_process(
            "sh",
            &["-c".to_string(), "echo hello".to_string()],
            Path::new("."),
            &HashMap::new(),
            Duration::from_secs(5),
            None,
        )
        .await
        .unwrap();
        assert!(out.stdout.contains("hello"));
        assert_eq!(out.return_code, 0);
        assert!(!out.timed_out);
    }

    #[tokio::test]
    async fn test_run_process_times_out() {
        let out = run_process(
            "sh",
            &["-c".to_string(), "sleep 5".to_string()],
            Path::new("."),
            &HashMap::new(),
            Duration::from_millis(50),
            None,
        )
        .await
        .unwrap();
        assert!(out.timed_out);
    }

    #[tokio::test]
    async fn test_run_process_reports_nonzero_exit() {
        let out = run_process(
            "sh",
            &["-c".to_string(), "exit 3".to_string()],
            Path::new("."),
            &HashMap::new(),
            Duration::from_secs(5),
            None,
        )
        .await
        .unwrap();
        assert_eq!(out.return_code, 3);
    }

    #[cfg(not(windows))]
    #[tokio::test]
    async fn test_run_process_streams_lines_tagged_by_category() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let out = run_process(
            "sh",
            &["-c".to_string(), "echo out-line 1>&1; echo err-line 1>&2".to_string()],
            Path::new("."),
            &HashMap::new(),
            Duration::from_secs(5),
            Some(tx),
        )
        .await
        .unwrap();
        assert!(out.stdout.contains("out-line"));
        assert!(out.stderr.contains("err-line"));

        let mut seen = Vec::new();
        while let Ok(pair) = rx.try_recv() {
            seen.push(pair);
        }
        assert!(seen.iter().any(|(cat, line)| cat == "stdout" && line == "out-line"));
        assert!(seen.iter().any(|(cat, line)| cat == "stderr" && line == "err-line"));
    }
}
