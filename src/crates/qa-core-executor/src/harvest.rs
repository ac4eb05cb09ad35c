//! Artifact harvest: walks the reports directory for anything the test run
//! produced beyond the report files themselves (screenshots, videos, logs).
//!
//! Grounded conceptually on the original's `_generate_allure_report` (it
//! checks `allure-results` for contents before acting on a directory), here
//! generalized to a `walkdir` pass over the whole execution directory,
//! filtered per spec.md §4.7 step 6 to the HTML/JSON/screenshot/video
//! extensions an execution can actually produce.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

const ARTIFACT_EXTENSIONS: &[&str] = &[
    "html", "htm", "json", "png", "jpg", "jpeg", "gif", "webp", "mp4", "webm",
];

fn is_artifact(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ARTIFACT_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

pub fn harvest_artifacts(execution_dir: &Path) -> Vec<PathBuf> {
    if !execution_dir.exists() {
        return Vec::new();
    }
    WalkDir::new(execution_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_artifact(path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harvest_finds_nested_artifact_files() {
        let dir = std::env::temp_dir().join(format!("qa-core-executor-harvest-{}", qa_core_utils::new_id()));
        std::fs::create_dir_all(dir.join("screenshots")).unwrap();
        std::fs::write(dir.join("junit.xml"), "<testsuite/>").unwrap();
        std::fs::write(dir.join("report.html"), "<html/>").unwrap();
        std::fs::write(dir.join("screenshots").join("step1.png"), []).unwrap();

        let artifacts = harvest_artifacts(&dir);
        assert_eq!(artifacts.len(), 2);
        assert!(artifacts.iter().any(|p| p.ends_with("report.html")));
        assert!(artifacts.iter().any(|p| p.ends_with("step1.png")));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_harvest_ignores_non_artifact_extensions() {
        let dir = std::env::temp_dir().join(format!("qa-core-executor-harvest-ignore-{}", qa_core_utils::new_id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("junit.xml"), "<testsuite/>").unwrap();
        std::fs::write(dir.join("notes.txt"), "scratch").unwrap();

        let artifacts = harvest_artifacts(&dir);
        assert!(artifacts.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_harvest_missing_dir_returns_empty() {
        let artifacts = harvest_artifacts(Path::new("/nonexistent/path/for/sure"));
        assert!(artifacts.is_empty());
    }
}
