//! Running test files.
//!
//! Each file is loaded and run on its own blocking task; reports are
//! collected in command-line order once every task finishes.

use std::io::Write;
use std::path::{Path, PathBuf};

use claw_ruletest::{TestCase, TestRunner};
use futures::future::join_all;
use tracing::{info, warn};

use crate::error::CliError;
use crate::output::{FileReport, OutputFormat, RunSummary};

/// Run command executor.
pub struct RunCommand {
    runner: TestRunner,
}

impl RunCommand {
    /// Create a new run command.
    #[must_use]
    pub const fn new(runner: TestRunner) -> Self {
        Self { runner }
    }

    /// Run every file and write the summary.
    ///
    /// Returns true if every file loaded and every assertion passed.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker task fails or output fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        files: &[PathBuf],
    ) -> Result<bool, CliError> {
        let summary = self.run_files(files).await?;
        format.write(writer, &summary)?;
        Ok(summary.all_passed())
    }

    /// Run every file in parallel.
    ///
    /// # Errors
    ///
    /// Returns an error if a worker task panicked.
    pub async fn run_files(&self, files: &[PathBuf]) -> Result<RunSummary, CliError> {
        let tasks = files.iter().cloned().map(|path| {
            let runner = self.runner.clone();
            tokio::task::spawn_blocking(move || run_file(&runner, &path))
        });

        let mut reports = Vec::with_capacity(files.len());
        for joined in join_all(tasks).await {
            reports.push(joined?);
        }

        let summary = RunSummary::new(reports);
        info!(
            files = summary.files.len(),
            passed = summary.passed,
            failed = summary.failed,
            errored = summary.errored,
            load_errors = summary.load_errors,
            "run finished"
        );
        Ok(summary)
    }
}

fn run_file(runner: &TestRunner, path: &Path) -> FileReport {
    let display_path = path.display().to_string();
    let result = TestCase::from_file(path).and_then(|case| runner.run(&case));
    match result {
        Ok(report) => FileReport::ran(display_path, report),
        Err(e) => {
            warn!(path = %display_path, error = %e, "test file failed to load");
            FileReport::load_failed(display_path, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PASSING: &str = r#"{
        "name": "instance down",
        "rules": { "groups": [ { "name": "availability", "rules": [
            { "alert": "InstanceDown", "expr": { "metric": "up", "op": "==", "threshold": 0 } }
        ] } ] },
        "fixtures": [ { "metrics": [ { "name": "up", "values": "0" } ] } ],
        "assertions": [ { "at": "0s", "expected": [
            { "alertname": "InstanceDown", "alertstate": "firing" }
        ] } ]
    }"#;

    fn command() -> RunCommand {
        RunCommand::new(TestRunner::default())
    }

    #[tokio::test]
    async fn reports_keep_argument_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("good.json");
        fs::write(&good, PASSING).expect("write");
        let missing = dir.path().join("missing.json");

        let summary = command()
            .run_files(&[missing.clone(), good.clone()])
            .await
            .unwrap();

        assert_eq!(summary.files.len(), 2);
        assert_eq!(summary.files[0].path, missing.display().to_string());
        assert!(summary.files[0].error.is_some());
        assert!(summary.files[1].passed());
        assert_eq!(summary.load_errors, 1);
        assert!(!summary.all_passed());
    }

    #[tokio::test]
    async fn execute_writes_and_reports_success() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("good.json");
        fs::write(&good, PASSING).expect("write");

        let mut out = Vec::new();
        let passed = command()
            .execute(&mut out, &OutputFormat::default(), &[good])
            .await
            .unwrap();

        assert!(passed);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("PASS   instance_down_at_0s"));
    }
}
