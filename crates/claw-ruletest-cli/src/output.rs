//! Output formatting for test reports.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use claw_ruletest::{Outcome, TestReport};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Result of one test file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Path as given on the command line.
    pub path: String,
    /// Report, if the file loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<TestReport>,
    /// Load error, if the file didn't load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    /// A file that ran.
    #[must_use]
    pub fn ran(path: impl Into<String>, report: TestReport) -> Self {
        Self {
            path: path.into(),
            report: Some(report),
            error: None,
        }
    }

    /// A file that failed to load.
    #[must_use]
    pub fn load_failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            report: None,
            error: Some(error.into()),
        }
    }

    /// Returns true if the file loaded and every assertion passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.report.as_ref().is_some_and(TestReport::passed)
    }
}

/// Results of a whole run, in command-line order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    /// One entry per test file.
    pub files: Vec<FileReport>,
    /// Assertions passed across all files.
    pub passed: usize,
    /// Assertions failed across all files.
    pub failed: usize,
    /// Assertions errored across all files.
    pub errored: usize,
    /// Assertions skipped across all files.
    pub skipped: usize,
    /// Files that failed to load.
    pub load_errors: usize,
}

impl RunSummary {
    /// Builds the summary and its totals.
    #[must_use]
    pub fn new(files: Vec<FileReport>) -> Self {
        let mut summary = Self::default();
        for file in &files {
            match &file.report {
                Some(report) => {
                    summary.passed += report.passed_count();
                    summary.failed += report.failed_count();
                    summary.errored += report.errored_count();
                    summary.skipped += report.skipped;
                }
                None => summary.load_errors += 1,
            }
        }
        summary.files = files;
        summary
    }

    /// Returns true if every file loaded and every assertion passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.files.iter().all(FileReport::passed)
    }
}

impl TableDisplay for RunSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for file in &self.files {
            match (&file.report, &file.error) {
                (Some(report), _) => {
                    writeln!(writer, "{}: {}", file.path, report.name)?;
                    for result in &report.results {
                        match &result.outcome {
                            Outcome::Passed => writeln!(writer, "  PASS   {}", result.name)?,
                            Outcome::Failed(mismatch) => {
                                writeln!(writer, "  FAIL   {}", result.name)?;
                                for line in mismatch.to_string().lines() {
                                    writeln!(writer, "         {line}")?;
                                }
                            }
                            Outcome::Errored(message) => {
                                writeln!(writer, "  ERROR  {}", result.name)?;
                                writeln!(writer, "         {message}")?;
                            }
                        }
                    }
                    if report.skipped > 0 {
                        writeln!(writer, "  SKIP   {} assertion(s) not run", report.skipped)?;
                    }
                }
                (None, error) => {
                    writeln!(writer, "{}: LOAD ERROR", file.path)?;
                    writeln!(writer, "         {}", error.as_deref().unwrap_or("unknown error"))?;
                }
            }
        }

        writeln!(writer, "══════════════════════════════════")?;
        writeln!(
            writer,
            "{} passed, {} failed, {} errored, {} skipped",
            self.passed, self.failed, self.errored, self.skipped
        )?;
        if self.load_errors > 0 {
            writeln!(writer, "{} file(s) failed to load", self.load_errors)?;
        }
        Ok(())
    }
}
