//! Result and report files written at the end of a run

use crate::config::{CONCURRENT_RESULTS_FILE, REPORT_FILE, SERIAL_RESULTS_FILE};
use crate::core::models::{ExecutionMode, MergedResult};
use crate::error::{BenchError, BenchResult};
use crate::report::Report;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes the three run artifacts into one directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn results_path(&self, mode: ExecutionMode) -> PathBuf {
        let file_name = match mode {
            ExecutionMode::Concurrent => CONCURRENT_RESULTS_FILE,
            ExecutionMode::Serial => SERIAL_RESULTS_FILE,
        };
        self.output_dir.join(file_name)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE)
    }

    /// Pretty-printed JSON array of merged results
    pub fn write_results(
        &self,
        mode: ExecutionMode,
        results: &[MergedResult],
    ) -> BenchResult<PathBuf> {
        let path = self.results_path(mode);
        let json = serde_json::to_string_pretty(results)?;
        self.write(&path, json.as_bytes())?;
        Ok(path)
    }

    pub fn write_report(&self, report: &Report) -> BenchResult<PathBuf> {
        let path = self.report_path();
        self.write(&path, report.render().as_bytes())?;
        Ok(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> BenchResult<()> {
        let artifact_error = |source| BenchError::Artifact {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(&self.output_dir).map_err(artifact_error)?;
        fs::write(path, contents).map_err(artifact_error)?;
        debug!(path = %path.display(), bytes = contents.len(), "artifact written");
        Ok(())
    }
}
