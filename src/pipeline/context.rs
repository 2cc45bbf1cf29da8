//! Per-run configuration, state, and scoped resources.
//!
//! One [`RunContext`] exists per pipeline execution. It is constructed by
//! the caller, passed explicitly into every stage call, and torn down
//! unconditionally when the run ends. Nothing here is process-global, so
//! concurrent runs never share state: each run's scoped temp directory gets
//! a unique randomized name and is removed on both success and failure.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Error as CapabilityFailure;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Caller-supplied configuration for one run. Debug logging is an explicit
/// field here, never an environment variable.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Rasterization resolution (DPI) used when a Render stage does not say
    /// otherwise.
    pub default_resolution: u32,
    /// Where external packaging collaborators pick up final artifacts. The
    /// core's sink stages write into the scoped temp directory only.
    pub output_dir: PathBuf,
    /// Gates per-step progress logging.
    pub debug: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            default_resolution: 150,
            output_dir: PathBuf::from("./output"),
            debug: false,
        }
    }
}

/// The per-execution bundle: config, run state, and scoped resources.
#[derive(Debug)]
pub struct RunContext {
    pub config: RunConfig,
    /// 1-based step counter, 0 before the first stage runs.
    pub current_step: usize,
    pub total_steps: usize,
    pub metadata: HashMap<String, serde_json::Value>,
    current_stage: String,
    temp_dir: Option<TempDir>,
    temp_files: Vec<PathBuf>,
}

impl RunContext {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            current_step: 0,
            total_steps: 0,
            metadata: HashMap::new(),
            current_stage: String::new(),
            temp_dir: None,
            temp_files: Vec::new(),
        }
    }

    /// Name of the stage currently executing.
    pub fn current_stage(&self) -> &str {
        &self.current_stage
    }

    pub(crate) fn enter_stage(&mut self, index: usize, name: &str) {
        self.current_step = index + 1;
        self.current_stage = name.to_string();
    }

    /// Path of the scoped temp directory, creating it on first demand. The
    /// path is stable for the remainder of the run.
    pub fn temp_dir(&mut self) -> Result<PathBuf> {
        if let Some(dir) = &self.temp_dir {
            return Ok(dir.path().to_path_buf());
        }
        let dir = tempfile::Builder::new().prefix("docpipe-").tempdir()?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "created scoped temp directory");
        self.temp_dir = Some(dir);
        Ok(path)
    }

    /// Registers a file for removal at teardown.
    pub fn track_temp_file(&mut self, path: PathBuf) {
        self.temp_files.push(path);
    }

    /// A parameter error attributed to the currently executing stage.
    pub fn param_error(&self, message: impl Into<String>) -> Error {
        Error::Param {
            step: self.current_step,
            stage: self.current_stage.clone(),
            message: message.into(),
        }
    }

    /// Wraps a failure surfaced by the Document capability, attributed to
    /// the currently executing stage.
    pub fn capability_error(&self, source: CapabilityFailure) -> Error {
        Error::Capability {
            step: self.current_step,
            stage: self.current_stage.clone(),
            source,
        }
    }

    /// Removes the scoped temp directory (if created) and every tracked
    /// temp file. Idempotent; the engine calls it on every exit path and
    /// Drop backstops it.
    pub fn cleanup(&mut self) {
        if let Some(dir) = self.temp_dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), "failed to remove scoped temp directory: {e}");
            }
        }
        for file in self.temp_files.drain(..) {
            if file.exists() {
                if let Err(e) = std::fs::remove_file(&file) {
                    warn!(path = %file.display(), "failed to remove temp file: {e}");
                }
            }
        }
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        self.cleanup();
    }
}
