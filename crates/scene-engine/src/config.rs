//! Engine configuration
//!
//! Limits are passed explicitly to every executor, scene and worker; there
//! is no process-wide default state. Configuration files are JSON and every
//! field is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::constants::defaults;
use crate::error::ConfigError;

/// Limits for driving a step generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionConfig {
    /// Total generator advances allowed per executor
    pub max_execution_step_count: usize,
    /// Steps taken eagerly when an executor is constructed (at least 1)
    pub initial_step_count: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_execution_step_count: defaults::MAX_EXECUTION_STEP_COUNT,
            initial_step_count: defaults::INITIAL_STEP_COUNT,
        }
    }
}

impl ExecutionConfig {
    /// Same config with a different step ceiling
    pub fn with_max_execution_step_count(mut self, max: usize) -> Self {
        self.max_execution_step_count = max;
        self
    }
}

/// Execution worker settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerConfig {
    /// Capacity of the request queue
    pub channel_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: defaults::WORKER_CHANNEL_CAPACITY,
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub execution: ExecutionConfig,
    pub worker: WorkerConfig,
}

impl EngineConfig {
    /// Parse configuration from a JSON string
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(contents).map_err(ConfigError::Parse)
    }

    /// Load configuration from a file, falling back to defaults if it is absent
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).await?;
        Self::from_json_str(&contents)
    }

    /// Save configuration to a file, creating parent directories
    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, contents).await?;

        log::info!("Configuration saved to {:?}", path);
        Ok(())
    }
}
