//! Engine configuration: TOML file with complete defaults, resolved from an
//! environment override or the platform config directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::budget::BudgetConfig;
use crate::chunker::ChunkingConfig;
use crate::error::{Result, SumAiError};
use crate::textrank::RankerConfig;

/// Environment variable pointing at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "SUMAI_CONFIG";

/// Top-level configuration tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub chunking: ChunkingConfig,
    pub budget: BudgetConfig,
    pub ranking: RankerConfig,
    pub evaluation: EvaluationSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; `["*"]` allows any origin.
    pub allow_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8585,
            allow_origins: vec!["*".to_string()],
        }
    }
}

/// Remote generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the generation endpoint. Absent means abstractive and
    /// hybrid calls fail with a model-unavailable condition.
    pub endpoint: Option<String>,
    /// Bearer token for the endpoint, if it needs one.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 120,
        }
    }
}

/// Evaluation and job-registry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
    /// Default dataset file for evaluation requests.
    pub dataset_path: PathBuf,
    /// Seconds a job record survives after its last update.
    pub job_ttl_secs: u64,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("dataset/test.csv"),
            job_ttl_secs: 3600,
        }
    }
}

impl Config {
    /// Load configuration from `SUMAI_CONFIG`, then the platform config
    /// directory, falling back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::from_path(Path::new(&path));
        }
        if let Some(dir) = dirs::config_dir() {
            let path = dir.join("sumai").join("config.toml");
            if path.exists() {
                return Self::from_path(&path);
            }
        }
        debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| SumAiError::Config(e.to_string()))
    }
}
