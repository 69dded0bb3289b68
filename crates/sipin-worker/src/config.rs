//! Worker settings
//!
//! Sources, later ones winning: built-in defaults, an optional TOML file,
//! then `SIPIN__`-prefixed environment variables with `__` between levels
//! (`SIPIN__ORG_API__URL=...`). A `.env` file is read first.

use crate::error::{Result, WorkerError};
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use sipin_core::mets::SoftwareAgent;
use sipin_core::AssemblerConfig;
use std::path::{Path, PathBuf};

// ============================================================================
// Defaults
// ============================================================================

/// Default settings file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "sipin.toml";

/// Default organization lookup timeout in seconds
pub const DEFAULT_ORG_API_TIMEOUT_SECS: u64 = 10;

/// Default bound on concurrent SIP creations
pub const DEFAULT_MAX_IN_FLIGHT: usize = 4;

/// Events go to stdout unless a file is configured
pub const STDOUT_OUTPUT: &str = "-";

pub const ENV_PREFIX: &str = "SIPIN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Host name reported in events; the local hostname when empty
    #[serde(default)]
    pub host: String,
    pub org_api: OrgApiSettings,
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub events: EventSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgApiSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSettings {
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub work_dir: Option<PathBuf>,
    pub software_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSettings {
    #[serde(default = "default_output")]
    pub output: String,
}

fn default_timeout() -> u64 {
    DEFAULT_ORG_API_TIMEOUT_SECS
}

fn default_max_in_flight() -> usize {
    DEFAULT_MAX_IN_FLIGHT
}

fn default_output() -> String {
    STDOUT_OUTPUT.to_string()
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

impl Settings {
    /// Load from `.env`, the settings file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let builder = Self::defaults()?.add_source(file).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );
        Self::build(builder)
    }

    /// Parse settings from TOML text, without the environment
    pub fn from_toml(content: &str) -> Result<Self> {
        Self::build(Self::defaults()?.add_source(File::from_str(content, FileFormat::Toml)))
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(config::Config::builder()
            .set_default("org_api.url", "")?
            .set_default("org_api.timeout_secs", DEFAULT_ORG_API_TIMEOUT_SECS)?)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let mut settings: Settings = builder.build()?.try_deserialize()?;
        if settings.host.trim().is_empty() {
            settings.host = local_hostname();
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.org_api.url.trim().is_empty() {
            return Err(WorkerError::Config(
                "org_api.url cannot be empty".to_string(),
            ));
        }
        if self.worker.max_in_flight == 0 {
            return Err(WorkerError::Config(
                "worker.max_in_flight must be greater than 0".to_string(),
            ));
        }
        if self.org_api.timeout_secs == 0 {
            tracing::warn!("org_api.timeout_secs is 0, lookups will not time out");
        }
        Ok(())
    }

    pub fn assembler_config(&self) -> AssemblerConfig {
        let mut software = SoftwareAgent::default();
        if let Some(name) = &self.pipeline.software_name {
            software.name = name.clone();
        }
        AssemblerConfig {
            work_dir: self.pipeline.work_dir.clone(),
            software,
        }
    }
}

fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string())
}
