//! Engine configuration
//!
//! Loaded with figment from defaults, an optional file and environment
//! variables prefixed with `VOLTAGE_JOBS_`.

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, RuleError};
use crate::exporter::ExportFormat;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "VOLTAGE_JOBS_";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine name, used for run log files
    pub name: String,

    /// Format used by `Engine::export_default`
    pub export_format: ExportFormat,

    /// Group exported metadata by job kind
    pub group_exports_by_kind: bool,

    /// Root directory for per-run log files (disabled when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            export_format: ExportFormat::Dict,
            group_exports_by_kind: true,
            log_dir: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `VOLTAGE_JOBS_*` environment variables
    pub fn load() -> Result<Self> {
        Self::figment()
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| RuleError::config(format!("Failed to load configuration: {}", e)))
    }

    /// Defaults overridden by a toml/yaml/json file, then by environment
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| RuleError::config("Config file must have an extension"))?;

        let figment = match extension {
            "toml" => Self::figment().merge(Toml::file(path)),
            "yaml" | "yml" => Self::figment().merge(Yaml::file(path)),
            "json" => Self::figment().merge(Json::file(path)),
            _ => {
                return Err(RuleError::config(format!(
                    "Unsupported config file format: {}",
                    extension
                )))
            },
        };

        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| {
                RuleError::config(format!(
                    "Failed to load configuration from {}: {}",
                    path.display(),
                    e
                ))
            })
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(EngineConfig::default()))
    }
}
