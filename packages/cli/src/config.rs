use quire_renderer::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "quire.config.json";

/// Quire configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Engine settings, at the top level of the file
    #[serde(flatten)]
    pub engine: EngineConfig,

    /// Decorators file used when `--decorators` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorators: Option<String>,
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn decorators_path(&self, cwd: &str) -> Option<PathBuf> {
        self.decorators
            .as_ref()
            .map(|path| PathBuf::from(cwd).join(path))
    }
}
