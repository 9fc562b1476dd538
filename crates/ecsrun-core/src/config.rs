use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration, loaded from `ecsrun.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub profile: Option<String>,
    /// Path to the `aws` binary.
    #[serde(default)]
    pub aws_cli: Option<String>,
    #[serde(default = "default_cluster")]
    pub cluster: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub service_definition: Option<PathBuf>,
    #[serde(default)]
    pub task_definition: Option<PathBuf>,
    /// Overall wait timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_cluster() -> String {
    "default".to_string()
}

fn default_timeout() -> u64 {
    600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            profile: None,
            aws_cli: None,
            cluster: default_cluster(),
            service: None,
            service_definition: None,
            task_definition: None,
            timeout: default_timeout(),
        }
    }
}

impl Config {
    /// Load config from the default path, or an empty config if none exists.
    pub fn load_default() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path. Relative definition paths are
    /// resolved against the config file's directory.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for p in [&mut self.task_definition, &mut self.service_definition]
            .into_iter()
            .flatten()
        {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }

    /// `./ecsrun.yaml` if present, else `<config dir>/ecsrun/ecsrun.yaml`.
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from("ecsrun.yaml");
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("ecsrun")
            .join("ecsrun.yaml")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
