use crate::constants::*;
use crate::error::AppError;
use crate::orchestrator::OrchestratorConfig;
use crate::validation::validate_config;
use directories::ProjectDirs;
use log::info;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub self_identity: String,
    pub blocked_apps: Vec<String>,
    pub cooldown_ms: u64,
    pub settle_delay_ms: u64,
    pub handoff_delay_ms: u64,
    pub poll_interval_ms: u64,
    /// argv that raises our controller surface; absent means the controller
    /// attached to the channel is already up
    pub controller_command: Option<Vec<String>>,
    pub settings_command: Option<Vec<String>>,
    /// Start monitoring without waiting for `startBlockerService`
    pub autostart: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            self_identity: DEFAULT_SELF_IDENTITY.to_string(),
            blocked_apps: DEFAULT_BLOCKED_APPS.iter().map(ToString::to_string).collect(),
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            handoff_delay_ms: DEFAULT_HANDOFF_DELAY_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            controller_command: None,
            settings_command: None,
            autostart: true,
        }
    }
}

impl AgentConfig {
    /// Load and validate a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let display = path.display().to_string();

        let config = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| AppError::ConfigParse {
                path: display,
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config at {display}, using defaults");
                Self::default()
            }
            Err(source) => {
                return Err(AppError::ConfigRead {
                    path: display,
                    source,
                })
            }
        };

        validate_config(&config)?;
        Ok(config)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            handoff_delay: Duration::from_millis(self.handoff_delay_ms),
        }
    }
}

/// `$APPWARDEN_CONFIG`, or `config.json` in the platform config directory.
pub fn get_config_path() -> Result<PathBuf, AppError> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    let proj_dirs =
        ProjectDirs::from("com", "appwarden", "AppWarden").ok_or(AppError::NoProjectDirs)?;
    Ok(proj_dirs.config_dir().join("config.json"))
}
