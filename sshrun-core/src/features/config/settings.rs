use directories::BaseDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tools::errors::ConfigError;
use crate::tools::types::{ExecOptions, HostKeyPolicy, StderrMode, DEFAULT_PORT};

/// User defaults read from `<config dir>/sshrun/settings.json`.
///
/// The file is optional and only ever read. Credentials have no place in it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_presets")]
    pub presets: Vec<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub known_hosts_path: Option<String>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
    #[serde(default)]
    pub capture_stderr: bool,
}

fn default_presets() -> Vec<String> {
    vec!["ls -l".to_string(), "uname -a".to_string(), "df -h".to_string()]
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            presets: default_presets(),
            port: default_port(),
            username: None,
            known_hosts_path: None,
            connect_timeout_secs: None,
            command_timeout_secs: None,
            capture_stderr: false,
        }
    }
}

impl Settings {
    pub fn preset(&self, index: usize) -> Option<&str> {
        self.presets.get(index).map(String::as_str)
    }

    /// Per-call options seeded from these settings, verifying host keys
    /// against the configured known_hosts file (or `~/.ssh/known_hosts`)
    pub fn exec_options(&self) -> ExecOptions {
        let mut options = ExecOptions::default();
        if let Some(path) = &self.known_hosts_path {
            options.host_key_policy =
                HostKeyPolicy::KnownHosts(PathBuf::from(shellexpand::tilde(path).to_string()));
        }
        options.connect_timeout = self.connect_timeout_secs.map(Duration::from_secs);
        options.command_timeout = self.command_timeout_secs.map(Duration::from_secs);
        if self.capture_stderr {
            options.stderr = StderrMode::Capture;
        }
        options
    }
}

pub struct SettingsStore;

impl SettingsStore {
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let base_dirs = BaseDirs::new().ok_or(ConfigError::NoConfigDir)?;
        Ok(base_dirs.config_dir().join("sshrun").join("settings.json"))
    }

    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Settings, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
        if !path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }
}
