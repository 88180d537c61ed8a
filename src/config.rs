//! Tool configuration
//!
//! Resolution order, highest first: command-line flags, `wbwrap.yaml`,
//! environment variables, built-in defaults. The CLI layers the first two;
//! this module covers the file and the environment.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WbError;

/// Default config file looked up in the current directory
pub const CONFIG_FILE: &str = "wbwrap.yaml";

/// Timeout variable, in whole seconds
pub const TIMEOUT_ENV: &str = "WBWRAP_TIMEOUT_SECS";

/// Program name to the environment variable that can override its path
pub const PROGRAM_ENV: &[(&str, &str)] = &[("wb_command", "WB_COMMAND"), ("mirtk", "MIRTK")];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Program overrides, e.g. `wb_command: /opt/workbench/bin/wb_command`
    pub programs: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl ToolConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, WbError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WbError> {
        Self::from_yaml(&fs::read_to_string(path)?)
    }

    /// Fill unset entries from the process environment
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Fill unset entries from `lookup`. Values already present win.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        for (program, var) in PROGRAM_ENV {
            if self.programs.contains_key(*program) {
                continue;
            }
            if let Some(path) = lookup(var).filter(|p| !p.trim().is_empty()) {
                self.programs.insert(program.to_string(), path);
            }
        }

        if self.timeout_secs.is_none() {
            match lookup(TIMEOUT_ENV).map(|raw| raw.trim().parse::<u64>()) {
                Some(Ok(secs)) => self.timeout_secs = Some(secs),
                Some(Err(e)) => tracing::warn!("ignoring {}: {}", TIMEOUT_ENV, e),
                None => {}
            }
        }
        self
    }

    /// Configured timeout; zero means none
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
    }
}
