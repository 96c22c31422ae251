use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auth::Principal;
use crate::clock::ClockKind;
use crate::error::Result;

pub const CONFIG_FILE: &str = "config.yaml";

/// Project configuration stored in `.tallybook/config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TallyConfig {
    /// Default caller when none is given on the command line
    pub identity: Option<String>,
    /// Source of `created_at` / `updated_at` stamps
    pub clock: ClockKind,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Snapshot output directory, relative to the project root
    pub snapshot_dir: String,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            identity: None,
            clock: ClockKind::default(),
            log_level: "warn".to_string(),
            snapshot_dir: "snapshot".to_string(),
        }
    }
}

impl TallyConfig {
    /// Load the config from `dir`, falling back to defaults when the file
    /// does not exist.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&text)?)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join(CONFIG_FILE), serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Configured default caller, if any.
    pub fn identity(&self) -> Result<Option<Principal>> {
        self.identity.as_deref().map(Principal::new).transpose()
    }
}
