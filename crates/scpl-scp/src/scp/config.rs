// ── Library configuration ─────────────────────────────────────────────────────

use crate::scp::error::{ScpError, ScpResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Serde default helpers ────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}

/// Rule for accepting an unfamiliar server host key at connect time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HostKeyPolicy {
    /// Accept any host key without consulting known_hosts.
    #[default]
    AutoAdd,
    /// Accept unknown keys with a warning; refuse mismatching known keys.
    Warn,
    /// Accept only keys already present in known_hosts.
    Reject,
}

/// Process-wide settings applied when the connection is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScpLibraryConfig {
    #[serde(default)]
    pub host_key_policy: HostKeyPolicy,
    /// Overrides `~/.ssh/known_hosts` for the Warn / Reject policies.
    #[serde(default)]
    pub known_hosts_path: Option<PathBuf>,
    /// Bounds TCP connect, handshake and authentication. None = block.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default = "default_true")]
    pub allow_agent: bool,
    /// Try `~/.ssh/id_*` identities when no key file was given.
    #[serde(default = "default_true")]
    pub look_for_keys: bool,
    #[serde(default = "default_false")]
    pub compress: bool,
}

impl Default for ScpLibraryConfig {
    fn default() -> Self {
        Self {
            host_key_policy: HostKeyPolicy::default(),
            known_hosts_path: None,
            connect_timeout_secs: None,
            allow_agent: default_true(),
            look_for_keys: default_true(),
            compress: default_false(),
        }
    }
}

impl ScpLibraryConfig {
    pub fn from_json(json: &str) -> ScpResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ScpError::invalid_argument(format!("Invalid SCP configuration: {}", e)))
    }

    /// Read a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> ScpResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScpError::io(format!("Cannot read configuration '{}': {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    /// known_hosts file consulted by the Warn / Reject policies.
    pub fn known_hosts_file(&self) -> Option<PathBuf> {
        self.known_hosts_path
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".ssh").join("known_hosts")))
    }
}
