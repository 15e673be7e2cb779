//! `koso.toml` loading.
//!
//! ```toml
//! [sync]
//! server_url = "ws://127.0.0.1:3000/ws"
//! port = 3000
//!
//! [log]
//! filter = "koso=debug,info"
//!
//! [keybindings]
//! insert_node = "Ctrl+Enter"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::keys::{default_shortcuts, KeyChord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// WebSocket endpoint clients connect to.
    pub server_url: String,
    /// Port `koso serve` listens on.
    pub port: u16,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:3000/ws".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KosoConfig {
    pub sync: SyncConfig,
    pub log: LogConfig,
    /// Shortcut name → chord, e.g. `undo = "Ctrl+z"`.
    pub keybindings: BTreeMap<String, String>,
}

impl KosoConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// The defaults when no path is given; a given path must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// The default shortcut set with this config's overrides applied.
    ///
    /// Every override must name a known shortcut, parse, and render to a
    /// glyph; the first one that doesn't is reported.
    pub fn shortcuts(&self) -> Result<Vec<(&'static str, KeyChord)>, ConfigError> {
        let mut shortcuts = default_shortcuts();

        for (name, value) in &self.keybindings {
            let slot = shortcuts
                .iter_mut()
                .find(|(default_name, _)| default_name == name)
                .ok_or_else(|| ConfigError::UnknownBinding(name.clone()))?;

            let invalid = |source| ConfigError::InvalidBinding {
                name: name.clone(),
                source,
            };
            let chord: KeyChord = value.parse().map_err(invalid)?;
            chord.render().map_err(invalid)?;

            tracing::debug!(%name, %chord, "Overriding default shortcut");
            slot.1 = chord;
        }

        Ok(shortcuts)
    }
}
