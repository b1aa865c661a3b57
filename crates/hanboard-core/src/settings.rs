use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Which global left-button presses the mouse hook swallows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseSuppression {
    /// Only presses that land inside the registered active area.
    #[default]
    InArea,
    /// Every press while global mouse handling is on.
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Attach the keyboard to the global hooks.
    pub hook_enabled: bool,
    /// Handle global left-button clicks through the mouse hook.
    #[serde(default = "default_use_global")]
    pub use_global: bool,
    pub mouse_suppression: MouseSuppression,
    /// Keyboard starts visible.
    #[serde(default = "default_show_on_start")]
    pub show_on_start: bool,
}

fn default_use_global() -> bool {
    true
}

fn default_show_on_start() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hook_enabled: false,
            use_global: true,
            mouse_suppression: MouseSuppression::InArea,
            show_on_start: true,
        }
    }
}

impl Settings {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("invalid settings JSON")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Falls back to defaults when the file is missing or unreadable.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring settings file: {:#}", e);
                Self::default()
            }
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        Ok(())
    }
}
