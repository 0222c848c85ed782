use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "bookflip";

/// Gesture and layout tuning, loaded from an optional YAML file in the user
/// config directory. CLI flags override whatever is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Minimum horizontal cell delta for a swipe to count as a page turn.
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: u16,

    /// Minimum raw drag delta (cells) for a highlight to be created.
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold: f64,

    /// Two facing pages per view when the terminal allows it.
    #[serde(default = "default_spread")]
    pub spread: bool,

    /// How many views to warm ahead of the current one.
    #[serde(default = "default_preload_ahead")]
    pub preload_ahead: usize,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_swipe_threshold() -> u16 {
    6
}

fn default_drag_threshold() -> f64 {
    1.0
}

fn default_spread() -> bool {
    true
}

fn default_preload_ahead() -> usize {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            swipe_threshold: default_swipe_threshold(),
            drag_threshold: default_drag_threshold(),
            spread: default_spread(),
            preload_ahead: default_preload_ahead(),
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(SETTINGS_FILENAME))
    }

    /// Load settings from the default location, falling back to defaults on
    /// a missing or malformed file (the viewer must still start).
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &PathBuf) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path).map_err(anyhow::Error::from).and_then(|content| {
            serde_yaml::from_str::<Settings>(&content).map_err(anyhow::Error::from)
        }) {
            Ok(settings) => {
                info!("loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                error!("failed to load settings from {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
