use crate::paginator::{Geometry, InvalidGeometryError};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "quire";

/// User-facing display and reading settings. Strongly typed and validated
/// at this boundary; the engine itself only ever sees a checked [`Geometry`]
/// passed in explicitly — there is no ambient settings state inside the
/// core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_page_width")]
    pub page_width: u16,
    #[serde(default = "default_page_height")]
    pub page_height: u16,
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f32,
    #[serde(default = "default_font_size")]
    pub font_size: u16,
    #[serde(default = "default_auto_save_interval_secs")]
    pub auto_save_interval_secs: u64,
    #[serde(default = "default_inactivity_threshold_secs")]
    pub inactivity_threshold_secs: u64,
}

fn default_page_width() -> u16 {
    80
}

fn default_page_height() -> u16 {
    24
}

fn default_line_spacing() -> f32 {
    1.2
}

fn default_font_size() -> u16 {
    12
}

fn default_auto_save_interval_secs() -> u64 {
    30
}

fn default_inactivity_threshold_secs() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            line_spacing: default_line_spacing(),
            font_size: default_font_size(),
            auto_save_interval_secs: default_auto_save_interval_secs(),
            inactivity_threshold_secs: default_inactivity_threshold_secs(),
        }
    }
}

impl Settings {
    /// Validate the display settings into a pagination geometry.
    /// Out-of-range values are rejected, never silently clamped.
    pub fn geometry(&self) -> Result<Geometry, InvalidGeometryError> {
        Geometry::new(
            self.page_width,
            self.page_height,
            self.line_spacing,
            self.font_size,
        )
    }

    pub fn inactivity_threshold(&self) -> Duration {
        Duration::from_secs(self.inactivity_threshold_secs)
    }

    pub fn auto_save_interval(&self) -> Duration {
        Duration::from_secs(self.auto_save_interval_secs)
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the config file, creating it with defaults on first
/// run. Parse or I/O failures fall back to defaults; reading must not be
/// blocked by a broken config.
pub fn load_settings() -> Settings {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, using default settings");
        return Settings::default();
    };
    if !path.exists() {
        info!("Settings file not found, creating with defaults at {path:?}");
        let settings = Settings::default();
        save_settings(&settings);
        return settings;
    }
    match fs::read_to_string(&path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {path:?}");
                settings
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
                Settings::default()
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            Settings::default()
        }
    }
}

pub fn save_settings(settings: &Settings) {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, cannot save settings");
        return;
    };
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }
    match serde_yaml::to_string(settings) {
        Ok(content) => match fs::write(&path, content) {
            Ok(()) => debug!("Saved settings to {path:?}"),
            Err(e) => error!("Failed to save settings to {path:?}: {e}"),
        },
        Err(e) => error!("Failed to serialize settings: {e}"),
    }
}
