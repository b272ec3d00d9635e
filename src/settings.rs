use std::path::{Path, PathBuf};

use crate::components::history::DEFAULT_MAX_HISTORY;
use crate::{log_info, log_warn};

/// Application settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Directory holding `images/animals/*.svg`
    pub asset_root: String,
    /// Catalog JSON file
    pub catalog_path: String,
    /// Where exported PNGs go (empty = current directory)
    pub export_dir: String,
    /// Maximum number of history snapshots
    pub max_undo_steps: usize,
    /// Ask before Clear All wipes every fill
    pub confirm_on_clear: bool,
    /// Opacity of the hovered shape
    pub hover_opacity: f32,
    /// Image id opened at startup (empty = none)
    pub last_image: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            asset_root: "static".to_string(),
            catalog_path: "data/animals.json".to_string(),
            export_dir: String::new(),
            max_undo_steps: DEFAULT_MAX_HISTORY,
            confirm_on_clear: true,
            hover_opacity: crate::binder::HOVER_OPACITY,
            last_image: String::new(),
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/colorbook/colorbook_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\colorbook\colorbook_settings.cfg
    /// On macOS:   ~/Library/Application Support/colorbook/colorbook_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        let base = if cfg!(target_os = "windows") {
            std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .ok()
                .map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join("Library").join("Application Support"))
        } else {
            std::env::var("XDG_CONFIG_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
        };
        base.map(|dir| dir.join("colorbook").join("colorbook_settings.cfg"))
    }

    pub fn export_dir(&self) -> PathBuf {
        if self.export_dir.trim().is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(&self.export_dir)
        }
    }

    pub fn to_config_string(&self) -> String {
        format!(
            "asset_root={}\n\
             catalog_path={}\n\
             export_dir={}\n\
             max_undo_steps={}\n\
             confirm_on_clear={}\n\
             hover_opacity={}\n\
             last_image={}\n",
            self.asset_root,
            self.catalog_path,
            self.export_dir,
            self.max_undo_steps,
            self.confirm_on_clear,
            self.hover_opacity,
            self.last_image,
        )
    }

    /// Parse `key=value` lines on top of the defaults. Unknown keys and
    /// unparsable values are ignored.
    pub fn from_config_str(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "asset_root" => {
                    if !val.is_empty() {
                        s.asset_root = val.to_string();
                    }
                }
                "catalog_path" => {
                    if !val.is_empty() {
                        s.catalog_path = val.to_string();
                    }
                }
                "export_dir" => s.export_dir = val.to_string(),
                "max_undo_steps" => {
                    s.max_undo_steps = val
                        .parse::<usize>()
                        .ok()
                        .filter(|&n| n > 0)
                        .unwrap_or(DEFAULT_MAX_HISTORY);
                }
                "confirm_on_clear" => s.confirm_on_clear = val == "true",
                "hover_opacity" => {
                    if let Ok(v) = val.parse::<f32>() {
                        s.hover_opacity = v.clamp(0.0, 1.0);
                    }
                }
                "last_image" => s.last_image = val.to_string(),
                _ => {}
            }
        }
        s
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_config_str(&content),
            Err(_) => Self::default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_config_string())
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        match self.save_to(&path) {
            Ok(()) => log_info!("Settings saved to {}", path.display()),
            Err(e) => log_warn!("Could not save settings to {}: {}", path.display(), e),
        }
    }
}
