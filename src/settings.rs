use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use crate::error::{EditorError, Result};
use crate::modules::image_editor::ExportSettings;

pub const DEFAULT_LOG_SPEC: &str = "info, eframe=warn, egui=warn, wgpu=error";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreference {
    #[default]
    System,
    Light,
    Dark,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub theme_preference: ThemePreference,
    /// Maximum number of history entries kept; `None` keeps everything.
    pub history_limit: Option<usize>,
    /// Return the adjustment sliders to neutral after a crop bakes them in.
    pub reset_filters_on_crop: bool,
    /// Family name → font file.
    pub font_files: BTreeMap<String, PathBuf>,
    /// Extra directories scanned for `.ttf`/`.otf` files.
    pub font_dirs: Vec<PathBuf>,
    pub default_export: ExportSettings,
    pub last_open_dir: Option<PathBuf>,
    pub log_spec: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme_preference: ThemePreference::System,
            history_limit: None,
            reset_filters_on_crop: false,
            font_files: BTreeMap::new(),
            font_dirs: Vec::new(),
            default_export: ExportSettings::default(),
            last_open_dir: None,
            log_spec: DEFAULT_LOG_SPEC.to_string(),
        }
    }
}

impl AppSettings {
    /// Missing file gives defaults silently; a malformed one gives defaults plus
    /// the parse error. The caller logs it once the logger is running.
    pub fn load() -> (Self, Option<EditorError>) {
        Self::load_from(&Self::get_config_path())
    }

    pub fn load_from(config_path: &Path) -> (Self, Option<EditorError>) {
        let contents: String = match fs::read_to_string(config_path) {
            Ok(contents) => contents,
            Err(_) => return (Self::default(), None),
        };
        match Self::from_json(&contents) {
            Ok(settings) => (settings, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn save(&self) -> Result<()> {
        let config_path: PathBuf = Self::get_config_path();
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, serde_json::to_string_pretty(self)?)?;
        log::debug!("settings saved to {}", config_path.display());
        Ok(())
    }

    pub fn get_config_path() -> PathBuf {
        let mut path: PathBuf = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("pixelperfect");
        path.push("settings.json");
        path
    }

    pub fn log_dir() -> PathBuf {
        let mut path: PathBuf = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("pixelperfect");
        path.push("logs");
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::image_export::ExportFormat;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_fills_defaults() {
        let s = AppSettings::from_json(r#"{ "theme_preference": "Dark", "history_limit": 50 }"#).unwrap();
        assert_eq!(s.theme_preference, ThemePreference::Dark);
        assert_eq!(s.history_limit, Some(50));
        assert!(!s.reset_filters_on_crop);
        assert_eq!(s.log_spec, DEFAULT_LOG_SPEC);
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut s = AppSettings::default();
        s.font_files.insert("Brand".into(), PathBuf::from("/fonts/brand.ttf"));
        s.default_export = ExportSettings { format: ExportFormat::Webp, quality: 0.5 };
        let json = serde_json::to_string_pretty(&s).unwrap();
        assert_eq!(AppSettings::from_json(&json).unwrap(), s);
    }

    #[test]
    fn test_load_reports_malformed_file_with_defaults() {
        let path = std::env::temp_dir().join(format!("pixelperfect-settings-{}.json", std::process::id()));
        fs::write(&path, "{ \"history_limit\": ").unwrap();
        let (settings, err) = AppSettings::load_from(&path);
        fs::remove_file(&path).unwrap();
        assert_eq!(settings, AppSettings::default());
        assert!(matches!(err, Some(EditorError::Settings(_))));
    }

    #[test]
    fn test_load_missing_file_is_silent() {
        let path = std::env::temp_dir().join("pixelperfect-no-such-settings.json");
        let (settings, err) = AppSettings::load_from(&path);
        assert_eq!(settings, AppSettings::default());
        assert!(err.is_none());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(AppSettings::from_json("{ not json").is_err());
    }
}
