//! Where settings and documents live on disk
//!
//! Settings are one pretty-printed JSON file under the platform config
//! directory. Documents go under the platform data directory unless
//! `storage.data_dir` points elsewhere. A missing or unreadable config
//! never stops the program; it falls back to defaults.

use crate::config::Settings;
use crate::error::{Error, Result, ResultExt};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory name under the platform config and data dirs
const APP_DIR_NAME: &str = "scribe";

const CONFIG_FILE_NAME: &str = "config.json";

/// Written first, then renamed over the real file
const CONFIG_TEMP_NAME: &str = "config.json.tmp";

// ─────────────────────────────────────────────────────────────────────────────
// Locations
// ─────────────────────────────────────────────────────────────────────────────

/// `<config_dir>/scribe`, e.g. `~/.config/scribe` on Linux.
pub fn get_config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or(Error::ConfigDirNotFound)?;
    Ok(base.join(APP_DIR_NAME))
}

pub fn get_config_file_path() -> Result<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Directory for the document store: the configured override, or
/// `<data_dir>/scribe`.
pub fn resolve_data_dir(settings: &Settings) -> Result<PathBuf> {
    match &settings.storage.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => {
            let base = dirs::data_dir().ok_or(Error::ConfigDirNotFound)?;
            Ok(base.join(APP_DIR_NAME))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Settings from the default location, or defaults if that fails.
pub fn load_config() -> Settings {
    get_config_file_path()
        .and_then(|path| load_config_from(&path))
        .unwrap_or_warn_default(Settings::default(), "Failed to load configuration")
}

/// Settings from `path`.
///
/// A missing or blank file gives defaults. Invalid JSON is an
/// [`Error::ConfigParse`] so the caller decides whether to fall back.
pub fn load_config_from(path: &Path) -> Result<Settings> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        Err(e) => {
            return Err(Error::ConfigLoad {
                path: path.to_path_buf(),
                source: Box::new(e),
            })
        }
    };

    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }

    let settings = Settings::from_json_sanitized(&contents).map_err(|e| {
        warn!("Invalid config at {}: {}", path.display(), e);
        Error::ConfigParse {
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    })?;

    info!("Loaded configuration from {}", path.display());
    Ok(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Saving
// ─────────────────────────────────────────────────────────────────────────────

pub fn save_config(settings: &Settings) -> Result<()> {
    save_config_to(settings, &get_config_file_path()?)
}

/// Write `settings` to `path`, creating the directory if needed.
///
/// The file is replaced by rename, so a crash mid-write leaves the old
/// config intact.
pub fn save_config_to(settings: &Settings, path: &Path) -> Result<()> {
    let save_error = |target: &Path, e: Box<dyn std::error::Error + Send + Sync>| {
        Error::ConfigSave {
            path: target.to_path_buf(),
            source: e,
        }
    };

    let dir = path.parent().ok_or(Error::ConfigDirNotFound)?;
    fs::create_dir_all(dir).map_err(|e| save_error(dir, Box::new(e)))?;

    let json = serde_json::to_string_pretty(settings).map_err(|e| save_error(path, Box::new(e)))?;
    let temp = dir.join(CONFIG_TEMP_NAME);
    fs::write(&temp, json).map_err(|e| save_error(&temp, Box::new(e)))?;
    fs::rename(&temp, path).map_err(|e| save_error(path, Box::new(e)))?;

    debug!("Saved configuration to {}", path.display());
    Ok(())
}

/// [`save_config`], logging instead of returning the error.
pub fn save_config_silent(settings: &Settings) -> bool {
    save_config(settings)
        .map_err(|e| warn!("Failed to save configuration: {}", e))
        .is_ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> PathBuf {
        dir.path().join("nested").join(CONFIG_FILE_NAME)
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_config_path_ends_with_app_dir() {
        if let Ok(path) = get_config_file_path() {
            assert!(path.ends_with(Path::new(APP_DIR_NAME).join(CONFIG_FILE_NAME)));
        }
    }

    #[test]
    fn test_missing_or_blank_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = config_in(&dir);
        assert_eq!(load_config_from(&path).unwrap(), Settings::default());

        write(&path, "\n  \n");
        assert_eq!(load_config_from(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = config_in(&dir);
        write(&path, "{ \"server\": ");
        assert!(matches!(
            load_config_from(&path),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_loaded_values_are_sanitized() {
        let dir = TempDir::new().unwrap();
        let path = config_in(&dir);
        write(&path, r#"{"assistant": {"timeout_secs": 0}, "server": {"port": 0}}"#);
        let settings = load_config_from(&path).unwrap();
        assert_eq!(settings.assistant.timeout_secs, Settings::MIN_TIMEOUT_SECS);
        assert_eq!(settings.server.port, 3000);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = config_in(&dir);
        let mut settings = Settings::default();
        settings.server.port = 8123;
        settings.assistant.model = "gemini-1.5-pro".to_string();

        save_config_to(&settings, &path).unwrap();
        assert!(!path.with_file_name(CONFIG_TEMP_NAME).exists());
        assert_eq!(load_config_from(&path).unwrap(), settings);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"server\""), "config is pretty-printed");
    }

    #[test]
    fn test_data_dir_override() {
        let mut settings = Settings::default();
        settings.storage.data_dir = Some(PathBuf::from("/srv/scribe-data"));
        assert_eq!(
            resolve_data_dir(&settings).unwrap(),
            PathBuf::from("/srv/scribe-data")
        );
    }

    #[test]
    fn test_load_config_never_fails() {
        assert!(load_config().server.port > 0);
    }
}
