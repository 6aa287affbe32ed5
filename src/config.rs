use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "PetBuddy";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Document store collections
pub const PETS_COLLECTION: &str = "pets";
pub const APPOINTMENTS_COLLECTION: &str = "appointments";

/// Blob prefix for uploaded pet photos
pub const PET_IMAGES_PREFIX: &str = "pet_images";

/// Timestamp encoding inside stored documents
pub const STORED_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Appointment date as shown to the user (and matched by search)
pub const DISPLAY_DATETIME_FORMAT: &str = "%d.%m.%Y. %H:%M";

/// Environment variable overriding the local data directory
pub const DATA_DIR_ENV: &str = "PETBUDDY_DATA_DIR";

/// Log filter used when `RUST_LOG` is unset
pub fn default_log_filter() -> &'static str {
    "info,petbuddy_lib=debug"
}

/// Get the application data directory
/// <platform data dir>/PetBuddy, or ./PetBuddy when the platform has none
pub fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Settings for the on-device backend adapters (SQLite documents + file blobs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalBackendConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
    pub blob_dir: String,
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            data_dir: app_data_dir(),
            database_file: "petbuddy.db".into(),
            blob_dir: "blobs".into(),
        }
    }
}

impl LocalBackendConfig {
    /// Defaults, with the data directory taken from `PETBUDDY_DATA_DIR` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        config
    }

    /// Load from a JSON file; missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    pub fn blob_root(&self) -> PathBuf {
        self.data_dir.join(&self.blob_dir)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("PetBuddy"));
    }

    #[test]
    fn app_name_is_petbuddy() {
        assert_eq!(APP_NAME, "PetBuddy");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.2.0");
    }

    #[test]
    fn derived_paths_live_under_data_dir() {
        let config = LocalBackendConfig {
            data_dir: PathBuf::from("/tmp/pb"),
            ..LocalBackendConfig::default()
        };
        assert_eq!(config.database_path(), PathBuf::from("/tmp/pb/petbuddy.db"));
        assert_eq!(config.blob_root(), PathBuf::from("/tmp/pb/blobs"));
    }

    #[test]
    fn load_fills_missing_keys_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend.json");
        std::fs::write(&path, r#"{"data_dir": "/srv/petbuddy"}"#).unwrap();

        let config = LocalBackendConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/petbuddy"));
        assert_eq!(config.database_file, "petbuddy.db");
        assert_eq!(config.blob_dir, "blobs");
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backend.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            LocalBackendConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            LocalBackendConfig::load(&dir.path().join("absent.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
