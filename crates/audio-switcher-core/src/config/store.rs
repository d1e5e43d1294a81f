//! Durable storage for [`PersistedState`].
//!
//! Stores a single TOML file in the per-user config directory. Saves are
//! atomic: the payload is written and synced to a sibling temp file which
//! then replaces the real file, so a crash mid-write leaves the previous
//! version intact.

use crate::{
    CoreResult, RegistryError,
    config::{CONFIG_FILE_NAME, Config, PersistedState},
};

use std::{
    collections::BTreeSet,
    fs,
    io::{self, Write},
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// On-disk layout. Flat keys, absent values omitted.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    excluded_device_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hotkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_device_id: Option<String>,
}

impl From<ConfigFile> for PersistedState {
    fn from(file: ConfigFile) -> Self {
        Self {
            config: Config {
                excluded_device_ids: file.excluded_device_ids,
                hotkey: file.hotkey,
            },
            active_device_id: file.active_device_id,
        }
    }
}

impl From<&PersistedState> for ConfigFile {
    fn from(state: &PersistedState) -> Self {
        Self {
            excluded_device_ids: state.config.excluded_device_ids.clone(),
            hotkey: state.config.hotkey.clone(),
            active_device_id: state.active_device_id.clone(),
        }
    }
}

/// Owner of the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store backed by an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store backed by `config.toml` in the per-user config directory.
    #[track_caller]
    pub fn at_default_location() -> CoreResult<Self> {
        let proj_dirs = ProjectDirs::from("com", "audio-switcher", "Audio-Switcher").ok_or_else(
            || RegistryError::ConfigWrite {
                reason: "Failed to get config directory".to_string(),
                location: ErrorLocation::from(Location::caller()),
            },
        )?;

        Ok(Self::new(proj_dirs.config_dir().join(CONFIG_FILE_NAME)))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted state.
    ///
    /// A missing file yields the default state. A file that exists but
    /// cannot be read or parsed yields [`RegistryError::ConfigCorrupt`];
    /// callers are expected to fall back to defaults.
    #[track_caller]
    #[instrument(skip(self), fields(path = ?self.path))]
    pub fn load(&self) -> CoreResult<PersistedState> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No config found, using defaults");
                return Ok(PersistedState::default());
            }
            Err(e) => {
                return Err(RegistryError::ConfigCorrupt {
                    path: self.path.clone(),
                    reason: format!("Failed to read config: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| RegistryError::ConfigCorrupt {
                path: self.path.clone(),
                reason: format!("Failed to parse config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("Configuration loaded");

        Ok(file.into())
    }

    /// Replace the persisted state atomically.
    #[track_caller]
    #[instrument(skip(self, state), fields(path = ?self.path))]
    pub fn save(&self, state: &PersistedState) -> CoreResult<()> {
        let caller = Location::caller();
        let write_err = |reason: String| RegistryError::ConfigWrite {
            reason,
            location: ErrorLocation::from(caller),
        };

        let contents = toml::to_string_pretty(&ConfigFile::from(state))
            .map_err(|e| write_err(format!("Failed to serialize config: {}", e)))?;

        if let Some(config_dir) = self.path.parent()
            && !config_dir.as_os_str().is_empty()
            && !config_dir.exists()
        {
            fs::create_dir_all(config_dir)
                .map_err(|e| write_err(format!("Failed to create config directory: {}", e)))?;
            debug!(config_dir = ?config_dir, "Created config directory");
        }

        // Atomic write: write to temp file then rename
        let temp_path = self.path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path)
            .map_err(|e| write_err(format!("Failed to create temp config file: {}", e)))?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| write_err(format!("Failed to write temp config file: {}", e)))?;

        temp_file
            .sync_all()
            .map_err(|e| write_err(format!("Failed to sync temp config file: {}", e)))?;

        drop(temp_file);

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            write_err(format!("Failed to rename temp config to final: {}", e))
        })?;

        info!(
            excluded = state.config.excluded_device_ids.len(),
            has_hotkey = state.config.hotkey.is_some(),
            "Configuration saved (atomic write)"
        );

        Ok(())
    }
}
