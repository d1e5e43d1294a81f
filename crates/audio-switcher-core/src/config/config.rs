use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// User configuration shared with the front end.
///
/// Exclusion is a selection policy only: excluded devices remain visible
/// in enumerations so they can be re-included.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Devices that may not be activated or cycled to.
    #[serde(default)]
    pub excluded_device_ids: BTreeSet<String>,

    /// Serialized key combination that cycles devices (None = no hotkey).
    #[serde(default)]
    pub hotkey: Option<String>,
}

impl Config {
    /// Binding suggested to the front end for a fresh install.
    pub const DEFAULT_HOTKEY: &'static str = "CommandOrControl+Shift+A";

    /// Whether `device_id` is in the excluded set.
    pub fn is_excluded(&self, device_id: &str) -> bool {
        self.excluded_device_ids.contains(device_id)
    }
}

/// Everything the store persists: the user config plus the active selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// User configuration.
    pub config: Config,
    /// Device chosen through this service, if any.
    pub active_device_id: Option<String>,
}

impl PersistedState {
    /// Drop an active selection that the exclusion set forbids.
    ///
    /// Returns the id that was dropped.
    pub fn drop_excluded_selection(&mut self) -> Option<String> {
        match &self.active_device_id {
            Some(id) if self.config.is_excluded(id) => self.active_device_id.take(),
            _ => None,
        }
    }
}
