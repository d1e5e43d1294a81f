//! Hotkey syntax validation.
//!
//! Accepts whatever `global_hotkey` can register: `+`-separated modifiers
//! followed by one key, e.g. `CommandOrControl+Shift+A` or `alt+KeyQ`.

use crate::{CoreResult, RegistryError};

use std::panic::Location;

use error_location::ErrorLocation;
use global_hotkey::hotkey::HotKey;

/// Parse a serialized key combination.
///
/// # Errors
///
/// Returns [`RegistryError::InvalidHotkey`] if the string is empty or is not
/// a modifier/key combination.
#[track_caller]
pub fn parse_hotkey(hotkey: &str) -> CoreResult<HotKey> {
    let trimmed = hotkey.trim();

    if trimmed.is_empty() {
        return Err(RegistryError::InvalidHotkey {
            hotkey: hotkey.to_string(),
            reason: "empty key combination".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    trimmed
        .parse::<HotKey>()
        .map_err(|e| RegistryError::InvalidHotkey {
            hotkey: hotkey.to_string(),
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}
