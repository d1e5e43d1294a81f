//! Device selection policy over a single snapshot.

use crate::{AudioDevice, Config};

/// Devices eligible for selection, in snapshot order.
pub(crate) fn included<'a>(devices: &'a [AudioDevice], config: &Config) -> Vec<&'a AudioDevice> {
    devices
        .iter()
        .filter(|d| !config.is_excluded(&d.id))
        .collect()
}

/// The device treated as current: the active selection if it is still
/// present, otherwise the OS default.
pub(crate) fn current_id<'a>(devices: &'a [AudioDevice], active: Option<&'a str>) -> Option<&'a str> {
    active
        .filter(|id| devices.iter().any(|d| d.id == *id))
        .or_else(|| devices.iter().find(|d| d.is_default).map(|d| d.id.as_str()))
}

/// Replacement when the active device becomes excluded: the OS default if
/// eligible, else the first eligible device.
pub(crate) fn replacement<'a>(devices: &'a [AudioDevice], config: &Config) -> Option<&'a AudioDevice> {
    let eligible = included(devices, config);

    eligible
        .iter()
        .find(|d| d.is_default)
        .or_else(|| eligible.first())
        .copied()
}

/// Next eligible device after the current one, wrapping around.
pub(crate) fn next_in_cycle<'a>(
    devices: &'a [AudioDevice],
    config: &Config,
    active: Option<&str>,
) -> Option<&'a AudioDevice> {
    let eligible = included(devices, config);
    if eligible.is_empty() {
        return None;
    }

    let current = current_id(devices, active);
    let next_index = match current.and_then(|id| eligible.iter().position(|d| d.id == id)) {
        Some(idx) => (idx + 1) % eligible.len(),
        None => 0,
    };

    eligible.get(next_index).copied()
}

/// 1-based position of the current device among eligible devices.
pub(crate) fn position(devices: &[AudioDevice], config: &Config, active: Option<&str>) -> Option<usize> {
    let current = current_id(devices, active)?;

    included(devices, config)
        .iter()
        .position(|d| d.id == current)
        .map(|idx| idx + 1)
}
