use std::path::PathBuf;

use error_location::ErrorLocation;
use serde::Serialize;
use thiserror::Error;

/// Registry and configuration errors with source location tracking.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The OS audio subsystem could not be queried (unreachable or timed out).
    #[error("Device query failed: {reason} {location}")]
    DeviceQuery {
        /// Description of the query failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The requested device is not present in the current snapshot.
    #[error("Unknown device: {device_id} {location}")]
    UnknownDevice {
        /// Device ID that was requested.
        device_id: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The requested device is in the excluded set.
    #[error("Device is excluded: {device_id} {location}")]
    DeviceExcluded {
        /// Device ID that was requested.
        device_id: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The OS refused to switch to the requested device.
    #[error("Failed to activate device {device_id}: {reason} {location}")]
    DeviceActivation {
        /// Device ID that was requested.
        device_id: String,
        /// Description of the activation failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The snapshot contains no output devices.
    #[error("No audio devices found {location}")]
    NoDevices {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A stored configuration exists but cannot be parsed.
    #[error("Config at {path:?} is corrupt: {reason} {location}")]
    ConfigCorrupt {
        /// Path of the unreadable config file.
        path: PathBuf,
        /// Parser or read error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The configuration could not be written to durable storage.
    #[error("Config write failed: {reason} {location}")]
    ConfigWrite {
        /// Description of the I/O failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A hotkey string is not a valid key combination.
    #[error("Invalid hotkey '{hotkey}': {reason} {location}")]
    InvalidHotkey {
        /// The rejected hotkey string.
        hotkey: String,
        /// Parser error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The registry has not finished loading its configuration.
    #[error("Registry is not ready {location}")]
    NotReady {
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Stable, location-free classification of a [`RegistryError`].
///
/// Serialized as a `snake_case` string for callers on the other side of
/// the process boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`RegistryError::DeviceQuery`].
    DeviceQuery,
    /// See [`RegistryError::UnknownDevice`].
    UnknownDevice,
    /// See [`RegistryError::DeviceExcluded`].
    DeviceExcluded,
    /// See [`RegistryError::DeviceActivation`].
    DeviceActivation,
    /// See [`RegistryError::NoDevices`].
    NoDevices,
    /// See [`RegistryError::ConfigCorrupt`].
    ConfigCorrupt,
    /// See [`RegistryError::ConfigWrite`].
    ConfigWrite,
    /// See [`RegistryError::InvalidHotkey`].
    InvalidHotkey,
    /// See [`RegistryError::NotReady`].
    NotReady,
}

impl RegistryError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::DeviceQuery { .. } => ErrorKind::DeviceQuery,
            RegistryError::UnknownDevice { .. } => ErrorKind::UnknownDevice,
            RegistryError::DeviceExcluded { .. } => ErrorKind::DeviceExcluded,
            RegistryError::DeviceActivation { .. } => ErrorKind::DeviceActivation,
            RegistryError::NoDevices { .. } => ErrorKind::NoDevices,
            RegistryError::ConfigCorrupt { .. } => ErrorKind::ConfigCorrupt,
            RegistryError::ConfigWrite { .. } => ErrorKind::ConfigWrite,
            RegistryError::InvalidHotkey { .. } => ErrorKind::InvalidHotkey,
            RegistryError::NotReady { .. } => ErrorKind::NotReady,
        }
    }

    /// Whether the caller may reasonably retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::DeviceQuery | ErrorKind::NotReady | ErrorKind::ConfigWrite
        )
    }
}

/// Result type alias using [`RegistryError`].
pub type Result<T> = std::result::Result<T, RegistryError>;
