use serde::{Deserialize, Serialize};

/// An audio output device as seen in one enumeration.
///
/// Snapshots are rebuilt on every query and never persisted. The `id` is
/// stable within a boot session only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    /// Opaque OS-assigned identifier.
    pub id: String,
    /// Human-readable display label.
    pub name: String,
    /// Whether the OS currently designates this device as its default output.
    pub is_default: bool,
}

impl AudioDevice {
    /// Create a device entry.
    pub fn new(id: impl Into<String>, name: impl Into<String>, is_default: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_default,
        }
    }
}
