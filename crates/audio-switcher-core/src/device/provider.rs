use crate::{AudioDevice, CoreResult};

/// Source of live audio device snapshots.
///
/// Implementations query the OS on every call and must not cache. A query
/// that cannot complete returns [`RegistryError::DeviceQuery`] rather than
/// an empty list.
///
/// [`RegistryError::DeviceQuery`]: crate::RegistryError::DeviceQuery
pub trait DeviceProvider: Send + Sync {
    /// Enumerate the output devices currently known to the OS.
    fn list_devices(&self) -> CoreResult<Vec<AudioDevice>>;

    /// Ask the OS to route output to `device_id`.
    ///
    /// Called after the registry has validated the id. Backends without a
    /// way to change the system default accept the request unchanged.
    fn activate(&self, device_id: &str) -> CoreResult<()> {
        let _ = device_id;
        Ok(())
    }
}
