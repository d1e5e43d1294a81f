//! Audio-switcher Core Library
//!
//! Tracks the system's audio output devices, persists the user's exclusion
//! list, hotkey and active selection, and exposes them through a
//! thread-safe [`RegistryService`].
//!
//! # Example
//!
//! ```no_run
//! use audio_switcher_core::{ConfigStore, CoreResult, RegistryService, platform_provider};
//!
//! fn main() -> CoreResult<()> {
//!     let store = ConfigStore::at_default_location()?;
//!     let registry = RegistryService::new(platform_provider(), store);
//!     registry.initialize();
//!
//!     for device in registry.get_audio_devices()? {
//!         println!("{} {}", if device.is_default { "*" } else { " " }, device.name);
//!     }
//!
//!     let next = registry.cycle_active_device()?;
//!     println!("Now playing through {}", next.name);
//!     Ok(())
//! }
//! ```

mod config;
mod device;
mod error;
mod hotkey;
mod registry;

pub use {
    config::{Config, ConfigStore, PersistedState},
    device::{AudioDevice, CpalDeviceProvider, DeviceProvider, platform_provider},
    error::{ErrorKind, RegistryError, Result as CoreResult},
    hotkey::parse_hotkey,
    registry::RegistryService,
};

#[cfg(windows)]
pub use device::WasapiDeviceProvider;

#[cfg(test)]
mod tests;
