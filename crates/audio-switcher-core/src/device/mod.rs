mod audio_device;
mod bounded_query;
mod cpal_provider;
mod provider;
#[cfg(windows)]
mod windows_provider;

pub use {audio_device::AudioDevice, cpal_provider::CpalDeviceProvider, provider::DeviceProvider};

#[cfg(windows)]
pub use windows_provider::WasapiDeviceProvider;

#[cfg(test)]
pub(crate) use {bounded_query::BoundedQuery, cpal_provider::disambiguate_ids};

/// The provider for the current platform.
///
/// Windows gets [`WasapiDeviceProvider`], which switches the system default
/// output. Elsewhere [`CpalDeviceProvider`] lists devices and keeps the
/// selection inside this service.
pub fn platform_provider() -> Box<dyn DeviceProvider> {
    #[cfg(windows)]
    {
        Box::new(WasapiDeviceProvider::new())
    }
    #[cfg(not(windows))]
    {
        Box::new(CpalDeviceProvider::new())
    }
}
