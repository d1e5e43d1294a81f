use crate::{AudioDevice, CoreResult, DeviceProvider, device::bounded_query::BoundedQuery};

use std::{collections::HashSet, time::Duration};

use cpal::traits::{DeviceTrait, HostTrait};
use tracing::{debug, instrument};

/// Upper bound on a single OS enumeration.
///
/// Some backends (PulseAudio without a running server, WASAPI during a
/// driver reset) can block indefinitely inside the enumeration call.
pub(crate) const QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Enumerates output devices through the platform's default cpal host.
///
/// Portable fallback: cpal exposes no stable endpoint identifier, so the
/// device name doubles as its id, with a numeric suffix for duplicates.
/// It also cannot change the system default output; see [`activate`].
///
/// [`activate`]: DeviceProvider::activate
#[derive(Debug)]
pub struct CpalDeviceProvider {
    query: BoundedQuery<Vec<AudioDevice>>,
}

impl CpalDeviceProvider {
    /// Create a provider with the default query timeout.
    pub fn new() -> Self {
        Self::with_timeout(QUERY_TIMEOUT)
    }

    /// Create a provider with a custom query timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            query: BoundedQuery::new("device-query", timeout, enumerate_output_devices),
        }
    }
}

impl Default for CpalDeviceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceProvider for CpalDeviceProvider {
    #[track_caller]
    #[instrument(skip(self), fields(timeout = ?self.query.timeout()))]
    fn list_devices(&self) -> CoreResult<Vec<AudioDevice>> {
        let devices = self.query.run()?;
        debug!(count = devices.len(), "Output devices enumerated");
        Ok(devices)
    }

    /// Accepts the selection without touching the OS: cpal hosts have no
    /// default-device setter.
    fn activate(&self, device_id: &str) -> CoreResult<()> {
        debug!(device_id = %device_id, "cpal host cannot change the system default, selection kept locally");
        Ok(())
    }
}

#[allow(deprecated)]
fn enumerate_output_devices() -> Result<Vec<AudioDevice>, String> {
    let host = cpal::default_host();
    let default_name = host.default_output_device().and_then(|d| d.name().ok());

    let names: Vec<String> = host
        .output_devices()
        .map_err(|e| format!("Failed to enumerate output devices: {}", e))?
        .enumerate()
        .map(|(idx, device)| {
            device
                .name()
                .unwrap_or_else(|_| format!("Output Device {}", idx + 1))
        })
        .collect();

    let ids = disambiguate_ids(&names);
    let mut default_marked = false;

    Ok(names
        .into_iter()
        .zip(ids)
        .map(|(name, id)| {
            let is_default = !default_marked && default_name.as_deref() == Some(name.as_str());
            default_marked |= is_default;
            AudioDevice {
                id,
                name,
                is_default,
            }
        })
        .collect())
}

/// Derive unique ids from display names, suffixing repeats with ` #2`, ` #3`...
pub(crate) fn disambiguate_ids(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(names.len());

    names
        .iter()
        .map(|name| {
            let mut candidate = name.clone();
            let mut n = 2;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{} #{}", name, n);
                n += 1;
            }
            candidate
        })
        .collect()
}
