//! Windows output devices through the MMDevice API.
//!
//! Endpoint ids are the stable `{0.0.0.00000000}.{guid}` strings Windows
//! assigns, and activation makes the endpoint the system default for
//! every role through the undocumented `IPolicyConfig` interface.

use crate::{
    AudioDevice, CoreResult, DeviceProvider, RegistryError,
    device::{bounded_query::BoundedQuery, cpal_provider::QUERY_TIMEOUT},
};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};
use windows::{
    Win32::{
        Devices::Properties::DEVPKEY_Device_FriendlyName,
        Media::Audio::{
            DEVICE_STATE_ACTIVE, IMMDevice, IMMDeviceEnumerator, MMDeviceEnumerator,
            eCommunications, eConsole, eMultimedia, eRender,
        },
        System::Com::{
            CLSCTX_ALL, COINIT_MULTITHREADED, CoCreateInstance, CoInitializeEx, CoUninitialize,
            STGM_READ,
        },
        UI::Shell::PropertiesSystem::{IPropertyStore, PROPERTYKEY},
    },
    core::{GUID, HRESULT, IUnknown, PCWSTR, interface},
};

/// `IPolicyConfig` vtable; only `SetDefaultEndpoint` is called.
#[interface("f8679f50-850a-41cf-9c72-430f290290c8")]
unsafe trait IPolicyConfig: IUnknown {
    fn reserved1(&self) -> HRESULT;
    fn reserved2(&self) -> HRESULT;
    fn reserved3(&self) -> HRESULT;
    fn reserved4(&self) -> HRESULT;
    fn reserved5(&self) -> HRESULT;
    fn reserved6(&self) -> HRESULT;
    fn reserved7(&self) -> HRESULT;
    fn reserved8(&self) -> HRESULT;
    fn reserved9(&self) -> HRESULT;
    fn reserved10(&self) -> HRESULT;
    fn set_default_endpoint(&self, device_id: PCWSTR, role: u32) -> HRESULT;
}

const CLSID_POLICY_CONFIG_CLIENT: GUID = GUID::from_u128(0x870af99c_171d_4f9e_af0d_e63df40c2bc9);

/// Uninitializes COM on drop if this guard initialized it.
struct ComGuard {
    initialized: bool,
}

impl ComGuard {
    fn new() -> Self {
        // Fails with RPC_E_CHANGED_MODE when the thread already runs COM in
        // another apartment; COM is still usable then, but not ours to undo.
        let initialized = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }.is_ok();
        Self { initialized }
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { CoUninitialize() };
        }
    }
}

/// Render endpoints enumerated and switched through WASAPI.
#[derive(Debug)]
pub struct WasapiDeviceProvider {
    query: BoundedQuery<Vec<AudioDevice>>,
}

impl WasapiDeviceProvider {
    /// Create a provider with the default query timeout.
    pub fn new() -> Self {
        Self::with_timeout(QUERY_TIMEOUT)
    }

    /// Create a provider with a custom query timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            query: BoundedQuery::new("wasapi-device-query", timeout, enumerate_render_devices),
        }
    }
}

impl Default for WasapiDeviceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceProvider for WasapiDeviceProvider {
    #[track_caller]
    #[instrument(skip(self), fields(timeout = ?self.query.timeout()))]
    fn list_devices(&self) -> CoreResult<Vec<AudioDevice>> {
        let devices = self.query.run()?;
        debug!(count = devices.len(), "Render endpoints enumerated");
        Ok(devices)
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn activate(&self, device_id: &str) -> CoreResult<()> {
        let caller = Location::caller();

        set_default_endpoint(device_id).map_err(|reason| RegistryError::DeviceActivation {
            device_id: device_id.to_string(),
            reason,
            location: ErrorLocation::from(caller),
        })?;

        info!(device_id = %device_id, "System default output changed");

        Ok(())
    }
}

fn enumerate_render_devices() -> Result<Vec<AudioDevice>, String> {
    let _com = ComGuard::new();

    unsafe {
        let enumerator: IMMDeviceEnumerator =
            CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)
                .map_err(|e| format!("Failed to create device enumerator: {}", e))?;

        let collection = enumerator
            .EnumAudioEndpoints(eRender, DEVICE_STATE_ACTIVE)
            .map_err(|e| format!("Failed to enumerate endpoints: {}", e))?;

        let count = collection
            .GetCount()
            .map_err(|e| format!("Failed to count endpoints: {}", e))?;

        // No default endpoint at all is a valid state (nothing plugged in).
        let default_id = enumerator
            .GetDefaultAudioEndpoint(eRender, eMultimedia)
            .ok()
            .and_then(|device| endpoint_id(&device).ok());

        let mut devices = Vec::with_capacity(count as usize);

        for i in 0..count {
            let device = collection
                .Item(i)
                .map_err(|e| format!("Failed to get endpoint {}: {}", i, e))?;

            let id = endpoint_id(&device)?;
            let name = friendly_name(&device).unwrap_or_else(|| format!("Output Device {}", i + 1));

            devices.push(AudioDevice {
                is_default: default_id.as_deref() == Some(id.as_str()),
                id,
                name,
            });
        }

        Ok(devices)
    }
}

unsafe fn endpoint_id(device: &IMMDevice) -> Result<String, String> {
    unsafe {
        let id = device
            .GetId()
            .map_err(|e| format!("Failed to read endpoint id: {}", e))?;
        id.to_string()
            .map_err(|e| format!("Endpoint id is not valid UTF-16: {}", e))
    }
}

unsafe fn friendly_name(device: &IMMDevice) -> Option<String> {
    unsafe {
        let props: IPropertyStore = device.OpenPropertyStore(STGM_READ).ok()?;
        let key = PROPERTYKEY {
            fmtid: DEVPKEY_Device_FriendlyName.fmtid,
            pid: DEVPKEY_Device_FriendlyName.pid,
        };
        let name = props.GetValue(&key).ok()?.to_string();

        (!name.is_empty()).then_some(name)
    }
}

fn set_default_endpoint(device_id: &str) -> Result<(), String> {
    let _com = ComGuard::new();
    let id_wide: Vec<u16> = device_id.encode_utf16().chain(std::iter::once(0)).collect();
    let id = PCWSTR(id_wide.as_ptr());

    unsafe {
        let policy: IPolicyConfig = CoCreateInstance(&CLSID_POLICY_CONFIG_CLIENT, None, CLSCTX_ALL)
            .map_err(|e| format!("Failed to create policy config: {}", e))?;

        for (role, label) in [
            (eConsole, "console"),
            (eMultimedia, "multimedia"),
            (eCommunications, "communications"),
        ] {
            policy
                .set_default_endpoint(id, role.0 as u32)
                .ok()
                .map_err(|e| format!("Failed to set {} default: {}", label, e))?;
        }
    }

    Ok(())
}
