use crate::{AudioDevice, ConfigStore, CoreResult, DeviceProvider, RegistryError};

use std::{
    panic::Location,
    path::PathBuf,
    sync::{
        Arc, Condvar, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use error_location::ErrorLocation;
use uuid::Uuid;

/// In-memory device source. Clones share state so a test can keep a handle
/// after boxing one into the registry.
#[derive(Clone, Default)]
pub(crate) struct FakeProvider {
    devices: Arc<Mutex<Vec<AudioDevice>>>,
    unreachable: Arc<AtomicBool>,
    reject_activation: Arc<AtomicBool>,
    activated: Arc<Mutex<Vec<String>>>,
    list_calls: Arc<AtomicUsize>,
    gate: Arc<ActivationGate>,
}

/// Holds the next `activate` call until opened.
#[derive(Default)]
struct ActivationGate {
    armed: Mutex<bool>,
    opened: Condvar,
    parked: AtomicBool,
}

impl FakeProvider {
    pub(crate) fn with_devices(devices: Vec<AudioDevice>) -> Self {
        let provider = Self::default();
        provider.set_devices(devices);
        provider
    }

    pub(crate) fn set_devices(&self, devices: Vec<AudioDevice>) {
        *self.devices.lock().unwrap_or_else(PoisonError::into_inner) = devices;
    }

    pub(crate) fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub(crate) fn set_reject_activation(&self, reject: bool) {
        self.reject_activation.store(reject, Ordering::SeqCst);
    }

    /// Number of `list_devices` calls so far.
    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Make the next `activate` call wait until [`release_activation`].
    ///
    /// [`release_activation`]: FakeProvider::release_activation
    pub(crate) fn hold_next_activation(&self) {
        *self.gate.armed.lock().unwrap_or_else(PoisonError::into_inner) = true;
    }

    /// Whether an `activate` call is currently held.
    pub(crate) fn activation_parked(&self) -> bool {
        self.gate.parked.load(Ordering::SeqCst)
    }

    pub(crate) fn release_activation(&self) {
        *self.gate.armed.lock().unwrap_or_else(PoisonError::into_inner) = false;
        self.gate.opened.notify_all();
    }

    pub(crate) fn activated(&self) -> Vec<String> {
        self.activated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DeviceProvider for FakeProvider {
    fn list_devices(&self) -> CoreResult<Vec<AudioDevice>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RegistryError::DeviceQuery {
                reason: "audio service unreachable".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(self
            .devices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn activate(&self, device_id: &str) -> CoreResult<()> {
        let mut armed = self.gate.armed.lock().unwrap_or_else(PoisonError::into_inner);
        if *armed {
            self.gate.parked.store(true, Ordering::SeqCst);
            while *armed {
                armed = self
                    .gate
                    .opened
                    .wait(armed)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            self.gate.parked.store(false, Ordering::SeqCst);
        }
        drop(armed);

        if self.reject_activation.load(Ordering::SeqCst) {
            return Err(RegistryError::DeviceActivation {
                device_id: device_id.to_string(),
                reason: "rejected".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.activated
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(device_id.to_string());
        Ok(())
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub(crate) fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while !condition() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(1));
    }
    true
}

/// Speakers (OS default) and a headset.
pub(crate) fn speakers_and_headset() -> Vec<AudioDevice> {
    vec![
        AudioDevice::new("A", "Speakers", true),
        AudioDevice::new("B", "Headset", false),
    ]
}

/// Config path inside a fresh, not yet created, temp directory.
pub(crate) fn temp_config_path() -> PathBuf {
    std::env::temp_dir()
        .join(format!("audio-switcher-test-{}", Uuid::new_v4()))
        .join("config.toml")
}

pub(crate) fn temp_store() -> ConfigStore {
    ConfigStore::new(temp_config_path())
}
