use crate::{AppCommand, Dispatcher};

use audio_switcher_core::{
    AudioDevice, ConfigStore, CoreResult, DeviceProvider, RegistryError, RegistryService,
};

use std::{
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use error_location::ErrorLocation;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Fixed device list with a switch to simulate an unreachable audio service.
#[derive(Clone, Default)]
pub(crate) struct StaticProvider {
    devices: Vec<AudioDevice>,
    unreachable: Arc<AtomicBool>,
}

impl StaticProvider {
    pub(crate) fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }
}

impl DeviceProvider for StaticProvider {
    fn list_devices(&self) -> CoreResult<Vec<AudioDevice>> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(RegistryError::DeviceQuery {
                reason: "audio service unreachable".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(self.devices.clone())
    }
}

pub(crate) struct Harness {
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) registry: Arc<RegistryService>,
    pub(crate) provider: StaticProvider,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
}

/// Dispatcher over Speakers (A, OS default) and Headset (B) with a fresh
/// config file. `ready` controls whether the registry is initialized.
pub(crate) fn harness(ready: bool) -> Harness {
    let provider = StaticProvider {
        devices: vec![
            AudioDevice::new("A", "Speakers", true),
            AudioDevice::new("B", "Headset", false),
        ],
        unreachable: Arc::default(),
    };
    let store = ConfigStore::new(
        std::env::temp_dir()
            .join(format!("audio-switcher-app-test-{}", Uuid::new_v4()))
            .join("config.toml"),
    );
    let registry = Arc::new(RegistryService::new(Box::new(provider.clone()), store));
    if ready {
        registry.initialize();
    }

    let (command_tx, command_rx) = mpsc::channel(32);
    let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry), command_tx));

    Harness {
        dispatcher,
        registry,
        provider,
        command_rx,
    }
}

/// Commands announced so far, without waiting.
pub(crate) fn drain(command_rx: &mut mpsc::Receiver<AppCommand>) -> Vec<AppCommand> {
    let mut commands = Vec::new();
    while let Ok(command) = command_rx.try_recv() {
        commands.push(command);
    }
    commands
}
