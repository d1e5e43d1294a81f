//! Request dispatch from the front end to the registry.
//!
//! The five calls form a closed enum, so routing is an exhaustive match
//! checked at compile time. Registry calls block on the OS or the disk and
//! run on the blocking pool.

use crate::{AppCommand, AppError, AppResult};

use audio_switcher_core::{AudioDevice, Config, RegistryService};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// A call from the front end: `{"cmd": "<name>", "args": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd", content = "args", rename_all = "snake_case")]
pub enum Invocation {
    /// List all output devices.
    GetAudioDevices,
    /// Select the active device.
    SetActiveDevice {
        /// Device id from a previous listing.
        id: String,
    },
    /// Read the cached configuration.
    GetConfig,
    /// Replace the excluded set.
    SetExcludedDevices {
        /// Device ids to exclude.
        ids: Vec<String>,
    },
    /// Validate and persist a full configuration.
    SaveConfig {
        /// The new configuration.
        config: Config,
    },
}

impl Invocation {
    /// Wire name of the call.
    pub fn name(&self) -> &'static str {
        match self {
            Invocation::GetAudioDevices => "get_audio_devices",
            Invocation::SetActiveDevice { .. } => "set_active_device",
            Invocation::GetConfig => "get_config",
            Invocation::SetExcludedDevices { .. } => "set_excluded_devices",
            Invocation::SaveConfig { .. } => "save_config",
        }
    }
}

/// Successful result of an [`Invocation`].
///
/// Serialized untagged: a device array, a config object, or `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// Output of `get_audio_devices`.
    Devices(Vec<AudioDevice>),
    /// Output of `get_config`.
    Config(Config),
    /// Calls without output.
    Done,
}

/// Routes invocations to the registry and announces state changes.
pub struct Dispatcher {
    registry: Arc<RegistryService>,
    command_tx: mpsc::Sender<AppCommand>,
}

impl Dispatcher {
    /// Create a dispatcher over a shared registry.
    pub fn new(registry: Arc<RegistryService>, command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self {
            registry,
            command_tx,
        }
    }

    /// Whether the registry has finished loading.
    pub fn is_ready(&self) -> bool {
        self.registry.is_ready()
    }

    /// Execute one invocation.
    #[instrument(skip(self, invocation), fields(cmd = invocation.name(), request_id = %Uuid::new_v4()))]
    pub async fn dispatch(&self, invocation: Invocation) -> AppResult<Reply> {
        let registry = Arc::clone(&self.registry);
        let hotkey_update = match &invocation {
            Invocation::SaveConfig { config } => Some(config.hotkey.clone()),
            _ => None,
        };
        let mutates = matches!(
            invocation,
            Invocation::SetActiveDevice { .. }
                | Invocation::SetExcludedDevices { .. }
                | Invocation::SaveConfig { .. }
        );

        let reply = tokio::task::spawn_blocking(move || route(&registry, invocation))
            .await
            .map_err(|e| AppError::TaskFailed {
                reason: format!("Registry task failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })??;

        if mutates {
            self.announce(AppCommand::StateChanged).await;
        }
        if let Some(hotkey) = hotkey_update {
            self.announce(AppCommand::HotkeyChanged(hotkey)).await;
        }

        debug!("Invocation complete");

        Ok(reply)
    }

    /// State is already persisted, so a closed channel only costs a stale
    /// tray badge.
    async fn announce(&self, command: AppCommand) {
        if let Err(e) = self.command_tx.send(command).await {
            warn!(error = %e, "Failed to announce state change");
        }
    }
}

fn route(registry: &RegistryService, invocation: Invocation) -> AppResult<Reply> {
    let reply = match invocation {
        Invocation::GetAudioDevices => Reply::Devices(registry.get_audio_devices()?),
        Invocation::SetActiveDevice { id } => {
            registry.set_active_device(&id)?;
            Reply::Done
        }
        Invocation::GetConfig => Reply::Config(registry.get_config()?),
        Invocation::SetExcludedDevices { ids } => {
            registry.set_excluded_devices(ids)?;
            Reply::Done
        }
        Invocation::SaveConfig { config } => {
            registry.save_config(config)?;
            info!("Configuration saved from front end");
            Reply::Done
        }
    };

    Ok(reply)
}
