//! Global hotkey registration and press forwarding.
//!
//! [`HotkeyRegistrar`] owns the OS registration and lives on the main
//! thread. [`HotkeyHandler`] runs on the async runtime and turns presses
//! into [`AppCommand::CycleDevice`].

use crate::{AppCommand, AppError, AppResult};

use audio_switcher_core::parse_hotkey;

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState, hotkey::HotKey};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Owner of the single registered hotkey.
///
/// Must be created and used on a thread with a message pump (the main
/// thread running the `tao` event loop) so that `WM_HOTKEY` messages are
/// dispatched on Windows. Dropping it unregisters the hotkey.
pub struct HotkeyRegistrar {
    manager: GlobalHotKeyManager,
    current: Option<HotKey>,
}

impl HotkeyRegistrar {
    /// Create a registrar with nothing registered.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(Self {
            manager,
            current: None,
        })
    }

    /// Replace the registered hotkey with `hotkey` (None = unregister).
    ///
    /// The previous hotkey is released first, so on failure nothing is
    /// registered.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn apply(&mut self, hotkey: Option<&str>) -> AppResult<()> {
        if let Some(previous) = self.current.take() {
            if let Err(e) = self.manager.unregister(previous) {
                warn!(error = %e, "Failed to unregister previous hotkey");
            }
        }

        let Some(raw) = hotkey else {
            info!("Global hotkey cleared");
            return Ok(());
        };

        let parsed = parse_hotkey(raw)?;

        self.manager
            .register(parsed)
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!(
                    "Failed to register '{}': {}. It might be in use by another application.",
                    raw, e
                ),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.current = Some(parsed);
        info!(hotkey = raw, "Global hotkey registered");

        Ok(())
    }
}

/// Forwards hotkey presses to the application loop.
pub struct HotkeyHandler {
    command_tx: mpsc::Sender<AppCommand>,
}

impl HotkeyHandler {
    /// Create a handler. It reacts to any registered hotkey, since the
    /// registrar keeps at most one.
    pub fn new(command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { command_tx }
    }

    /// Run the hotkey event loop until a shutdown signal is received.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let receiver = GlobalHotKeyEvent::receiver().clone();
        let (event_tx, mut event_rx) = mpsc::channel(32);

        // GlobalHotKeyEvent::receiver() is a crossbeam receiver with a
        // blocking recv(); one blocking task forwards events. It exits when
        // event_rx is dropped and the next blocking_send fails.
        let handle = tokio::task::spawn_blocking(move || {
            while let Ok(event) = receiver.recv() {
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Hotkey handler shutting down");
                    break;
                }
                Some(event) = event_rx.recv() => {
                    if event.state == HotKeyState::Pressed {
                        self.handle_hotkey_press().await?;
                    }
                }
            }
        }

        drop(event_rx);

        // The blocking task may stay parked in recv() until the next hotkey
        // event; the runtime reclaims it on exit.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Hotkey event forwarder stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Hotkey event forwarder task panicked"),
            Err(_) => debug!(
                "Hotkey event forwarder did not stop within timeout, \
                   will be cleaned up on exit"
            ),
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub(crate) async fn handle_hotkey_press(&self) -> AppResult<()> {
        self.command_tx
            .send(AppCommand::CycleDevice)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send CycleDevice: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!("Hotkey pressed, cycle requested");

        Ok(())
    }
}
