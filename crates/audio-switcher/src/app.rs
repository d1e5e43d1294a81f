use crate::{AppCommand, AppError, AppResult, UiCommand};

use audio_switcher_core::RegistryService;

use std::{panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tao::event_loop::EventLoopProxy;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, instrument, warn};
use tray_icon::{
    MouseButton, MouseButtonState, TrayIconEvent,
    menu::{MenuEvent, MenuId},
};

/// Main application state.
///
/// Runs on the async runtime thread. Tray and hotkey changes go back to
/// the main thread through `ui_proxy` because `TrayIcon` is `!Send` and
/// hotkeys must be registered on the event-loop thread.
pub struct App {
    pub(crate) registry: Arc<RegistryService>,
    pub(crate) ui_proxy: EventLoopProxy<UiCommand>,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) settings_menu_id: MenuId,
    pub(crate) quit_menu_id: MenuId,
    pub(crate) front_end_url: String,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Audio-Switcher starting");

        // MenuEvent and TrayIconEvent expose blocking crossbeam receivers;
        // one blocking task each forwards into the select loop. They exit
        // when their async receiver is dropped and the next send fails.
        let (menu_event_tx, mut menu_event_rx) = mpsc::channel(32);
        let menu_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if menu_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        let (icon_event_tx, mut icon_event_rx) = mpsc::channel(32);
        let icon_handle = tokio::task::spawn_blocking(move || {
            let receiver = TrayIconEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if icon_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                Some(event) = menu_event_rx.recv() => {
                    if let Err(e) = self.handle_menu_event(event).await {
                        error!(error = ?e, "Failed to handle tray menu event");
                    }
                }

                Some(event) = icon_event_rx.recv() => {
                    if is_left_click(&event) {
                        self.cycle_device().await;
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::CycleDevice => self.cycle_device().await,
                        AppCommand::StateChanged => self.refresh_badge().await,
                        AppCommand::HotkeyChanged(hotkey) => {
                            self.send_ui(UiCommand::RegisterHotkey(hotkey));
                        }
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        drop(menu_event_rx);
        drop(icon_event_rx);

        for (name, handle) in [("Menu", menu_handle), ("Tray icon", icon_handle)] {
            match tokio::time::timeout(Duration::from_secs(1), handle).await {
                Ok(Ok(())) => info!("{} event forwarder stopped cleanly", name),
                Ok(Err(e)) => error!(error = ?e, "{} event forwarder task panicked", name),
                Err(_) => info!(
                    "{} event forwarder did not stop within timeout, \
                     will be cleaned up on exit",
                    name
                ),
            }
        }

        let _ = self.shutdown_tx.send(true);
        self.send_ui(UiCommand::Shutdown);
        info!("Audio-Switcher shut down successfully");

        Ok(())
    }

    /// Switch to the next eligible device and refresh the badge.
    #[instrument(skip(self))]
    async fn cycle_device(&self) {
        let registry = Arc::clone(&self.registry);

        match tokio::task::spawn_blocking(move || registry.cycle_active_device()).await {
            Ok(Ok(device)) => info!(device_id = %device.id, name = %device.name, "Switched device"),
            Ok(Err(e)) => warn!(error = %e, "Failed to cycle device"),
            Err(e) => error!(error = ?e, "Cycle task panicked"),
        }

        self.refresh_badge().await;
    }

    /// Recompute the current device position and push it to the tray.
    #[instrument(skip(self))]
    async fn refresh_badge(&self) {
        let registry = Arc::clone(&self.registry);

        let position = match tokio::task::spawn_blocking(move || registry.active_position()).await
        {
            Ok(Ok(position)) => position,
            Ok(Err(e)) => {
                warn!(error = %e, "Cannot compute device position, clearing badge");
                None
            }
            Err(e) => {
                error!(error = ?e, "Badge task panicked");
                None
            }
        };

        self.send_ui(UiCommand::SetBadge(position));
    }

    /// Handle tray menu events.
    #[instrument(skip(self))]
    async fn handle_menu_event(&mut self, event: MenuEvent) -> AppResult<()> {
        let event_id = &event.id;

        if *event_id == self.settings_menu_id {
            open::that(&self.front_end_url).map_err(|e| AppError::IoError {
                source: e,
                location: ErrorLocation::from(Location::caller()),
            })?;
            info!(url = %self.front_end_url, "Opened settings UI");
        } else if *event_id == self.quit_menu_id {
            info!("Quit requested from tray menu");
            self.command_tx
                .send(AppCommand::Shutdown)
                .await
                .map_err(|e| AppError::ChannelSendFailed {
                    message: format!("Failed to send Shutdown: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }

        Ok(())
    }

    fn send_ui(&self, command: UiCommand) {
        if let Err(e) = self.ui_proxy.send_event(command) {
            warn!(error = %e, "UI event loop closed");
        }
    }
}

/// Left button released over the tray icon.
fn is_left_click(event: &TrayIconEvent) -> bool {
    matches!(
        event,
        TrayIconEvent::Click {
            button: MouseButton::Left,
            button_state: MouseButtonState::Up,
            ..
        }
    )
}
