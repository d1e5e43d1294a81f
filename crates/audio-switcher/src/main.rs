//! Audio-Switcher: tray utility for cycling audio output devices.

mod app;
mod app_command;
mod badge;
mod dispatcher;
mod error;
mod hotkey_handler;
mod server;
mod server_settings;
#[cfg(test)]
mod tests;
mod tray_manager;
mod ui_command;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    dispatcher::{Dispatcher, Invocation, Reply},
    error::{AppError, Result as AppResult},
    hotkey_handler::{HotkeyHandler, HotkeyRegistrar},
    server_settings::ServerSettings,
    tray_manager::TrayManager,
    ui_command::UiCommand,
};

use audio_switcher_core::{ConfigStore, RegistryService, platform_provider};

use std::sync::Arc;

use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "audio_switcher=debug,audio_switcher_core=debug";

/// Application entry point.
fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let event_loop = EventLoopBuilder::<UiCommand>::with_user_event().build();
    let ui_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new() {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Registered on the main thread so tao pumps WM_HOTKEY on Windows.
    // Dropping it unregisters the hotkey.
    let mut registrar: Option<HotkeyRegistrar> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => match cmd {
                UiCommand::SetBadge(position) => {
                    if let Err(e) = tray_manager.set_badge(position) {
                        error!(error = ?e, "Failed to update tray badge");
                    }
                }
                UiCommand::RegisterHotkey(hotkey) => match registrar.as_mut() {
                    Some(registrar) => {
                        if let Err(e) = registrar.apply(hotkey.as_deref()) {
                            error!(error = %e, "Failed to register hotkey");
                        }
                    }
                    None => error!("Hotkey manager unavailable, hotkey ignored"),
                },
                UiCommand::Shutdown => {
                    *control_flow = ControlFlow::ExitWithCode(0);
                }
            },
            Event::NewEvents(tao::event::StartCause::Init) => {
                let store = match ConfigStore::at_default_location() {
                    Ok(store) => store,
                    Err(e) => {
                        error!("Failed to locate config: {:?}", e);
                        std::process::exit(1);
                    }
                };
                info!(path = %store.path().display(), "Using config file");

                let registry = Arc::new(RegistryService::new(platform_provider(), store));

                // A missing hotkey manager only disables the hotkey; tray
                // and boundary keep working.
                registrar = match HotkeyRegistrar::new() {
                    Ok(r) => Some(r),
                    Err(e) => {
                        error!(error = %e, "Global hotkeys unavailable");
                        None
                    }
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let settings = ServerSettings::from_env();
                let (command_tx, command_rx) = mpsc::channel(32);
                let (shutdown_tx, shutdown_rx) = watch::channel(false);

                let ui_proxy = ui_proxy.clone();
                let settings_menu_id = tray_manager.settings_item_id().clone();
                let quit_menu_id = tray_manager.quit_item_id().clone();

                // Spawn tokio runtime on separate thread.
                // TrayManager and the hotkey registrar stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let dispatcher =
                            Arc::new(Dispatcher::new(Arc::clone(&registry), command_tx.clone()));
                        let hotkey_handler = HotkeyHandler::new(command_tx.clone());
                        let startup_tx = command_tx.clone();

                        let app = App {
                            registry: Arc::clone(&registry),
                            ui_proxy,
                            command_tx,
                            command_rx,
                            shutdown_tx,
                            settings_menu_id,
                            quit_menu_id,
                            front_end_url: settings.url(),
                        };

                        tokio::join!(
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            },
                            async {
                                if let Err(e) = server::serve(
                                    dispatcher,
                                    settings.port,
                                    settings.ui_dir.clone(),
                                    shutdown_rx.clone(),
                                )
                                .await
                                {
                                    error!(error = ?e, "Boundary error");
                                }
                            },
                            async {
                                if let Err(e) = hotkey_handler.run(shutdown_rx.clone()).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            initialize_registry(registry, startup_tx),
                        );
                    });
                });
            }
            _ => {}
        }
    });
}

/// Load the registry off the async threads, then announce the loaded
/// hotkey and state. Until this finishes the boundary answers `not_ready`.
async fn initialize_registry(registry: Arc<RegistryService>, command_tx: mpsc::Sender<AppCommand>) {
    let loaded = Arc::clone(&registry);
    if let Err(e) = tokio::task::spawn_blocking(move || loaded.initialize()).await {
        error!(error = ?e, "Registry initialization panicked");
        return;
    }

    let hotkey = match registry.get_config() {
        Ok(config) => config.hotkey,
        Err(e) => {
            error!(error = %e, "Registry not ready after initialization");
            return;
        }
    };

    for command in [AppCommand::HotkeyChanged(hotkey), AppCommand::StateChanged] {
        if command_tx.send(command).await.is_err() {
            error!("App loop stopped before startup completed");
            return;
        }
    }
}
