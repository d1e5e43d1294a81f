//! System tray icon showing the current device number.
//!
//! Left click cycles devices; the context menu offers Settings and Quit.

use crate::{AppError, AppResult, badge};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};
use tray_icon::menu::{Menu, MenuId, MenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

const TOOLTIP: &str = "Audio Switcher";

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    settings_item_id: MenuId,
    quit_item_id: MenuId,
    badge: Option<usize>,
}

impl TrayManager {
    /// Create the tray icon with an empty badge.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let menu = Menu::new();

        let settings_item = MenuItem::new("Settings", true, None);
        let quit_item = MenuItem::new("Quit", true, None);

        let settings_id = settings_item.id().clone();
        let quit_id = quit_item.id().clone();

        menu.append(&settings_item).map_err(|e| AppError::TrayError {
            reason: format!("Failed to add settings menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        menu.append(&quit_item).map_err(|e| AppError::TrayError {
            reason: format!("Failed to add quit menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(TOOLTIP)
            .with_menu(Box::new(menu))
            // Left click is reserved for cycling
            .with_menu_on_left_click(false)
            .with_icon(Self::badge_icon(None)?)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            tray_icon,
            settings_item_id: settings_id,
            quit_item_id: quit_id,
            badge: None,
        })
    }

    /// Redraw the badge for the given 1-based device position.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn set_badge(&mut self, position: Option<usize>) -> AppResult<()> {
        if self.badge == position {
            return Ok(());
        }

        self.tray_icon
            .set_icon(Some(Self::badge_icon(position)?))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let tooltip = match position {
            Some(n) => format!("{} - device {}", TOOLTIP, n),
            None => TOOLTIP.to_string(),
        };

        self.tray_icon
            .set_tooltip(Some(tooltip))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.badge = position;
        debug!(position = ?position, "Tray badge updated");

        Ok(())
    }

    #[track_caller]
    fn badge_icon(position: Option<usize>) -> AppResult<Icon> {
        let rgba = badge::render_badge(position);

        Icon::from_rgba(rgba, badge::BADGE_SIZE, badge::BADGE_SIZE).map_err(|e| {
            AppError::TrayError {
                reason: format!("Failed to create icon from RGBA: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }

    /// Get the settings menu item ID.
    pub fn settings_item_id(&self) -> &MenuId {
        &self.settings_item_id
    }

    /// Get the quit menu item ID.
    pub fn quit_item_id(&self) -> &MenuId {
        &self.quit_item_id
    }
}
