use crate::{
    AudioDevice, Config, ConfigStore, CoreResult, DeviceProvider, PersistedState, RegistryError,
    hotkey::parse_hotkey,
    registry::selection,
};

use std::{
    collections::BTreeSet,
    panic::Location,
    sync::{Mutex, PoisonError, RwLock},
};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of the registry. `Ready` owns the cached persisted state.
#[derive(Debug)]
enum Lifecycle {
    Uninitialized,
    Ready(PersistedState),
}

/// Merges live device snapshots with the persisted configuration.
///
/// # Thread Safety
///
/// All methods take `&self`; share the service behind an `Arc`.
///
/// - Mutations (`set_active_device`, `set_excluded_devices`, `save_config`,
///   `cycle_active_device`) are serialized by a single mutation lock.
/// - Reads take a short read lock on the cached state and never observe a
///   half-applied change: the cache is replaced whole, and only after the
///   new state has been persisted.
/// - Device enumeration can block on the OS and is always done before the
///   mutation lock is taken.
pub struct RegistryService {
    provider: Box<dyn DeviceProvider>,
    store: ConfigStore,
    state: RwLock<Lifecycle>,
    mutation: Mutex<()>,
}

impl RegistryService {
    /// Create an uninitialized registry. Call [`initialize`] before use.
    ///
    /// [`initialize`]: RegistryService::initialize
    pub fn new(provider: Box<dyn DeviceProvider>, store: ConfigStore) -> Self {
        Self {
            provider,
            store,
            state: RwLock::new(Lifecycle::Uninitialized),
            mutation: Mutex::new(()),
        }
    }

    /// Load the persisted state and become ready.
    ///
    /// A corrupt config is logged and replaced by defaults in memory; the
    /// file itself is left untouched until the next successful save. A
    /// stored active selection that is excluded is dropped. Calling this
    /// again once ready does nothing.
    #[instrument(skip(self))]
    pub fn initialize(&self) {
        let _guard = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);

        if self.is_ready() {
            debug!("Registry already initialized");
            return;
        }

        let mut loaded = match self.store.load() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Config unreadable, falling back to defaults");
                PersistedState::default()
            }
        };

        if let Some(dropped) = loaded.drop_excluded_selection() {
            warn!(device_id = %dropped, "Stored active device is excluded, selection cleared");
        }

        info!(
            excluded = loaded.config.excluded_device_ids.len(),
            active = ?loaded.active_device_id,
            "Registry ready"
        );

        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Lifecycle::Ready(loaded);
    }

    /// Whether [`initialize`](RegistryService::initialize) has completed.
    pub fn is_ready(&self) -> bool {
        matches!(
            *self.state.read().unwrap_or_else(PoisonError::into_inner),
            Lifecycle::Ready(_)
        )
    }

    /// Live device list, excluded devices included.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn get_audio_devices(&self) -> CoreResult<Vec<AudioDevice>> {
        self.ensure_ready()?;
        self.provider.list_devices()
    }

    /// Cached configuration.
    #[track_caller]
    pub fn get_config(&self) -> CoreResult<Config> {
        Ok(self.snapshot()?.config)
    }

    /// Device currently selected through this service, if any.
    #[track_caller]
    pub fn active_device_id(&self) -> CoreResult<Option<String>> {
        Ok(self.snapshot()?.active_device_id)
    }

    /// Make `device_id` the active device.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownDevice`] if the id is not in the live snapshot.
    /// - [`RegistryError::DeviceExcluded`] if the id is excluded.
    /// - [`RegistryError::DeviceActivation`] if the backend refuses the switch.
    /// - [`RegistryError::ConfigWrite`] if the selection cannot be persisted.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn set_active_device(&self, device_id: &str) -> CoreResult<()> {
        let caller = Location::caller();
        self.ensure_ready()?;

        let devices = self.provider.list_devices()?;
        if !devices.iter().any(|d| d.id == device_id) {
            return Err(RegistryError::UnknownDevice {
                device_id: device_id.to_string(),
                location: ErrorLocation::from(caller),
            });
        }

        let _guard = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = self.snapshot()?;

        if next.config.is_excluded(device_id) {
            return Err(RegistryError::DeviceExcluded {
                device_id: device_id.to_string(),
                location: ErrorLocation::from(caller),
            });
        }

        self.provider.activate(device_id)?;

        if next.active_device_id.as_deref() == Some(device_id) {
            debug!(device_id = %device_id, "Device already active");
            return Ok(());
        }

        next.active_device_id = Some(device_id.to_string());
        self.persist(next)?;

        info!(device_id = %device_id, "Active device set");

        Ok(())
    }

    /// Replace the excluded set.
    ///
    /// If the active device becomes excluded it is replaced by the OS
    /// default (when eligible) or the first eligible device; with no
    /// eligible device, or no snapshot available, the selection is cleared.
    #[track_caller]
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub fn set_excluded_devices(&self, ids: Vec<String>) -> CoreResult<()> {
        self.ensure_ready()?;
        let excluded: BTreeSet<String> = ids.into_iter().collect();

        // Taken before the lock: whether the active device is displaced is
        // only known under the lock, after any concurrent selection lands.
        let devices = self.provider.list_devices();

        let _guard = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = self.snapshot()?;
        next.config.excluded_device_ids = excluded;

        if let Some(displaced) = next.drop_excluded_selection() {
            next.active_device_id = match &devices {
                Ok(devices) => self.reassign(devices, &next.config),
                Err(e) => {
                    warn!(error = %e, "Cannot pick a replacement device, clearing selection");
                    None
                }
            };

            info!(
                displaced = %displaced,
                replacement = ?next.active_device_id,
                "Active device excluded, selection reassigned"
            );
        }

        let excluded_count = next.config.excluded_device_ids.len();
        self.persist(next)?;

        info!(excluded = excluded_count, "Excluded devices updated");

        Ok(())
    }

    /// Validate and persist a full configuration, then update the cache.
    ///
    /// The active selection is carried over, or cleared if `config`
    /// excludes it.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidHotkey`] before anything is written.
    /// - [`RegistryError::ConfigWrite`] if persistence fails; the cache is
    ///   left unchanged.
    #[track_caller]
    #[instrument(skip(self, config))]
    pub fn save_config(&self, config: Config) -> CoreResult<()> {
        self.ensure_ready()?;

        if let Some(hotkey) = &config.hotkey {
            parse_hotkey(hotkey)?;
        }

        let _guard = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = self.snapshot()?;
        next.config = config;

        if let Some(dropped) = next.drop_excluded_selection() {
            info!(device_id = %dropped, "Saved config excludes the active device, selection cleared");
        }

        self.persist(next)?;

        Ok(())
    }

    /// Activate the next eligible device after the current one.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoDevices`] if no device is eligible.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn cycle_active_device(&self) -> CoreResult<AudioDevice> {
        let caller = Location::caller();
        self.ensure_ready()?;

        let devices = self.provider.list_devices()?;

        let _guard = self.mutation.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = self.snapshot()?;

        let target = selection::next_in_cycle(&devices, &next.config, next.active_device_id.as_deref())
            .cloned()
            .ok_or_else(|| RegistryError::NoDevices {
                location: ErrorLocation::from(caller),
            })?;

        self.provider.activate(&target.id)?;

        if next.active_device_id.as_deref() != Some(target.id.as_str()) {
            next.active_device_id = Some(target.id.clone());
            self.persist(next)?;
        }

        info!(device_id = %target.id, name = %target.name, "Cycled to next device");

        Ok(target)
    }

    /// 1-based position of the current device among eligible devices.
    #[track_caller]
    pub fn active_position(&self) -> CoreResult<Option<usize>> {
        self.ensure_ready()?;
        let devices = self.provider.list_devices()?;
        let state = self.snapshot()?;

        Ok(selection::position(
            &devices,
            &state.config,
            state.active_device_id.as_deref(),
        ))
    }

    /// Activate the replacement for a displaced selection, if any.
    fn reassign(&self, devices: &[AudioDevice], config: &Config) -> Option<String> {
        let replacement = selection::replacement(devices, config)?;

        match self.provider.activate(&replacement.id) {
            Ok(()) => Some(replacement.id.clone()),
            Err(e) => {
                warn!(device_id = %replacement.id, error = %e, "Replacement device rejected");
                None
            }
        }
    }

    /// Write `next` to disk, then swap it into the cache.
    ///
    /// Must be called with the mutation lock held.
    #[track_caller]
    fn persist(&self, next: PersistedState) -> CoreResult<()> {
        self.store.save(&next)?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Lifecycle::Ready(next);

        Ok(())
    }

    #[track_caller]
    fn snapshot(&self) -> CoreResult<PersistedState> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            Lifecycle::Ready(state) => Ok(state.clone()),
            Lifecycle::Uninitialized => Err(RegistryError::NotReady {
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    #[track_caller]
    fn ensure_ready(&self) -> CoreResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(RegistryError::NotReady {
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}
