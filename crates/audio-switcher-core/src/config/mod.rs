#[allow(clippy::module_inception)]
mod config;
mod store;

pub use {
    config::{Config, PersistedState},
    store::ConfigStore,
};

pub(crate) const CONFIG_FILE_NAME: &str = "config.toml";
