mod selection;
mod service;

pub use service::RegistryService;

#[cfg(test)]
pub(crate) use selection::{next_in_cycle, position, replacement};
