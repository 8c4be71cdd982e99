//! Local workspace declaration: the persisted config model and the
//! registry that serializes every read-modify-persist cycle over it.

mod config;
mod error;
mod registry;

pub use config::{Event, WorkspaceConfig, DEFAULT_VERSION};
pub use error::ConfigError;
pub use registry::{ConfigRegistry, CONFIG_FILE};
