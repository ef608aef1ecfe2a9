//! Persisted repository configuration.

mod node;
mod repository;

pub use node::{ConfigNode, OrderedMap};
pub use repository::{DEFAULT_CHUNK_SIZE_KB, RepositoryConfig};

use std::path::PathBuf;

/// `~/.syncremote/repository.json`, or `None` when there is no home directory.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".syncremote").join("repository.json"))
}
