//! Config file loading
//!
//! One structured document (YAML, JSON or TOML) is located, parsed once and
//! exposed as a flat, dotted-key store.

pub mod loader;
pub mod store;

pub use loader::{load_file, LoadedFile, SUPPORTED_EXTENSIONS};
pub use store::{ConfigSource, ConfigStore};
