//! Configuration loading
//!
//! Reads `ARKIVE_*` environment variables or a TOML/JSON file into
//! [`arkive_domain::Config`].

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
