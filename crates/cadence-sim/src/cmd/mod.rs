pub mod bindings;
pub mod config;
pub mod field;
pub mod routines;
pub mod run;

use std::path::Path;

use anyhow::Context;
use cadence_core::config::Config;

/// Load the config file when it exists, fall back to defaults otherwise.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        Config::load(path).with_context(|| format!("loading config from {}", path.display()))
    } else {
        Ok(Config::default())
    }
}
