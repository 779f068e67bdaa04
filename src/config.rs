use std::path::PathBuf;

use anyhow::{Context, Result};
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "skins";
const ENV_PREFIX: &str = "SKINS";

/// Runtime settings. Defaults live here, `skins.toml` (optional) overrides them,
/// `SKINS_*` environment variables override both.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    pub report_path: PathBuf,
    pub export_path: PathBuf,
    pub workshop_url: String,
    pub item_list_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        with_defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    /// Built-in defaults only, ignoring `skins.toml` and the environment.
    #[cfg(test)]
    pub fn defaults() -> Self {
        with_defaults().unwrap().build().unwrap().try_deserialize().unwrap()
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("db_path", "data/skins.sqlite")?
        .set_default("report_path", "storage/errors.json")?
        .set_default("export_path", "storage/Skins.json")?
        .set_default("workshop_url", "https://steamcommunity.com/workshop/browse/")?
        .set_default("item_list_url", "https://www.corrosionhour.com/rust-item-list/")?
        .set_default("user_agent", concat!("rust_skins/", env!("CARGO_PKG_VERSION")))?
        .set_default("timeout_secs", 30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_defaults() {
        let s = Settings::defaults();
        assert_eq!(s.timeout_secs, 30);
        assert!(s.workshop_url.starts_with("https://steamcommunity.com/"));
        assert_eq!(s.report_path, PathBuf::from("storage/errors.json"));
    }
}
