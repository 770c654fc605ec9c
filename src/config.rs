use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const DATA_ENV: &str = "EPISODE_CATALOG_DATA";
const LOG_ENV: &str = "EPISODE_CATALOG_LOG";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    data_file: Option<PathBuf>,
    log_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_file: PathBuf,
    pub log_level: String,
}

/// Resolves the settings: environment first, then the config file, then
/// defaults under the config directory.
pub fn load() -> Result<Settings> {
    load_from(&get_config_path(), &get_config_dir_path())
}

fn load_from(config_path: &Path, config_dir: &Path) -> Result<Settings> {
    let file = if config_path.exists() {
        let config_content = fs::read_to_string(config_path)?;
        toml::from_str(&config_content)?
    } else {
        ConfigFile::default()
    };

    let data_file = env::var_os(DATA_ENV)
        .map(PathBuf::from)
        .or(file.data_file)
        .unwrap_or_else(|| config_dir.join("catalog.json"));
    let log_level = env::var(LOG_ENV)
        .ok()
        .or(file.log_level)
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    Ok(Settings {
        data_file,
        log_level,
    })
}

fn get_config_dir_path() -> PathBuf {
    xdir::config()
        .map(|path| path.join("episode-catalog"))
        // If the standard path could not be found (e.g.`$HOME` is not set),
        // default to the current directory.
        .unwrap_or_default()
}

fn get_config_path() -> PathBuf {
    get_config_dir_path().join("config.toml")
}
