use crate::model::Settings;
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "dirplay";
const SETTINGS_FILE: &str = "settings.json";
const LOG_DIR: &str = "logs";

pub fn config_root() -> Result<PathBuf> {
    if let Ok(override_dir) = env::var("DIRPLAY_CONFIG_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .context("neither HOME nor USERPROFILE is set")?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR))
}

pub fn settings_path() -> Result<PathBuf> {
    Ok(config_root()?.join(SETTINGS_FILE))
}

pub fn load_settings() -> Result<Settings> {
    let path = settings_path()?;
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read settings file {}", path.display()))?;
    parse_settings(&raw).with_context(|| format!("failed to parse settings file {}", path.display()))
}

pub fn parse_settings(raw: &str) -> Result<Settings> {
    let mut settings: Settings = serde_json::from_str(raw)?;
    settings.volume = settings.volume.min(100);
    Ok(settings)
}

pub fn log_dir(settings: &Settings) -> Result<PathBuf> {
    match &settings.log_dir {
        Some(dir) => Ok(dir.clone()),
        None => Ok(config_root()?.join(LOG_DIR)),
    }
}
