// Configuration loader
// Reads ~/.strata/config.toml when present, falls back to defaults

use std::fs;

use anyhow::{Context, Result};

use super::settings::Config;

pub fn load_config() -> Result<Config> {
    let Some(home) = dirs::home_dir() else {
        return Ok(Config::default());
    };

    let config_path = home.join(".strata/config.toml");
    if !config_path.exists() {
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(&config_path)
        .with_context(|| format!("failed to read {}", config_path.display()))?;
    let config = toml::from_str(&contents)
        .with_context(|| format!("invalid configuration at {}", config_path.display()))?;

    Ok(config)
}
