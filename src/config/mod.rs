mod types;

pub use types::*;

use anyhow::{Context, Result};
use avikit_media::avi::AVIF_HASINDEX;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./avikit.toml", "~/.config/avikit/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn validate_config(config: &Config) -> Result<()> {
    if config.output.max_bytes_per_sec == Some(0) {
        anyhow::bail!("output.max_bytes_per_sec must be positive when set");
    }

    // idx1 is always written; a header claiming otherwise misleads readers
    if config.output.flags & AVIF_HASINDEX == 0 {
        tracing::warn!(
            "output.flags {:#x} lacks HASINDEX although an index is written",
            config.output.flags
        );
    }

    Ok(())
}
