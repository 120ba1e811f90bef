//! Initialize the configuration directory: create ~/.tg-file-share and a config template.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Template written by `init`. Token and file server URL must be filled in (or given via env) before `serve`.
const DEFAULT_CONFIG: &str = r#"{
  "server": {
    "bind": "0.0.0.0",
    "port": 8001
  },
  "telegram": {
    "botToken": "",
    "apiBase": "https://api.telegram.org",
    "pollTimeoutSecs": 60,
    "retryDelaySecs": 2,
    "requestTimeoutSecs": 30
  },
  "fileServerUrl": ""
}
"#;

/// Create the config directory and write the template if no config file exists yet.
/// An existing config file is never overwritten. Returns the config directory.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    } else {
        log::debug!("config already exists at {}, skipping", config_path.display());
    }

    Ok(config_dir.to_path_buf())
}
