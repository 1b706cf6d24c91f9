use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::HubkeyConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["hubkey.toml", "hubkey.yaml", "hubkey.yml", "hubkey.json"];

pub const ENV_KEYSTORE_DIR: &str = "HUBKEY_KEYSTORE_DIR";
pub const ENV_KEYSTORE_PASSPHRASE: &str = "HUBKEY_KEYSTORE_PASSPHRASE";
pub const ENV_KEY_ALIAS: &str = "HUBKEY_KEY_ALIAS";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<HubkeyConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./hubkey.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/hubkey/hubkey.{toml,yaml,yml,json}` (user-global)
///
/// Returns `HubkeyConfig::default()` if no config file is found.
pub fn discover_and_load() -> HubkeyConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    HubkeyConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/hubkey/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hubkey").map(|d| d.config_dir().to_path_buf())
}

/// Default keystore directory: `keys/` under the platform data dir.
pub fn default_keystore_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "hubkey").map(|d| d.data_dir().join("keys"))
}

/// Overlay `HUBKEY_*` environment variables onto `config`.
pub fn apply_env_overrides(config: HubkeyConfig) -> HubkeyConfig {
    apply_env_overrides_with(config, |name| std::env::var(name).ok())
}

fn apply_env_overrides_with(
    mut config: HubkeyConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> HubkeyConfig {
    if let Some(dir) = lookup(ENV_KEYSTORE_DIR).filter(|v| !v.is_empty()) {
        config.device.keystore_dir = Some(PathBuf::from(dir));
    }
    if let Some(alias) = lookup(ENV_KEY_ALIAS).filter(|v| !v.is_empty()) {
        config.device.key_alias = alias;
    }
    if let Some(passphrase) = lookup(ENV_KEYSTORE_PASSPHRASE) {
        config.device.keystore_passphrase = Some(Secret::new(passphrase));
    }
    config
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<HubkeyConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
