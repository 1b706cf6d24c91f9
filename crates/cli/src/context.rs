//! Builds the unlock machinery from configuration.

use std::{
    io::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    anyhow::{Context, Result},
    hubkey_config::{ENV_KEYSTORE_PASSPHRASE, HubkeyConfig},
    hubkey_device::{
        DeviceError, DeviceIdentity, DeviceKey, DeviceKeyStore, KdfParams, SoftwareKeyStore,
        error::Result as DeviceResult,
    },
    hubkey_jwe::Pbes2Params,
    hubkey_unlock::VaultUnlock,
    tracing::debug,
};

/// Config from `--config`, or discovered, with `HUBKEY_*` overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<HubkeyConfig> {
    let config = match path {
        Some(path) => hubkey_config::load_config(path)?,
        None => hubkey_config::discover_and_load(),
    };
    Ok(hubkey_config::apply_env_overrides(config))
}

/// The device keystore named by configuration. A store that cannot be
/// opened still builds; its reason surfaces on the first device operation,
/// so setup-code commands work without any keystore configured.
pub enum ConfiguredStore {
    Software(SoftwareKeyStore),
    Missing(String),
}

impl ConfiguredStore {
    pub fn from_config(config: &HubkeyConfig) -> Self {
        let Some(dir) = keystore_dir(config) else {
            return Self::Missing(
                "cannot determine a keystore directory; set device.keystore_dir".into(),
            );
        };
        let Some(passphrase) = config.device.keystore_passphrase.clone() else {
            return Self::Missing(format!(
                "no keystore passphrase configured; set {ENV_KEYSTORE_PASSPHRASE}"
            ));
        };
        let kdf = KdfParams {
            m_cost: config.keystore_kdf.memory_kib,
            t_cost: config.keystore_kdf.iterations,
            p_cost: config.keystore_kdf.parallelism,
        };

        debug!(dir = %dir.display(), alias = %config.device.key_alias, "using software keystore");
        Self::Software(SoftwareKeyStore::new(dir, passphrase).with_kdf_params(kdf))
    }

    fn missing(reason: &str) -> DeviceError {
        DeviceError::Unavailable(reason.to_string())
    }
}

impl DeviceKeyStore for ConfiguredStore {
    fn load(&self, alias: &str) -> DeviceResult<Option<Arc<dyn DeviceKey>>> {
        match self {
            Self::Software(store) => store.load(alias),
            Self::Missing(reason) => Err(Self::missing(reason)),
        }
    }

    fn generate(&self, alias: &str) -> DeviceResult<Arc<dyn DeviceKey>> {
        match self {
            Self::Software(store) => store.generate(alias),
            Self::Missing(reason) => Err(Self::missing(reason)),
        }
    }
}

pub fn vault_unlock(config: &HubkeyConfig) -> Result<VaultUnlock<ConfiguredStore>> {
    let pbes2 = Pbes2Params {
        iterations: config.wrap.pbes2_iterations,
    };
    pbes2.validate()?;

    let store = ConfiguredStore::from_config(config);
    let identity = DeviceIdentity::with_alias(store, config.device.key_alias.clone());
    Ok(VaultUnlock::new(Arc::new(identity)).with_pbes2_params(pbes2))
}

fn keystore_dir(config: &HubkeyConfig) -> Option<PathBuf> {
    config
        .device
        .keystore_dir
        .clone()
        .or_else(hubkey_config::default_keystore_dir)
}

pub fn read_token(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(raw.trim().to_string())
}

/// Write `contents` readable by the owner only.
pub fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    file.write_all(contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
