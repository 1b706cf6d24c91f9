//! File-backed software keystore, the fallback when no platform keystore is
//! available.
//!
//! Each alias maps to `<dir>/<alias>.key.json`, which holds the PKCS#8
//! device key sealed with XChaCha20-Poly1305 under an Argon2id KEK derived
//! from the keystore passphrase. Provisioning takes an exclusive advisory
//! lock on `<dir>/<alias>.lock` so that concurrent processes converge on one
//! key.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
    sync::Arc,
};

use {
    base64::{Engine, engine::general_purpose::STANDARD},
    fd_lock::RwLock,
    secrecy::Secret,
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
};

use crate::{
    error::{DeviceError, Result},
    keystore::{DeviceKey, DeviceKeyStore},
    local_key::LocalKey,
    seal::{self, KdfParams, SealingKey},
};

const FORMAT_VERSION: u32 = 1;

/// On-disk representation of one sealed device key.
#[derive(Debug, Serialize, Deserialize)]
struct KeyFile {
    version: u32,
    kdf: KdfParams,
    salt: String,
    sealed_key: String,
}

pub struct SoftwareKeyStore {
    dir: PathBuf,
    passphrase: Secret<String>,
    kdf: KdfParams,
}

impl SoftwareKeyStore {
    pub fn new(dir: impl Into<PathBuf>, passphrase: Secret<String>) -> Self {
        Self {
            dir: dir.into(),
            passphrase,
            kdf: KdfParams::default(),
        }
    }

    /// Override the Argon2id cost used when sealing new keys. Existing files
    /// keep the parameters they were written with.
    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    fn key_path(&self, alias: &str) -> PathBuf {
        self.dir.join(format!("{alias}.key.json"))
    }

    fn lock_path(&self, alias: &str) -> PathBuf {
        self.dir.join(format!("{alias}.lock"))
    }

    fn read_key(&self, alias: &str) -> Result<Option<LocalKey>> {
        let path = self.key_path(alias);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DeviceError::unavailable(format!(
                    "read {}: {e}",
                    path.display()
                )));
            },
        };

        let file: KeyFile = serde_json::from_str(&raw)
            .map_err(|e| DeviceError::unavailable(format!("parse {}: {e}", path.display())))?;
        if file.version != FORMAT_VERSION {
            return Err(DeviceError::unavailable(format!(
                "unsupported keystore format version {}",
                file.version
            )));
        }

        let salt = STANDARD
            .decode(&file.salt)
            .map_err(|e| DeviceError::unavailable(format!("keystore salt: {e}")))?;
        let sealed = STANDARD
            .decode(&file.sealed_key)
            .map_err(|e| DeviceError::unavailable(format!("sealed key: {e}")))?;

        let der = SealingKey::derive(&self.passphrase, &salt, &file.kdf)?.open(&sealed, alias)?;

        LocalKey::from_pkcs8_der(&der).map(Some)
    }

    fn write_key(&self, alias: &str, key: &LocalKey) -> Result<()> {
        let salt = seal::generate_salt();
        let der = key.to_pkcs8_der()?;
        let sealed = SealingKey::derive(&self.passphrase, &salt, &self.kdf)?.seal(&der, alias)?;

        let file = KeyFile {
            version: FORMAT_VERSION,
            kdf: self.kdf,
            salt: STANDARD.encode(salt),
            sealed_key: STANDARD.encode(sealed),
        };
        let data = serde_json::to_string_pretty(&file)?;

        let path = self.key_path(alias);
        let tmp = path.with_extension("json.tmp");
        // Left behind by an interrupted write; the mode applies only on create.
        match fs::remove_file(&tmp) {
            Ok(()) => debug!(alias, "removed stale temporary key file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => return Err(e.into()),
        }
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut out = options.open(&tmp)?;
        out.write_all(data.as_bytes())?;
        out.sync_all()?;
        drop(out);

        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl DeviceKeyStore for SoftwareKeyStore {
    fn load(&self, alias: &str) -> Result<Option<Arc<dyn DeviceKey>>> {
        validate_alias(alias)?;
        Ok(self
            .read_key(alias)?
            .map(|key| Arc::new(key) as Arc<dyn DeviceKey>))
    }

    fn generate(&self, alias: &str) -> Result<Arc<dyn DeviceKey>> {
        validate_alias(alias)?;
        fs::create_dir_all(&self.dir).map_err(|e| {
            DeviceError::unavailable(format!("create {}: {e}", self.dir.display()))
        })?;

        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path(alias))?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock
            .write()
            .map_err(|e| DeviceError::unavailable(format!("keystore lock: {e}")))?;

        if let Some(existing) = self.read_key(alias)? {
            debug!(alias, "device key already provisioned by another writer");
            return Ok(Arc::new(existing));
        }

        let key = LocalKey::generate();
        self.write_key(alias, &key)?;
        info!(alias, dir = %self.dir.display(), "device key generated");
        Ok(Arc::new(key))
    }
}

fn validate_alias(alias: &str) -> Result<()> {
    let valid = !alias.is_empty()
        && !alias.starts_with('.')
        && alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(DeviceError::unavailable(format!("invalid key alias {alias:?}")))
    }
}
