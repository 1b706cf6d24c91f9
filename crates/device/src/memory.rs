//! In-memory keystore for tests and ephemeral sessions. Keys die with the
//! process.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use crate::{
    error::{DeviceError, Result},
    keystore::{DeviceKey, DeviceKeyStore},
    local_key::LocalKey,
};

#[derive(Default)]
pub struct MemoryKeyStore {
    keys: Mutex<HashMap<String, Arc<LocalKey>>>,
    generated: AtomicUsize,
    unavailable: bool,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every operation fails, standing in for a broken
    /// platform keystore.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Number of keys this store has generated.
    pub fn generated(&self) -> usize {
        self.generated.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.unavailable {
            Err(DeviceError::unavailable("memory keystore disabled"))
        } else {
            Ok(())
        }
    }
}

impl DeviceKeyStore for MemoryKeyStore {
    fn load(&self, alias: &str) -> Result<Option<Arc<dyn DeviceKey>>> {
        self.check()?;
        let keys = self
            .keys
            .lock()
            .map_err(|_| DeviceError::unavailable("memory keystore poisoned"))?;
        Ok(keys
            .get(alias)
            .map(|key| Arc::clone(key) as Arc<dyn DeviceKey>))
    }

    fn generate(&self, alias: &str) -> Result<Arc<dyn DeviceKey>> {
        self.check()?;
        let mut keys = self
            .keys
            .lock()
            .map_err(|_| DeviceError::unavailable("memory keystore poisoned"))?;
        let key = keys.entry(alias.to_string()).or_insert_with(|| {
            self.generated.fetch_add(1, Ordering::SeqCst);
            Arc::new(LocalKey::generate())
        });
        Ok(Arc::clone(key) as Arc<dyn DeviceKey>)
    }
}
