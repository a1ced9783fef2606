//! Secure key storage boundary.
//!
//! Private key material of a persisted [`crate::key::KeyPair`] lives behind a
//! [`SecureStore`] rather than in the key pair itself; the pair holds only
//! opaque handles plus the public key. A software backend ([`MemoryStore`]) is
//! provided; hardware-backed stores (TPM, enclave) plug in behind the same
//! trait.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};

/// Opaque reference to a single key entry inside one [`SecureStore`].
///
/// Handles are only meaningful to the store instance that issued them;
/// equality is by store identity, not by key bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyHandle(u64);

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Whether an entry holds private or public key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    Private,
    Public,
}

/// A key entry as held by a [`SecureStore`].
///
/// `der` is PKCS#8 for private keys and SubjectPublicKeyInfo for public keys.
/// `exportable: false` marks keys whose material must never leave the store
/// (hardware-backed or caller-restricted); [`crate::key::KeyPair::export`]
/// refuses such keys.
#[derive(Debug, Clone)]
pub struct StoredKey {
    pub label: String,
    pub tag: Vec<u8>,
    pub class: KeyClass,
    pub der: Vec<u8>,
    pub exportable: bool,
}

/// Persistent key storage capability.
///
/// Implementations may block on I/O (keystore daemon, hardware token); callers
/// must treat every method as potentially slow. No cross-call transaction is
/// assumed: two concurrent `delete` calls against the same handle are a race
/// whose loser observes [`Error::KeyNotFound`], not a crash.
pub trait SecureStore: Send + Sync {
    /// Stores an entry and returns an opaque handle to it.
    fn store(&self, entry: StoredKey) -> Result<KeyHandle>;

    /// Loads the entry for a handle, or [`Error::HandleNotFound`] if the
    /// handle no longer resolves in this store.
    fn load(&self, handle: &KeyHandle) -> Result<StoredKey>;

    /// Removes the entry for a handle, or [`Error::KeyNotFound`] if it was
    /// already removed.
    fn delete(&self, handle: &KeyHandle) -> Result<()>;

    /// Whether this store keeps private key material inside protected
    /// hardware.
    fn hardware_backed(&self) -> bool {
        false
    }
}

/// Software-only [`SecureStore`] backend keeping entries in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<u64, StoredKey>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SecureStore for MemoryStore {
    fn store(&self, entry: StoredKey) -> Result<KeyHandle> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Crypto("store mutex poisoned".into()))?;
        entries.insert(id, entry);
        Ok(KeyHandle(id))
    }

    fn load(&self, handle: &KeyHandle) -> Result<StoredKey> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| Error::Crypto("store mutex poisoned".into()))?;
        entries
            .get(&handle.0)
            .cloned()
            .ok_or_else(|| Error::HandleNotFound(handle.to_string()))
    }

    fn delete(&self, handle: &KeyHandle) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::Crypto("store mutex poisoned".into()))?;
        match entries.remove(&handle.0) {
            Some(_) => Ok(()),
            None => Err(Error::KeyNotFound(handle.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(label: &str) -> StoredKey {
        StoredKey {
            label: label.to_string(),
            tag: label.as_bytes().to_vec(),
            class: KeyClass::Private,
            der: vec![1, 2, 3],
            exportable: true,
        }
    }

    #[test]
    fn store_load_roundtrip() {
        let store = MemoryStore::new();
        let handle = store.store(entry("a")).unwrap();
        let loaded = store.load(&handle).unwrap();
        assert_eq!(loaded.label, "a");
        assert_eq!(loaded.der, vec![1, 2, 3]);
    }

    #[test]
    fn delete_is_not_idempotent() {
        let store = MemoryStore::new();
        let handle = store.store(entry("a")).unwrap();
        store.delete(&handle).unwrap();
        assert!(matches!(store.delete(&handle), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn load_after_delete_fails() {
        let store = MemoryStore::new();
        let handle = store.store(entry("a")).unwrap();
        store.delete(&handle).unwrap();
        assert!(matches!(store.load(&handle), Err(Error::HandleNotFound(_))));
    }

    #[test]
    fn handles_are_store_scoped() {
        let a = MemoryStore::new();
        let b = MemoryStore::new();
        let handle = a.store(entry("a")).unwrap();
        assert!(matches!(b.load(&handle), Err(Error::HandleNotFound(_))));
    }
}
