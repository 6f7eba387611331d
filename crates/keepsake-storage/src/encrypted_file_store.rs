use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use keepsake_core::{KeyValueStore, SettingValue, StoreError};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::key_provider::KeyProvider;

const FORMAT_VERSION: u32 = 1;
const NONCE_LEN: usize = 12;

type Entries = BTreeMap<String, SettingValue>;

/// AES-GCM encrypted single-file store implementing the shared `KeyValueStore` contract.
///
/// The whole settings map is one ciphertext. Reads decrypt the file, writes
/// re-encrypt it under a fresh nonce and swap it in atomically. The file is
/// only created by the first write.
pub struct EncryptedFileStore<P: KeyProvider> {
    path: PathBuf,
    key_provider: P,
}

impl<P: KeyProvider> EncryptedFileStore<P> {
    pub fn new(path: impl Into<PathBuf>, key_provider: P) -> Self {
        Self {
            path: path.into(),
            key_provider,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cipher(&self) -> Result<Aes256Gcm, StoreError> {
        let material = self
            .key_provider
            .material()
            .map_err(|e| StoreError::Storage {
                reason: format!("key provider: {e}"),
            })?;
        Aes256Gcm::new_from_slice(&material.bytes).map_err(|e| StoreError::Storage {
            reason: format!("cipher init failed: {e}"),
        })
    }

    fn load_entries(&self) -> Result<Entries, StoreError> {
        let Some(blob) = read_blob(&self.path)? else {
            return Ok(Entries::new());
        };

        if blob.version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {}",
                blob.version
            )));
        }

        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(blob.nonce)
            .map_err(|e| corrupt(format!("nonce decode failed: {e}")))?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(corrupt(format!(
                "expected {NONCE_LEN} byte nonce, got {}",
                nonce_bytes.len()
            )));
        }
        let ciphertext = URL_SAFE_NO_PAD
            .decode(blob.ciphertext)
            .map_err(|e| corrupt(format!("ciphertext decode failed: {e}")))?;

        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|e| corrupt(format!("decrypt failed: {e}")))?;

        serde_json::from_slice(&plaintext).map_err(|e| corrupt(format!("invalid payload: {e}")))
    }

    fn store_entries(&self, entries: &Entries) -> Result<(), StoreError> {
        let plaintext = serde_json::to_vec(entries).map_err(storage_err)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher()?
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|e| StoreError::Storage {
                reason: format!("encrypt failed: {e}"),
            })?;

        let blob = StoredBlob {
            version: FORMAT_VERSION,
            nonce: URL_SAFE_NO_PAD.encode(nonce.as_slice()),
            ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
        };
        write_blob(&self.path, &blob)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredBlob {
    version: u32,
    nonce: String,
    ciphertext: String,
}

impl<P: KeyProvider> KeyValueStore for EncryptedFileStore<P> {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn init(&self) -> Result<(), StoreError> {
        let entries = self.load_entries()?;
        debug!(count = entries.len(), "settings file opened");
        Ok(())
    }

    #[instrument(skip(self))]
    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load_entries()?.into_keys().collect())
    }

    #[instrument(skip(self))]
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.load_entries()?.contains_key(key))
    }

    #[instrument(skip(self))]
    fn get(&self, key: &str) -> Result<SettingValue, StoreError> {
        self.load_entries()?
            .remove(key)
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    #[instrument(skip(self, value))]
    fn put(&self, key: &str, value: SettingValue) -> Result<(), StoreError> {
        if !value.is_storable() {
            return Err(StoreError::Storage {
                reason: format!("value for {key} has no JSON representation"),
            });
        }
        let mut entries = self.load_entries()?;
        entries.insert(key.to_string(), value);
        self.store_entries(&entries)
    }

    #[instrument(skip(self))]
    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.load_entries()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.store_entries(&entries)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn delete_all(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(storage_err(err)),
        }
    }
}

fn write_blob(path: &Path, blob: &StoredBlob) -> Result<(), StoreError> {
    let parent = path.parent().ok_or_else(|| StoreError::Storage {
        reason: "invalid storage path".to_string(),
    })?;
    fs::create_dir_all(parent).map_err(storage_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(storage_err)?;
    let json = serde_json::to_vec(blob).map_err(storage_err)?;
    tmp.write_all(&json).map_err(storage_err)?;
    tmp.flush().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

/// `None` when the file has not been created yet.
fn read_blob(path: &Path) -> Result<Option<StoredBlob>, StoreError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(storage_err(err)),
    };

    let mut buf = Vec::new();
    file.read_to_end(&mut buf).map_err(storage_err)?;
    serde_json::from_slice(&buf)
        .map(Some)
        .map_err(|e| corrupt(format!("invalid envelope: {e}")))
}

fn corrupt(reason: String) -> StoreError {
    StoreError::Corrupt { reason }
}

fn storage_err<E: ToString>(err: E) -> StoreError {
    StoreError::Storage {
        reason: err.to_string(),
    }
}
