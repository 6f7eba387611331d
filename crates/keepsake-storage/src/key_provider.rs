use std::sync::{Arc, Mutex};

use argon2::Argon2;
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;
use tracing::debug;

/// Passphrase used when configuration does not supply one.
pub const DEFAULT_PASSPHRASE: &str = "io.keepsake.settings";

/// Salt mixed into passphrase derivation. Fixed so the same passphrase always
/// opens the same file.
const PASSPHRASE_SALT: &[u8] = b"keepsake/settings/v1";

/// Key material used for encryption at rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Identifier for logging/rotation (never log key bytes).
    pub id: String,
    /// 256-bit symmetric key.
    pub bytes: [u8; 32],
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("generation error: {0}")]
    Generation(String),
    #[error("key derivation error: {0}")]
    Derivation(String),
}

/// Provides the settings encryption key (passphrase, OS keychain, or memory in tests).
pub trait KeyProvider: Send + Sync {
    fn material(&self) -> Result<KeyMaterial, KeyError>;
}

impl<P: KeyProvider + ?Sized> KeyProvider for Box<P> {
    fn material(&self) -> Result<KeyMaterial, KeyError> {
        (**self).material()
    }
}

/// Derives the key from a passphrase with Argon2id. Derivation runs once per provider.
pub struct PassphraseKeyProvider {
    passphrase: String,
    derived: Mutex<Option<KeyMaterial>>,
}

impl PassphraseKeyProvider {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
            derived: Mutex::new(None),
        }
    }

    /// Provider for the passphrase compiled into the crate.
    pub fn default_passphrase() -> Self {
        Self::new(DEFAULT_PASSPHRASE)
    }
}

impl std::fmt::Debug for PassphraseKeyProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassphraseKeyProvider")
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

impl KeyProvider for PassphraseKeyProvider {
    fn material(&self) -> Result<KeyMaterial, KeyError> {
        let mut guard = self
            .derived
            .lock()
            .map_err(|err| KeyError::Derivation(format!("lock poisoned: {err}")))?;

        if let Some(existing) = guard.as_ref() {
            return Ok(existing.clone());
        }

        debug!("deriving settings key from passphrase");
        let material = derive_key(&self.passphrase)?;
        *guard = Some(material.clone());
        Ok(material)
    }
}

/// OS keyring-backed provider. Uses the `keyring` crate to store a random key.
pub struct KeyringProvider {
    service: String,
    account: String,
}

impl KeyringProvider {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }
}

impl KeyProvider for KeyringProvider {
    fn material(&self) -> Result<KeyMaterial, KeyError> {
        let entry = keyring::Entry::new(&self.service, &self.account)
            .map_err(|err| KeyError::Keyring(err.to_string()))?;
        material_from_entry(&entry)
    }
}

/// A new key is only minted when the keyring has no entry; any other failure
/// must not replace the key that encrypts existing settings.
fn material_from_entry(entry: &keyring::Entry) -> Result<KeyMaterial, KeyError> {
    match entry.get_password() {
        Ok(secret) => decode_key(&secret),
        Err(keyring::Error::NoEntry) => {
            let material = generate_key();
            entry
                .set_password(&encode_key(&material))
                .map_err(|e| KeyError::Keyring(e.to_string()))?;
            Ok(material)
        }
        Err(err) => Err(KeyError::Keyring(err.to_string())),
    }
}

/// In-memory key provider for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryKeyProvider {
    inner: Arc<Mutex<Option<KeyMaterial>>>,
}

impl KeyProvider for InMemoryKeyProvider {
    fn material(&self) -> Result<KeyMaterial, KeyError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| KeyError::Generation(format!("lock poisoned: {err}")))?;

        if let Some(existing) = guard.clone() {
            return Ok(existing);
        }

        let material = generate_key();
        *guard = Some(material.clone());
        Ok(material)
    }
}

fn derive_key(passphrase: &str) -> Result<KeyMaterial, KeyError> {
    let mut bytes = [0u8; 32];
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), PASSPHRASE_SALT, &mut bytes)
        .map_err(|e| KeyError::Derivation(e.to_string()))?;
    Ok(KeyMaterial {
        id: "passphrase".to_string(),
        bytes,
    })
}

fn generate_key() -> KeyMaterial {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    KeyMaterial {
        id: "default".to_string(),
        bytes,
    }
}

fn encode_key(material: &KeyMaterial) -> String {
    general_purpose::STANDARD.encode(material.bytes)
}

fn decode_key(secret: &str) -> Result<KeyMaterial, KeyError> {
    let bytes = general_purpose::STANDARD
        .decode(secret)
        .map_err(|e| KeyError::Decode(e.to_string()))?;

    let bytes: [u8; 32] = bytes.try_into().map_err(|raw: Vec<u8>| {
        KeyError::Decode(format!("expected 32 bytes, got {}", raw.len()))
    })?;

    Ok(KeyMaterial {
        id: "default".to_string(),
        bytes,
    })
}
