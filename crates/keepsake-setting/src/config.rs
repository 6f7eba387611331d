use std::path::{Path, PathBuf};

use keepsake_storage::{
    encrypted_file_store::EncryptedFileStore,
    key_provider::{KeyProvider, KeyringProvider, PassphraseKeyProvider, DEFAULT_PASSPHRASE},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::StoreSettingHelper;

/// File name of the settings store inside the data directory.
pub const SETTINGS_FILE_NAME: &str = "KeepsakeSetting.sav";

const KEYRING_SERVICE: &str = "keepsake";
const KEYRING_ACCOUNT: &str = "settings-key";

/// Where the settings encryption key comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum KeySource {
    Passphrase { passphrase: String },
    Keyring { service: String, account: String },
}

impl KeySource {
    pub fn keyring() -> Self {
        KeySource::Keyring {
            service: KEYRING_SERVICE.to_string(),
            account: KEYRING_ACCOUNT.to_string(),
        }
    }

    fn provider(&self) -> Box<dyn KeyProvider> {
        match self {
            KeySource::Passphrase { passphrase } => {
                Box::new(PassphraseKeyProvider::new(passphrase.clone()))
            }
            KeySource::Keyring { service, account } => {
                Box::new(KeyringProvider::new(service.clone(), account.clone()))
            }
        }
    }
}

impl Default for KeySource {
    fn default() -> Self {
        KeySource::Passphrase {
            passphrase: DEFAULT_PASSPHRASE.to_string(),
        }
    }
}

/// Everything needed to open the settings store. Built once at startup and
/// handed to whoever needs settings access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsConfig {
    pub file_path: PathBuf,
    pub key: KeySource,
}

impl SettingsConfig {
    pub fn new(file_path: impl Into<PathBuf>, key: KeySource) -> Self {
        Self {
            file_path: file_path.into(),
            key,
        }
    }

    /// Settings file with the standard name inside `dir`, default passphrase.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(SETTINGS_FILE_NAME), KeySource::default())
    }
}

/// Helper over the encrypted file store described by `config`.
pub type FileSettingHelper = StoreSettingHelper<EncryptedFileStore<Box<dyn KeyProvider>>>;

/// Build the encrypted settings helper for `config`. Nothing touches disk until first use.
pub fn open(config: &SettingsConfig) -> FileSettingHelper {
    debug!(path = ?config.file_path, "opening settings store");
    StoreSettingHelper::new(EncryptedFileStore::new(
        config.file_path.clone(),
        config.key.provider(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_dir_uses_fixed_file_name() {
        let config = SettingsConfig::in_dir("/data/app");
        assert_eq!(
            config.file_path,
            PathBuf::from("/data/app").join(SETTINGS_FILE_NAME)
        );
        assert_eq!(config.key, KeySource::default());
    }

    #[test]
    fn open_does_not_create_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = SettingsConfig::in_dir(dir.path());
        let helper = open(&config);

        assert_eq!(helper.store().path(), config.file_path.as_path());
        assert!(!config.file_path.exists());
    }
}
