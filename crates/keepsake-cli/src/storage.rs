use std::path::PathBuf;

use color_eyre::Result;
use dirs::data_dir;
use keepsake_setting::{SettingsConfig, SETTINGS_FILE_NAME};
use tracing::debug;

use crate::config::Config;

/// Resolve the default data directory for Keepsake.
pub fn default_data_dir() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| color_eyre::eyre::eyre!("no data dir available"))?;
    Ok(base.join("keepsake"))
}

/// Build the settings store configuration, applying config overrides.
pub fn settings_from_config(config: &Config) -> Result<SettingsConfig> {
    let file_path = match &config.settings_file {
        Some(path) => {
            debug!(?path, "using settings file (config override)");
            path.clone()
        }
        None => default_data_dir()?.join(SETTINGS_FILE_NAME),
    };
    Ok(SettingsConfig::new(
        file_path,
        config.key.clone().unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use keepsake_setting::KeySource;

    use super::*;

    #[test]
    fn override_path_and_key_are_used() {
        let config = Config {
            settings_file: Some(PathBuf::from("/tmp/custom.sav")),
            key: Some(KeySource::keyring()),
        };
        let settings = settings_from_config(&config).expect("resolve");
        assert_eq!(settings.file_path, PathBuf::from("/tmp/custom.sav"));
        assert_eq!(settings.key, KeySource::keyring());
    }

    #[test]
    fn defaults_to_fixed_file_name_and_builtin_passphrase() {
        let Ok(settings) = settings_from_config(&Config::default()) else {
            // No data dir on this platform (e.g. minimal CI containers).
            return;
        };
        assert!(settings.file_path.ends_with(SETTINGS_FILE_NAME));
        assert_eq!(settings.key, KeySource::default());
    }
}
