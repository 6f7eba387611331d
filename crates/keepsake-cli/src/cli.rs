use clap::{Parser, Subcommand, ValueEnum};
use keepsake_core::SettingKind;

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "keepsake",
    about = "Inspect and edit an encrypted settings file",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List all setting names.
    List,
    /// Print the value of a setting.
    Get {
        name: String,
        /// Decode the stored string as JSON and pretty-print it.
        #[arg(long)]
        json: bool,
    },
    /// Write a setting.
    Set {
        #[arg(value_enum)]
        kind: ValueKind,
        name: String,
        value: String,
    },
    /// Check whether a setting exists.
    Has { name: String },
    /// Remove one setting.
    Remove { name: String },
    /// Delete the settings file.
    Clear,
    /// Run a health check against the settings store.
    Health,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

/// Value kinds accepted by `set`; `json` is stored as a string.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    String,
    Json,
}

impl ValueKind {
    /// Storage kind backing this value kind.
    pub fn setting_kind(self) -> SettingKind {
        match self {
            ValueKind::Bool => SettingKind::Bool,
            ValueKind::Int => SettingKind::Int,
            ValueKind::Float => SettingKind::Float,
            ValueKind::String | ValueKind::Json => SettingKind::String,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_subcommand() {
        let cli = Cli::try_parse_from(["keepsake", "list"]).expect("parse should succeed");
        assert_eq!(cli.command, Command::List);
    }

    #[test]
    fn requires_subcommand() {
        assert!(Cli::try_parse_from(["keepsake"]).is_err());
    }

    #[test]
    fn parses_typed_set() {
        let cli = Cli::try_parse_from(["keepsake", "set", "float", "volume", "0.5"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Command::Set {
                kind: ValueKind::Float,
                name: "volume".into(),
                value: "0.5".into(),
            }
        );
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["keepsake", "set", "date", "x", "1"]).is_err());
    }

    #[test]
    fn parses_get_with_json_flag() {
        let cli = Cli::try_parse_from(["keepsake", "get", "profile", "--json"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Command::Get {
                name: "profile".into(),
                json: true,
            }
        );
    }

    #[test]
    fn parses_config_init_subcommand() {
        let cli =
            Cli::try_parse_from(["keepsake", "config", "init"]).expect("parse should succeed");
        assert_eq!(cli.command, Command::Config(ConfigCommand::Init));
    }

    #[test]
    fn json_is_stored_as_string() {
        assert_eq!(ValueKind::Json.setting_kind(), SettingKind::String);
    }
}
