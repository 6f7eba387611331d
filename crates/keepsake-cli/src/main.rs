mod cli;
mod commands;
mod config;
mod storage;

use std::io;

use clap::Parser;
use color_eyre::Result;
use keepsake_core::SettingHelper;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Command, ConfigCommand};

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    dispatch(cli.command, config::load)
}

/// `load_config` only runs for commands that read configuration.
fn dispatch(cmd: Command, load_config: impl FnOnce() -> Result<config::Config>) -> Result<()> {
    match cmd {
        Command::Version => print_version(),
        Command::Config(ConfigCommand::Init) => init_config(&load_config()?)?,
        cmd => run_settings_command(cmd, &load_config()?)?,
    }
    Ok(())
}

fn init_tracing() {
    // RUST_LOG wins, default info. Logs go to stderr, command output to stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("keepsake {}", env!("CARGO_PKG_VERSION"));
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

fn run_settings_command(cmd: Command, config: &config::Config) -> Result<()> {
    let settings = storage::settings_from_config(config)?;
    let mut helper = keepsake_setting::open(&settings);

    // `health` reports load failures itself; `clear` must work on unreadable files.
    if !matches!(cmd, Command::Health | Command::Clear) && !helper.load() {
        warn!(path = ?settings.file_path, "settings file could not be opened");
        color_eyre::eyre::bail!(
            "cannot open settings file {}",
            settings.file_path.display()
        );
    }

    let stdout = io::stdout();
    commands::handle(cmd, &mut helper, &mut stdout.lock())
}
