use std::io::Write;

use color_eyre::{eyre::bail, Result};
use keepsake_core::{SettingHelper, SettingHelperExt, SettingValue};
use tracing::info;

use crate::cli::{Command, ValueKind};

const HEALTH_CHECK_KEY: &str = "__keepsake_health_check";

/// Execute a settings subcommand, writing user-facing output to `out`.
pub fn handle<H: SettingHelper + ?Sized>(
    cmd: Command,
    helper: &mut H,
    out: &mut dyn Write,
) -> Result<()> {
    match cmd {
        Command::List => {
            let names = helper.all_setting_names()?;
            if names.is_empty() {
                writeln!(out, "No settings stored.")?;
            }
            for name in names {
                writeln!(out, "{name}")?;
            }
        }
        Command::Get { name, json } => {
            let Some(value) = helper.get_value(&name)? else {
                bail!("setting not found: {name}");
            };
            if json {
                let value: serde_json::Value = helper.get_object(&name)?;
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            } else {
                writeln!(out, "{value} ({})", value.kind())?;
            }
        }
        Command::Set { kind, name, value } => {
            write_value(helper, kind, &name, &value)?;
            info!(setting = %name, ?kind, "setting written");
            writeln!(out, "Set {name}")?;
        }
        Command::Has { name } => {
            writeln!(out, "{}", helper.has_setting(&name)?)?;
        }
        Command::Remove { name } => {
            if !helper.remove_setting(&name) {
                bail!("failed to remove setting {name}");
            }
            writeln!(out, "Removed {name}")?;
        }
        Command::Clear => {
            helper.remove_all_settings()?;
            writeln!(out, "All settings removed")?;
        }
        Command::Health => {
            run_health(helper)?;
            writeln!(out, "Settings: ok")?;
        }
        Command::Version | Command::Config(_) => {
            bail!("not a settings command")
        }
    }
    Ok(())
}

fn write_value<H: SettingHelper + ?Sized>(
    helper: &mut H,
    kind: ValueKind,
    name: &str,
    raw: &str,
) -> Result<()> {
    if kind == ValueKind::Json {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        helper.set_object(name, &value)?;
        return Ok(());
    }

    match SettingValue::parse(kind.setting_kind(), raw)? {
        SettingValue::Bool(v) => helper.set_bool(name, v)?,
        SettingValue::Int(v) => helper.set_int(name, v)?,
        SettingValue::Float(v) => helper.set_float(name, v)?,
        SettingValue::String(v) => helper.set_string(name, &v)?,
    }
    Ok(())
}

/// Round-trip a marker value through the store, leaving it as it was.
fn run_health<H: SettingHelper + ?Sized>(helper: &mut H) -> Result<()> {
    if !helper.load() {
        bail!("settings store failed to load");
    }
    let existed = helper.save();

    helper.set_string(HEALTH_CHECK_KEY, "ok")?;
    let round_trip = helper.get_string(HEALTH_CHECK_KEY)?;
    if !helper.remove_setting(HEALTH_CHECK_KEY) {
        bail!("failed to remove health check value");
    }
    if !existed && helper.all_setting_names()?.is_empty() {
        helper.remove_all_settings()?;
    }

    if round_trip.as_deref() != Some("ok") {
        bail!("settings round-trip failed");
    }
    Ok(())
}
