use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind tag of a stored setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingKind {
    Bool,
    Int,
    Float,
    String,
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SettingKind::Bool => "bool",
            SettingKind::Int => "int",
            SettingKind::Float => "float",
            SettingKind::String => "string",
        };
        f.write_str(label)
    }
}

/// A typed setting value as persisted by a store.
///
/// Objects are not a separate variant: they are JSON-encoded and kept as
/// [`SettingValue::String`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SettingValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
}

/// Failure to turn free-form text into a [`SettingValue`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot parse {input:?} as {kind}")]
pub struct ParseValueError {
    pub kind: SettingKind,
    pub input: String,
}

impl SettingValue {
    /// Whether the value survives JSON persistence; NaN and infinities do not.
    pub fn is_storable(&self) -> bool {
        match self {
            SettingValue::Float(v) => v.is_finite(),
            _ => true,
        }
    }

    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Bool(_) => SettingKind::Bool,
            SettingValue::Int(_) => SettingKind::Int,
            SettingValue::Float(_) => SettingKind::Float,
            SettingValue::String(_) => SettingKind::String,
        }
    }

    pub fn into_bool(self) -> Option<bool> {
        match self {
            SettingValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_int(self) -> Option<i32> {
        match self {
            SettingValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_float(self) -> Option<f32> {
        match self {
            SettingValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            SettingValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Parse user-supplied text (e.g. a CLI argument) as a value of `kind`.
    pub fn parse(kind: SettingKind, input: &str) -> Result<Self, ParseValueError> {
        let err = || ParseValueError {
            kind,
            input: input.to_string(),
        };
        let trimmed = input.trim();
        match kind {
            SettingKind::Bool => trimmed.parse().map(SettingValue::Bool).map_err(|_| err()),
            SettingKind::Int => trimmed.parse().map(SettingValue::Int).map_err(|_| err()),
            SettingKind::Float => trimmed
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(SettingValue::Float)
                .ok_or_else(err),
            SettingKind::String => Ok(SettingValue::String(input.to_string())),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(v) => write!(f, "{v}"),
            SettingValue::Int(v) => write!(f, "{v}"),
            SettingValue::Float(v) => write!(f, "{v}"),
            SettingValue::String(v) => f.write_str(v),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        SettingValue::Int(value)
    }
}

impl From<f32> for SettingValue {
    fn from(value: f32) -> Self {
        SettingValue::Float(value)
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::String(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}
