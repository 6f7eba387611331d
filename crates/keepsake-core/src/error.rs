use thiserror::Error;

use crate::{setting::SettingKind, store::StoreError};

/// Errors surfaced by setting helpers.
#[derive(Debug, Error)]
pub enum SettingError {
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Setting is absent and the accessor has no default to fall back on.
    #[error("setting not found: {name}")]
    Missing { name: String },
    #[error("setting {name} holds a {found} value, expected {expected}")]
    TypeMismatch {
        name: String,
        expected: SettingKind,
        found: SettingKind,
    },
    /// NaN and infinities have no JSON form and would make the store unreadable.
    #[error("setting {name} cannot store non-finite float {value}")]
    NonFiniteFloat { name: String, value: f32 },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no codec registered for type {type_name}")]
    UnregisteredType { type_name: String },
    /// Value handed to the registry is not the type registered under that name.
    #[error("value is not of registered type {type_name}")]
    TypeConflict { type_name: String },
}
