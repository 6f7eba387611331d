//! Core abstractions for Keepsake: the setting value model, the key-value store
//! contract and the setting helper contract built on top of it.
//! This crate is intentionally small to keep dependency surface minimal.

pub mod error;
pub mod helper;
pub mod registry;
pub mod setting;
pub mod store;

pub use error::SettingError;
pub use helper::{SettingHelper, SettingHelperExt};
pub use registry::ObjectRegistry;
pub use setting::{SettingKind, SettingValue};
pub use store::{InMemoryStore, KeyValueStore, StoreError};
