//! The setting helper contract: typed access to named, persisted settings.

use std::{any::Any, path::Path};

use serde::{de::DeserializeOwned, Serialize};

use crate::{error::SettingError, registry::ObjectRegistry, setting::SettingValue};

/// Typed facade over a settings store.
///
/// Getters without a default follow the store's lookup rules: `get_bool` and
/// `get_float` fail with [`SettingError::Missing`], `get_int` yields `0` and
/// `get_string` yields `None`.
pub trait SettingHelper {
    /// Number of settings. Not tracked by every helper; `-1` means unknown.
    fn count(&self) -> i32;

    /// Backing file, when the helper persists to one.
    fn file_path(&self) -> Option<&Path>;

    /// Prepare the backing store. Never fails loudly: returns `false` after logging.
    fn load(&self) -> bool;

    /// Report whether settings are persisted.
    fn save(&self) -> bool;

    fn all_setting_names(&self) -> Result<Vec<String>, SettingError>;

    /// Append all setting names to `results`.
    fn all_setting_names_into(&self, results: &mut Vec<String>) -> Result<(), SettingError> {
        results.extend(self.all_setting_names()?);
        Ok(())
    }

    fn has_setting(&self, name: &str) -> Result<bool, SettingError>;

    /// Stored value of any kind; `None` when absent.
    fn get_value(&self, name: &str) -> Result<Option<SettingValue>, SettingError>;

    /// Remove one setting; `false` if the store refused.
    fn remove_setting(&mut self, name: &str) -> bool;

    fn remove_all_settings(&mut self) -> Result<(), SettingError>;

    fn get_bool(&self, name: &str) -> Result<bool, SettingError>;
    fn get_bool_or(&self, name: &str, default: bool) -> Result<bool, SettingError>;
    fn set_bool(&mut self, name: &str, value: bool) -> Result<(), SettingError>;

    fn get_int(&self, name: &str) -> Result<i32, SettingError>;
    fn get_int_or(&self, name: &str, default: i32) -> Result<i32, SettingError>;
    fn set_int(&mut self, name: &str, value: i32) -> Result<(), SettingError>;

    fn get_float(&self, name: &str) -> Result<f32, SettingError>;
    fn get_float_or(&self, name: &str, default: f32) -> Result<f32, SettingError>;
    /// Fails with [`SettingError::NonFiniteFloat`] for NaN or infinities.
    fn set_float(&mut self, name: &str, value: f32) -> Result<(), SettingError>;

    fn get_string(&self, name: &str) -> Result<Option<String>, SettingError>;
    fn get_string_or(&self, name: &str, default: &str) -> Result<String, SettingError>;
    fn set_string(&mut self, name: &str, value: &str) -> Result<(), SettingError>;
}

/// JSON object access layered on the string accessors of any [`SettingHelper`].
///
/// A blank or absent string counts as "no object stored".
pub trait SettingHelperExt: SettingHelper {
    fn get_object<T>(&self, name: &str) -> Result<T, SettingError>
    where
        T: DeserializeOwned + Default,
    {
        match stored_json(self, name)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(T::default()),
        }
    }

    fn get_object_or<T>(&self, name: &str, default: T) -> Result<T, SettingError>
    where
        T: DeserializeOwned,
    {
        match stored_json(self, name)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(default),
        }
    }

    fn set_object<T>(&mut self, name: &str, obj: &T) -> Result<(), SettingError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_string(obj)?;
        self.set_string(name, &json)
    }

    /// Like [`get_object`](Self::get_object) for a type known only by its registered name.
    fn get_object_dyn(
        &self,
        registry: &ObjectRegistry,
        type_name: &str,
        name: &str,
    ) -> Result<Box<dyn Any>, SettingError> {
        match stored_json(self, name)? {
            Some(json) => registry.decode(type_name, &json),
            None => registry.default_value(type_name),
        }
    }

    fn get_object_dyn_or(
        &self,
        registry: &ObjectRegistry,
        type_name: &str,
        name: &str,
        default: Box<dyn Any>,
    ) -> Result<Box<dyn Any>, SettingError> {
        match stored_json(self, name)? {
            Some(json) => registry.decode(type_name, &json),
            None => Ok(default),
        }
    }

    fn set_object_dyn(
        &mut self,
        registry: &ObjectRegistry,
        type_name: &str,
        name: &str,
        obj: &dyn Any,
    ) -> Result<(), SettingError> {
        let json = registry.encode(type_name, obj)?;
        self.set_string(name, &json)
    }
}

impl<H: SettingHelper + ?Sized> SettingHelperExt for H {}

fn stored_json<H: SettingHelper + ?Sized>(
    helper: &H,
    name: &str,
) -> Result<Option<String>, SettingError> {
    Ok(helper
        .get_string(name)?
        .filter(|json| !json.trim().is_empty()))
}
