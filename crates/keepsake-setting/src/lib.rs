//! Setting helper that forwards every operation to a [`KeyValueStore`].

use std::path::Path;

use keepsake_core::{
    KeyValueStore, SettingError, SettingHelper, SettingKind, SettingValue, StoreError,
};
use tracing::{debug, instrument, warn};

pub mod config;

pub use config::{open, FileSettingHelper, KeySource, SettingsConfig, SETTINGS_FILE_NAME};

/// Setting helper backed by a key-value store.
///
/// Adds no caching or coordination of its own: each call is one store call.
pub struct StoreSettingHelper<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> StoreSettingHelper<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn lookup(&self, name: &str) -> Result<Option<SettingValue>, SettingError> {
        match self.store.get(name) {
            Ok(value) => Ok(Some(value)),
            Err(StoreError::NotFound { .. }) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn read<T>(
        &self,
        name: &str,
        expected: SettingKind,
        extract: fn(SettingValue) -> Option<T>,
    ) -> Result<Option<T>, SettingError> {
        let Some(value) = self.lookup(name)? else {
            return Ok(None);
        };
        let found = value.kind();
        extract(value)
            .map(Some)
            .ok_or_else(|| SettingError::TypeMismatch {
                name: name.to_string(),
                expected,
                found,
            })
    }

    fn write(&self, name: &str, value: SettingValue) -> Result<(), SettingError> {
        Ok(self.store.put(name, value)?)
    }
}

fn missing(name: &str) -> SettingError {
    SettingError::Missing {
        name: name.to_string(),
    }
}

impl<S: KeyValueStore> SettingHelper for StoreSettingHelper<S> {
    fn count(&self) -> i32 {
        -1
    }

    fn file_path(&self) -> Option<&Path> {
        self.store.location()
    }

    #[instrument(skip(self))]
    fn load(&self) -> bool {
        if !self.store.exists() {
            debug!("no settings file yet; nothing to load");
            return true;
        }

        match self.store.init() {
            Ok(()) => true,
            Err(err) => {
                warn!("load settings failure with error '{err}'");
                false
            }
        }
    }

    fn save(&self) -> bool {
        self.store.exists()
    }

    fn all_setting_names(&self) -> Result<Vec<String>, SettingError> {
        Ok(self.store.keys()?)
    }

    fn has_setting(&self, name: &str) -> Result<bool, SettingError> {
        Ok(self.store.contains(name)?)
    }

    fn get_value(&self, name: &str) -> Result<Option<SettingValue>, SettingError> {
        self.lookup(name)
    }

    fn remove_setting(&mut self, name: &str) -> bool {
        match self.store.delete(name) {
            Ok(()) => true,
            Err(err) => {
                debug!(setting = name, %err, "remove setting failed");
                false
            }
        }
    }

    #[instrument(skip(self))]
    fn remove_all_settings(&mut self) -> Result<(), SettingError> {
        Ok(self.store.delete_all()?)
    }

    fn get_bool(&self, name: &str) -> Result<bool, SettingError> {
        self.read(name, SettingKind::Bool, SettingValue::into_bool)?
            .ok_or_else(|| missing(name))
    }

    fn get_bool_or(&self, name: &str, default: bool) -> Result<bool, SettingError> {
        Ok(self
            .read(name, SettingKind::Bool, SettingValue::into_bool)?
            .unwrap_or(default))
    }

    fn set_bool(&mut self, name: &str, value: bool) -> Result<(), SettingError> {
        self.write(name, SettingValue::Bool(value))
    }

    fn get_int(&self, name: &str) -> Result<i32, SettingError> {
        self.get_int_or(name, 0)
    }

    fn get_int_or(&self, name: &str, default: i32) -> Result<i32, SettingError> {
        Ok(self
            .read(name, SettingKind::Int, SettingValue::into_int)?
            .unwrap_or(default))
    }

    fn set_int(&mut self, name: &str, value: i32) -> Result<(), SettingError> {
        self.write(name, SettingValue::Int(value))
    }

    fn get_float(&self, name: &str) -> Result<f32, SettingError> {
        self.read(name, SettingKind::Float, SettingValue::into_float)?
            .ok_or_else(|| missing(name))
    }

    fn get_float_or(&self, name: &str, default: f32) -> Result<f32, SettingError> {
        Ok(self
            .read(name, SettingKind::Float, SettingValue::into_float)?
            .unwrap_or(default))
    }

    fn set_float(&mut self, name: &str, value: f32) -> Result<(), SettingError> {
        if !value.is_finite() {
            return Err(SettingError::NonFiniteFloat {
                name: name.to_string(),
                value,
            });
        }
        self.write(name, SettingValue::Float(value))
    }

    fn get_string(&self, name: &str) -> Result<Option<String>, SettingError> {
        self.read(name, SettingKind::String, SettingValue::into_string)
    }

    fn get_string_or(&self, name: &str, default: &str) -> Result<String, SettingError> {
        Ok(self
            .get_string(name)?
            .unwrap_or_else(|| default.to_string()))
    }

    fn set_string(&mut self, name: &str, value: &str) -> Result<(), SettingError> {
        self.write(name, SettingValue::String(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use keepsake_core::{InMemoryStore, ObjectRegistry, SettingHelperExt};
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Graphics {
        quality: String,
        vsync: bool,
        resolution: (u32, u32),
    }

    fn helper() -> StoreSettingHelper<InMemoryStore> {
        StoreSettingHelper::new(InMemoryStore::new())
    }

    #[test]
    fn fresh_install_loads_and_falls_back_to_defaults() {
        let helper = helper();
        assert!(helper.load());
        assert!(!helper.has_setting("x").unwrap());
        assert_eq!(helper.get_int_or("x", 7).unwrap(), 7);
        assert!(helper.get_bool_or("x", true).unwrap());
        assert_eq!(helper.get_float_or("x", 2.5).unwrap(), 2.5);
        assert_eq!(helper.get_string_or("x", "fallback").unwrap(), "fallback");
    }

    #[test]
    fn getters_without_default_on_absent_key() {
        let helper = helper();
        assert!(matches!(
            helper.get_bool("x"),
            Err(SettingError::Missing { name }) if name == "x"
        ));
        assert!(matches!(
            helper.get_float("x"),
            Err(SettingError::Missing { .. })
        ));
        assert_eq!(helper.get_int("x").unwrap(), 0);
        assert_eq!(helper.get_string("x").unwrap(), None);
    }

    #[test]
    fn typed_values_round_trip() {
        let mut helper = helper();
        helper.set_bool("fullscreen", true).unwrap();
        helper.set_int("difficulty", -3).unwrap();
        helper.set_float("volume", 0.75).unwrap();
        helper.set_string("language", "en-GB").unwrap();

        assert!(helper.get_bool("fullscreen").unwrap());
        assert_eq!(helper.get_int("difficulty").unwrap(), -3);
        assert_eq!(helper.get_float("volume").unwrap(), 0.75);
        assert_eq!(helper.get_string("language").unwrap().as_deref(), Some("en-GB"));
        assert!(helper.has_setting("volume").unwrap());
    }

    #[test]
    fn non_finite_floats_are_rejected_before_the_store() {
        let mut helper = helper();
        helper.set_int("score", 10).unwrap();

        for value in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = helper.set_float("gamma", value).expect_err("non-finite");
            assert!(matches!(err, SettingError::NonFiniteFloat { name, .. } if name == "gamma"));
        }

        assert!(!helper.has_setting("gamma").unwrap());
        assert_eq!(helper.get_int("score").unwrap(), 10);
    }

    #[test]
    fn get_value_returns_any_kind() {
        let mut helper = helper();
        helper.set_float("volume", 0.5).unwrap();

        assert_eq!(
            helper.get_value("volume").unwrap(),
            Some(SettingValue::Float(0.5))
        );
        assert_eq!(helper.get_value("absent").unwrap(), None);
    }

    #[test]
    fn reading_with_wrong_type_is_a_mismatch() {
        let mut helper = helper();
        helper.set_string("volume", "loud").unwrap();

        let err = helper.get_int_or("volume", 1).expect_err("stored as string");
        assert!(matches!(
            err,
            SettingError::TypeMismatch {
                expected: SettingKind::Int,
                found: SettingKind::String,
                ..
            }
        ));
    }

    #[test]
    fn count_is_untracked() {
        let mut helper = helper();
        helper.set_int("a", 1).unwrap();
        assert_eq!(helper.count(), -1);
        assert_eq!(helper.file_path(), None);
    }

    #[test]
    fn save_reports_file_presence_only() {
        let mut helper = helper();
        assert!(!helper.save());
        helper.set_int("a", 1).unwrap();
        assert!(helper.save());
        helper.remove_all_settings().unwrap();
        assert!(!helper.save());
    }

    #[test]
    fn load_failure_is_reported_not_raised() {
        let helper = StoreSettingHelper::new(InMemoryStore::failing_init());
        assert!(!helper.load());
    }

    #[test]
    fn remove_setting_and_remove_all() {
        let mut helper = helper();
        helper.set_int("a", 1).unwrap();
        helper.set_int("b", 2).unwrap();

        assert!(helper.remove_setting("a"));
        assert!(helper.remove_setting("missing"));
        assert_eq!(helper.all_setting_names().unwrap(), ["b"]);

        helper.remove_all_settings().unwrap();
        assert!(helper.all_setting_names().unwrap().is_empty());
    }

    #[test]
    fn names_append_to_caller_buffer() {
        let mut helper = helper();
        helper.set_int("b", 1).unwrap();
        helper.set_int("c", 1).unwrap();

        let mut names = vec!["a".to_string()];
        helper.all_setting_names_into(&mut names).unwrap();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn objects_round_trip_and_default() {
        let mut helper = helper();
        assert_eq!(
            helper.get_object::<Graphics>("graphics").unwrap(),
            Graphics::default()
        );

        let graphics = Graphics {
            quality: "ultra".into(),
            vsync: true,
            resolution: (2560, 1440),
        };
        helper.set_object("graphics", &graphics).unwrap();
        assert_eq!(helper.get_object::<Graphics>("graphics").unwrap(), graphics);
        assert_eq!(
            helper.get_string("graphics").unwrap().as_deref(),
            Some(r#"{"quality":"ultra","vsync":true,"resolution":[2560,1440]}"#)
        );
    }

    #[test]
    fn blank_object_uses_supplied_default() {
        let mut helper = helper();
        helper.set_string("graphics", "   ").unwrap();

        let fallback = Graphics {
            quality: "low".into(),
            ..Graphics::default()
        };
        assert_eq!(
            helper.get_object_or("graphics", fallback.clone()).unwrap(),
            fallback
        );
        assert_eq!(
            helper.get_object::<Graphics>("graphics").unwrap(),
            Graphics::default()
        );
    }

    #[test]
    fn malformed_object_json_is_an_error() {
        let mut helper = helper();
        helper.set_string("graphics", "{not json").unwrap();
        assert!(matches!(
            helper.get_object::<Graphics>("graphics"),
            Err(SettingError::Json(_))
        ));
    }

    #[test]
    fn registry_backed_object_access() {
        let mut registry = ObjectRegistry::new();
        registry.register::<Graphics>("graphics");

        let mut helper = helper();
        let absent = helper
            .get_object_dyn(&registry, "graphics", "gfx")
            .unwrap();
        assert_eq!(absent.downcast_ref::<Graphics>(), Some(&Graphics::default()));

        let graphics = Graphics {
            quality: "medium".into(),
            vsync: false,
            resolution: (1280, 720),
        };
        helper
            .set_object_dyn(&registry, "graphics", "gfx", &graphics)
            .unwrap();

        let loaded = helper
            .get_object_dyn_or(&registry, "graphics", "gfx", Box::new(Graphics::default()))
            .unwrap();
        assert_eq!(loaded.downcast_ref::<Graphics>(), Some(&graphics));

        let err = helper
            .get_object_dyn(&registry, "audio", "gfx")
            .expect_err("audio is not registered");
        assert!(matches!(err, SettingError::UnregisteredType { .. }));
    }

    #[test]
    fn works_through_trait_object() {
        let mut helper = helper();
        let dynamic: &mut dyn SettingHelper = &mut helper;
        dynamic.set_object("list", &vec![1, 2, 3]).unwrap();
        assert_eq!(dynamic.get_object::<Vec<i32>>("list").unwrap(), [1, 2, 3]);
    }
}
