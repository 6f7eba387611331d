//! Serialization registry for callers that only know an object's type at runtime.
//!
//! Each entry maps a type name to JSON encode/decode functions and a default
//! constructor, all monomorphized at registration time.

use std::{any::Any, collections::BTreeMap};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::SettingError;

type DecodeFn = fn(&str) -> Result<Box<dyn Any>, serde_json::Error>;
type EncodeFn = fn(&dyn Any) -> Option<Result<String, serde_json::Error>>;
type DefaultFn = fn() -> Box<dyn Any>;

#[derive(Clone, Copy)]
struct Codec {
    decode: DecodeFn,
    encode: EncodeFn,
    default: DefaultFn,
}

/// Type-name keyed JSON codecs.
#[derive(Clone, Default)]
pub struct ObjectRegistry {
    codecs: BTreeMap<String, Codec>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `type_name`, replacing any previous codec for that name.
    pub fn register<T>(&mut self, type_name: impl Into<String>) -> &mut Self
    where
        T: Serialize + DeserializeOwned + Default + 'static,
    {
        self.codecs.insert(
            type_name.into(),
            Codec {
                decode: decode_as::<T>,
                encode: encode_as::<T>,
                default: default_of::<T>,
            },
        );
        self
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.codecs.contains_key(type_name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.codecs.keys().map(String::as_str)
    }

    pub fn decode(&self, type_name: &str, json: &str) -> Result<Box<dyn Any>, SettingError> {
        let codec = self.codec(type_name)?;
        Ok((codec.decode)(json)?)
    }

    pub fn encode(&self, type_name: &str, value: &dyn Any) -> Result<String, SettingError> {
        let codec = self.codec(type_name)?;
        match (codec.encode)(value) {
            Some(encoded) => Ok(encoded?),
            None => Err(SettingError::TypeConflict {
                type_name: type_name.to_string(),
            }),
        }
    }

    pub fn default_value(&self, type_name: &str) -> Result<Box<dyn Any>, SettingError> {
        Ok((self.codec(type_name)?.default)())
    }

    fn codec(&self, type_name: &str) -> Result<&Codec, SettingError> {
        self.codecs
            .get(type_name)
            .ok_or_else(|| SettingError::UnregisteredType {
                type_name: type_name.to_string(),
            })
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("types", &self.codecs.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn decode_as<T: DeserializeOwned + 'static>(
    json: &str,
) -> Result<Box<dyn Any>, serde_json::Error> {
    let value: T = serde_json::from_str(json)?;
    Ok(Box::new(value))
}

fn encode_as<T: Serialize + 'static>(
    value: &dyn Any,
) -> Option<Result<String, serde_json::Error>> {
    value.downcast_ref::<T>().map(serde_json::to_string)
}

fn default_of<T: Default + 'static>() -> Box<dyn Any> {
    Box::new(T::default())
}
