use std::error::Error as StdError;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{FromRef, PathItem, Ref, RefError, RefType, Spec};

/// Map of possible out-of-band callbacks related to the parent operation.
///
/// Each value in the map is a [`PathItem`] that describes a set of requests that may be
/// initiated by the API provider and the expected responses.
///
/// NB: this structure is flattened when serializing and unflattened when deserializing in order
/// to support spec extensions; `paths` is a synthetic property within the data tree that
/// comprises an OpenAPI document.
///
/// See <https://spec.openapis.org/oas/v3.2.0#callback-object>.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "CallbackSerde", into = "CallbackSerde")]
pub struct Callback {
    /// Map of [`PathItem`]s describing provider-initiated requests.
    ///
    /// The key used to identify the Path Item Object is an expression, evaluated at runtime,
    /// that identifies a URL to use for the callback operation.
    pub paths: IndexMap<String, PathItem>,

    /// Specification extensions.
    ///
    /// Only "x-" prefixed keys are collected, and the prefix is stripped.
    pub extensions: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(transparent)]
struct CallbackSerde(serde_json::Map<String, serde_json::Value>);

impl TryFrom<CallbackSerde> for Callback {
    type Error = Box<dyn StdError>;

    fn try_from(CallbackSerde(map): CallbackSerde) -> Result<Self, Self::Error> {
        let mut paths = IndexMap::new();
        let mut extensions = IndexMap::new();

        for (key, value) in map {
            match key.strip_prefix("x-") {
                Some(ext_key) => {
                    extensions.insert(ext_key.to_owned(), value);
                }
                None => {
                    paths.insert(key, serde_json::from_value(value)?);
                }
            }
        }

        Ok(Self { paths, extensions })
    }
}

impl From<Callback> for CallbackSerde {
    fn from(val: Callback) -> Self {
        let Callback { paths, extensions } = val;

        CallbackSerde(
            paths
                .into_iter()
                .map(|(key, val)| {
                    (
                        key,
                        serde_json::to_value(val).expect("path item serialization should not fail"),
                    )
                })
                .chain(
                    extensions
                        .into_iter()
                        .map(|(key, val)| (format!("x-{key}"), val)),
                )
                .collect(),
        )
    }
}

impl FromRef for Callback {
    fn from_ref(spec: &Spec, path: &str) -> Result<Self, RefError> {
        let refpath = path.parse::<Ref>()?;

        match refpath.kind {
            RefType::Callback => spec
                .components
                .as_ref()
                .and_then(|cs| cs.callbacks.get(&refpath.name))
                .ok_or_else(|| RefError::Unresolvable(path.to_owned()))
                .and_then(|oor| oor.resolve(spec)),

            _ => Err(RefError::MismatchedType(refpath.kind, RefType::Callback)),
        }
    }
}
