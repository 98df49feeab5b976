//! Strict decoding of rendered documents.
//!
//! Rendered YAML is first converted to JSON, then deserialized into the target
//! type. Any field present in the document but unknown to the target type is
//! a hard error: this is what certifies that a template's output matches the
//! declared schema exactly, catching typos and schema drift.
//!
//! ```rust
//! use helmet::decode::{decode_strict, DecodeError};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Spec {
//!     image: String,
//! }
//!
//! let spec: Spec = decode_strict("image: nginx").unwrap();
//! assert_eq!(spec.image, "nginx");
//!
//! let err = decode_strict::<Spec>("image: nginx\nreplicas: 2").unwrap_err();
//! assert!(matches!(err, DecodeError::UnknownFields { .. }));
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::BoxError;

/// Errors raised while decoding a document.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The document is not valid YAML.
    #[error("failed to convert document from YAML to JSON: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document has fields the target type does not declare.
    #[error("unknown field {}", quoted(.fields))]
    UnknownFields { fields: Vec<String> },

    /// A field has the wrong type or shape.
    #[error("invalid value at {path}: {source}")]
    Invalid {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The blueprint value could not be serialized.
    #[error("failed to serialize blueprint: {0}")]
    Blueprint(#[source] serde_json::Error),

    /// Failure reported by a custom unmarshal hook.
    #[error("{0}")]
    Custom(BoxError),
}

impl DecodeError {
    /// Wraps an arbitrary error from a custom unmarshal hook.
    pub fn custom(err: impl Into<BoxError>) -> Self {
        DecodeError::Custom(err.into())
    }
}

/// Converts a YAML document to its JSON value.
///
/// Empty documents become `null`.
pub fn yaml_to_json(document: &str) -> Result<Value, DecodeError> {
    if document.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_yaml::from_str(document)?)
}

/// Decodes a YAML document into `T`, rejecting unknown fields.
///
/// An empty or `null` document yields the zero value of `T`: whatever `T`
/// decodes from `null` (`None`, `()`), otherwise `T` decoded from an empty
/// record, so types whose fields all have serde defaults come back default.
pub fn decode_strict<T: DeserializeOwned>(document: &str) -> Result<T, DecodeError> {
    match yaml_to_json(document)? {
        Value::Null => decode_empty(),
        value => decode_value(value),
    }
}

fn decode_empty<T: DeserializeOwned>() -> Result<T, DecodeError> {
    T::deserialize(Value::Null).or_else(|_| decode_value(Value::Object(Map::new())))
}

/// Decodes a YAML document over a copy of `blueprint`.
///
/// The blueprint is serialized and the document is merged over it: records
/// merge key by key, every other value is replaced. Fields set on the
/// blueprint but absent from the document therefore survive. The blueprint
/// itself is never modified.
pub fn decode_into<T>(document: &str, blueprint: &T) -> Result<T, DecodeError>
where
    T: Serialize + DeserializeOwned,
{
    let mut base = serde_json::to_value(blueprint).map_err(DecodeError::Blueprint)?;
    overlay(&mut base, yaml_to_json(document)?);
    decode_value(base)
}

/// Default unmarshal step: [`decode_into`] with a blueprint, [`decode_strict`]
/// without.
pub fn decode_document<T>(document: &str, blueprint: Option<&T>) -> Result<T, DecodeError>
where
    T: Serialize + DeserializeOwned,
{
    match blueprint {
        Some(blueprint) => decode_into(document, blueprint),
        None => decode_strict(document),
    }
}

/// Deserializes a JSON value into `T`, rejecting unknown fields.
pub fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, DecodeError> {
    let mut unknown = Vec::new();
    let mut record = |path: serde_ignored::Path| unknown.push(path.to_string());
    let tracked = serde_ignored::Deserializer::new(value, &mut record);

    let decoded: T = serde_path_to_error::deserialize(tracked).map_err(|err| {
        let path = err.path().to_string();
        DecodeError::Invalid {
            path,
            source: err.into_inner(),
        }
    })?;

    if unknown.is_empty() {
        Ok(decoded)
    } else {
        Err(DecodeError::UnknownFields { fields: unknown })
    }
}

fn overlay(base: &mut Value, document: Value) {
    match (base, document) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(document)) => {
            for (key, value) in document {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, document) => *base = document,
    }
}

fn quoted(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("{:?}", f))
        .collect::<Vec<_>>()
        .join(", ")
}
