//! Exact key-set validation for JSON request bodies.
//!
//! A [`KeySchema`] accepts a body only when every required field is present
//! and no field outside the schema appears. Failures are reported per field so
//! callers can attach them to a `400` response.

use axum::{extract::rejection::JsonRejection, Json};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Pseudo field name used for problems with the body as a whole.
pub const BODY_FIELD: &str = "$body";

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            reason: "missing".to_string(),
        }
    }

    pub fn unexpected(field: &str) -> Self {
        Self {
            field: field.to_string(),
            reason: "unexpected".to_string(),
        }
    }

    pub fn body(reason: impl Into<String>) -> Self {
        Self {
            field: BODY_FIELD.to_string(),
            reason: reason.into(),
        }
    }
}

/// Declared field names of a JSON object body.
#[derive(Debug, Clone, Copy)]
pub struct KeySchema {
    required: &'static [&'static str],
    optional: &'static [&'static str],
}

impl KeySchema {
    /// Schema whose key set must equal `required` exactly.
    pub const fn exact(required: &'static [&'static str]) -> Self {
        Self {
            required,
            optional: &[],
        }
    }

    /// Additionally tolerate `optional` keys.
    pub const fn with_optional(self, optional: &'static [&'static str]) -> Self {
        Self {
            required: self.required,
            optional,
        }
    }

    fn allows(&self, key: &str) -> bool {
        self.required
            .iter()
            .chain(self.optional)
            .any(|field| *field == key)
    }

    /// Compare the key set of `object` against the schema.
    pub fn check(&self, object: &Map<String, Value>) -> Result<(), Vec<FieldError>> {
        let mut errors: Vec<FieldError> = self
            .required
            .iter()
            .filter(|field| !object.contains_key(**field))
            .map(|field| FieldError::missing(field))
            .collect();

        errors.extend(
            object
                .keys()
                .filter(|key| !self.allows(key))
                .map(|key| FieldError::unexpected(key)),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Check the key set of an extracted JSON body, then deserialize it.
    ///
    /// Takes the extractor result directly so a malformed body is reported
    /// the same way as a wrong key set.
    pub fn parse<T: DeserializeOwned>(
        &self,
        payload: Result<Json<Value>, JsonRejection>,
    ) -> Result<T, Vec<FieldError>> {
        let Json(value) = payload.map_err(|rejection| vec![FieldError::body(rejection.body_text())])?;

        let Value::Object(object) = value else {
            return Err(vec![FieldError::body("expected a JSON object")]);
        };

        self.check(&object)?;

        serde_json::from_value(Value::Object(object))
            .map_err(|err| vec![FieldError::body(err.to_string())])
    }
}
