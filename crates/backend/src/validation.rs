//! Payload parsing and validation.
//!
//! Schemas are declared with `validator` on the request types in
//! `shared_types`. Its error map is unordered, so the result is rebuilt in
//! the schema's declared field order with one message per field.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared_types::{Schema, SchemaField};
use validator::{ValidationError, ValidationErrors};

use crate::error::{ApiError, ApiResult};

/// Read a JSON object body into a payload and validate it.
///
/// An empty body reads as `{}`. Numbers and booleans in string fields are
/// taken as their text; arrays and objects there are reported per field
/// alongside every other violation. Bodies that are not a JSON object are
/// a parse error.
pub fn read_payload<T: Schema + DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    let mut object = if body.iter().all(u8::is_ascii_whitespace) {
        Map::new()
    } else {
        serde_json::from_slice::<Map<String, Value>>(body)?
    };

    let mistyped = coerce_to_strings(&mut object, T::FIELDS);
    let payload: T = serde_json::from_value(Value::Object(object))?;
    check_fields(&payload, &mistyped)?;

    Ok(payload)
}

/// Rewrite scalar field values as strings. Returns the fields holding an
/// array or object, which are cleared.
fn coerce_to_strings(object: &mut Map<String, Value>, fields: &[SchemaField]) -> Vec<&'static str> {
    let mut mistyped = Vec::new();

    for field in fields {
        let coerced = match object.get(field.wire_name) {
            Some(Value::Number(n)) => Value::String(n.to_string()),
            Some(Value::Bool(b)) => Value::String(b.to_string()),
            Some(Value::Array(_)) | Some(Value::Object(_)) => {
                mistyped.push(field.wire_name);
                Value::Null
            }
            _ => continue,
        };
        object.insert(field.wire_name.to_string(), coerced);
    }

    mistyped
}

/// Validate a payload, collecting every violated field before returning.
fn check_fields<T: Schema>(payload: &T, mistyped: &[&str]) -> ApiResult<()> {
    let errors = payload.validate().err();
    if errors.is_none() && mistyped.is_empty() {
        return Ok(());
    }

    Err(ApiError::Validation(ordered_messages(
        errors.as_ref(),
        T::FIELDS,
        mistyped,
    )))
}

fn ordered_messages(
    errors: Option<&ValidationErrors>,
    fields: &[SchemaField],
    mistyped: &[&str],
) -> Vec<String> {
    let by_field = errors.map(ValidationErrors::field_errors).unwrap_or_default();

    fields
        .iter()
        .filter_map(|field| {
            if mistyped.contains(&field.wire_name) {
                return Some(format!("{} must be a `string` type", field.wire_name));
            }

            let field_errors = by_field
                .get(field.ident)
                .or_else(|| by_field.get(field.wire_name))?;
            // A missing value also fails its format checks; report it once, as missing
            let error = field_errors
                .iter()
                .find(|e| e.code == "required")
                .or_else(|| field_errors.first())?;
            Some(message_for(field.wire_name, error))
        })
        .collect()
}

fn message_for(field: &str, error: &ValidationError) -> String {
    match error.code.as_ref() {
        "required" => format!("{} is a required field", field),
        "email" => format!("{} must be a valid email", field),
        "url" => format!("{} must be a valid URL", field),
        _ => format!("{} is invalid", field),
    }
}
