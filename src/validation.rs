//! Request validation: custom field rules for `validator`, conversion of
//! failures into the 422 envelope, and the `ValidatedJson` extractor.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::database::MessageTarget;
use crate::error::{ApiError, FieldErrors};

pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*";

pub fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

pub fn contains_uppercase(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_uppercase) {
        return Ok(());
    }
    Err(ValidationError::new("contains_uppercase"))
}

pub fn contains_lowercase(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_lowercase) {
        return Ok(());
    }
    Err(ValidationError::new("contains_lowercase"))
}

pub fn contains_number(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_numeric) {
        return Ok(());
    }
    Err(ValidationError::new("contains_number"))
}

pub fn contains_special(value: &str) -> Result<(), ValidationError> {
    if value.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
        return Ok(());
    }
    Err(ValidationError::new("contains_special"))
}

/// Letters and digits from any script.
pub fn alphanumeric_unicode(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(char::is_alphanumeric) {
        return Ok(());
    }
    Err(ValidationError::new("alphanumeric_unicode"))
}

/// Non-blank, with an uppercase letter, a lowercase letter, a digit and a special character.
pub fn strong_password(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    contains_uppercase(value)?;
    contains_lowercase(value)?;
    contains_number(value)?;
    contains_special(value)
}

pub fn username_characters(value: &str) -> Result<(), ValidationError> {
    required(value)?;
    alphanumeric_unicode(value)
}

fn param_u64(error: &ValidationError, name: &str) -> Option<u64> {
    error.params.get(name).and_then(|v| v.as_u64())
}

fn length_message(field: &str, error: &ValidationError) -> String {
    let len = error
        .params
        .get("value")
        .and_then(|v| v.as_str())
        .map(|s| s.chars().count() as u64);

    match (param_u64(error, "min"), param_u64(error, "max"), len) {
        (Some(min), _, Some(len)) if len < min => format!("{field} must be at least {min} characters"),
        (_, Some(max), Some(len)) if len > max => format!("{field} must be at most {max} characters"),
        (Some(min), None, _) => format!("{field} must be at least {min} characters"),
        (None, Some(max), _) => format!("{field} must be at most {max} characters"),
        _ => format!("{field} has an invalid length"),
    }
}

/// Human-readable message for one failed rule.
pub fn message_for(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    match error.code.as_ref() {
        "required" => format!("{field} is required"),
        "email" => format!("{field} must be a valid email"),
        "length" => length_message(field, error),
        "contains_uppercase" => format!("{field} must contain at least one uppercase letter"),
        "contains_lowercase" => format!("{field} must contain at least one lowercase letter"),
        "contains_number" => format!("{field} must contain at least one number"),
        "contains_special" => format!("{field} must contain at least one special character ({SPECIAL_CHARACTERS})"),
        "alphanumeric_unicode" => format!("{field} must contain only letters and numbers"),
        _ => format!("{field} is invalid"),
    }
}

fn precedence(error: &ValidationError) -> u8 {
    match error.code.as_ref() {
        "required" => 0,
        "email" => 1,
        "length" => 2,
        _ => 3,
    }
}

/// One message per field: `required`, then email syntax, then length, then other format rules.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, failures)| {
            let chosen = failures.iter().min_by_key(|e| precedence(e))?;
            Some((field.to_string(), message_for(field, chosen)))
        })
        .collect()
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation_failed(field_errors(&errors))
    }
}

/// `null` decodes like a missing field, so the `required` rule reports it.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Cross-field rule: exactly one of `room_id` / `receiver_id`.
pub fn exactly_one_target(room_id: Option<i64>, receiver_id: Option<i64>) -> Result<MessageTarget, ApiError> {
    let message = match (room_id, receiver_id) {
        (Some(room_id), None) => return Ok(MessageTarget::Room(room_id)),
        (None, Some(receiver_id)) => return Ok(MessageTarget::Direct(receiver_id)),
        (None, None) => "either room_id or receiver_id must be provided",
        (Some(_), Some(_)) => "only one of room_id or receiver_id must be provided",
    };
    let mut errors = FieldErrors::new();
    errors.insert("room_id".to_string(), message.to_string());
    errors.insert("receiver_id".to_string(), message.to_string());
    Err(ApiError::validation_failed(errors))
}

/// JSON body that has passed its field rules. Undecodable bodies are a 400,
/// rule failures a 422.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(error = %rejection, "Rejected request body");
            ApiError::bad_request("Invalid request body")
        })?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
