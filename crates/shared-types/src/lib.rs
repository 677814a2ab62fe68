use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Public projection of a stored user, matching the select column order exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub google_id: String,
}

/// A payload field: the name the validator reports it under and the name
/// clients send it as.
#[derive(Debug, Clone, Copy)]
pub struct SchemaField {
    pub ident: &'static str,
    pub wire_name: &'static str,
}

const fn field(ident: &'static str, wire_name: &'static str) -> SchemaField {
    SchemaField { ident, wire_name }
}

/// A request payload with a declared field order for error reporting.
pub trait Schema: Validate {
    const FIELDS: &'static [SchemaField];
}

/// Schemes an image URL may use.
const URL_SCHEMES: [&str; 3] = ["http", "https", "ftp"];

/// Absolute http(s) or ftp URL with a host.
fn web_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(url)
            if URL_SCHEMES.contains(&url.scheme())
                && url.host_str().is_some_and(|host| !host.is_empty()) =>
        {
            Ok(())
        }
        _ => Err(ValidationError::new("url")),
    }
}

/// The domain part of an address must have at least two labels (`a@b.c`).
fn dotted_domain(value: &str) -> Result<(), ValidationError> {
    let domain = value.rsplit_once('@').map(|(_, domain)| domain).unwrap_or_default();
    let mut labels = domain.split('.');
    let dotted = domain.contains('.') && labels.all(|label| !label.is_empty());

    if dotted {
        Ok(())
    } else {
        Err(ValidationError::new("email"))
    }
}

// Every field is optional on the wire so a missing one surfaces as a
// validation message instead of a deserialization failure.

/// Signup with client-supplied profile fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(required, length(min = 1, code = "required"))]
    pub name: Option<String>,

    #[validate(
        required,
        length(min = 1, code = "required"),
        email,
        custom = "dotted_domain"
    )]
    pub email: Option<String>,

    #[validate(required, length(min = 1, code = "required"), custom = "web_url")]
    pub image_url: Option<String>,

    #[validate(required, length(min = 1, code = "required"))]
    pub google_id: Option<String>,

    #[validate(required, length(min = 1, code = "required"))]
    pub google_token: Option<String>,
}

impl Schema for SignupRequest {
    const FIELDS: &'static [SchemaField] = &[
        field("name", "name"),
        field("email", "email"),
        field("image_url", "imageUrl"),
        field("google_id", "googleId"),
        field("google_token", "googleToken"),
    ];
}

/// Signup where the profile is derived from a Google authorization code.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CodeSignupRequest {
    #[validate(required, length(min = 1, code = "required"))]
    pub google_access_token: Option<String>,
}

impl Schema for CodeSignupRequest {
    const FIELDS: &'static [SchemaField] = &[field("google_access_token", "googleAccessToken")];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(required, length(min = 1, code = "required"))]
    pub google_id: Option<String>,

    #[validate(required, length(min = 1, code = "required"))]
    pub google_token: Option<String>,
}

impl Schema for LoginRequest {
    const FIELDS: &'static [SchemaField] = &[
        field("google_id", "googleId"),
        field("google_token", "googleToken"),
    ];
}

/// Successful signup or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: User,
}

/// Either a single message or the per-field validation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<String>),
}

/// API error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail::Message(message.into()),
            details: None,
        }
    }
}
