use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Deserializer, de::IgnoredAny};

use crate::http_server::error::ApiError;

/// JSON body whose rejection is reported as [`ApiError::Forbidden`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// Query string whose rejection is reported as [`ApiError::Forbidden`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// Accepts ids sent as numbers (`5`) or numeric strings (`"5"`).
/// Anything else deserializes to `None` and is handled as a missing field.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Number(id)) => Some(id),
        Some(RawId::Text(text)) => text.trim().parse().ok(),
        Some(RawId::Other(_)) | None => None,
    })
}

/// A present, non-empty string field.
pub fn required(value: Option<String>) -> Result<String, ApiError> {
    value.filter(|v| !v.is_empty()).ok_or(ApiError::Forbidden)
}

pub fn required_id(value: Option<i64>) -> Result<i64, ApiError> {
    value.ok_or(ApiError::Forbidden)
}
