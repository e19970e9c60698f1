use axum::{
    body::Body,
    extract::rejection::{JsonRejection, QueryRejection},
    http::{Response, StatusCode},
    response::IntoResponse,
};

/// Every failure a handler can report. The API only distinguishes these statuses;
/// bodies carry nothing but the reason phrase.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed input. The API answers 403 where 400 would be usual.
    #[error("Missing or invalid input")]
    Forbidden,
    #[error("Invalid credentials")]
    Unauthorized,
    #[error("Not found")]
    NotFound,
    #[error("Internal error: {0:?}")]
    Internal(color_eyre::Report),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<color_eyre::Report> for ApiError {
    fn from(report: color_eyre::Report) -> Self {
        Self::Internal(report)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        log::debug!("Rejected JSON body: {}", rejection.body_text());
        Self::Forbidden
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        log::debug!("Rejected query string: {}", rejection.body_text());
        Self::Forbidden
    }
}

/// Bare status response whose body is the canonical reason phrase.
pub fn status_response(status: StatusCode) -> Response<Body> {
    (status, status.canonical_reason().unwrap_or("Error")).into_response()
}

// Tell axum how to convert `ApiError` into a response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response<Body> {
        if let ApiError::Internal(err) = &self {
            log::error!("{err:?}");
        }

        status_response(self.status())
    }
}
