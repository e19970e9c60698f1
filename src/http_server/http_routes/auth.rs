use std::sync::Arc;

use axum::extract::State;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::http_server::{
    error::{ApiError, ApiResult},
    extract::{JsonBody, required},
    state::AppState,
};
use crate::services::user::UserService;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthRequest {
    pub login: Option<String>,
    pub password: Option<String>,
}

/// Check a login/password pair and return the user's id as plain text.
#[utoipa::path(
    post,
    path = "/auth",
    tag = "user",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Id of the authenticated user", body = String, content_type = "text/plain"),
        (status = 401, description = "No user with these credentials"),
        (status = 403, description = "login or password is missing"),
    )
)]
pub async fn authenticate(
    State(app_state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<AuthRequest>,
) -> ApiResult<String> {
    let login = required(request.login)?;
    let password = required(request.password)?;

    let service = UserService::new(app_state.db.clone());
    match service.authenticate(&login, &password).await? {
        Some(id) => Ok(id.to_string()),
        None => {
            log::info!("Failed login attempt for '{}'", login);
            Err(ApiError::Unauthorized)
        }
    }
}
