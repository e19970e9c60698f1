use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::http_server::{
    error::{ApiError, ApiResult},
    extract::{JsonBody, required},
    state::AppState,
};
use crate::services::file::{Scope, StagedUpload, is_valid_file_id};

/// Multipart form accepted by `POST /file`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// The image to upload
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    scope: Scope,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadedFile {
    pub scope: Scope,
    /// Stored file name, `<id>.<ext>`
    pub id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveFileRequest {
    pub scope: Option<String>,
    /// File id as returned by `POST /file`
    pub id: Option<String>,
}

fn parse_scope(scope: Option<&str>) -> ApiResult<Scope> {
    scope
        .and_then(|s| s.parse().ok())
        .ok_or(ApiError::Forbidden)
}

/// Upload an image and move it into the directory of the given scope.
#[utoipa::path(
    post,
    path = "/file",
    tag = "file",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored", body = UploadedFile),
        (status = 403, description = "No image part or unknown scope"),
    )
)]
pub async fn upload_file(
    State(app_state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadedFile>> {
    let mut multipart = multipart.map_err(|e| {
        log::debug!("Rejected upload: {}", e.body_text());
        ApiError::Forbidden
    })?;

    let mut scope: Option<String> = None;
    let mut staged: Option<StagedUpload> = None;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                log::debug!("Malformed multipart body: {}", e.body_text());
                if let Some(upload) = staged.take() {
                    app_state.files.discard(upload).await;
                }
                return Err(ApiError::Forbidden);
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("scope") => {
                scope = field.text().await.ok();
            }
            Some("file") if staged.is_none() => {
                // Non-image parts are dropped as if no file was sent
                let Some(mime) = field
                    .content_type()
                    .filter(|mime| mime.starts_with("image"))
                    .map(str::to_string)
                else {
                    continue;
                };

                let mut upload = app_state.files.stage(&mime).await?;
                loop {
                    match field.chunk().await {
                        Ok(Some(chunk)) => {
                            if let Err(e) = upload.write_chunk(&chunk).await {
                                app_state.files.discard(upload).await;
                                return Err(e.into());
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            log::debug!("Upload interrupted: {}", e.body_text());
                            app_state.files.discard(upload).await;
                            return Err(ApiError::Forbidden);
                        }
                    }
                }
                staged = Some(upload);
            }
            _ => {}
        }
    }

    let Some(upload) = staged else {
        return Err(ApiError::Forbidden);
    };

    let scope = match parse_scope(scope.as_deref()) {
        Ok(scope) => scope,
        Err(e) => {
            app_state.files.discard(upload).await;
            return Err(e);
        }
    };

    let id = app_state.files.relocate(upload, scope).await;
    Ok(Json(UploadedFile { scope, id }))
}

/// Delete a previously uploaded file. Succeeds even if the file is already gone.
#[utoipa::path(
    post,
    path = "/file/remove",
    tag = "file",
    request_body = RemoveFileRequest,
    responses(
        (status = 200, description = "File removed (or was not there)"),
        (status = 403, description = "Unknown scope or missing id"),
    )
)]
pub async fn remove_file(
    State(app_state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<RemoveFileRequest>,
) -> ApiResult<StatusCode> {
    let scope = parse_scope(request.scope.as_deref())?;
    let id = required(request.id)?;
    if !is_valid_file_id(&id) {
        return Err(ApiError::Forbidden);
    }

    app_state.files.remove(scope, &id).await;
    Ok(StatusCode::OK)
}
