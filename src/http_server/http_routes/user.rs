use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::http_server::{
    error::{ApiError, ApiResult},
    extract::{JsonBody, QueryParams, lenient_id, required, required_id},
    http_routes::playlist::PlaylistSummary,
    state::AppState,
};
use crate::services::{LinkOutcome, user::UserService};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// User id
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub username: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub login: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
    /// File id of an uploaded avatar
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPlaylistRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    #[schema(value_type = i64)]
    pub user_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    #[schema(value_type = i64)]
    pub playlist_id: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/user",
    tag = "user",
    params(UserQuery),
    responses(
        (status = 200, description = "Public profile of the user", body = UserProfile),
        (status = 403, description = "id is missing"),
        (status = 404, description = "No user with this id"),
    )
)]
pub async fn get_user(
    State(app_state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<UserQuery>,
) -> ApiResult<Json<UserProfile>> {
    let id = required_id(query.id)?;

    let user = UserService::new(app_state.db.clone())
        .get(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(UserProfile {
        username: user.username,
        avatar: user.avatar,
    }))
}

#[utoipa::path(
    get,
    path = "/user/playlists",
    tag = "user",
    params(UserQuery),
    responses(
        (status = 200, description = "Playlists attached to the user", body = Vec<PlaylistSummary>),
        (status = 403, description = "id is missing"),
        (status = 404, description = "No user with this id"),
    )
)]
pub async fn get_user_playlists(
    State(app_state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<UserQuery>,
) -> ApiResult<Json<Vec<PlaylistSummary>>> {
    let id = required_id(query.id)?;

    let playlists = UserService::new(app_state.db.clone())
        .playlists(id)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(
        playlists.into_iter().map(PlaylistSummary::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/user/playlists/add",
    tag = "user",
    request_body = UserPlaylistRequest,
    responses(
        (status = 200, description = "Playlist attached to the user"),
        (status = 403, description = "userId or playlistId is missing"),
        (status = 404, description = "User or playlist not found"),
    )
)]
pub async fn add_user_playlist(
    State(app_state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<UserPlaylistRequest>,
) -> ApiResult<StatusCode> {
    let user_id = required_id(request.user_id)?;
    let playlist_id = required_id(request.playlist_id)?;

    match UserService::new(app_state.db.clone())
        .add_playlist(user_id, playlist_id)
        .await?
    {
        LinkOutcome::OwnerMissing | LinkOutcome::TargetMissing => Err(ApiError::NotFound),
        LinkOutcome::Linked | LinkOutcome::Unlinked => Ok(StatusCode::OK),
    }
}

#[utoipa::path(
    post,
    path = "/user/playlists/remove",
    tag = "user",
    request_body = UserPlaylistRequest,
    responses(
        (status = 200, description = "Playlist detached from the user"),
        (status = 403, description = "userId or playlistId is missing"),
        (status = 404, description = "User not found"),
    )
)]
pub async fn remove_user_playlist(
    State(app_state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<UserPlaylistRequest>,
) -> ApiResult<StatusCode> {
    let user_id = required_id(request.user_id)?;
    let playlist_id = required_id(request.playlist_id)?;

    match UserService::new(app_state.db.clone())
        .remove_playlist(user_id, playlist_id)
        .await?
    {
        LinkOutcome::OwnerMissing | LinkOutcome::TargetMissing => Err(ApiError::NotFound),
        LinkOutcome::Linked | LinkOutcome::Unlinked => Ok(StatusCode::OK),
    }
}

/// Create a user and return the new id as plain text.
#[utoipa::path(
    post,
    path = "/user",
    tag = "user",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Id of the new user", body = String, content_type = "text/plain"),
        (status = 403, description = "login, password or username is missing"),
    )
)]
pub async fn create_user(
    State(app_state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<CreateUserRequest>,
) -> ApiResult<String> {
    let login = required(request.login)?;
    let password = required(request.password)?;
    let username = required(request.username)?;

    let user = UserService::new(app_state.db.clone())
        .create(login, password, username, request.avatar)
        .await?;

    Ok(user.id.to_string())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use super::*;
    use crate::test_utils::TestApp;

    async fn create_user(app: &TestApp, avatar: Option<&str>) -> i64 {
        let (status, body) = app
            .post_json(
                "/user",
                &json!({
                    "login": "listener",
                    "password": "pw",
                    "username": "Listener",
                    "avatar": avatar,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        String::from_utf8(body.to_vec()).unwrap().parse().unwrap()
    }

    async fn create_playlist(app: &TestApp, title: &str) -> i64 {
        let (status, body) = app
            .post_json("/playlist", &json!({ "title": title, "thumbnail": "t.png" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        String::from_utf8(body.to_vec()).unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let app = TestApp::new().await;
        let id = create_user(&app, Some("1700000000000.png")).await;

        let (status, body) = app.get(&format!("/user?id={}", id)).await;
        assert_eq!(status, StatusCode::OK);

        let profile: UserProfile = serde_json::from_slice(&body).unwrap();
        assert_eq!(profile.username, "Listener");
        assert_eq!(profile.avatar.as_deref(), Some("1700000000000.png"));
    }

    #[tokio::test]
    async fn test_profile_hides_credentials() {
        let app = TestApp::new().await;
        let id = create_user(&app, None).await;

        let (_, body) = app.get(&format!("/user?id={}", id)).await;
        let value: Value = serde_json::from_slice(&body).unwrap();

        assert!(value.get("password").is_none());
        assert!(value.get("login").is_none());
        assert!(value["avatar"].is_null());
    }

    #[tokio::test]
    async fn test_get_user_errors() {
        let app = TestApp::new().await;

        let (status, _) = app.get("/user").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.get("/user?id=abc").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.get("/user?id=4242").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_user_requires_fields() {
        let app = TestApp::new().await;

        let (status, _) = app
            .post_json("/user", &json!({ "login": "a", "password": "b" }))
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_user_playlists_add_and_remove() {
        let app = TestApp::new().await;
        let user_id = create_user(&app, None).await;
        let playlist_id = create_playlist(&app, "Road Trip").await;

        // Ids are accepted as numbers or strings, and adding twice keeps one entry
        let (status, _) = app
            .post_json(
                "/user/playlists/add",
                &json!({ "userId": user_id, "playlistId": playlist_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app
            .post_json(
                "/user/playlists/add",
                &json!({ "userId": user_id.to_string(), "playlistId": playlist_id.to_string() }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app.get(&format!("/user/playlists?id={}", user_id)).await;
        assert_eq!(status, StatusCode::OK);
        let playlists: Vec<PlaylistSummary> = serde_json::from_slice(&body).unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].id, playlist_id);
        assert_eq!(playlists[0].title, "Road Trip");

        let (status, _) = app
            .post_json(
                "/user/playlists/remove",
                &json!({ "userId": user_id, "playlistId": playlist_id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = app.get(&format!("/user/playlists?id={}", user_id)).await;
        let playlists: Vec<PlaylistSummary> = serde_json::from_slice(&body).unwrap();
        assert!(playlists.is_empty());
    }

    #[tokio::test]
    async fn test_user_playlists_errors() {
        let app = TestApp::new().await;
        let user_id = create_user(&app, None).await;

        let (status, _) = app.get("/user/playlists?id=4242").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .post_json("/user/playlists/add", &json!({ "userId": user_id }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .post_json(
                "/user/playlists/add",
                &json!({ "userId": user_id, "playlistId": 4242 }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .post_json(
                "/user/playlists/remove",
                &json!({ "userId": 4242, "playlistId": 1 }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
