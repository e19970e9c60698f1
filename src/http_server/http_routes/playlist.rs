use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities;
use crate::http_server::{
    error::{ApiError, ApiResult},
    extract::{JsonBody, QueryParams, lenient_id, required, required_id},
    state::AppState,
};
use crate::services::{LinkOutcome, playlist::PlaylistService};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlaylistSummary {
    pub id: i64,
    pub title: String,
    pub thumbnail: String,
    pub private: bool,
}

impl From<entities::playlist::Model> for PlaylistSummary {
    fn from(model: entities::playlist::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            thumbnail: model.thumbnail,
            private: model.private,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Track {
    pub id: i64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlaylistDetail {
    pub id: i64,
    pub title: String,
    pub thumbnail: String,
    pub private: bool,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlaylistRequest {
    pub title: Option<String>,
    /// File id of an uploaded thumbnail
    pub thumbnail: Option<String>,
    /// Hidden from search when true (default false)
    pub private: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddTrackRequest {
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    #[schema(value_type = i64)]
    pub playlist_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveTrackRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    #[schema(value_type = i64)]
    pub track_id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_id")]
    #[schema(value_type = i64)]
    pub playlist_id: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DropPlaylistRequest {
    #[serde(default, deserialize_with = "lenient_id")]
    #[schema(value_type = i64)]
    pub playlist_id: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistQuery {
    /// Playlist id
    #[serde(default, deserialize_with = "lenient_id")]
    pub playlist_id: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Substring to look for in playlist titles
    pub q: Option<String>,
}

/// Create a playlist and return the new id as plain text.
#[utoipa::path(
    post,
    path = "/playlist",
    tag = "playlist",
    request_body = CreatePlaylistRequest,
    responses(
        (status = 200, description = "Id of the new playlist", body = String, content_type = "text/plain"),
        (status = 403, description = "title or thumbnail is missing"),
    )
)]
pub async fn create_playlist(
    State(app_state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<CreatePlaylistRequest>,
) -> ApiResult<String> {
    let title = required(request.title)?;
    let thumbnail = required(request.thumbnail)?;

    let playlist = PlaylistService::new(app_state.db.clone())
        .create(title, thumbnail, request.private.unwrap_or(false))
        .await?;

    Ok(playlist.id.to_string())
}

/// Create a track from a URL and append it to the playlist.
#[utoipa::path(
    post,
    path = "/playlist/add",
    tag = "playlist",
    request_body = AddTrackRequest,
    responses(
        (status = 200, description = "Track added"),
        (status = 403, description = "url or playlistId is missing"),
        (status = 404, description = "Playlist not found"),
    )
)]
pub async fn add_track(
    State(app_state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<AddTrackRequest>,
) -> ApiResult<StatusCode> {
    let url = required(request.url)?;
    let playlist_id = required_id(request.playlist_id)?;

    PlaylistService::new(app_state.db.clone())
        .add_track(playlist_id, url)
        .await?
        .ok_or(ApiError::NotFound)?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    post,
    path = "/playlist/remove",
    tag = "playlist",
    request_body = RemoveTrackRequest,
    responses(
        (status = 200, description = "Track removed from the playlist"),
        (status = 403, description = "trackId or playlistId is missing"),
        (status = 404, description = "Playlist not found"),
    )
)]
pub async fn remove_track(
    State(app_state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<RemoveTrackRequest>,
) -> ApiResult<StatusCode> {
    let track_id = required_id(request.track_id)?;
    let playlist_id = required_id(request.playlist_id)?;

    match PlaylistService::new(app_state.db.clone())
        .remove_track(playlist_id, track_id)
        .await?
    {
        LinkOutcome::OwnerMissing | LinkOutcome::TargetMissing => Err(ApiError::NotFound),
        LinkOutcome::Linked | LinkOutcome::Unlinked => Ok(StatusCode::OK),
    }
}

/// Delete a playlist. Unknown ids are accepted silently.
#[utoipa::path(
    post,
    path = "/playlist/drop",
    tag = "playlist",
    request_body = DropPlaylistRequest,
    responses(
        (status = 200, description = "Playlist deleted"),
        (status = 403, description = "playlistId is missing"),
    )
)]
pub async fn drop_playlist(
    State(app_state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<DropPlaylistRequest>,
) -> ApiResult<StatusCode> {
    let playlist_id = required_id(request.playlist_id)?;

    PlaylistService::new(app_state.db.clone())
        .delete(playlist_id)
        .await?;

    Ok(StatusCode::OK)
}

#[utoipa::path(
    get,
    path = "/playlist",
    tag = "playlist",
    params(PlaylistQuery),
    responses(
        (status = 200, description = "The playlist with its tracks", body = PlaylistDetail),
        (status = 403, description = "playlistId is missing"),
        (status = 404, description = "Playlist not found"),
    )
)]
pub async fn get_playlist(
    State(app_state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<PlaylistQuery>,
) -> ApiResult<Json<PlaylistDetail>> {
    let playlist_id = required_id(query.playlist_id)?;

    let loaded = PlaylistService::new(app_state.db.clone())
        .get_with_tracks(playlist_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let playlist = loaded.playlist;
    Ok(Json(PlaylistDetail {
        id: playlist.id,
        title: playlist.title,
        thumbnail: playlist.thumbnail,
        private: playlist.private,
        tracks: loaded
            .tracks
            .into_iter()
            .map(|track| Track {
                id: track.id,
                url: track.url,
            })
            .collect(),
    }))
}

/// Public playlists whose title contains `q`.
#[utoipa::path(
    get,
    path = "/playlist/search",
    tag = "playlist",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching public playlists", body = Vec<PlaylistSummary>),
        (status = 403, description = "q is missing or contains an apostrophe"),
    )
)]
pub async fn search_playlists(
    State(app_state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> ApiResult<Json<Vec<PlaylistSummary>>> {
    let q = required(query.q)?;
    if q.contains('\'') {
        return Err(ApiError::Forbidden);
    }

    let playlists = PlaylistService::new(app_state.db.clone())
        .search(&q)
        .await?;

    Ok(Json(
        playlists.into_iter().map(PlaylistSummary::from).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::test_utils::TestApp;

    async fn create_playlist(app: &TestApp, title: &str, private: bool) -> i64 {
        let (status, body) = app
            .post_json(
                "/playlist",
                &json!({ "title": title, "thumbnail": "t.png", "private": private }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        String::from_utf8(body.to_vec()).unwrap().parse().unwrap()
    }

    async fn fetch(app: &TestApp, id: i64) -> PlaylistDetail {
        let (status, body) = app.get(&format!("/playlist?playlistId={}", id)).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_create_playlist_defaults_public() {
        let app = TestApp::new().await;
        let (status, body) = app
            .post_json("/playlist", &json!({ "title": "Chill", "thumbnail": "c.png" }))
            .await;
        assert_eq!(status, StatusCode::OK);
        let id: i64 = String::from_utf8(body.to_vec()).unwrap().parse().unwrap();

        let playlist = fetch(&app, id).await;
        assert_eq!(playlist.title, "Chill");
        assert_eq!(playlist.thumbnail, "c.png");
        assert!(!playlist.private);
        assert!(playlist.tracks.is_empty());
    }

    #[tokio::test]
    async fn test_create_playlist_requires_fields() {
        let app = TestApp::new().await;

        let (status, _) = app.post_json("/playlist", &json!({ "title": "x" })).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_add_and_remove_track() {
        let app = TestApp::new().await;
        let id = create_playlist(&app, "Mix", false).await;

        let (status, _) = app
            .post_json(
                "/playlist/add",
                &json!({ "url": "https://example.com/song.mp3", "playlistId": id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let playlist = fetch(&app, id).await;
        assert_eq!(playlist.tracks.len(), 1);
        assert_eq!(playlist.tracks[0].url, "https://example.com/song.mp3");

        let (status, _) = app
            .post_json(
                "/playlist/remove",
                &json!({ "trackId": playlist.tracks[0].id, "playlistId": id }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        assert!(fetch(&app, id).await.tracks.is_empty());
    }

    #[tokio::test]
    async fn test_track_routes_errors() {
        let app = TestApp::new().await;

        let (status, _) = app
            .post_json("/playlist/add", &json!({ "url": "https://example.com/a" }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .post_json(
                "/playlist/add",
                &json!({ "url": "https://example.com/a", "playlistId": 4242 }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .post_json("/playlist/remove", &json!({ "trackId": 1, "playlistId": 4242 }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.get("/playlist").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.get("/playlist?playlistId=4242").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_drop_playlist() {
        let app = TestApp::new().await;
        let id = create_playlist(&app, "Temporary", false).await;

        let (status, _) = app
            .post_json("/playlist/drop", &json!({ "playlistId": id }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.get(&format!("/playlist?playlistId={}", id)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Dropping an unknown playlist still succeeds
        let (status, _) = app
            .post_json("/playlist/drop", &json!({ "playlistId": id }))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.post_json("/playlist/drop", &json!({})).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_search() {
        let app = TestApp::new().await;
        let public = create_playlist(&app, "Rock Classics", false).await;
        create_playlist(&app, "Private Rock", true).await;
        create_playlist(&app, "Jazz Nights", false).await;
        create_playlist(&app, "hard rock", false).await;

        let (status, body) = app.get("/playlist/search?q=Rock").await;
        assert_eq!(status, StatusCode::OK);

        let results: Vec<PlaylistSummary> = serde_json::from_slice(&body).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, public);
        assert!(!results[0].private);
    }

    #[tokio::test]
    async fn test_search_rejects_apostrophe_and_missing_query() {
        let app = TestApp::new().await;

        let (status, _) = app.get("/playlist/search?q=Rock%27n%27Roll").await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.get("/playlist/search").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
