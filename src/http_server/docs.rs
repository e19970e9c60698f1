use axum::{Json, response::Html};
use utoipa::OpenApi;

use crate::http_server::http_routes::{auth, file, playlist, user};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "playlist-server",
        description = "Users, playlists, tracks and image uploads"
    ),
    paths(
        file::upload_file,
        file::remove_file,
        auth::authenticate,
        user::get_user,
        user::get_user_playlists,
        user::add_user_playlist,
        user::remove_user_playlist,
        user::create_user,
        playlist::create_playlist,
        playlist::add_track,
        playlist::remove_track,
        playlist::drop_playlist,
        playlist::get_playlist,
        playlist::search_playlists,
    ),
    components(schemas(
        file::UploadForm,
        file::UploadedFile,
        file::RemoveFileRequest,
        auth::AuthRequest,
        user::UserProfile,
        user::CreateUserRequest,
        user::UserPlaylistRequest,
        playlist::PlaylistSummary,
        playlist::PlaylistDetail,
        playlist::Track,
        playlist::CreatePlaylistRequest,
        playlist::AddTrackRequest,
        playlist::RemoveTrackRequest,
        playlist::DropPlaylistRequest,
    )),
    tags(
        (name = "file", description = "Image uploads for users and playlists"),
        (name = "user", description = "Users, login and their playlists"),
        (name = "playlist", description = "Playlists and their tracks"),
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

const DOCS_PAGE: &str = r##"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8" />
    <title>playlist-server API</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
  </head>
  <body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
      window.ui = SwaggerUIBundle({ url: "/docs/openapi.json", dom_id: "#swagger-ui" });
    </script>
  </body>
</html>
"##;

pub async fn docs_page() -> Html<&'static str> {
    Html(DOCS_PAGE)
}
