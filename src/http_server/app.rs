use std::{path::PathBuf, sync::Arc};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    database::Database,
    http_server::{
        docs,
        http_routes::{auth, file, playlist, user},
        state::AppState,
    },
    services::file::FileStore,
};

pub struct HttpServerConfig {
    pub port: u16,
    pub database: Arc<Database>,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

/// All API routes. Paths that match none of them are looked up in the static
/// directory, which is how uploaded files are served back.
pub fn router(app_state: Arc<AppState>, max_body_bytes: usize) -> Router {
    let static_files = ServeDir::new(app_state.files.root());

    Router::new()
        .route("/file", post(file::upload_file))
        .route("/file/remove", post(file::remove_file))
        .route("/auth", post(auth::authenticate))
        .route("/user", get(user::get_user).post(user::create_user))
        .route("/user/playlists", get(user::get_user_playlists))
        .route("/user/playlists/add", post(user::add_user_playlist))
        .route("/user/playlists/remove", post(user::remove_user_playlist))
        .route(
            "/playlist",
            get(playlist::get_playlist).post(playlist::create_playlist),
        )
        .route("/playlist/add", post(playlist::add_track))
        .route("/playlist/remove", post(playlist::remove_track))
        .route("/playlist/drop", post(playlist::drop_playlist))
        .route("/playlist/search", get(playlist::search_playlists))
        .route("/docs", get(docs::docs_page))
        .route("/docs/openapi.json", get(docs::openapi_json))
        .fallback_service(static_files)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .with_state(app_state)
}

pub async fn start(config: HttpServerConfig) -> color_eyre::Result<()> {
    let files = FileStore::new(config.static_dir);
    files.ensure_layout().await?;
    log::info!("Serving static files from {}", files.root().display());

    let app_state = Arc::new(AppState {
        db: config.database,
        files,
    });
    let app = router(app_state, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", config.port))?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Failed to start HTTP server")?;

    log::info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
