use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
};
use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, Database as SeaDatabase};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::database::Database;
use crate::http_server::{app::router, state::AppState};
use crate::services::file::FileStore;

pub async fn test_db() -> Arc<Database> {
    let conn = SeaDatabase::connect("sqlite::memory:?mode=rwc")
        .await
        .unwrap();

    // Enable foreign keys
    conn.execute_unprepared("PRAGMA foreign_keys = ON")
        .await
        .unwrap();

    migration::Migrator::up(&conn, None)
        .await
        .unwrap_or_else(|e| panic!("Failed to apply migrations: {}", e));

    Arc::new(Database { conn })
}

/// The full router over an in-memory database and a temporary static root.
pub struct TestApp {
    router: Router,
    dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_body_limit(10 * 1024 * 1024).await
    }

    pub async fn with_body_limit(max_body_bytes: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let files = FileStore::new(dir.path().join("static"));
        files.ensure_layout().await.unwrap();

        let state = Arc::new(AppState {
            db: test_db().await,
            files,
        });

        Self {
            router: router(state, max_body_bytes),
            dir,
        }
    }

    pub fn static_dir(&self) -> PathBuf {
        self.dir.path().join("static")
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Bytes) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, json: &serde_json::Value) -> (StatusCode, Bytes) {
        self.send_raw("POST", uri, "application/json", json.to_string().into_bytes())
            .await
    }

    pub async fn send_raw(
        &self,
        method: &str,
        uri: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> (StatusCode, Bytes) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

const BOUNDARY: &str = "playlist-server-test-boundary";

/// Build a `multipart/form-data` body with an optional `scope` text field and an
/// optional `file` part given as `(content_type, bytes)`.
/// Returns the request content type and the encoded body.
pub fn multipart_body(scope: Option<&str>, file: Option<(&str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    if let Some((content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    if let Some(scope) = scope {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"scope\"\r\n\r\n{scope}\r\n"
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}
