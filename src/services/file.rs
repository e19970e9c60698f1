use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use chrono::Utc;
use color_eyre::eyre::{Result, WrapErr};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::instrument;
use utoipa::ToSchema;

/// Directory an uploaded file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    User,
    Playlist,
}

impl Scope {
    pub const ALL: [Scope; 2] = [Scope::User, Scope::Playlist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Playlist => "playlist",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown file scope: {0:?}")]
pub struct UnknownScope(String);

impl FromStr for Scope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Scope::User),
            "playlist" => Ok(Scope::Playlist),
            other => Err(UnknownScope(other.to_string())),
        }
    }
}

/// An upload written to the static root under its temporary name,
/// waiting to be moved into a scope directory.
pub struct StagedUpload {
    name: String,
    path: PathBuf,
    extension: Option<String>,
    file: File,
}

impl StagedUpload {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file
            .write_all(chunk)
            .await
            .wrap_err_with(|| format!("Failed to write upload: {}", self.path.display()))
    }

    /// Name the file will have once relocated: `<id>.<ext>`.
    fn stored_name(&self) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{}", self.name, ext),
            None => self.name.clone(),
        }
    }
}

/// Uploaded files under the static root, laid out as `<root>/<scope>/<id>`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scope_dir(&self, scope: Scope) -> PathBuf {
        self.root.join(scope.as_str())
    }

    /// Create the static root and one directory per scope.
    pub async fn ensure_layout(&self) -> Result<()> {
        for scope in Scope::ALL {
            let dir = self.scope_dir(scope);
            tokio::fs::create_dir_all(&dir)
                .await
                .wrap_err_with(|| format!("Failed to create upload directory: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Current time in milliseconds plus a random integer up to 1e9.
    pub fn generate_id() -> String {
        let now = Utc::now().timestamp_millis();
        let jitter: i64 = rand::rng().random_range(0..=1_000_000_000);
        (now + jitter).to_string()
    }

    /// Open a staging file for an upload with the given MIME type.
    pub async fn stage(&self, mime: &str) -> Result<StagedUpload> {
        let name = Self::generate_id();
        let path = self.root.join(&name);
        let file = File::create(&path)
            .await
            .wrap_err_with(|| format!("Failed to create staging file: {}", path.display()))?;

        log::debug!("Staging upload {} ({})", path.display(), mime);
        Ok(StagedUpload {
            name,
            path,
            extension: extension_for(mime).map(str::to_string),
            file,
        })
    }

    /// Move a staged upload into `<root>/<scope>/<id>.<ext>` and return the stored file id.
    ///
    /// A failed rename is logged and otherwise ignored.
    #[instrument(skip(self, staged))]
    pub async fn relocate(&self, mut staged: StagedUpload, scope: Scope) -> String {
        if let Err(e) = staged.file.flush().await {
            log::warn!("Failed to flush upload {}: {}", staged.path.display(), e);
        }

        let id = staged.stored_name();
        let target = self.scope_dir(scope).join(&id);
        let StagedUpload { path, file, .. } = staged;
        drop(file);

        match tokio::fs::rename(&path, &target).await {
            Ok(()) => log::info!("Stored upload at {}", target.display()),
            Err(e) => log::warn!(
                "Failed to move upload {} to {}: {}",
                path.display(),
                target.display(),
                e
            ),
        }

        id
    }

    /// Delete a staged upload that will not be kept.
    pub async fn discard(&self, staged: StagedUpload) {
        let StagedUpload { path, file, .. } = staged;
        drop(file);

        if let Err(e) = tokio::fs::remove_file(&path).await {
            log::debug!("Failed to discard upload {}: {}", path.display(), e);
        }
    }

    /// Delete `<root>/<scope>/<id>`. Missing files and delete errors are ignored.
    pub async fn remove(&self, scope: Scope, id: &str) {
        let path = self.scope_dir(scope).join(id);

        match tokio::fs::remove_file(&path).await {
            Ok(()) => log::info!("Removed {}", path.display()),
            Err(e) => log::debug!("Failed to remove {}: {}", path.display(), e),
        }
    }
}

/// MIME subtype used as the file extension: `image/png` -> `png`.
pub fn extension_for(mime: &str) -> Option<&str> {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    essence
        .split_once('/')
        .map(|(_, subtype)| subtype)
        .filter(|subtype| !subtype.is_empty())
}

/// A file id must name a single entry inside a scope directory.
pub fn is_valid_file_id(id: &str) -> bool {
    let mut components = Path::new(id).components();
    !id.contains(['/', '\\'])
        && matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none()
}
