use std::path::{Path, PathBuf};

use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    database: String,
    /// Directory served as static content; uploads land in `<static_dir>/<scope>/`
    static_dir: String,
    pub port: u16,
    /// Request body cap, applied to JSON and multipart bodies alike
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "~/.local/share/playlist-server/playlists.db".to_string(),
            static_dir: "./static".to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("playlist-server").join("config.toml"))
    }

    /// Load the default config file, falling back to built-in defaults when it does not exist
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write the default config to the default path unless a file is already there
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_else(|| eyre!("No config directory available"))?;
        if path.exists() {
            log::info!("Config already exists at: {}", path.display());
            return Ok(path);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).wrap_err_with(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents =
            toml::to_string_pretty(&Self::default()).wrap_err("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    pub fn database_path(&self) -> PathBuf {
        self.expand_path(&self.database)
    }

    pub fn static_dir(&self) -> PathBuf {
        self.expand_path(&self.static_dir)
    }

    pub fn set_static_dir(&mut self, dir: &Path) {
        self.static_dir = dir.to_string_lossy().to_string();
    }
}
