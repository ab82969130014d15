//! Configuration system for intact.
//!
//! Resolution order: command-line flags (applied by the binaries) →
//! environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $INTACT_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/intact/config.toml
//!   3. ~/.config/intact/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::codec::{CompressionLevel, DEFAULT_CHUNK_SIZE};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntactConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the upload endpoint binds to.
    pub bind_addr: String,
    /// Directory uploads are written into. Created on startup.
    pub output_dir: PathBuf,
    /// Decompression read size in bytes.
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Directory whose regular files are uploaded.
    pub source_dir: PathBuf,
    /// Full URL of the upload endpoint.
    pub server_url: String,
    /// File read size in bytes, for both hashing and compression.
    pub chunk_size: usize,
    /// gzip level, 1-9.
    pub compression_level: u32,
    /// Files in flight at once. 1 = strictly sequential.
    pub concurrency: usize,
    /// Whole-request timeout in seconds. 0 = none.
    pub request_timeout_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            output_dir: PathBuf::from("./server_output"),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./client_files"),
            server_url: "http://127.0.0.1:8080/upload".to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            compression_level: 6,
            concurrency: 1,
            request_timeout_secs: 0,
        }
    }
}

impl ClientConfig {
    pub fn compression(&self) -> Result<CompressionLevel, crate::codec::CodecError> {
        CompressionLevel::from_numeric(self.compression_level)
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("intact")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl IntactConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_file(&Self::file_path())?;
        config.apply_env_overrides(|k| std::env::var(k).ok());
        Ok(config)
    }

    /// Parse `path`, or return defaults if it does not exist.
    pub fn load_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(IntactConfig::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("INTACT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&IntactConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply INTACT_* overrides. `var` looks up one variable.
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("INTACT_SERVER__BIND_ADDR") {
            self.server.bind_addr = v;
        }
        if let Some(v) = var("INTACT_SERVER__OUTPUT_DIR") {
            self.server.output_dir = PathBuf::from(v);
        }
        if let Some(v) = var("INTACT_CLIENT__SOURCE_DIR") {
            self.client.source_dir = PathBuf::from(v);
        }
        if let Some(v) = var("INTACT_CLIENT__SERVER_URL") {
            self.client.server_url = v;
        }
        if let Some(v) = var("INTACT_CLIENT__CONCURRENCY") {
            if let Ok(n) = v.parse() {
                self.client.concurrency = n;
            }
        }
        if let Some(v) = var("INTACT_CLIENT__COMPRESSION_LEVEL") {
            if let Ok(n) = v.parse() {
                self.client.compression_level = n;
            }
        }
    }
}
