use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CharrefError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error in {path}: {message}")]
    JsonParse { path: PathBuf, message: String },

    #[error("TOML parse error in {path}: {message}")]
    TomlParse { path: PathBuf, message: String },

    #[error("Reference cache not found: {path}")]
    CacheNotFound { path: PathBuf },

    #[error("Invalid character reference entry '{name}': {value:?}")]
    InvalidEntry { name: String, value: String },

    #[error("Failed to fetch reference table from {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Config file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Reference table is empty")]
    EmptyTable,
}

impl CharrefError {
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, CharrefError::CacheNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, CharrefError>;
