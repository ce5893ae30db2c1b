use crate::error::{CharrefError, Result};
use crate::source::DEFAULT_SOURCE_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the reference table is cached and where refreshes come from.
///
/// ```toml
/// cache_path = "data/html5charref.json"
///
/// [source]
/// kind = "remote"
/// url = "https://html.spec.whatwg.org/entities.json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub cache_path: Option<PathBuf>,
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    #[default]
    Bundled,
    Remote {
        #[serde(default = "default_source_url")]
        url: String,
    },
}

pub fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

impl LoaderConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CharrefError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|error| CharrefError::TomlParse {
            path: origin.to_path_buf(),
            message: error.to_string(),
        })
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }
}
