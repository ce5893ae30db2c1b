use crate::cache;
use crate::error::{CharrefError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_SOURCE_URL: &str = "https://html.spec.whatwg.org/entities.json";

const BUNDLED_TABLE: &str = include_str!("../data/html5charref.json");

/// Produces a fresh reference table, e.g. from the published HTML5 registry.
pub trait ReferenceSource: Send + Sync {
    fn fetch(&self) -> Result<BTreeMap<String, char>>;

    fn describe(&self) -> String;
}

/// Durable storage for a previously fetched table.
pub trait ReferenceStore: Send + Sync {
    /// Fails with [`CharrefError::CacheNotFound`] when nothing is stored.
    fn load(&self) -> Result<BTreeMap<String, char>>;

    fn persist(&self, entries: &BTreeMap<String, char>) -> Result<()>;
}

/// The table shipped inside the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSource;

impl ReferenceSource for BundledSource {
    fn fetch(&self) -> Result<BTreeMap<String, char>> {
        cache::parse_cache(BUNDLED_TABLE, Path::new("<bundled>"))
    }

    fn describe(&self) -> String {
        "bundled table".to_string()
    }
}

/// Downloads the WHATWG `entities.json` document.
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct RemoteSource {
    pub url: String,
}

#[cfg(feature = "remote")]
impl RemoteSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[cfg(feature = "remote")]
impl Default for RemoteSource {
    fn default() -> Self {
        Self::new(DEFAULT_SOURCE_URL)
    }
}

#[cfg(feature = "remote")]
impl ReferenceSource for RemoteSource {
    fn fetch(&self) -> Result<BTreeMap<String, char>> {
        let fetch_error = |message: String| CharrefError::Fetch {
            url: self.url.clone(),
            message,
        };

        let body = reqwest::blocking::get(self.url.as_str())
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(|error| fetch_error(error.to_string()))?;

        parse_whatwg_entities(&body).map_err(|error| fetch_error(error.to_string()))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[derive(Debug, Deserialize)]
struct WhatwgEntity {
    codepoints: Vec<u32>,
}

/// Parses the WHATWG entity document. Legacy names without a trailing `;`
/// and names expanding to more than one code point are skipped.
pub fn parse_whatwg_entities(json: &str) -> Result<BTreeMap<String, char>> {
    let document: BTreeMap<String, WhatwgEntity> =
        serde_json::from_str(json).map_err(|error| CharrefError::JsonParse {
            path: PathBuf::from(DEFAULT_SOURCE_URL),
            message: error.to_string(),
        })?;

    let entries = document
        .into_iter()
        .filter(|(name, _)| name.starts_with('&') && name.ends_with(';'))
        .filter_map(|(name, entity)| match entity.codepoints.as_slice() {
            [single] => char::from_u32(*single).map(|character| (name, character)),
            _ => None,
        })
        .collect();

    Ok(entries)
}

/// Stores the table as a JSON file in the persisted layout.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    pub path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A store at `<dir>/html5charref.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(cache::CACHE_FILE_NAME))
    }
}

impl ReferenceStore for JsonFileStore {
    fn load(&self) -> Result<BTreeMap<String, char>> {
        cache::load_cache(&self.path)
    }

    fn persist(&self, entries: &BTreeMap<String, char>) -> Result<()> {
        cache::save_cache(&self.path, entries)
    }
}

/// A store that never holds anything; every load goes to the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoStore;

impl ReferenceStore for NoStore {
    fn load(&self) -> Result<BTreeMap<String, char>> {
        Err(CharrefError::CacheNotFound {
            path: PathBuf::new(),
        })
    }

    fn persist(&self, _entries: &BTreeMap<String, char>) -> Result<()> {
        Ok(())
    }
}
