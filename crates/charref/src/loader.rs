use crate::config::{LoaderConfig, SourceConfig};
use crate::error::{CharrefError, Result};
use crate::source::{BundledSource, JsonFileStore, NoStore, ReferenceSource, ReferenceStore};
use crate::table::ReferenceTable;
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Builds [`ReferenceTable`]s from a persisted cache, refreshing from a
/// source when the cache is missing or a rebuild is requested.
pub struct TableLoader {
    store: Box<dyn ReferenceStore>,
    source: Box<dyn ReferenceSource>,
}

impl Default for TableLoader {
    fn default() -> Self {
        Self::new(NoStore, BundledSource)
    }
}

impl TableLoader {
    pub fn new(
        store: impl ReferenceStore + 'static,
        source: impl ReferenceSource + 'static,
    ) -> Self {
        Self {
            store: Box::new(store),
            source: Box::new(source),
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        let store: Box<dyn ReferenceStore> = match &config.cache_path {
            Some(path) => Box::new(JsonFileStore::new(path)),
            None => Box::new(NoStore),
        };

        let source: Box<dyn ReferenceSource> = match &config.source {
            SourceConfig::Bundled => Box::new(BundledSource),
            SourceConfig::Remote { url } => remote_source(url)?,
        };

        Ok(Self { store, source })
    }

    /// Reads the cached table, falling back to [`TableLoader::rebuild`] when
    /// no cache exists. Any other cache failure is returned as-is.
    pub fn load(&self) -> Result<ReferenceTable> {
        match self.store.load() {
            Ok(entries) => {
                let table = build_table(entries)?;
                debug!("Loaded {} character references from cache", table.len());
                Ok(table)
            }
            Err(error) if error.is_cache_miss() => {
                warn!(
                    "No cached reference table, refreshing from {}",
                    self.source.describe()
                );
                self.rebuild()
            }
            Err(error) => Err(error),
        }
    }

    /// Fetches a fresh table from the source and persists it.
    pub fn rebuild(&self) -> Result<ReferenceTable> {
        let entries = self.source.fetch()?;
        if entries.is_empty() {
            return Err(CharrefError::EmptyTable);
        }

        self.store.persist(&entries)?;
        let table = build_table(entries)?;
        info!(
            "Refreshed {} character references from {}",
            table.len(),
            self.source.describe()
        );
        Ok(table)
    }
}

fn build_table(entries: BTreeMap<String, char>) -> Result<ReferenceTable> {
    if entries.is_empty() {
        return Err(CharrefError::EmptyTable);
    }
    ReferenceTable::from_entries(entries)
}

#[cfg(feature = "remote")]
fn remote_source(url: &str) -> Result<Box<dyn ReferenceSource>> {
    Ok(Box::new(crate::source::RemoteSource::new(url)))
}

#[cfg(not(feature = "remote"))]
fn remote_source(url: &str) -> Result<Box<dyn ReferenceSource>> {
    Err(CharrefError::Fetch {
        url: url.to_string(),
        message: "remote sources require the `remote` feature".to_string(),
    })
}
