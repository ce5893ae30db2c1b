use crate::config::LoaderConfig;
use crate::error::Result;
use crate::loader::TableLoader;
use crate::table::ReferenceTable;
use crate::{escape, unescape};
use log::info;
use std::borrow::Cow;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

/// A reference table shared between threads, replaceable as a whole.
///
/// Readers take an [`Arc`] snapshot and never observe a partially built
/// table: a rebuild constructs the new table first and then swaps the
/// pointer. Snapshots taken before the swap stay valid.
pub struct Charrefs {
    loader: TableLoader,
    current: RwLock<Arc<ReferenceTable>>,
}

impl Charrefs {
    /// Wraps an already built table. Rebuilds go to the bundled table.
    pub fn new(table: ReferenceTable) -> Self {
        Self::with_loader(table, TableLoader::default())
    }

    pub fn with_loader(table: ReferenceTable, loader: TableLoader) -> Self {
        Self {
            loader,
            current: RwLock::new(Arc::new(table)),
        }
    }

    pub fn load(loader: TableLoader) -> Result<Self> {
        let table = loader.load()?;
        Ok(Self::with_loader(table, loader))
    }

    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        Self::load(TableLoader::from_config(config)?)
    }

    pub fn snapshot(&self) -> Arc<ReferenceTable> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Refreshes from the loader's source and publishes the result. On error
    /// the current table stays in place.
    pub fn rebuild(&self) -> Result<()> {
        let table = self.loader.rebuild()?;
        let entries = table.len();
        self.replace(table);
        info!("Published rebuilt reference table with {entries} entries");
        Ok(())
    }

    /// Publishes `table` and returns the one it replaced.
    pub fn replace(&self, table: ReferenceTable) -> Arc<ReferenceTable> {
        let next = Arc::new(table);
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, next)
    }

    pub fn escape_char(&self, character: char, named_only: bool) -> String {
        escape::escape_char(&self.snapshot(), character, named_only).into_owned()
    }

    pub fn escape_char_advanced(&self, character: char) -> Option<Vec<String>> {
        escape::escape_char_advanced(&self.snapshot(), character).map(<[String]>::to_vec)
    }

    pub fn escape_text(&self, text: &str, named_only: bool) -> String {
        escape::escape_text(&self.snapshot(), text, named_only)
    }

    pub fn unescape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        unescape::unescape(&self.snapshot(), text)
    }

    pub fn unescape_charref(&self, name: &str) -> Option<char> {
        self.snapshot().lookup_name(name)
    }
}

static GLOBAL: OnceLock<Charrefs> = OnceLock::new();
static GLOBAL_INIT: Mutex<()> = Mutex::new(());

/// The process-wide instance, built from the bundled table on first use.
pub fn global() -> Result<&'static Charrefs> {
    init_global(&LoaderConfig::default())
}

/// Builds the process-wide instance from `config` unless it already exists.
/// Concurrent first callers block until one of them has finished loading; a
/// failed load leaves the instance unset so a later call can retry.
pub fn init_global(config: &LoaderConfig) -> Result<&'static Charrefs> {
    if let Some(charrefs) = GLOBAL.get() {
        return Ok(charrefs);
    }

    let _guard = GLOBAL_INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(charrefs) = GLOBAL.get() {
        return Ok(charrefs);
    }

    let charrefs = Charrefs::from_config(config)?;
    Ok(GLOBAL.get_or_init(|| charrefs))
}
