//! Module defining the registry which maps file extensions to the functions loading them.

use std::{
    collections::BTreeMap,
    fmt,
    path::Path,
    sync::Arc,
};

use tracing::debug;

use crate::{
    data::LoadedData,
    error::{Error, load_failure},
    formats::{self, EXT_CSV, EXT_JSON, EXT_XML},
};


/// A function loading the file at the given path.
pub type Loader = Arc<dyn Fn(&Path) -> Result<LoadedData, Error> + Send + Sync>;

/// A strategy producing the data of a fixture. Overrides the default extension-based dispatch for a fixture.
///
/// Implemented by plain loader closures and by the storage adapters.
pub trait DataSource: Send + Sync {
    fn load(&self, path: &Path, loaders: &LoaderRegistry) -> Result<LoadedData, Error>;
}

impl<F> DataSource for F
where
    F: Fn(&Path) -> Result<LoadedData, Error> + Send + Sync,
{
    fn load(&self, path: &Path, _loaders: &LoaderRegistry) -> Result<LoadedData, Error> {
        self(path)
    }
}

/// Registry of loaders keyed by lowercase file extension. Comes with loaders for `json`, `csv` and `xml`.
#[derive(Clone)]
pub struct LoaderRegistry {
    loaders: BTreeMap<String, Loader>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(EXT_JSON, load_json);
        registry.register(EXT_CSV, load_csv);
        registry.register(EXT_XML, load_xml);
        registry
    }
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("loaders", &self.extensions())
            .finish()
    }
}

impl LoaderRegistry {
    /// A registry with the built-in loaders.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry without any loader.
    pub fn empty() -> Self {
        Self {
            loaders: BTreeMap::new(),
        }
    }

    /// Installs `loader` for `extension`, replacing any previous one. The extension is case-insensitive and may carry
    /// a leading dot.
    pub fn register<F>(&mut self, extension: &str, loader: F)
    where
        F: Fn(&Path) -> Result<LoadedData, Error> + Send + Sync + 'static,
    {
        let extension = formats::normalize_extension(extension);
        debug!(extension = %extension, "registered loader");
        self.loaders.insert(extension, Arc::new(loader));
    }

    pub fn get(&self, extension: &str) -> Option<Loader> {
        self.loaders
            .get(&formats::normalize_extension(extension))
            .cloned()
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        self.loaders.keys().map(String::as_str).collect()
    }

    /// Loads the file at `path` with the loader registered for its extension.
    ///
    /// Malformed content is reported as [`Error::InvalidData`]; any other failure of the loader is wrapped into
    /// [`Error::LoadFailure`].
    pub fn load(&self, path: &Path) -> Result<LoadedData, Error> {
        if !path.exists() {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(Error::InvalidArgument(format!(
                "path is not a file: {}",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let loader = self
            .get(&extension)
            .ok_or_else(|| Error::UnsupportedFormat {
                extension: extension.clone(),
            })?;

        debug!(path = %path.display(), extension = %extension, "loading data file");
        loader(path).map_err(|err| match err {
            err @ Error::InvalidData { .. } => err,
            other => load_failure(path, other),
        })
    }
}

fn load_json(path: &Path) -> Result<LoadedData, Error> {
    let bytes = std::fs::read(path)?;
    formats::parse_json(&bytes).map(LoadedData::Json)
}

fn load_csv(path: &Path) -> Result<LoadedData, Error> {
    let bytes = std::fs::read(path)?;
    formats::parse_csv(&bytes).map(LoadedData::Csv)
}

fn load_xml(path: &Path) -> Result<LoadedData, Error> {
    let bytes = std::fs::read(path)?;
    formats::parse_xml(&bytes).map(LoadedData::Xml)
}
