//! Module defining the fixture registry: declared fixture names mapped to their target and data file.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    data::LoadedData,
    error::Error,
    loader::DataSource,
    signature::{BoundArguments, Signature},
    value::FixtureValue,
};


pub type ConstructFn =
    dyn Fn(LoadedData, &str) -> Result<Box<dyn FixtureValue>, Error> + Send + Sync;
pub type CallFn =
    dyn Fn(LoadedData, BoundArguments) -> Result<Box<dyn FixtureValue>, Error> + Send + Sync;

/// Types constructed from loaded data and a description. Used as class targets.
pub trait FixtureClass: FixtureValue + Sized + 'static {
    fn from_data(data: LoadedData, description: &str) -> Result<Self, Error>;
}

/// What a fixture delegates to once its data is loaded.
#[derive(Clone)]
pub enum Target {
    /// Constructed from `(data, description)`; takes no host arguments
    Class {
        name: String,
        construct: Arc<ConstructFn>,
    },
    /// Called with the data first and the bound host arguments
    Function {
        name: String,
        signature: Signature,
        call: Arc<CallFn>,
    },
}

impl Target {
    /// A class target constructing `T`.
    pub fn class<T: FixtureClass>(name: impl Into<String>) -> Self {
        Self::class_with(name, |data, description| {
            T::from_data(data, description).map(|value| Box::new(value) as Box<dyn FixtureValue>)
        })
    }

    /// A class target with a custom constructor.
    pub fn class_with<F>(name: impl Into<String>, construct: F) -> Self
    where
        F: Fn(LoadedData, &str) -> Result<Box<dyn FixtureValue>, Error> + Send + Sync + 'static,
    {
        Target::Class {
            name: name.into(),
            construct: Arc::new(construct),
        }
    }

    /// A function target. `signature` lists all declared parameters including the leading data slot.
    pub fn function<F>(name: impl Into<String>, signature: Signature, call: F) -> Self
    where
        F: Fn(LoadedData, BoundArguments) -> Result<Box<dyn FixtureValue>, Error>
            + Send
            + Sync
            + 'static,
    {
        Target::Function {
            name: name.into(),
            signature,
            call: Arc::new(call),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Target::Class { name, .. } | Target::Function { name, .. } => name,
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self, Target::Class { .. })
    }

    /// The declared signature. Class targets declare none.
    pub fn signature(&self) -> Signature {
        match self {
            Target::Class { .. } => Signature::empty(),
            Target::Function { signature, .. } => signature.clone(),
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Class { name, .. } => f.debug_struct("Class").field("name", name).finish(),
            Target::Function {
                name, signature, ..
            } => f
                .debug_struct("Function")
                .field("name", name)
                .field("signature", &signature.to_string())
                .finish(),
        }
    }
}

/// A registered fixture.
#[derive(Clone)]
pub struct Registration {
    pub name: String,
    pub target: Target,
    pub relative_path: PathBuf,
    pub description: String,
    pub source: Option<Arc<dyn DataSource>>,
}

impl Registration {
    pub fn is_class(&self) -> bool {
        self.target.is_class()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("relative_path", &self.relative_path)
            .field("description", &self.description)
            .field("custom_source", &self.source.is_some())
            .finish()
    }
}

/// Declared fixtures by name. Registering a name again replaces its entry.
#[derive(Debug, Clone, Default)]
pub struct FixtureRegistry {
    entries: IndexMap<String, Registration>,
}

impl FixtureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `target` under its own name. The data path is not checked before the fixture is invoked.
    pub fn register(
        &mut self,
        target: Target,
        relative_path: impl Into<PathBuf>,
        description: impl Into<String>,
        source: Option<Arc<dyn DataSource>>,
    ) {
        let name = target.name().to_string();
        let relative_path = relative_path.into();
        debug!(fixture = %name, path = %relative_path.display(), "registered data fixture");
        let registration = Registration {
            name: name.clone(),
            target,
            relative_path,
            description: description.into(),
            source,
        };
        // keeps the original position when a name is registered again
        self.entries.insert(name, registration);
    }

    /// Starts declaring a fixture backed by the file at `relative_path`.
    pub fn data_fixture(&mut self, relative_path: impl AsRef<Path>) -> Declaration<'_> {
        Declaration {
            registry: self,
            relative_path: relative_path.as_ref().to_path_buf(),
            description: String::new(),
            source: None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Registration> {
        self.entries.get(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for a fixture declaration, finished by [`Declaration::register`].
#[must_use = "a declaration does nothing until `register` is called"]
pub struct Declaration<'r> {
    registry: &'r mut FixtureRegistry,
    relative_path: PathBuf,
    description: String,
    source: Option<Arc<dyn DataSource>>,
}

impl Declaration<'_> {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Loads the data with `loader` instead of the extension-based default.
    pub fn loader<F>(self, loader: F) -> Self
    where
        F: Fn(&Path) -> Result<LoadedData, Error> + Send + Sync + 'static,
    {
        self.source(loader)
    }

    /// Loads the data from `source` instead of the extension-based default.
    pub fn source(mut self, source: impl DataSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Registers `target` under its name and hands it back unchanged.
    pub fn register(self, target: Target) -> Target {
        self.registry.register(
            target.clone(),
            self.relative_path,
            self.description,
            self.source,
        );
        target
    }
}
