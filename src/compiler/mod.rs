//! Module turning registered fixtures into callables the host can request.
//!
//! Compiling a registration resolves its data path against the configured base directory and fixes the signature the
//! host sees: function targets lose their leading data parameter, class targets take no arguments at all. Invoking a
//! compiled fixture binds the host arguments, loads the data (again on every call) and hands both to the target.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::IndexMap;
use tracing::{debug, error};

use crate::{
    config::{Config, FIXTURE_PATH_SETTING},
    data::LoadedData,
    error::Error,
    loader::{DataSource, LoaderRegistry},
    registry::{FixtureRegistry, Registration, Target},
    signature::{CallArgs, Signature},
    value::FixtureValue,
};


/// A registered fixture bound to its absolute data path.
#[derive(Clone)]
pub struct CompiledFixture {
    name: String,
    path: PathBuf,
    description: String,
    source: Option<Arc<dyn DataSource>>,
    signature: Signature,
    target: Target,
}

impl CompiledFixture {
    /// Compiles `registration` with data resolved against `root`.
    pub fn compile(registration: &Registration, root: &Path) -> Self {
        let signature = match &registration.target {
            Target::Class { .. } => Signature::empty(),
            Target::Function { signature, .. } => signature.without_data_slot(),
        };
        let path = root.join(&registration.relative_path);
        debug!(
            fixture = %registration.name,
            path = %path.display(),
            signature = %signature,
            "compiled data fixture"
        );
        Self {
            name: registration.name.clone(),
            path,
            description: registration.description.clone(),
            source: registration.source.clone(),
            signature,
            target: registration.target.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path of the backing data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_class(&self) -> bool {
        self.target.is_class()
    }

    /// Parameters the host has to supply.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Produces the fixture value for the host-supplied `args`.
    ///
    /// A missing data file is reported as [`Error::FixtureDataNotFound`]; every other failure is logged and returned
    /// unchanged.
    pub fn invoke(
        &self,
        args: CallArgs,
        loaders: &LoaderRegistry,
    ) -> Result<Box<dyn FixtureValue>, Error> {
        self.run(args, loaders).map_err(|err| self.report(err))
    }

    fn run(&self, args: CallArgs, loaders: &LoaderRegistry) -> Result<Box<dyn FixtureValue>, Error> {
        let bound = self.signature.bind(args)?;
        let data = self.load(loaders)?;

        match &self.target {
            Target::Class { construct, .. } => construct(data, &self.description),
            Target::Function { call, .. } => {
                let mut value = call(data, bound)?;
                if let Some(described) = value.as_described() {
                    described.set_description(self.description.clone());
                }
                Ok(value)
            }
        }
    }

    fn load(&self, loaders: &LoaderRegistry) -> Result<LoadedData, Error> {
        match &self.source {
            Some(source) => source.load(&self.path, loaders),
            None => loaders.load(&self.path),
        }
    }

    fn report(&self, err: Error) -> Error {
        if is_missing_file(&err) {
            return Error::FixtureDataNotFound {
                fixture: self.name.clone(),
                path: self.path.clone(),
                setting: FIXTURE_PATH_SETTING,
            };
        }
        error!(
            fixture = %self.name,
            path = %self.path.display(),
            error = %err,
            "data fixture failed"
        );
        err
    }
}

impl fmt::Debug for CompiledFixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFixture")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("signature", &self.signature.to_string())
            .field("class", &self.is_class())
            .finish()
    }
}

fn is_missing_file(err: &Error) -> bool {
    match err {
        Error::NotFound { .. } => true,
        Error::Io(io) => io.kind() == std::io::ErrorKind::NotFound,
        _ => false,
    }
}

/// Compiled fixtures by name, in registration order.
#[derive(Debug, Clone, Default)]
pub struct FixtureNamespace {
    fixtures: IndexMap<String, CompiledFixture>,
}

impl FixtureNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `fixture` under its name, replacing any fixture of the same name.
    pub fn install(&mut self, fixture: CompiledFixture) {
        self.fixtures.insert(fixture.name.clone(), fixture);
    }

    pub fn get(&self, name: &str) -> Option<&CompiledFixture> {
        self.fixtures.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.fixtures.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledFixture> {
        self.fixtures.values()
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Invokes the fixture `name` with `args`.
    pub fn request(
        &self,
        name: &str,
        args: CallArgs,
        loaders: &LoaderRegistry,
    ) -> Result<Box<dyn FixtureValue>, Error> {
        let fixture = self
            .get(name)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown fixture '{name}'")))?;
        fixture.invoke(args, loaders)
    }
}

/// Compiles every registration of `registry` into a fresh namespace.
pub fn compile_all(registry: &FixtureRegistry, config: &Config) -> FixtureNamespace {
    let mut namespace = FixtureNamespace::new();
    for registration in registry.iter() {
        namespace.install(CompiledFixture::compile(registration, &config.fixture_path));
    }
    debug!(
        fixtures = namespace.len(),
        root = %config.fixture_path.display(),
        "compiled data fixtures"
    );
    namespace
}
