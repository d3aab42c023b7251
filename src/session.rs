//! Module defining the session: the owner of the registries and the compiled fixtures for one test run.

use std::path::Path;

use tracing::info;

use crate::{
    compiler::{self, CompiledFixture, FixtureNamespace},
    config::Config,
    data::LoadedData,
    error::Error,
    loader::LoaderRegistry,
    registry::FixtureRegistry,
    signature::CallArgs,
    value::FixtureValue,
};

/// A fixture session. Declare fixtures on [`Session::fixtures_mut`], then [`Session::compile_all`] and request them.
///
/// Sessions share nothing, so independent sessions can live on different threads.
#[derive(Debug, Default)]
pub struct Session {
    config: Config,
    loaders: LoaderRegistry,
    fixtures: FixtureRegistry,
    namespace: FixtureNamespace,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replaces the captured settings. Takes effect at the next [`Session::compile_all`].
    pub fn configure(&mut self, config: Config) {
        self.config = config;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    pub fn loaders_mut(&mut self) -> &mut LoaderRegistry {
        &mut self.loaders
    }

    /// Installs `loader` for `extension`, replacing any previous one.
    pub fn register_loader<F>(&mut self, extension: &str, loader: F)
    where
        F: Fn(&Path) -> Result<LoadedData, Error> + Send + Sync + 'static,
    {
        self.loaders.register(extension, loader);
    }

    pub fn fixtures(&self) -> &FixtureRegistry {
        &self.fixtures
    }

    pub fn fixtures_mut(&mut self) -> &mut FixtureRegistry {
        &mut self.fixtures
    }

    /// Compiles every registered fixture into a fresh namespace, replacing the previous one.
    pub fn compile_all(&mut self) -> &FixtureNamespace {
        self.namespace = compiler::compile_all(&self.fixtures, &self.config);
        info!(
            fixtures = self.namespace.len(),
            root = %self.config.fixture_path.display(),
            "data fixtures ready"
        );
        &self.namespace
    }

    pub fn namespace(&self) -> &FixtureNamespace {
        &self.namespace
    }

    /// The compiled fixture `name`. Fixtures registered since the last compilation are not visible.
    pub fn fixture(&self, name: &str) -> Option<&CompiledFixture> {
        self.namespace.get(name)
    }

    /// Invokes the compiled fixture `name` with `args`.
    pub fn request(&self, name: &str, args: CallArgs) -> Result<Box<dyn FixtureValue>, Error> {
        self.namespace.request(name, args, &self.loaders)
    }
}
