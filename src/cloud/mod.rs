//! Module for fixtures backed by objects in cloud storage buckets.
//!
//! By default an adapter mocks the bucket: the object key doubles as a path relative to the configured fixture
//! directory and is loaded like any other data file. With mocking disabled the object is fetched from the provider
//! and parsed by the extension of its key, with the same parsers the file loaders use.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use tracing::debug;

use crate::{
    data::LoadedData,
    error::Error,
    formats,
    loader::{DataSource, LoaderRegistry},
    registry::{FixtureRegistry, Target},
};

#[cfg(feature = "azure")]
mod azure;
#[cfg(feature = "gcs")]
mod gcs;
#[cfg(feature = "s3")]
mod s3;

#[cfg(test)]
mod tests;

/// Fetches raw objects from a storage provider.
pub trait ObjectStore: Send + Sync {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    S3,
    Gcs,
    Azure,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Provider::S3 => "AWS S3",
            Provider::Gcs => "Google Cloud Storage",
            Provider::Azure => "Azure Blob Storage",
        }
    }

    /// The cargo feature compiling in the provider's client.
    pub fn feature(self) -> &'static str {
        match self {
            Provider::S3 => "s3",
            Provider::Gcs => "gcs",
            Provider::Azure => "azure",
        }
    }

    fn dependency_missing(self) -> Error {
        Error::DependencyMissing {
            provider: self.name(),
            feature: self.feature(),
        }
    }

    /// Creates the provider's client from the environment.
    fn connect(self) -> Result<Arc<dyn ObjectStore>, Error> {
        match self {
            Provider::S3 => connect_s3(),
            Provider::Gcs => connect_gcs(),
            Provider::Azure => connect_azure(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "s3")]
fn connect_s3() -> Result<Arc<dyn ObjectStore>, Error> {
    Ok(Arc::new(s3::S3Client::from_env()?))
}

#[cfg(not(feature = "s3"))]
fn connect_s3() -> Result<Arc<dyn ObjectStore>, Error> {
    Err(Provider::S3.dependency_missing())
}

#[cfg(feature = "gcs")]
fn connect_gcs() -> Result<Arc<dyn ObjectStore>, Error> {
    Ok(Arc::new(gcs::GcsClient::from_env()?))
}

#[cfg(not(feature = "gcs"))]
fn connect_gcs() -> Result<Arc<dyn ObjectStore>, Error> {
    Err(Provider::Gcs.dependency_missing())
}

#[cfg(feature = "azure")]
fn connect_azure() -> Result<Arc<dyn ObjectStore>, Error> {
    Ok(Arc::new(azure::AzureBlobClient::from_env()?))
}

#[cfg(not(feature = "azure"))]
fn connect_azure() -> Result<Arc<dyn ObjectStore>, Error> {
    Err(Provider::Azure.dependency_missing())
}

/// Data source for an object in a storage bucket.
#[derive(Clone)]
pub struct CloudAdapter {
    provider: Provider,
    bucket: String,
    key: String,
    mock: bool,
    client: Option<Arc<dyn ObjectStore>>,
}

impl CloudAdapter {
    /// A mocking adapter for `key` in `bucket`.
    pub fn new(provider: Provider, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            provider,
            bucket: bucket.into(),
            key: key.into(),
            mock: true,
            client: None,
        }
    }

    pub fn s3(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(Provider::S3, bucket, key)
    }

    pub fn gcs(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(Provider::Gcs, bucket, key)
    }

    pub fn azure_blob(container: impl Into<String>, blob: impl Into<String>) -> Self {
        Self::new(Provider::Azure, container, blob)
    }

    /// `true` loads the local file standing in for the object, `false` fetches it from the provider.
    pub fn mock(mut self, mock: bool) -> Self {
        self.mock = mock;
        self
    }

    /// Fetches live objects through `client` instead of the provider's own client.
    pub fn with_client(mut self, client: impl ObjectStore + 'static) -> Self {
        self.client = Some(Arc::new(client));
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_mock(&self) -> bool {
        self.mock
    }

    /// Loads the object: from `local_hint` through `loaders` when mocking, from the provider otherwise.
    pub fn resolve(&self, local_hint: &Path, loaders: &LoaderRegistry) -> Result<LoadedData, Error> {
        if self.mock {
            return loaders.load(local_hint);
        }
        self.load_remote()
    }

    fn load_remote(&self) -> Result<LoadedData, Error> {
        let client = match &self.client {
            Some(client) => Arc::clone(client),
            None => self.provider.connect()?,
        };

        debug!(provider = %self.provider, bucket = %self.bucket, key = %self.key, "fetching object");
        let content = client.get_object(&self.bucket, &self.key)?;

        let extension = Path::new(&self.key)
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        formats::parse_by_extension(content, &extension)
    }
}

impl DataSource for CloudAdapter {
    fn load(&self, path: &Path, loaders: &LoaderRegistry) -> Result<LoadedData, Error> {
        self.resolve(path, loaders)
    }
}

impl fmt::Debug for CloudAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudAdapter")
            .field("provider", &self.provider)
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("mock", &self.mock)
            .field("custom_client", &self.client.is_some())
            .finish()
    }
}

impl FixtureRegistry {
    /// Declares a fixture backed by `key` in the S3 bucket `bucket`.
    pub fn aws_bucket_fixture(
        &mut self,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> CloudDeclaration<'_> {
        self.cloud_fixture(CloudAdapter::s3(bucket, key))
    }

    /// Declares a fixture backed by `key` in the GCS bucket `bucket`.
    pub fn gcs_fixture(
        &mut self,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> CloudDeclaration<'_> {
        self.cloud_fixture(CloudAdapter::gcs(bucket, key))
    }

    /// Declares a fixture backed by `blob` in the Azure container `container`.
    pub fn azure_blob_fixture(
        &mut self,
        container: impl Into<String>,
        blob: impl Into<String>,
    ) -> CloudDeclaration<'_> {
        self.cloud_fixture(CloudAdapter::azure_blob(container, blob))
    }

    fn cloud_fixture(&mut self, adapter: CloudAdapter) -> CloudDeclaration<'_> {
        CloudDeclaration {
            registry: self,
            adapter,
            description: String::new(),
        }
    }
}

/// Builder for a bucket-backed fixture declaration. The object key is used as the local path when mocking.
#[must_use = "a declaration does nothing until `register` is called"]
pub struct CloudDeclaration<'r> {
    registry: &'r mut FixtureRegistry,
    adapter: CloudAdapter,
    description: String,
}

impl CloudDeclaration<'_> {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn mock(mut self, mock: bool) -> Self {
        self.adapter = self.adapter.mock(mock);
        self
    }

    pub fn client(mut self, client: impl ObjectStore + 'static) -> Self {
        self.adapter = self.adapter.with_client(client);
        self
    }

    /// Registers `target` under its name and hands it back unchanged.
    pub fn register(self, target: Target) -> Target {
        let relative_path = PathBuf::from(self.adapter.key());
        self.registry.register(
            target.clone(),
            relative_path,
            self.description,
            Some(Arc::new(self.adapter)),
        );
        target
    }
}
