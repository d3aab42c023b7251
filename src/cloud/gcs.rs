//! Live Google Cloud Storage access through the `google-cloud-storage` client.

use std::fmt;

use anyhow::anyhow;
use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::objects::{download::Range, get::GetObjectRequest},
};
use tokio::runtime::Runtime;
use tracing::debug;

use crate::error::Error;

use super::ObjectStore;

const ENV_ENDPOINT: &str = "STORAGE_EMULATOR_HOST";

pub(super) struct GcsClient {
    runtime: Runtime,
    client: Client,
}

impl GcsClient {
    /// Application default credentials when available, anonymous access otherwise. `STORAGE_EMULATOR_HOST`
    /// overrides the endpoint.
    pub(super) fn from_env() -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let endpoint = std::env::var(ENV_ENDPOINT).ok();
        let client = runtime.block_on(async {
            let mut config = match ClientConfig::default().with_auth().await {
                Ok(config) => config,
                Err(e) => {
                    debug!(error = %e, "no Google credentials found, using anonymous access");
                    ClientConfig::default().anonymous()
                }
            };
            if let Some(endpoint) = endpoint {
                config.storage_endpoint = endpoint;
            }
            Client::new(config)
        });

        Ok(Self { runtime, client })
    }
}

impl fmt::Debug for GcsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsClient").finish_non_exhaustive()
    }
}

impl ObjectStore for GcsClient {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Error> {
        let request = GetObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            ..Default::default()
        };
        self.runtime
            .block_on(self.client.download_object(&request, &Range::default()))
            .map_err(|e| anyhow!("downloading gs://{bucket}/{key} failed: {e}").into())
    }
}
