//! Live S3 access through the AWS SDK. Credentials and region come from the standard AWS environment.

use std::fmt;

use anyhow::anyhow;
use aws_sdk_s3::{Client, error::DisplayErrorContext};
use tokio::runtime::Runtime;

use crate::error::Error;

use super::ObjectStore;

pub(super) struct S3Client {
    // the SDK is async; fetches run to completion on this runtime
    runtime: Runtime,
    client: Client,
}

impl S3Client {
    pub(super) fn from_env() -> Result<Self, Error> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let config = runtime.block_on(aws_config::load_defaults(
            aws_config::BehaviorVersion::latest(),
        ));
        Ok(Self {
            runtime,
            client: Client::new(&config),
        })
    }
}

impl fmt::Debug for S3Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Client").finish_non_exhaustive()
    }
}

impl ObjectStore for S3Client {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Error> {
        self.runtime.block_on(async {
            let response = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| anyhow!("GetObject s3://{bucket}/{key} failed: {}", DisplayErrorContext(&e)))?;
            let body = response
                .body
                .collect()
                .await
                .map_err(|e| anyhow!("reading s3://{bucket}/{key} failed: {e}"))?;
            Ok::<_, Error>(body.into_bytes().to_vec())
        })
    }
}
