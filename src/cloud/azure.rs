//! Live Azure Blob Storage access through the Azure SDK, configured from a storage connection string.

use std::fmt;

use anyhow::anyhow;
use azure_storage::ConnectionString;
use azure_storage_blobs::prelude::{BlobServiceClient, ClientBuilder};
use tokio::runtime::Runtime;

use crate::error::Error;

use super::ObjectStore;

pub(crate) const ENV_CONNECTION_STRING: &str = "AZURE_STORAGE_CONNECTION_STRING";

pub(super) struct AzureBlobClient {
    runtime: Runtime,
    account: String,
    service: BlobServiceClient,
}

impl AzureBlobClient {
    pub(super) fn from_env() -> Result<Self, Error> {
        let connection_string = std::env::var(ENV_CONNECTION_STRING).map_err(|_| {
            Error::ConfigurationMissing(format!("{ENV_CONNECTION_STRING} environment variable not set"))
        })?;
        Self::from_connection_string(&connection_string)
    }

    /// Accepts account key and SAS connection strings. The account name is required either way.
    pub(super) fn from_connection_string(connection_string: &str) -> Result<Self, Error> {
        let settings = ConnectionString::new(connection_string)
            .map_err(|e| Error::ConfigurationMissing(format!("invalid Azure connection string: {e}")))?;
        let account = settings
            .account_name
            .ok_or_else(|| Error::ConfigurationMissing("connection string has no AccountName".to_string()))?
            .to_string();
        let credentials = settings
            .storage_credentials()
            .map_err(|e| Error::ConfigurationMissing(format!("connection string has no usable credentials: {e}")))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            runtime,
            service: ClientBuilder::new(account.clone(), credentials).blob_service_client(),
            account,
        })
    }
}

impl fmt::Debug for AzureBlobClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureBlobClient")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

impl ObjectStore for AzureBlobClient {
    fn get_object(&self, container: &str, blob: &str) -> Result<Vec<u8>, Error> {
        let client = self.service.container_client(container).blob_client(blob);
        self.runtime
            .block_on(client.get_content())
            .map_err(|e| anyhow!("downloading blob {container}/{blob} from {} failed: {e}", self.account).into())
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_err, assert_matches, assert_ok};

    use super::*;

    #[test]
    fn account_key_connection_string_builds_a_client() {
        let client = assert_ok!(AzureBlobClient::from_connection_string(
            "DefaultEndpointsProtocol=https;AccountName=acct;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net"
        ));
        assert_eq!(client.account, "acct");
    }

    #[test]
    fn connection_string_without_account_is_rejected() {
        let err = assert_err!(AzureBlobClient::from_connection_string(
            "DefaultEndpointsProtocol=https;AccountKey=c2VjcmV0"
        ));
        assert_matches!(err, Error::ConfigurationMissing(_));
    }
}
