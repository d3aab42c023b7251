use std::{collections::HashMap, fs, sync::Mutex};

use claims::{assert_err, assert_matches, assert_ok, assert_some};
use rstest::rstest;
use serde_json::json;

use super::*;

/// In-memory object store recording the requested objects.
#[derive(Default)]
struct MemoryStore {
    objects: HashMap<(String, String), Vec<u8>>,
    requests: Mutex<Vec<(String, String)>>,
}

impl MemoryStore {
    fn with_object(mut self, bucket: &str, key: &str, content: &[u8]) -> Self {
        self.objects
            .insert((bucket.to_string(), key.to_string()), content.to_vec());
        self
    }
}

impl ObjectStore for MemoryStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Error> {
        self.requests
            .lock()
            .expect("requests lock")
            .push((bucket.to_string(), key.to_string()));
        self.objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such object: {bucket}/{key}").into())
    }
}

impl ObjectStore for Arc<MemoryStore> {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Error> {
        self.as_ref().get_object(bucket, key)
    }
}

#[test]
fn mock_adapter_loads_like_the_loader_registry() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("users.json");
    fs::write(&path, br#"{"users": [1, 2]}"#).expect("write data file");
    let loaders = LoaderRegistry::new();

    let adapter = CloudAdapter::s3("bucket", "users.json");
    assert!(adapter.is_mock());

    let from_adapter = assert_ok!(adapter.resolve(&path, &loaders));
    let from_registry = assert_ok!(loaders.load(&path));
    assert_eq!(from_adapter, from_registry);
}

#[test]
fn mock_adapter_reports_missing_local_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let adapter = CloudAdapter::gcs("bucket", "missing.json");

    let err = assert_err!(adapter.resolve(&dir.path().join("missing.json"), &LoaderRegistry::new()));
    assert!(err.is_not_found());
}

#[cfg(not(feature = "s3"))]
#[test]
fn live_s3_without_feature_is_a_missing_dependency() {
    let adapter = CloudAdapter::s3("bucket", "data.json").mock(false);

    let err = assert_err!(adapter.resolve(Path::new("ignored.json"), &LoaderRegistry::new()));
    assert_matches!(
        err,
        Error::DependencyMissing {
            feature: "s3",
            ..
        }
    );
}

#[cfg(not(feature = "azure"))]
#[test]
fn live_azure_without_feature_is_a_missing_dependency() {
    let adapter = CloudAdapter::azure_blob("container", "data.json").mock(false);

    let err = assert_err!(adapter.resolve(Path::new("ignored.json"), &LoaderRegistry::new()));
    assert_matches!(
        err,
        Error::DependencyMissing {
            feature: "azure",
            ..
        }
    );
}

#[rstest]
#[case::json("data.json", br#"{"a": 1}"#.as_slice(), json!({"a": 1}))]
#[case::csv("reports/data.CSV", b"id,name\n1,x\n".as_slice(), json!([{"id": "1", "name": "x"}]))]
#[case::xml("data.xml", b"<root><v>1</v></root>".as_slice(), json!({"root": {"v": "1"}}))]
fn live_adapter_parses_by_key_extension(
    #[case] key: &str,
    #[case] content: &[u8],
    #[case] expected: serde_json::Value,
) {
    let store = MemoryStore::default().with_object("bucket", key, content);
    let adapter = CloudAdapter::gcs("bucket", key)
        .mock(false)
        .with_client(store);

    let data = assert_ok!(adapter.resolve(Path::new("does/not/matter"), &LoaderRegistry::new()));
    assert_eq!(data.to_json(), expected);
}

#[test]
fn live_adapter_returns_raw_bytes_for_unknown_extension() {
    let store = Arc::new(MemoryStore::default().with_object("bucket", "blob.bin", b"\x00\x01"));
    let adapter = CloudAdapter::azure_blob("bucket", "blob.bin")
        .mock(false)
        .with_client(Arc::clone(&store));

    let data = assert_ok!(adapter.resolve(Path::new("ignored"), &LoaderRegistry::new()));
    assert_eq!(data, LoadedData::Bytes(vec![0, 1]));
    assert_eq!(
        *store.requests.lock().expect("requests lock"),
        vec![("bucket".to_string(), "blob.bin".to_string())]
    );
}

#[test]
fn live_adapter_reports_malformed_content_as_invalid_data() {
    let store = MemoryStore::default().with_object("bucket", "data.json", b"{not json");
    let adapter = CloudAdapter::s3("bucket", "data.json")
        .mock(false)
        .with_client(store);

    let err = assert_err!(adapter.resolve(Path::new("ignored"), &LoaderRegistry::new()));
    assert_matches!(err, Error::InvalidData { format: "json", .. });
}

#[test]
fn live_adapter_propagates_store_errors() {
    let adapter = CloudAdapter::s3("bucket", "absent.json")
        .mock(false)
        .with_client(MemoryStore::default());

    let err = assert_err!(adapter.resolve(Path::new("ignored"), &LoaderRegistry::new()));
    assert_matches!(err, Error::Other(_));
}

#[rstest]
#[case::aws(Provider::S3)]
#[case::gcs(Provider::Gcs)]
#[case::azure(Provider::Azure)]
fn cloud_declarations_use_the_key_as_relative_path(#[case] provider: Provider) {
    let mut registry = FixtureRegistry::new();
    let target = Target::class_with("bucket_data", |data, _| Ok(Box::new(data)));

    let declaration = match provider {
        Provider::S3 => registry.aws_bucket_fixture("bucket", "nested/data.json"),
        Provider::Gcs => registry.gcs_fixture("bucket", "nested/data.json"),
        Provider::Azure => registry.azure_blob_fixture("bucket", "nested/data.json"),
    };
    let registered = declaration.description("bucket backed").register(target);

    let entry = assert_some!(registry.get(registered.name()));
    assert_eq!(entry.relative_path, PathBuf::from("nested/data.json"));
    assert_eq!(entry.description, "bucket backed");
    assert!(entry.source.is_some());
    assert!(entry.is_class());
}

#[test]
fn provider_names_and_features() {
    assert_eq!(Provider::S3.to_string(), "AWS S3");
    assert_eq!(Provider::Gcs.feature(), "gcs");
    assert_eq!(Provider::Azure.name(), "Azure Blob Storage");
}
