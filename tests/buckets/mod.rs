//! Tests of fixtures backed by storage buckets.

use std::collections::HashMap;

use claims::{assert_err, assert_matches, assert_ok, assert_some};
use data_fixtures::{CallArgs, CsvFixture, Error, JsonFixture, ObjectStore, Target, XmlFixture};

use crate::session;

struct StaticStore(HashMap<&'static str, &'static [u8]>);

impl ObjectStore for StaticStore {
    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Error> {
        self.0
            .get(format!("{bucket}/{key}").as_str())
            .map(|content| content.to_vec())
            .ok_or_else(|| anyhow::anyhow!("object {bucket}/{key} does not exist").into())
    }
}

#[test]
fn mocked_buckets_read_local_files() {
    let mut session = session();
    let fixtures = session.fixtures_mut();
    fixtures
        .aws_bucket_fixture("test-bucket", "users.json")
        .description("Users from S3")
        .register(Target::class::<JsonFixture>("s3_users"));
    fixtures
        .gcs_fixture("test-bucket", "products.csv")
        .register(Target::class::<CsvFixture>("gcs_products"));
    fixtures
        .azure_blob_fixture("container", "catalog.xml")
        .register(Target::class::<XmlFixture>("azure_catalog"));
    session.compile_all();

    let users = assert_ok!(session.request("s3_users", CallArgs::new()));
    let users = assert_some!(users.downcast_ref::<JsonFixture>());
    assert_eq!(format!("{users:?}"), r#"JsonFixture("Users from S3")"#);

    let products = assert_ok!(session.request("gcs_products", CallArgs::new()));
    assert_eq!(assert_some!(products.downcast_ref::<CsvFixture>()).row_count(), 4);

    let catalog = assert_ok!(session.request("azure_catalog", CallArgs::new()));
    let catalog = assert_some!(catalog.downcast_ref::<XmlFixture>());
    assert_eq!(assert_ok!(catalog.findall("book")).len(), 2);
}

#[test]
fn live_buckets_fetch_through_the_client() {
    let store = StaticStore(HashMap::from([(
        "remote/reports/latest.json",
        br#"{"status": "ok"}"#.as_slice(),
    )]));
    let mut session = session();
    session
        .fixtures_mut()
        .gcs_fixture("remote", "reports/latest.json")
        .mock(false)
        .client(store)
        .register(Target::class::<JsonFixture>("report"));
    session.compile_all();

    let report = assert_ok!(session.request("report", CallArgs::new()));
    let report = assert_some!(report.downcast_ref::<JsonFixture>());
    assert_eq!(report["status"], "ok");
}

#[cfg(not(feature = "s3"))]
#[test]
fn live_bucket_without_provider_support_fails_on_request() {
    let mut session = session();
    session
        .fixtures_mut()
        .aws_bucket_fixture("remote", "users.json")
        .mock(false)
        .register(Target::class::<JsonFixture>("remote_users"));
    session.compile_all();

    let err = assert_err!(session.request("remote_users", CallArgs::new()));
    assert_matches!(err, Error::DependencyMissing { feature: "s3", .. });
}
