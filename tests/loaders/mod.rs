//! Tests of the built-in loaders and of loaders registered by the user.

use std::path::Path;

use claims::{assert_err, assert_matches, assert_ok, assert_some};
use data_fixtures::{
    CallArgs, Error, JsonFixture, LoadedData, LoaderRegistry, Target,
};
use rstest::rstest;
use serde_json::{Map, Value, json};

use crate::{data_dir, session};

/// Parses `key = value` lines, skipping comments.
fn load_ini(path: &Path) -> Result<LoadedData, Error> {
    let text = std::fs::read_to_string(path)?;
    let settings: Map<String, Value> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), Value::String(value.trim().to_string())))
        .collect();
    Ok(LoadedData::Json(Value::Object(settings)))
}

#[rstest]
#[case::json("users.json", "json")]
#[case::csv("products.csv", "csv")]
#[case::xml("catalog.xml", "xml")]
fn built_in_formats_load(#[case] file: &str, #[case] kind: &str) {
    let data = assert_ok!(LoaderRegistry::new().load(&data_dir().join(file)));
    assert_eq!(data.kind(), kind);
}

#[test]
fn unknown_extension_is_unsupported_until_registered() {
    let path = data_dir().join("settings.ini");
    let mut loaders = LoaderRegistry::new();

    let err = assert_err!(loaders.load(&path));
    assert_matches!(&err, Error::UnsupportedFormat { extension } if extension == "ini");

    loaders.register(".INI", load_ini);
    let data = assert_ok!(loaders.load(&path));
    assert_eq!(data, LoadedData::Json(json!({"name": "fixtures", "retries": "3"})));
}

#[test]
fn session_loaders_serve_compiled_fixtures() {
    let mut session = session();
    session.register_loader("ini", load_ini);
    session
        .fixtures_mut()
        .data_fixture("settings.ini")
        .description("Application settings")
        .register(Target::class::<JsonFixture>("settings"));
    session.compile_all();

    let value = assert_ok!(session.request("settings", CallArgs::new()));
    let settings = assert_some!(value.downcast_ref::<JsonFixture>());
    assert_eq!(assert_ok!(settings.get("retries")), Some(&json!("3")));
}

#[test]
fn directories_are_rejected() {
    let err = assert_err!(LoaderRegistry::new().load(&data_dir()));
    assert_matches!(err, Error::InvalidArgument(_));
}

#[test]
fn failing_user_loader_is_wrapped_with_the_path() {
    let path = data_dir().join("settings.ini");
    let mut loaders = LoaderRegistry::new();
    loaders.register("ini", |_: &Path| Err(anyhow::anyhow!("no ini support").into()));

    let err = assert_err!(loaders.load(&path));

    assert_matches!(&err, Error::LoadFailure { path: failed, .. } if failed == &path);
    assert!(std::error::Error::source(&err).is_some());
}
