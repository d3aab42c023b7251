//! End-to-end tests of declaring, compiling and requesting fixtures through a session.

use claims::{assert_err, assert_matches, assert_ok, assert_some};
use data_fixtures::{
    CallArgs, Config, CsvFixture, Error, HasDescription, JsonFixture, LoadedData, Parameter,
    RowFilter, Signature, Target, XmlFixture,
};
use serde_json::{Value, json};

use crate::{data_dir, session};

#[test]
fn class_fixtures_for_every_built_in_format() {
    let mut session = session();
    let fixtures = session.fixtures_mut();
    fixtures
        .data_fixture("users.json")
        .description("Test user data")
        .register(Target::class::<JsonFixture>("users"));
    fixtures
        .data_fixture("products.csv")
        .description("Product catalog")
        .register(Target::class::<CsvFixture>("products"));
    fixtures
        .data_fixture("catalog.xml")
        .register(Target::class::<XmlFixture>("catalog"));

    let namespace = session.compile_all();
    assert_eq!(namespace.names(), vec!["users", "products", "catalog"]);

    let users = assert_ok!(session.request("users", CallArgs::new()));
    let users = assert_some!(users.downcast_ref::<JsonFixture>());
    assert_eq!(HasDescription::description(users), "Test user data");
    assert_eq!(users["users"].as_array().map(Vec::len), Some(3));

    let products = assert_ok!(session.request("products", CallArgs::new()));
    let products = assert_some!(products.downcast_ref::<CsvFixture>());
    let furniture = products.filter_rows(&RowFilter::new().equals("category", "furniture"));
    assert_eq!(furniture.len(), 2);

    let catalog = assert_ok!(session.request("catalog", CallArgs::new()));
    let catalog = assert_some!(catalog.downcast_ref::<XmlFixture>());
    assert_eq!(catalog.tag(), "catalog");
    assert_eq!(format!("{catalog:?}").split('(').next(), Some("XmlFixture"));
}

#[test]
fn function_fixture_gets_data_and_host_arguments() {
    let mut session = session();
    let signature = assert_ok!(Signature::new([
        Parameter::positional("data"),
        Parameter::keyword_only("active").with_default(true),
    ]));
    session.fixtures_mut().data_fixture("users.json").register(Target::function(
        "user_names",
        signature,
        |data: LoadedData, args| {
            let active: bool = args.get_as("active")?;
            let names: Vec<Value> = data.to_json()["users"]
                .as_array()
                .into_iter()
                .flatten()
                .filter(|user| user["active"] == json!(active))
                .map(|user| user["name"].clone())
                .collect();
            Ok(Box::new(Value::Array(names)))
        },
    ));
    session.compile_all();

    let active = assert_ok!(session.request("user_names", CallArgs::new()));
    assert_eq!(active.downcast_ref::<Value>(), Some(&json!(["Alice", "Carol"])));

    let inactive = assert_ok!(session.request("user_names", CallArgs::new().kwarg("active", false)));
    assert_eq!(inactive.downcast_ref::<Value>(), Some(&json!(["Bob"])));

    // keyword-only parameters cannot be passed by position
    assert_matches!(
        session.request("user_names", CallArgs::new().arg(false)),
        Err(Error::InvalidArgument(_))
    );
}

#[test]
fn misconfigured_root_reports_the_setting() {
    let mut session = session();
    session
        .fixtures_mut()
        .data_fixture("users.json")
        .register(Target::class::<JsonFixture>("users"));
    session.configure(Config::new(data_dir().join("missing")));
    session.compile_all();

    let err = assert_err!(session.request("users", CallArgs::new()));

    assert!(err.is_not_found());
    let message = err.to_string();
    assert!(message.contains("users"), "{message}");
    assert!(message.contains("fixture_path"), "{message}");
}

#[test]
fn malformed_data_surfaces_at_request_time() {
    let mut session = session();
    session
        .fixtures_mut()
        .data_fixture("broken.json")
        .register(Target::class::<JsonFixture>("broken"));

    session.compile_all();

    assert_matches!(
        session.request("broken", CallArgs::new()),
        Err(Error::InvalidData { format: "json", .. })
    );
}

#[test]
fn registrations_after_compilation_need_a_recompile() {
    let mut session = session();
    session.compile_all();
    session
        .fixtures_mut()
        .data_fixture("users.json")
        .register(Target::class::<JsonFixture>("late"));

    assert!(session.fixture("late").is_none());
    session.compile_all();
    assert!(session.fixture("late").is_some());
}

#[test]
fn sessions_are_independent_across_threads() {
    let handles: Vec<_> = ["users.json", "products.csv"]
        .into_iter()
        .map(|file| {
            std::thread::spawn(move || {
                let mut session = session();
                session
                    .fixtures_mut()
                    .data_fixture(file)
                    .register(Target::class_with("data", |data, _| Ok(Box::new(data))));
                session.compile_all();
                let value = session.request("data", CallArgs::new()).map_err(|e| e.to_string())?;
                value
                    .downcast_ref::<LoadedData>()
                    .map(LoadedData::kind)
                    .ok_or_else(|| "unexpected value".to_string())
            })
        })
        .collect();

    let kinds: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("session thread"))
        .collect();

    assert_eq!(kinds, vec![Ok("json"), Ok("csv")]);
}
