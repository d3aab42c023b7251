//! Tests of the signatures compiled fixtures advertise to the host.

use claims::assert_ok;
use data_fixtures::{CallArgs, LoadedData, Parameter, ParameterKind, Signature, Target};
use rstest::rstest;
use serde_json::{Value, json};

use crate::session;

fn echo(data: LoadedData, args: data_fixtures::BoundArguments) -> Result<Box<dyn data_fixtures::FixtureValue>, data_fixtures::Error> {
    let bound: serde_json::Map<String, Value> =
        args.iter().map(|(name, value)| (name.to_string(), value.clone())).collect();
    Ok(Box::new(json!({"kind": data.kind(), "args": bound})))
}

#[test]
fn variadics_and_defaults_survive_compilation() {
    let declared = assert_ok!(Signature::new([
        Parameter::positional("data"),
        Parameter::positional("multiplier").with_default(2),
        Parameter::var_positional("args"),
        Parameter::keyword_only("scale").with_default(1.5),
        Parameter::var_keyword("kwargs"),
    ]));
    let mut session = session();
    session
        .fixtures_mut()
        .data_fixture("users.json")
        .register(Target::function("echo", declared.clone(), echo));
    session.compile_all();

    let fixture = session.fixture("echo").expect("compiled fixture");
    let host = fixture.signature();
    assert_eq!(host.parameters(), &declared.parameters()[1..]);
    assert_eq!(host.to_string(), "(multiplier=2, *args, scale=1.5, **kwargs)");
    let kinds: Vec<ParameterKind> = host.parameters().iter().map(Parameter::kind).collect();
    assert_eq!(
        kinds,
        vec![
            ParameterKind::Positional,
            ParameterKind::VarPositional,
            ParameterKind::KeywordOnly,
            ParameterKind::VarKeyword,
        ]
    );

    let value = assert_ok!(session.request(
        "echo",
        CallArgs::new().arg(3).arg("x").kwarg("verbose", true)
    ));
    assert_eq!(
        value.downcast_ref::<Value>(),
        Some(&json!({
            "kind": "json",
            "args": {"multiplier": 3, "args": ["x"], "scale": 1.5, "kwargs": {"verbose": true}}
        }))
    );
}

#[rstest]
#[case::data_slot(&["data", "limit"], &["limit"])]
#[case::self_slot(&["self"], &[])]
#[case::other_first_name(&["rows", "limit"], &["rows", "limit"])]
#[case::no_parameters(&[], &[])]
fn host_sees_everything_but_the_data_slot(#[case] declared: &[&str], #[case] visible: &[&str]) {
    let signature = assert_ok!(Signature::new(declared.iter().map(|name| Parameter::positional(*name))));
    let mut session = session();
    session
        .fixtures_mut()
        .data_fixture("users.json")
        .register(Target::function("target", signature, echo));
    session.compile_all();

    let fixture = session.fixture("target").expect("compiled fixture");
    assert_eq!(fixture.signature().names(), visible);
}
