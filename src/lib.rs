//! Data-backed test fixtures.
//!
//! A fixture is declared by pointing a target at a data file: a class-like type constructed from the loaded data, or a
//! function receiving the data as its first argument. At session start every declaration is compiled into a callable
//! which loads the file on each request and advertises only the parameters the host still has to supply.
//!
//! # Example
//!
//! ```no_run
//! use data_fixtures::{
//!     CallArgs, Config, JsonFixture, LoadedData, Parameter, Session, Signature, Target,
//! };
//!
//! let mut session = Session::new(Config::new("tests/data"));
//!
//! session
//!     .fixtures_mut()
//!     .data_fixture("users.json")
//!     .description("Known users")
//!     .register(Target::class::<JsonFixture>("users"));
//!
//! let signature = Signature::new([
//!     Parameter::positional("data"),
//!     Parameter::positional("limit").with_default(10),
//! ])?;
//! session.fixtures_mut().data_fixture("users.json").register(Target::function(
//!     "first_users",
//!     signature,
//!     |data: LoadedData, args| {
//!         let limit: usize = args.get_as("limit")?;
//!         let users = data.to_json()["users"].as_array().cloned().unwrap_or_default();
//!         Ok(Box::new(serde_json::Value::from(users.into_iter().take(limit).collect::<Vec<_>>())))
//!     },
//! ));
//!
//! session.compile_all();
//! let users = session.request("users", CallArgs::new())?;
//! let first = session.request("first_users", CallArgs::new().kwarg("limit", 1))?;
//! println!("{users:?} {first:?}");
//! # Ok::<(), data_fixtures::Error>(())
//! ```

mod cloud;
mod compiler;
mod config;
mod data;
mod error;
mod formats;
mod loader;
mod registry;
mod session;
mod signature;
mod telemetry;
mod types;
mod value;

pub use cloud::{CloudAdapter, CloudDeclaration, ObjectStore, Provider};
pub use compiler::{CompiledFixture, FixtureNamespace, compile_all};
pub use config::{Config, FIXTURE_PATH_ENV, FIXTURE_PATH_SETTING};
pub use data::{LoadedData, Row};
pub use error::Error;
pub use formats::{Element, XPathItem, XmlDocument, parse_by_extension, parse_csv, parse_json, parse_xml};
pub use loader::{DataSource, Loader, LoaderRegistry};
pub use registry::{CallFn, ConstructFn, Declaration, FixtureClass, FixtureRegistry, Registration, Target};
pub use session::Session;
pub use signature::{
    BoundArguments, CallArgs, DATA_SLOT_NAMES, Parameter, ParameterKind, Signature,
};
pub use telemetry::setup_logging;
pub use types::{BaseFixture, CsvFixture, JsonFixture, RowFilter, XmlFixture};
#[doc(hidden)]
pub use value::AsAny;
pub use value::{FixtureValue, HasDescription};
