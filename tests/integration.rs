//! Integration tests for the data fixtures.

mod buckets;
mod from_file;
mod loaders;
mod sessions;
mod signatures;
mod wrappers;

use std::path::PathBuf;

use data_fixtures::{Config, Session};

/// Directory holding the data files of the integration tests.
pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
}

/// A session reading from `tests/data/`.
pub fn session() -> Session {
    Session::new(Config::new(data_dir()))
}

#[test]
fn empty_session_compiles_nothing() {
    let mut session = session();

    let namespace = session.compile_all();

    assert!(namespace.is_empty());
    assert!(session.fixture("anything").is_none());
}
