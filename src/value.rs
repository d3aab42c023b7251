//! Module defining what a fixture produces and the optional description capability of those values.

use std::any::Any;
use std::fmt;

use serde_json::Value;

use crate::data::{LoadedData, Row};

/// Values which can carry the description of the fixture they were produced by.
pub trait HasDescription {
    fn description(&self) -> &str;
    fn set_description(&mut self, description: String);
}

#[doc(hidden)]
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A value produced by a compiled fixture.
///
/// Types which want to receive the fixture description implement [`HasDescription`] and return `Some(self)` from
/// [`FixtureValue::as_described`].
pub trait FixtureValue: AsAny + fmt::Debug {
    fn as_described(&mut self) -> Option<&mut dyn HasDescription> {
        None
    }
}

impl dyn FixtureValue {
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl FixtureValue for Value {}
impl FixtureValue for LoadedData {}
impl FixtureValue for Vec<Row> {}
impl FixtureValue for String {}
impl FixtureValue for bool {}
impl FixtureValue for i64 {}
impl FixtureValue for u64 {}
impl FixtureValue for f64 {}
impl FixtureValue for () {}
