//! Module defining the descriptive wrapper types: read-only views over loaded data which carry the description of
//! the fixture that produced them.
//!
//! All wrappers can be used as class targets (see [`FixtureClass`]) and receive the fixture description on
//! construction. Their [`Debug`](fmt::Debug) rendering is the short form `Name("description")`, falling back to
//! `Name(data=...)` without a description; [`Display`](fmt::Display) additionally shows the data. Rendered data is
//! cut to 80 characters.

use std::{fmt, ops::Index};

use serde_json::{Map, Value, map};

use crate::{
    data::{LoadedData, Row},
    error::{Error, not_a_mapping},
    formats::{Element, XPathItem, XmlDocument},
    registry::FixtureClass,
    value::{FixtureValue, HasDescription},
};


const REPR_MAX_LEN: usize = 80;
const ELLIPSIS: &str = "...";

/// Implements description handling and rendering for a wrapper with `data` and `description` fields.
macro_rules! descriptive_fixture {
    ($name:ident) => {
        impl HasDescription for $name {
            fn description(&self) -> &str {
                &self.description
            }

            fn set_description(&mut self, description: String) {
                self.description = description;
            }
        }

        impl FixtureValue for $name {
            fn as_described(&mut self) -> Option<&mut dyn HasDescription> {
                Some(self)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                render_short(f, stringify!($name), &self.data_repr(), &self.description)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                render_detailed(f, stringify!($name), &self.data_repr(), &self.description)
            }
        }
    };
}

/// Wrapper over loaded data of any shape.
#[derive(Clone, PartialEq)]
pub struct BaseFixture {
    data: LoadedData,
    description: String,
}

impl BaseFixture {
    pub fn new(data: impl Into<LoadedData>) -> Self {
        Self {
            data: data.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn data(&self) -> &LoadedData {
        &self.data
    }

    pub fn into_data(self) -> LoadedData {
        self.data
    }

    /// Number of entries, rows or bytes. Scalars and XML documents have no size and report 0.
    pub fn len(&self) -> usize {
        match &self.data {
            LoadedData::Json(value) => json_len(value),
            LoadedData::Csv(rows) => rows.len(),
            LoadedData::Xml(_) => 0,
            LoadedData::Bytes(bytes) => bytes.len(),
        }
    }

    /// True for `null`, `false`, zero and anything sized without entries. An XML document is never empty.
    pub fn is_empty(&self) -> bool {
        match &self.data {
            LoadedData::Json(value) => json_is_empty(value),
            LoadedData::Csv(rows) => rows.is_empty(),
            LoadedData::Xml(_) => false,
            LoadedData::Bytes(bytes) => bytes.is_empty(),
        }
    }

    /// Iterates the JSON view of the data: the keys of an object, the elements of an array or CSV rows as objects.
    pub fn iter(&self) -> impl Iterator<Item = Value> {
        let items = match self.data.to_json() {
            Value::Object(map) => map.into_iter().map(|(k, _)| Value::String(k)).collect(),
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        items.into_iter()
    }

    /// Membership on the JSON view of the data, see [`JsonFixture::contains`].
    pub fn contains(&self, item: &Value) -> bool {
        json_contains(&self.data.to_json(), item)
    }

    fn data_repr(&self) -> String {
        self.data.to_json().to_string()
    }
}

impl FixtureClass for BaseFixture {
    fn from_data(data: LoadedData, description: &str) -> Result<Self, Error> {
        Ok(Self::new(data).with_description(description))
    }
}

descriptive_fixture!(BaseFixture);

/// Wrapper over parsed JSON with mapping helpers.
#[derive(Clone, PartialEq)]
pub struct JsonFixture {
    data: Value,
    description: String,
}

impl JsonFixture {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn keys(&self) -> Result<map::Keys<'_>, Error> {
        self.as_object().map(Map::keys)
    }

    pub fn values(&self) -> Result<map::Values<'_>, Error> {
        self.as_object().map(Map::values)
    }

    pub fn items(&self) -> Result<map::Iter<'_>, Error> {
        self.as_object().map(Map::iter)
    }

    /// The value under `key`, if the data is an object.
    pub fn get(&self, key: &str) -> Result<Option<&Value>, Error> {
        self.as_object().map(|map| map.get(key))
    }

    /// The value under `key`, or `default` when absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> Result<&'a Value, Error> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Entries of an object or array, characters of a string, 0 otherwise.
    pub fn len(&self) -> usize {
        json_len(&self.data)
    }

    pub fn is_empty(&self) -> bool {
        json_is_empty(&self.data)
    }

    /// Iterates the keys of an object or the elements of an array. Other values yield nothing.
    pub fn iter(&self) -> Box<dyn Iterator<Item = Value> + '_> {
        match &self.data {
            Value::Object(map) => Box::new(map.keys().cloned().map(Value::String)),
            Value::Array(items) => Box::new(items.iter().cloned()),
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Key membership for objects, element membership for arrays, substring membership for strings.
    pub fn contains(&self, item: &Value) -> bool {
        json_contains(&self.data, item)
    }

    fn as_object(&self) -> Result<&Map<String, Value>, Error> {
        self.data
            .as_object()
            .ok_or_else(|| not_a_mapping(json_type_name(&self.data)))
    }

    fn data_repr(&self) -> String {
        self.data.to_string()
    }
}

impl<I: serde_json::value::Index> Index<I> for JsonFixture {
    type Output = Value;

    /// Same as indexing a [`Value`]: missing keys and out-of-range positions give `null`.
    fn index(&self, index: I) -> &Value {
        &self.data[index]
    }
}

impl FixtureClass for JsonFixture {
    fn from_data(data: LoadedData, description: &str) -> Result<Self, Error> {
        match data {
            LoadedData::Json(value) => Ok(Self::new(value).with_description(description)),
            other => Err(wrong_shape("JsonFixture", "json", &other)),
        }
    }
}

descriptive_fixture!(JsonFixture);

/// Wrapper over CSV rows with column helpers.
#[derive(Clone, PartialEq)]
pub struct CsvFixture {
    data: Vec<Row>,
    description: String,
}

impl CsvFixture {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            data: rows,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn rows(&self) -> &[Row] {
        &self.data
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.data
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Column names, taken from the first row.
    pub fn columns(&self) -> Vec<&str> {
        self.data
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Values of `column` in row order. Rows without the column contribute an empty string.
    pub fn get_column(&self, column: &str) -> Vec<&str> {
        self.data
            .iter()
            .map(|row| row.get(column).map(String::as_str).unwrap_or_default())
            .collect()
    }

    /// Rows satisfying every condition of `filter`.
    pub fn filter_rows(&self, filter: &RowFilter) -> Vec<&Row> {
        self.data.iter().filter(|row| filter.matches(row)).collect()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.data.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.data.iter()
    }

    pub fn contains(&self, row: &Row) -> bool {
        self.data.contains(row)
    }

    fn data_repr(&self) -> String {
        LoadedData::Csv(self.data.clone()).to_json().to_string()
    }
}

impl Index<usize> for CsvFixture {
    type Output = Row;

    fn index(&self, index: usize) -> &Row {
        &self.data[index]
    }
}

impl<'a> IntoIterator for &'a CsvFixture {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl FixtureClass for CsvFixture {
    fn from_data(data: LoadedData, description: &str) -> Result<Self, Error> {
        match data {
            LoadedData::Csv(rows) => Ok(Self::new(rows).with_description(description)),
            other => Err(wrong_shape("CsvFixture", "csv", &other)),
        }
    }
}

descriptive_fixture!(CsvFixture);

type CellPredicate = dyn Fn(Option<&str>) -> bool + Send + Sync;

enum Condition {
    Equals(String),
    Predicate(Box<CellPredicate>),
}

/// Conditions on the cells of a row, all of which must hold.
///
/// ```
/// use data_fixtures::RowFilter;
///
/// let filter = RowFilter::new()
///     .equals("city", "NYC")
///     .matching("price", |cell| cell.and_then(|p| p.parse::<f64>().ok()).is_some_and(|p| p > 100.0));
/// # let _ = filter;
/// ```
#[derive(Default)]
pub struct RowFilter {
    conditions: Vec<(String, Condition)>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the cell of `column` to equal `value`. A row without the column never matches.
    pub fn equals(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.conditions
            .push((column.into(), Condition::Equals(value.to_string())));
        self
    }

    /// Requires `predicate` to accept the cell of `column`; it receives `None` when the row lacks the column.
    pub fn matching<F>(mut self, column: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Option<&str>) -> bool + Send + Sync + 'static,
    {
        self.conditions
            .push((column.into(), Condition::Predicate(Box::new(predicate))));
        self
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.conditions.iter().all(|(column, condition)| {
            let cell = row.get(column).map(String::as_str);
            match condition {
                Condition::Equals(expected) => cell == Some(expected.as_str()),
                Condition::Predicate(predicate) => predicate(cell),
            }
        })
    }
}

impl fmt::Debug for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for (column, condition) in &self.conditions {
            match condition {
                Condition::Equals(value) => list.entry(&format_args!("{column} == {value:?}")),
                Condition::Predicate(_) => list.entry(&format_args!("{column} matches <predicate>")),
            };
        }
        list.finish()
    }
}

/// Wrapper over a parsed XML document with navigation helpers.
#[derive(Clone, PartialEq)]
pub struct XmlFixture {
    data: XmlDocument,
    description: String,
}

impl XmlFixture {
    pub fn new(document: XmlDocument) -> Self {
        Self {
            data: document,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn document(&self) -> &XmlDocument {
        &self.data
    }

    pub fn root(&self) -> &Element {
        self.data.root()
    }

    /// Tag of the root element.
    pub fn tag(&self) -> &str {
        self.root().tag()
    }

    /// First element matching `path` relative to the root.
    pub fn find(&self, path: &str) -> Result<Option<&Element>, Error> {
        self.root().find(path)
    }

    /// All elements matching `path` relative to the root.
    pub fn findall(&self, path: &str) -> Result<Vec<&Element>, Error> {
        self.root().findall(path)
    }

    pub fn xpath(&self, path: &str) -> Result<Vec<XPathItem<'_>>, Error> {
        self.data.xpath(path)
    }

    /// Text of the first element matching `path`; `default` if there is no match or the element has no text.
    pub fn get_text(&self, path: &str, default: &str) -> Result<String, Error> {
        let text = self
            .find(path)?
            .and_then(Element::text)
            .filter(|text| !text.is_empty())
            .unwrap_or(default);
        Ok(text.to_string())
    }

    /// The document as nested mappings, see [`XmlDocument::to_dict`].
    pub fn to_dict(&self) -> Value {
        self.data.to_dict()
    }

    fn data_repr(&self) -> String {
        self.to_dict().to_string()
    }
}

impl FixtureClass for XmlFixture {
    fn from_data(data: LoadedData, description: &str) -> Result<Self, Error> {
        match data {
            LoadedData::Xml(document) => Ok(Self::new(document).with_description(description)),
            other => Err(wrong_shape("XmlFixture", "xml", &other)),
        }
    }
}

descriptive_fixture!(XmlFixture);

fn wrong_shape(fixture: &str, expected: &str, found: &LoadedData) -> Error {
    Error::TypeMismatch(format!(
        "{fixture} expects {expected} data, got {}",
        found.kind()
    ))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn json_len(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.len(),
        Value::Array(items) => items.len(),
        Value::String(text) => text.chars().count(),
        _ => 0,
    }
}

fn json_is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        other => json_len(other) == 0,
    }
}

fn json_contains(haystack: &Value, item: &Value) -> bool {
    match (haystack, item) {
        (Value::Object(map), Value::String(key)) => map.contains_key(key),
        (Value::Array(items), _) => items.contains(item),
        (Value::String(text), Value::String(part)) => text.contains(part.as_str()),
        _ => false,
    }
}

fn truncated(repr: &str) -> String {
    if repr.chars().count() <= REPR_MAX_LEN {
        return repr.to_string();
    }
    let kept: String = repr
        .chars()
        .take(REPR_MAX_LEN - ELLIPSIS.len())
        .collect();
    kept + ELLIPSIS
}

fn render_short(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    data_repr: &str,
    description: &str,
) -> fmt::Result {
    if description.is_empty() {
        write!(f, "{name}(data={})", truncated(data_repr))
    } else {
        write!(f, "{name}({description:?})")
    }
}

fn render_detailed(
    f: &mut fmt::Formatter<'_>,
    name: &str,
    data_repr: &str,
    description: &str,
) -> fmt::Result {
    if description.is_empty() {
        render_short(f, name, data_repr, description)
    } else {
        write!(
            f,
            "{name}(data={}, description={description:?})",
            truncated(data_repr)
        )
    }
}
