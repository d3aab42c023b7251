//! Module for the shapes data can take after it was loaded from a file or a storage bucket.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::formats::xml::XmlDocument;


/// One CSV row: column name to raw cell value, in column order.
pub type Row = IndexMap<String, String>;

/// The result of running a loader.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedData {
    Json(Value),
    Csv(Vec<Row>),
    Xml(XmlDocument),
    /// Raw content fetched from a storage bucket whose key has no known extension
    Bytes(Vec<u8>),
}

impl LoadedData {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadedData::Json(_) => "json",
            LoadedData::Csv(_) => "csv",
            LoadedData::Xml(_) => "xml",
            LoadedData::Bytes(_) => "bytes",
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            LoadedData::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_rows(&self) -> Option<&[Row]> {
        match self {
            LoadedData::Csv(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn as_xml(&self) -> Option<&XmlDocument> {
        match self {
            LoadedData::Xml(doc) => Some(doc),
            _ => None,
        }
    }

    /// Converts the data into a JSON value. XML documents go through [`XmlDocument::to_dict`].
    pub fn to_json(&self) -> Value {
        match self {
            LoadedData::Json(value) => value.clone(),
            LoadedData::Csv(rows) => Value::Array(
                rows.iter()
                    .map(|row| {
                        Value::Object(
                            row.iter()
                                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                                .collect(),
                        )
                    })
                    .collect(),
            ),
            LoadedData::Xml(doc) => doc.to_dict(),
            LoadedData::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

impl Serialize for LoadedData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LoadedData::Json(value) => value.serialize(serializer),
            LoadedData::Csv(rows) => rows.serialize(serializer),
            LoadedData::Xml(doc) => doc.to_dict().serialize(serializer),
            LoadedData::Bytes(bytes) => serializer.serialize_bytes(bytes),
        }
    }
}

impl From<Value> for LoadedData {
    fn from(value: Value) -> Self {
        LoadedData::Json(value)
    }
}

impl From<Vec<Row>> for LoadedData {
    fn from(rows: Vec<Row>) -> Self {
        LoadedData::Csv(rows)
    }
}

impl From<XmlDocument> for LoadedData {
    fn from(doc: XmlDocument) -> Self {
        LoadedData::Xml(doc)
    }
}
