//! Module defining the byte-level parsers for the supported data formats.
//!
//! The parsers are shared between the file loaders and the live storage adapters, so that the same content yields
//! the same parsed shape no matter where it came from.

use crate::{
    data::{LoadedData, Row},
    error::{Error, invalid_data},
};

pub mod xml;


pub use xml::{Element, XPathItem, XmlDocument};

pub(crate) const EXT_JSON: &str = "json";
pub(crate) const EXT_CSV: &str = "csv";
pub(crate) const EXT_XML: &str = "xml";

/// Parses UTF-8 encoded JSON.
pub fn parse_json(bytes: &[u8]) -> Result<serde_json::Value, Error> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| invalid_data(EXT_JSON, format!("cannot decode as UTF-8: {e}")))?;
    serde_json::from_str(text).map_err(|e| invalid_data(EXT_JSON, e))
}

/// Parses UTF-8 encoded CSV with a header row into rows of raw string cells.
///
/// Short rows get empty strings for their missing columns, surplus fields are dropped.
pub fn parse_csv(bytes: &[u8]) -> Result<Vec<Row>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| invalid_data(EXT_CSV, e))?
        .clone();

    reader
        .records()
        .map(|record| {
            let record = record.map_err(|e| invalid_data(EXT_CSV, e))?;
            Ok(headers
                .iter()
                .enumerate()
                .map(|(idx, column)| {
                    let cell = record.get(idx).unwrap_or_default();
                    (column.to_string(), cell.to_string())
                })
                .collect())
        })
        .collect()
}

/// Parses a well-formed XML document into a navigable tree. The encoding comes from a byte order mark or the XML
/// declaration, defaulting to UTF-8.
pub fn parse_xml(bytes: &[u8]) -> Result<XmlDocument, Error> {
    xml::parse(bytes)
}

/// Parses `bytes` according to `extension` (case-insensitive, leading dot optional).
///
/// Content with an unknown extension is returned unparsed as [`LoadedData::Bytes`].
pub fn parse_by_extension(bytes: Vec<u8>, extension: &str) -> Result<LoadedData, Error> {
    let extension = normalize_extension(extension);
    match extension.as_str() {
        EXT_JSON => parse_json(&bytes).map(LoadedData::Json),
        EXT_CSV => parse_csv(&bytes).map(LoadedData::Csv),
        EXT_XML => parse_xml(&bytes).map(LoadedData::Xml),
        _ => Ok(LoadedData::Bytes(bytes)),
    }
}

pub(crate) fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_lowercase()
}
