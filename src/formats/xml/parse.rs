//! Event-driven XML parsing into an [`Element`] tree.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, invalid_data};
use crate::formats::EXT_XML;

use super::{Element, XmlDocument};

pub(crate) fn parse(bytes: &[u8]) -> Result<XmlDocument, Error> {
    let source = decode(bytes)?;
    let mut reader = Reader::from_str(&source);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            invalid_data(
                EXT_XML,
                format!("at position {}: {e}", reader.error_position()),
            )
        })?;

        match event {
            Event::Start(start) => {
                ensure_no_second_root(&root, &stack)?;
                stack.push(element_from_start(&start, reader.decoder())?);
            }
            Event::Empty(start) => {
                ensure_no_second_root(&root, &stack)?;
                let element = element_from_start(&start, reader.decoder())?;
                close_element(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| invalid_data(EXT_XML, "unexpected closing tag"))?;
                close_element(element, &mut stack, &mut root);
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| invalid_data(EXT_XML, e))?;
                append_text(&text, &mut stack)?;
            }
            Event::CData(cdata) => {
                let raw = cdata.into_inner();
                let text = std::str::from_utf8(&raw).map_err(|e| invalid_data(EXT_XML, e))?;
                append_text(text, &mut stack)?;
            }
            Event::Eof => break,
            // declarations, comments, processing instructions and doctypes carry no data
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(invalid_data(
            EXT_XML,
            format!("unclosed element <{}>", open.tag),
        ));
    }
    root.map(XmlDocument::new)
        .ok_or_else(|| invalid_data(EXT_XML, "document has no root element"))
}

fn ensure_no_second_root(root: &Option<Element>, stack: &[Element]) -> Result<(), Error> {
    if root.is_some() && stack.is_empty() {
        return Err(invalid_data(EXT_XML, "document has more than one root element"));
    }
    Ok(())
}

fn element_from_start(start: &BytesStart<'_>, decoder: Decoder) -> Result<Element, Error> {
    let tag = decoder
        .decode(start.name().as_ref())
        .map_err(|e| invalid_data(EXT_XML, e))?
        .into_owned();

    let mut element = Element::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| invalid_data(EXT_XML, e))?;
        let name = decoder
            .decode(attr.key.as_ref())
            .map_err(|e| invalid_data(EXT_XML, e))?
            .into_owned();
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|e| invalid_data(EXT_XML, e))?
            .into_owned();
        element.attributes.insert(name, value);
    }
    Ok(element)
}

fn close_element(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn append_text(text: &str, stack: &mut [Element]) -> Result<(), Error> {
    let Some(current) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(invalid_data(EXT_XML, "text outside of the root element"));
    };

    let slot = match current.children.last_mut() {
        Some(last_child) => &mut last_child.tail,
        None => &mut current.text,
    };
    slot.get_or_insert_with(String::new).push_str(text);
    Ok(())
}

/// Decodes a raw document to text. A byte order mark takes precedence over the `encoding` of the XML declaration;
/// documents with neither are UTF-8.
fn decode(bytes: &[u8]) -> Result<Cow<'_, str>, Error> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_length)) => (encoding, &bytes[bom_length..]),
        None => (sniff_encoding(bytes)?, bytes),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| invalid_data(EXT_XML, format!("document is not valid {}", encoding.name())))
}

fn sniff_encoding(bytes: &[u8]) -> Result<&'static Encoding, Error> {
    match bytes {
        [0x3C, 0x00, 0x3F, 0x00, ..] => return Ok(UTF_16LE),
        [0x00, 0x3C, 0x00, 0x3F, ..] => return Ok(UTF_16BE),
        _ => {}
    }

    let Some(label) = declared_encoding(bytes) else {
        return Ok(UTF_8);
    };
    // a UTF-16 label on an ASCII-compatible document means UTF-8
    Encoding::for_label(&label)
        .map(Encoding::output_encoding)
        .ok_or_else(|| {
            invalid_data(
                EXT_XML,
                format!("unsupported encoding {:?}", String::from_utf8_lossy(&label)),
            )
        })
}

fn declared_encoding(bytes: &[u8]) -> Option<Vec<u8>> {
    let mut reader = Reader::from_reader(bytes);
    match reader.read_event() {
        Ok(Event::Decl(decl)) => decl.encoding().and_then(Result::ok).map(Cow::into_owned),
        _ => None,
    }
}
