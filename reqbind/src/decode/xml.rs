use quick_xml::Reader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

use super::{BodyDecoder, DecodeError};

/// Decodes `application/xml` and `text/xml` bodies with `quick-xml`.
///
/// The root element becomes an object of its children and attributes.
/// Elements without children become their trimmed text. Repeated child
/// elements become arrays.
#[derive(Clone, Copy, Debug, Default)]
pub struct XmlDecoder;

impl BodyDecoder for XmlDecoder {
    fn format(&self) -> &'static str {
        "xml"
    }

    fn content_types(&self) -> &[&'static str] {
        &["application/xml", "text/xml"]
    }

    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError> {
        parse(body).map_err(|message| DecodeError::Syntax {
            format: self.format(),
            message,
        })
    }

    fn text_scalars(&self) -> bool {
        true
    }
}

struct Element {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Element {
    fn into_value(self) -> Value {
        if self.children.is_empty() {
            Value::String(self.text.trim().to_owned())
        } else {
            Value::Object(self.children)
        }
    }

    fn push_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }
}

fn parse(input: &[u8]) -> Result<Value, String> {
    let mut reader = Reader::from_reader(input);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        buf.clear();
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| err.to_string())?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let element = open_element(&reader, e)?;
                if matches!(event, Event::Start(_)) {
                    stack.push(element);
                } else {
                    close_element(&mut stack, element, &mut root)?;
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or("unbalanced closing tag")?;
                close_element(&mut stack, element, &mut root)?;
            }
            Event::Text(e) => {
                if let Some(current) = stack.last_mut() {
                    let text = e.decode().map_err(|err| err.to_string())?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(current) = stack.last_mut() {
                    let text = core::str::from_utf8(&e).map_err(|err| err.to_string())?;
                    current.text.push_str(text);
                }
            }
            Event::GeneralRef(e) => {
                if let Some(current) = stack.last_mut() {
                    let raw = e.decode().map_err(|err| err.to_string())?;
                    current.text.push_str(&resolve_entity(&raw)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err("unexpected end of document".to_owned());
    }
    root.ok_or_else(|| "no root element".to_owned())
}

fn open_element(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Element, String> {
    let name = core::str::from_utf8(start.local_name().as_ref())
        .map_err(|err| err.to_string())?
        .to_owned();
    let mut element = Element {
        name,
        children: Map::new(),
        text: String::new(),
    };
    for attr in start.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let key = attr.key;
        if key.as_ref() == b"xmlns" || key.prefix().is_some_and(|p| p.as_ref() == b"xmlns") {
            continue;
        }
        let local = core::str::from_utf8(key.local_name().as_ref())
            .map_err(|err| err.to_string())?
            .to_owned();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|err| err.to_string())?
            .into_owned();
        element.push_child(local, Value::String(value));
    }
    Ok(element)
}

fn close_element(
    stack: &mut [Element],
    element: Element,
    root: &mut Option<Value>,
) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => {
            let name = element.name.clone();
            parent.push_child(name, element.into_value());
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element.into_value());
            Ok(())
        }
        None => Err("multiple root elements".to_owned()),
    }
}

fn resolve_entity(raw: &str) -> Result<String, String> {
    if let Some(resolved) = resolve_xml_entity(raw) {
        return Ok(resolved.into());
    }
    if let Some(rest) = raw.strip_prefix('#') {
        let code = match rest.strip_prefix('x').or_else(|| rest.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => rest.parse::<u32>(),
        }
        .map_err(|_| format!("invalid numeric entity: #{rest}"))?;
        let ch = char::from_u32(code).ok_or_else(|| format!("invalid code point: {code}"))?;
        return Ok(ch.to_string());
    }
    Err(format!("unknown entity: &{raw};"))
}
