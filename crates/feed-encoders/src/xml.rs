//! Rendering a JSON tree as XML text.

use feed_types::{EncodeError, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::Value;

/// Element wrapping the whole document.
pub const ROOT_ELEMENT: &str = "ObjectNode";

/// Element name for items of an array that has no member name (root arrays).
const ITEM_ELEMENT: &str = "item";

/// Render `json` under an `<ObjectNode>` root.
///
/// Object members become child elements, array items repeat the member's
/// element, `null` becomes an empty element and scalars become escaped text.
pub fn to_xml(json: &Value) -> Result<String> {
    let mut writer = Writer::new(Vec::new());

    match json {
        Value::Array(items) => {
            open(&mut writer, ROOT_ELEMENT)?;
            for item in items {
                write_element(&mut writer, ITEM_ELEMENT, item)?;
            }
            close(&mut writer, ROOT_ELEMENT)?;
        }
        other => write_element(&mut writer, ROOT_ELEMENT, other)?,
    }

    String::from_utf8(writer.into_inner()).map_err(|e| EncodeError::Xml(e.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Null => emit(writer, Event::Empty(BytesStart::new(name))),
        Value::Object(members) => {
            open(writer, name)?;
            for (member, child) in members {
                write_member(writer, &element_name(member), child)?;
            }
            close(writer, name)
        }
        // Only reachable for nested arrays; members handle their own arrays
        Value::Array(items) => {
            open(writer, name)?;
            for item in items {
                write_member(writer, ITEM_ELEMENT, item)?;
            }
            close(writer, name)
        }
        Value::Bool(b) => text_element(writer, name, &b.to_string()),
        Value::Number(n) => text_element(writer, name, &n.to_string()),
        Value::String(s) => text_element(writer, name, s),
    }
}

fn write_member(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
            Ok(())
        }
        other => write_element(writer, name, other),
    }
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    open(writer, name)?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    close(writer, name)
}

fn open(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new(name)))
}

fn close(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| EncodeError::Xml(e.to_string()))
}

/// Replace characters that cannot appear in an XML name with `_`.
pub fn element_name(member: &str) -> String {
    if member.is_empty() {
        return "_".to_string();
    }

    member
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let valid = if i == 0 {
                c.is_alphabetic() || c == '_'
            } else {
                c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
            };
            if valid {
                c
            } else {
                '_'
            }
        })
        .collect()
}
