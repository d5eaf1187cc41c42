//! Tagged value model and the JSON → XML node builder.
//!
//! # Encoding Rules
//! - `null` → `<tag nil="true"/>`
//! - scalar → `<tag>text</tag>`
//! - array or pseudo-array (keys exactly `"0".."n-1"`) → `<tag>` containing
//!   one element per item, tagged with `tag` minus a trailing `s`
//! - object → keys starting with `@` become attributes, all other keys
//!   become children; an array-valued key repeats `<key>` once per item

use serde_json::{Map, Value};

use crate::xml::element::XmlElement;

/// Attribute value used to mark an explicit null.
pub const NIL_ATTRIBUTE: (&str, &str) = ("nil", "true");

/// Prefix marking an object key as an XML attribute.
pub const ATTRIBUTE_PREFIX: char = '@';

/// A value ready to be rendered as one XML element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    /// Explicit null.
    Null,
    /// Text content.
    Scalar(String),
    /// Attributes plus named children.
    Record(XmlRecord),
    /// Ordered items rendered under a container element.
    Sequence(Vec<XmlValue>),
}

/// Attributes and children of a record, kept apart so attributes are
/// always emitted first regardless of how the source interleaved them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlRecord {
    attributes: Vec<(String, String)>,
    children: Vec<(String, XmlValue)>,
}

impl XmlRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Add a single child element.
    pub fn child(mut self, name: impl Into<String>, value: XmlValue) -> Self {
        self.children.push((name.into(), value));
        self
    }

    /// Add a text child element.
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.child(name, XmlValue::Scalar(value.into()))
    }

    /// Add one `<name>` element per value, with no wrapping container.
    pub fn repeated(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = XmlValue>,
    ) -> Self {
        let name = name.into();
        for value in values {
            self.children.push((name.clone(), value));
        }
        self
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[(String, XmlValue)] {
        &self.children
    }

    fn from_json_object(map: &Map<String, Value>) -> Self {
        let mut record = XmlRecord::new();

        for (key, value) in map {
            if let Some(name) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                record.attributes.push((name.to_string(), attribute_text(value)));
            }
        }

        for (key, value) in map {
            if key.starts_with(ATTRIBUTE_PREFIX) {
                continue;
            }
            match value {
                Value::Array(items) => {
                    record = record.repeated(key.as_str(), items.iter().map(XmlValue::from_json));
                }
                other => {
                    record.children.push((key.clone(), XmlValue::from_json(other)));
                }
            }
        }

        record
    }
}

impl From<XmlRecord> for XmlValue {
    fn from(record: XmlRecord) -> Self {
        XmlValue::Record(record)
    }
}

impl XmlValue {
    /// Text scalar.
    pub fn scalar(text: impl Into<String>) -> Self {
        XmlValue::Scalar(text.into())
    }

    /// Map an arbitrary JSON value into its tagged form.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => XmlValue::Null,
            Value::Bool(b) => XmlValue::Scalar(b.to_string()),
            Value::Number(n) => XmlValue::Scalar(n.to_string()),
            Value::String(s) => XmlValue::Scalar(s.clone()),
            Value::Array(items) => XmlValue::Sequence(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => match pseudo_array_items(map) {
                Some(items) => XmlValue::Sequence(items.into_iter().map(Self::from_json).collect()),
                None => XmlValue::Record(XmlRecord::from_json_object(map)),
            },
        }
    }

    /// Render this value as an element named `tag`.
    pub fn into_element(self, tag: &str) -> XmlElement {
        match self {
            XmlValue::Null => XmlElement::new(tag).with_attribute(NIL_ATTRIBUTE.0, NIL_ATTRIBUTE.1),
            XmlValue::Scalar(text) => XmlElement::new(tag).with_text(text),
            XmlValue::Sequence(items) => {
                let item_tag = singularize(tag);
                let mut element = XmlElement::new(tag);
                for item in items {
                    element.push_child(item.into_element(item_tag));
                }
                element
            }
            XmlValue::Record(record) => {
                let mut element = XmlElement::new(tag);
                for (name, value) in record.attributes {
                    element = element.with_attribute(name, value);
                }
                for (name, value) in record.children {
                    element.push_child(value.into_element(&name));
                }
                element
            }
        }
    }
}

/// Build the element tree for `value` under `tag`.
///
/// Total over JSON input: every value maps to exactly one element.
pub fn build(value: &Value, tag: &str) -> XmlElement {
    XmlValue::from_json(value).into_element(tag)
}

/// Naive singular form: drop one trailing `s`.
pub fn singularize(tag: &str) -> &str {
    tag.strip_suffix('s').unwrap_or(tag)
}

/// Items of an object whose keys are exactly the integers `0..n-1`,
/// ordered by index. Empty, sparse or non-zero-based objects are records.
fn pseudo_array_items(map: &Map<String, Value>) -> Option<Vec<&Value>> {
    if map.is_empty() {
        return None;
    }

    let mut indexed = Vec::with_capacity(map.len());
    for (key, value) in map {
        let index: usize = key.parse().ok()?;
        if *key != index.to_string() {
            return None;
        }
        indexed.push((index, value));
    }
    indexed.sort_by_key(|(index, _)| *index);

    indexed
        .iter()
        .enumerate()
        .all(|(position, (index, _))| position == *index)
        .then(|| indexed.into_iter().map(|(_, value)| value).collect())
}

fn attribute_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
