//! XML element tree, serialization and parsing.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

use crate::xml::{XmlError, XmlResult};

/// Key holding attributes in the JSON view of an element.
pub const JSON_ATTRIBUTES_KEY: &str = "$";

/// Key holding text in the JSON view of an element that also has
/// attributes or children.
pub const JSON_TEXT_KEY: &str = "_";

/// A single XML element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: Option<String>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// Insert an attribute ahead of the existing ones.
    pub fn prepend_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(0, (name.into(), value.into()));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Parse a document into its root element.
    ///
    /// Whitespace-only text is dropped; declarations, comments and
    /// processing instructions are ignored.
    pub fn parse(input: &str) -> XmlResult<Self> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(element_from_start(&start)?),
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| XmlError::Malformed("unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    append_text(&mut stack, &text);
                }
                Event::CData(data) => {
                    let raw = data.into_inner();
                    append_text(&mut stack, &String::from_utf8_lossy(&raw));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(XmlError::Malformed("unclosed element".to_string()));
        }
        root.ok_or_else(|| XmlError::Malformed("document has no root element".to_string()))
    }

    /// JSON view keyed by the root element name.
    ///
    /// Text-only elements become strings, attributes land under `"$"`,
    /// repeated children become arrays and a lone child stays a value.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.name.clone(), self.json_body());
        Value::Object(map)
    }

    fn json_body(&self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            return Value::String(self.text.clone().unwrap_or_default());
        }

        let mut map = Map::new();
        if !self.attributes.is_empty() {
            let attributes = self
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            map.insert(JSON_ATTRIBUTES_KEY.to_string(), Value::Object(attributes));
        }
        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            map.insert(JSON_TEXT_KEY.to_string(), Value::String(text.to_string()));
        }
        for child in &self.children {
            let body = child.json_body();
            match map.get_mut(&child.name) {
                Some(Value::Array(items)) => items.push(body),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, body]);
                }
                None => {
                    map.insert(child.name.clone(), body);
                }
            }
        }
        Value::Object(map)
    }

    fn write_to(&self, writer: &mut Writer<Vec<u8>>) -> XmlResult<()> {
        let start = BytesStart::new(self.name.as_str()).with_attributes(
            self.attributes
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );

        let text = self.text.as_deref().filter(|t| !t.is_empty());
        if text.is_none() && self.children.is_empty() {
            return write_event(writer, Event::Empty(start));
        }

        write_event(writer, Event::Start(start))?;
        if let Some(text) = text {
            write_event(writer, Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write_to(writer)?;
        }
        write_event(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

/// XML declaration emitted ahead of the root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration {
    pub version: &'static str,
    pub encoding: Option<&'static str>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0",
            encoding: None,
        }
    }
}

/// A root element plus its declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub declaration: Declaration,
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self {
            declaration: Declaration::default(),
            root,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static str) -> Self {
        self.declaration.encoding = Some(encoding);
        self
    }

    /// Serialize to text, indented by two spaces when `pretty` is set.
    pub fn to_xml(&self, pretty: bool) -> XmlResult<String> {
        let mut writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };

        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new(
                self.declaration.version,
                self.declaration.encoding,
                None,
            )),
        )?;
        self.root.write_to(&mut writer)?;

        String::from_utf8(writer.into_inner()).map_err(|e| XmlError::Write(e.to_string()))
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> XmlResult<()> {
    writer
        .write_event(event)
        .map_err(|e| XmlError::Write(e.to_string()))
}

fn element_from_start(start: &BytesStart<'_>) -> XmlResult<XmlElement> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()));
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> XmlResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(XmlError::Malformed(
            "document has more than one root element".to_string(),
        )),
    }
}

fn append_text(stack: &mut [XmlElement], text: &str) {
    if let Some(current) = stack.last_mut() {
        current.text.get_or_insert_with(String::new).push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::build;
    use serde_json::json;

    #[test]
    fn test_write_compact() {
        let root = XmlElement::new("a")
            .with_attribute("version", "1")
            .with_child(XmlElement::new("b").with_text("x & y"))
            .with_child(XmlElement::new("c"));
        let xml = XmlDocument::new(root).to_xml(false).unwrap();
        assert_eq!(
            xml,
            r#"<?xml version="1.0"?><a version="1"><b>x &amp; y</b><c/></a>"#
        );
    }

    #[test]
    fn test_write_declares_encoding() {
        let xml = XmlDocument::new(XmlElement::new("channel"))
            .with_encoding("UTF-8")
            .to_xml(true)
            .unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    }

    #[test]
    fn test_pretty_output_keeps_text_inline() {
        let root = XmlElement::new("a").with_child(XmlElement::new("b").with_text("t"));
        let xml = XmlDocument::new(root).to_xml(true).unwrap();
        assert!(xml.contains("<b>t</b>"));
        assert!(xml.contains('\n'));
    }

    #[test]
    fn test_built_tree_survives_write_and_parse() {
        let value = json!({
            "@version": "4.5.2",
            "id": "abc",
            "name": "Orders <inbound>",
            "revision": 3,
            "description": null,
            "exportData": {"metadata": {"enabled": true}},
            "tags": ["a", "b"],
            "rules": {"0": {"name": "r0"}, "1": {"name": "r1"}}
        });
        let built = build(&value, "channel");

        for pretty in [false, true] {
            let xml = XmlDocument::new(built.clone()).to_xml(pretty).unwrap();
            let parsed = XmlElement::parse(&xml).unwrap();
            assert_eq!(parsed, built, "pretty = {pretty}");
        }
    }

    #[test]
    fn test_parse_rejects_unbalanced_input() {
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("").is_err());
    }

    #[test]
    fn test_json_view() {
        let parsed = XmlElement::parse(
            r#"<list><item id="1">one</item><item id="2">two</item><count>2</count><empty/></list>"#,
        )
        .unwrap();
        assert_eq!(
            parsed.to_json(),
            json!({
                "list": {
                    "item": [
                        {"$": {"id": "1"}, "_": "one"},
                        {"$": {"id": "2"}, "_": "two"}
                    ],
                    "count": "2",
                    "empty": ""
                }
            })
        );
    }

    #[test]
    fn test_json_view_of_scalar_document() {
        let parsed = XmlElement::parse("<boolean>true</boolean>").unwrap();
        assert_eq!(parsed.to_json(), json!({"boolean": "true"}));
    }
}
