//! Channel model XML template.

use serde_json::Value;

use crate::xml::element::XmlDocument;
use crate::xml::node::build;
use crate::xml::XmlResult;

/// Build the `channel` document for a channel JSON model.
///
/// The model is serialized as given; the root only gains a `version`
/// attribute when the model does not carry `@version` itself.
pub fn build_channel_xml(channel: &Value, model_version: &str) -> XmlResult<String> {
    let mut root = build(channel, "channel");
    if root.attribute("version").is_none() {
        root.prepend_attribute("version", model_version);
    }
    XmlDocument::new(root).with_encoding("UTF-8").to_xml(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlElement;
    use serde_json::json;

    #[test]
    fn test_channel_keeps_model_version() {
        let xml = build_channel_xml(&json!({"@version": "4.4.1", "id": "c1"}), "4.5.2").unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));

        let root = XmlElement::parse(&xml).unwrap();
        assert_eq!(root.name(), "channel");
        assert_eq!(root.attribute("version"), Some("4.4.1"));
        assert_eq!(root.child("id").and_then(XmlElement::text), Some("c1"));
    }

    #[test]
    fn test_channel_gets_default_version() {
        let xml = build_channel_xml(&json!({"id": "c1", "description": null}), "4.5.2").unwrap();
        let root = XmlElement::parse(&xml).unwrap();
        assert_eq!(root.attribute("version"), Some("4.5.2"));
        assert_eq!(
            root.child("description").and_then(|d| d.attribute("nil")),
            Some("true")
        );
    }

    #[test]
    fn test_channel_connectors() {
        let channel = json!({
            "id": "c1",
            "sourceConnector": {
                "@version": "4.5.2",
                "metaDataId": 0,
                "transformer": {"elements": {"0": {"name": "step"}}}
            },
            "destinationConnectors": {
                "connector": [{"metaDataId": 1}, {"metaDataId": 2}]
            }
        });
        let root = XmlElement::parse(&build_channel_xml(&channel, "4.5.2").unwrap()).unwrap();

        let source = root.child("sourceConnector").unwrap();
        assert_eq!(source.attribute("version"), Some("4.5.2"));
        let steps = source
            .child("transformer")
            .and_then(|t| t.child("elements"))
            .unwrap();
        assert_eq!(steps.children()[0].name(), "element");

        let connectors: Vec<_> = root
            .child("destinationConnectors")
            .unwrap()
            .children_named("connector")
            .collect();
        assert_eq!(connectors.len(), 2);
    }
}
