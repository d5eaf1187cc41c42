//! Alert model XML template.
//!
//! Maps the browser's alert JSON onto the engine's `alertModel` document.
//! Missing fields fall back to empty text, `false` or empty collections.

use serde_json::Value;

use crate::xml::element::XmlDocument;
use crate::xml::node::{XmlRecord, XmlValue};
use crate::xml::XmlResult;

/// Trigger class the engine expects on alert triggers.
pub const DEFAULT_TRIGGER_CLASS: &str = "defaultTrigger";

/// Build the alert document for `alert`, whose `id` must already be set.
pub fn build_alert_xml(alert: &Value, model_version: &str) -> XmlResult<String> {
    let root = alert_model(alert, model_version).into_element("alertModel");
    XmlDocument::new(root).to_xml(true)
}

/// Explicit mapping from the alert JSON to the tagged model.
pub fn alert_model(alert: &Value, model_version: &str) -> XmlValue {
    XmlRecord::new()
        .attribute("version", model_version)
        .text("id", text(alert.get("id")))
        .text("name", text(alert.get("name")))
        .text("enabled", truthy(alert.get("enabled")).to_string())
        .child("trigger", trigger(alert.get("trigger"), model_version))
        .child("actionGroups", action_groups(alert.get("actionGroups"), model_version))
        .child("properties", XmlRecord::new().into())
        .into()
}

fn trigger(trigger: Option<&Value>, model_version: &str) -> XmlValue {
    let channels = trigger.and_then(|t| t.get("alertChannels"));

    let enabled_channels = channels
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter(|(_, channel)| truthy(channel.get("enabled")))
        .map(|(id, _)| XmlValue::scalar(id.as_str()));

    let alert_channels = XmlRecord::new()
        .attribute("version", model_version)
        .text(
            "newChannelSource",
            truthy(channels.and_then(|c| c.get("newChannelSource"))).to_string(),
        )
        .text(
            "newChannelDestination",
            truthy(channels.and_then(|c| c.get("newChannelDestination"))).to_string(),
        )
        .child("enabledChannels", XmlRecord::new().repeated("string", enabled_channels).into())
        .child("disabledChannels", XmlRecord::new().into())
        .child("partialChannels", XmlRecord::new().into());

    let error_event_types = items(trigger.and_then(|t| t.get("errorEventTypes")))
        .map(|event_type| XmlValue::scalar(text(Some(event_type))));

    XmlRecord::new()
        .attribute("class", DEFAULT_TRIGGER_CLASS)
        .attribute("version", model_version)
        .child("alertChannels", alert_channels.into())
        .child(
            "errorEventTypes",
            XmlRecord::new().repeated("errorEventType", error_event_types).into(),
        )
        .text("regex", text(trigger.and_then(|t| t.get("regex"))))
        .into()
}

fn action_groups(groups: Option<&Value>, model_version: &str) -> XmlValue {
    let groups = items(groups).map(|group| -> XmlValue {
        let actions = items(group.get("actions")).map(|action| -> XmlValue {
            XmlRecord::new()
                .attribute("version", model_version)
                .text("protocol", text(action.get("protocol")))
                .text("recipient", text(action.get("recipient")))
                .into()
        });

        XmlRecord::new()
            .attribute("version", model_version)
            .child("actions", XmlRecord::new().repeated("alertAction", actions).into())
            .text("subject", text(group.get("subject")))
            .text("template", text(group.get("template")))
            .into()
    });

    XmlRecord::new().repeated("alertActionGroup", groups).into()
}

/// Elements of a JSON array; anything else yields nothing.
fn items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value.and_then(Value::as_array).into_iter().flatten()
}

/// Loose truthiness as the browser model uses it: `null`, `false`, `0`
/// and `""` are false; anything else present is true.
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Text content for a field, empty when missing or null.
pub(crate) fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlElement;
    use serde_json::json;

    fn parsed(alert: &Value) -> XmlElement {
        XmlElement::parse(&build_alert_xml(alert, "4.5.2").unwrap()).unwrap()
    }

    #[test]
    fn test_alert_document_shape() {
        let alert = json!({
            "id": "a-1",
            "name": "Test",
            "enabled": true,
            "trigger": {
                "alertChannels": {"ch1": {"enabled": true}, "ch2": {"enabled": false}},
                "errorEventTypes": ["SOURCE_CONNECTOR"]
            },
            "actionGroups": [{
                "actions": [{"protocol": "EMAIL", "recipient": "a@b.com"}],
                "subject": "S",
                "template": "T"
            }]
        });
        let root = parsed(&alert);

        assert_eq!(root.name(), "alertModel");
        assert_eq!(root.attribute("version"), Some("4.5.2"));
        assert_eq!(root.child("enabled").and_then(XmlElement::text), Some("true"));

        let trigger = root.child("trigger").unwrap();
        assert_eq!(trigger.attribute("class"), Some("defaultTrigger"));
        assert_eq!(trigger.attribute("version"), Some("4.5.2"));

        let enabled: Vec<_> = trigger
            .child("alertChannels")
            .and_then(|c| c.child("enabledChannels"))
            .unwrap()
            .children_named("string")
            .filter_map(XmlElement::text)
            .collect();
        assert_eq!(enabled, vec!["ch1"]);

        let error_types = trigger.child("errorEventTypes").unwrap();
        assert_eq!(
            error_types.child("errorEventType").and_then(XmlElement::text),
            Some("SOURCE_CONNECTOR")
        );

        let groups: Vec<_> = root
            .child("actionGroups")
            .unwrap()
            .children_named("alertActionGroup")
            .collect();
        assert_eq!(groups.len(), 1);
        let actions: Vec<_> = groups[0]
            .child("actions")
            .unwrap()
            .children_named("alertAction")
            .collect();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].child("protocol").and_then(XmlElement::text), Some("EMAIL"));
        assert_eq!(groups[0].child("subject").and_then(XmlElement::text), Some("S"));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let root = parsed(&json!({"id": "only-id"}));

        assert_eq!(root.child("name").and_then(XmlElement::text), None);
        assert_eq!(root.child("enabled").and_then(XmlElement::text), Some("false"));

        let channels = root.child("trigger").and_then(|t| t.child("alertChannels")).unwrap();
        assert_eq!(
            channels.child("newChannelSource").and_then(XmlElement::text),
            Some("false")
        );
        assert!(channels.child("enabledChannels").unwrap().children().is_empty());
        assert!(channels.child("partialChannels").is_some());
        assert!(root.child("actionGroups").unwrap().children().is_empty());
        assert!(root.child("properties").is_some());
    }

    #[test]
    fn test_truthiness() {
        assert!(!truthy(None));
        assert!(!truthy(Some(&json!(0))));
        assert!(!truthy(Some(&json!(""))));
        assert!(truthy(Some(&json!("yes"))));
        assert!(truthy(Some(&json!({}))));
    }
}
