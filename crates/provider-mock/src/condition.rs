use crate::tree::MockNodeData;
use uia_locator_core::ui::{
    ConditionFlags, ConditionValue, ControlTypeId, PropertyId, attribute_names,
};

/// Native condition of the mock provider, evaluated directly against arena
/// nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCondition {
    ControlType { id: ControlTypeId, flags: ConditionFlags },
    Property { id: PropertyId, value: ConditionValue, flags: ConditionFlags },
    And(Vec<MockCondition>),
}

impl MockCondition {
    pub(crate) fn matches(&self, node: &MockNodeData) -> bool {
        match self {
            MockCondition::ControlType { id, flags } => {
                if flags.is_substring() {
                    match (node.control_type.name(), id.name()) {
                        (Some(actual), Some(expected)) => flags.matches_text(actual, expected),
                        _ => false,
                    }
                } else {
                    node.control_type == *id
                }
            }
            MockCondition::Property { id, value, flags } => match (*id, value) {
                (PropertyId::RUNTIME_ID, ConditionValue::RuntimeId(expected)) => {
                    node.runtime_id == *expected
                }
                (_, ConditionValue::RuntimeId(_)) => false,
                (PropertyId::CONTROL_TYPE, ConditionValue::Text(expected)) => {
                    node.control_type.name().is_some_and(|actual| flags.matches_text(actual, expected))
                }
                (id, ConditionValue::Text(expected)) => match property_text(node, id) {
                    Some(actual) => flags.matches_text(&actual, expected),
                    None => false,
                },
            },
            MockCondition::And(parts) => parts.iter().all(|part| part.matches(node)),
        }
    }
}

/// Formatted property value used for both attribute reads and matching.
pub(crate) fn property_text(node: &MockNodeData, id: PropertyId) -> Option<String> {
    let name = id.name()?;
    Some(attribute_text(node, name))
}

pub(crate) fn attribute_text(node: &MockNodeData, name: &str) -> String {
    let bounds = node.bounds;
    match name {
        attribute_names::LEFT => bounds.left().to_string(),
        attribute_names::TOP => bounds.top().to_string(),
        attribute_names::RIGHT => bounds.right().to_string(),
        attribute_names::BOTTOM => bounds.bottom().to_string(),
        "BoundingRectangle" => {
            format!("{},{},{},{}", bounds.left(), bounds.top(), bounds.right(), bounds.bottom())
        }
        "RuntimeId" => node.runtime_id.to_json(),
        "ControlType" => node.control_type.to_string(),
        attribute_names::IS_ENABLED
        | attribute_names::IS_CONTROL_ELEMENT
        | attribute_names::IS_CONTENT_ELEMENT => {
            node.property(name).unwrap_or("true").to_owned()
        }
        _ if uia_locator_core::ui::attributes::FLAGS.contains(&name) => {
            node.property(name).unwrap_or("false").to_owned()
        }
        _ if uia_locator_core::ui::attributes::NUMBERS.contains(&name) => {
            node.property(name).unwrap_or("0").to_owned()
        }
        _ => node.property(name).unwrap_or_default().to_owned(),
    }
}
