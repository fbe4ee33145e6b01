use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

/// Numeric property identifier understood by provider search conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(i32);

id_table!(PropertyId, PROPERTY_TABLE {
    RUNTIME_ID = 30000 => "RuntimeId",
    BOUNDING_RECTANGLE = 30001 => "BoundingRectangle",
    PROCESS_ID = 30002 => "ProcessId",
    CONTROL_TYPE = 30003 => "ControlType",
    LOCALIZED_CONTROL_TYPE = 30004 => "LocalizedControlType",
    NAME = 30005 => "Name",
    ACCELERATOR_KEY = 30006 => "AcceleratorKey",
    ACCESS_KEY = 30007 => "AccessKey",
    HAS_KEYBOARD_FOCUS = 30008 => "HasKeyboardFocus",
    IS_KEYBOARD_FOCUSABLE = 30009 => "IsKeyboardFocusable",
    IS_ENABLED = 30010 => "IsEnabled",
    AUTOMATION_ID = 30011 => "AutomationId",
    CLASS_NAME = 30012 => "ClassName",
    HELP_TEXT = 30013 => "HelpText",
    CLICKABLE_POINT = 30014 => "ClickablePoint",
    CULTURE = 30015 => "Culture",
    IS_CONTROL_ELEMENT = 30016 => "IsControlElement",
    IS_CONTENT_ELEMENT = 30017 => "IsContentElement",
    LABELED_BY = 30018 => "LabeledBy",
    IS_PASSWORD = 30019 => "IsPassword",
    NATIVE_WINDOW_HANDLE = 30020 => "NativeWindowHandle",
    ITEM_TYPE = 30021 => "ItemType",
    IS_OFFSCREEN = 30022 => "IsOffscreen",
    ORIENTATION = 30023 => "Orientation",
    FRAMEWORK_ID = 30024 => "FrameworkId",
    IS_REQUIRED_FOR_FORM = 30025 => "IsRequiredForForm",
    ITEM_STATUS = 30026 => "ItemStatus",
    ARIA_ROLE = 30101 => "AriaRole",
    ARIA_PROPERTIES = 30102 => "AriaProperties",
});

static BY_NAME: LazyLock<HashMap<String, PropertyId>> = LazyLock::new(|| {
    PROPERTY_TABLE.iter().map(|(name, id)| (name.to_ascii_lowercase(), *id)).collect()
});

static BY_ID: LazyLock<HashMap<PropertyId, &'static str>> =
    LazyLock::new(|| PROPERTY_TABLE.iter().map(|(name, id)| (*id, *name)).collect());

impl PropertyId {
    pub const fn from_raw(id: i32) -> Self {
        Self(id)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Case-insensitive lookup of a property name such as `Name` or `automationid`.
    pub fn from_name(name: &str) -> Option<Self> {
        BY_NAME.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn name(self) -> Option<&'static str> {
        BY_ID.get(&self).copied()
    }
}

impl Display for PropertyId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Property({})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Name", PropertyId::NAME)]
    #[case("automationid", PropertyId::AUTOMATION_ID)]
    #[case("ClassName", PropertyId::CLASS_NAME)]
    fn known_properties_resolve(#[case] name: &str, #[case] expected: PropertyId) {
        assert_eq!(PropertyId::from_name(name), Some(expected));
        assert_eq!(expected.name().map(str::to_ascii_lowercase), Some(name.to_ascii_lowercase()));
    }

    #[rstest]
    fn unknown_property_is_none() {
        assert_eq!(PropertyId::from_name("class"), None);
        assert_eq!(PropertyId::from_name("Bottom"), None);
    }
}
