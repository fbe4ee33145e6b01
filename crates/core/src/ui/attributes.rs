/// Keys of the formatted attribute map returned by
/// [`AccessibilityTreeProvider::attributes`](crate::provider::AccessibilityTreeProvider::attributes).
pub mod names {
    pub const ACCELERATOR_KEY: &str = "AcceleratorKey";
    pub const ACCESS_KEY: &str = "AccessKey";
    pub const ARIA_PROPERTIES: &str = "AriaProperties";
    pub const ARIA_ROLE: &str = "AriaRole";
    pub const AUTOMATION_ID: &str = "AutomationId";
    pub const BOTTOM: &str = "Bottom";
    pub const LEFT: &str = "Left";
    pub const RIGHT: &str = "Right";
    pub const TOP: &str = "Top";
    pub const CLASS_NAME: &str = "ClassName";
    pub const FRAMEWORK_ID: &str = "FrameworkId";
    pub const HELP_TEXT: &str = "HelpText";
    pub const IS_CONTENT_ELEMENT: &str = "IsContentElement";
    pub const IS_CONTROL_ELEMENT: &str = "IsControlElement";
    pub const IS_ENABLED: &str = "IsEnabled";
    pub const IS_KEYBOARD_FOCUSABLE: &str = "IsKeyboardFocusable";
    pub const IS_PASSWORD: &str = "IsPassword";
    pub const IS_REQUIRED_FOR_FORM: &str = "IsRequiredForForm";
    pub const ITEM_STATUS: &str = "ItemStatus";
    pub const ITEM_TYPE: &str = "ItemType";
    pub const NAME: &str = "Name";
    pub const NATIVE_WINDOW_HANDLE: &str = "NativeWindowHandle";
    pub const ORIENTATION: &str = "Orientation";
    pub const PROCESS_ID: &str = "ProcessId";

    /// Reserved snapshot attribute carrying the JSON runtime id.
    pub const SNAPSHOT_ID: &str = "id";
}

/// Text-valued attributes, formatted verbatim.
pub const TEXT: &[&str] = &[
    names::ACCELERATOR_KEY,
    names::ACCESS_KEY,
    names::ARIA_PROPERTIES,
    names::ARIA_ROLE,
    names::AUTOMATION_ID,
    names::CLASS_NAME,
    names::FRAMEWORK_ID,
    names::HELP_TEXT,
    names::ITEM_STATUS,
    names::ITEM_TYPE,
    names::NAME,
];

/// Boolean attributes, formatted as `true`/`false`.
pub const FLAGS: &[&str] = &[
    names::IS_CONTENT_ELEMENT,
    names::IS_CONTROL_ELEMENT,
    names::IS_ENABLED,
    names::IS_KEYBOARD_FOCUSABLE,
    names::IS_PASSWORD,
    names::IS_REQUIRED_FOR_FORM,
];

/// Integer attributes, formatted in decimal. The rectangle edges come from the
/// bounding rectangle.
pub const NUMBERS: &[&str] = &[
    names::BOTTOM,
    names::LEFT,
    names::RIGHT,
    names::TOP,
    names::NATIVE_WINDOW_HANDLE,
    names::ORIENTATION,
    names::PROCESS_ID,
];

pub fn format_flag(value: bool) -> String {
    if value { "true".to_owned() } else { "false".to_owned() }
}
