use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

/// Numeric control-type identifier as reported by the accessibility API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControlTypeId(i32);

id_table!(ControlTypeId, CONTROL_TYPE_TABLE {
    BUTTON = 50000 => "Button",
    CALENDAR = 50001 => "Calendar",
    CHECK_BOX = 50002 => "CheckBox",
    COMBO_BOX = 50003 => "ComboBox",
    EDIT = 50004 => "Edit",
    HYPERLINK = 50005 => "Hyperlink",
    IMAGE = 50006 => "Image",
    LIST_ITEM = 50007 => "ListItem",
    LIST = 50008 => "List",
    MENU = 50009 => "Menu",
    MENU_BAR = 50010 => "MenuBar",
    MENU_ITEM = 50011 => "MenuItem",
    PROGRESS_BAR = 50012 => "ProgressBar",
    RADIO_BUTTON = 50013 => "RadioButton",
    SCROLL_BAR = 50014 => "ScrollBar",
    SLIDER = 50015 => "Slider",
    SPINNER = 50016 => "Spinner",
    STATUS_BAR = 50017 => "StatusBar",
    TAB = 50018 => "Tab",
    TAB_ITEM = 50019 => "TabItem",
    TEXT = 50020 => "Text",
    TOOL_BAR = 50021 => "ToolBar",
    TOOL_TIP = 50022 => "ToolTip",
    TREE = 50023 => "Tree",
    TREE_ITEM = 50024 => "TreeItem",
    CUSTOM = 50025 => "Custom",
    GROUP = 50026 => "Group",
    THUMB = 50027 => "Thumb",
    DATA_GRID = 50028 => "DataGrid",
    DATA_ITEM = 50029 => "DataItem",
    DOCUMENT = 50030 => "Document",
    SPLIT_BUTTON = 50031 => "SplitButton",
    WINDOW = 50032 => "Window",
    PANE = 50033 => "Pane",
    HEADER = 50034 => "Header",
    HEADER_ITEM = 50035 => "HeaderItem",
    TABLE = 50036 => "Table",
    TITLE_BAR = 50037 => "TitleBar",
    SEPARATOR = 50038 => "Separator",
    SEMANTIC_ZOOM = 50039 => "SemanticZoom",
    APP_BAR = 50040 => "AppBar",
});

static BY_NAME: LazyLock<HashMap<String, ControlTypeId>> = LazyLock::new(|| {
    CONTROL_TYPE_TABLE.iter().map(|(name, id)| (name.to_ascii_lowercase(), *id)).collect()
});

static BY_ID: LazyLock<HashMap<ControlTypeId, &'static str>> =
    LazyLock::new(|| CONTROL_TYPE_TABLE.iter().map(|(name, id)| (*id, *name)).collect());

impl ControlTypeId {
    pub const fn from_raw(id: i32) -> Self {
        Self(id)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Case-insensitive lookup of a human-readable control-type name.
    pub fn from_name(name: &str) -> Option<Self> {
        BY_NAME.get(&name.to_ascii_lowercase()).copied()
    }

    /// Canonical name of a known control type.
    pub fn name(self) -> Option<&'static str> {
        BY_ID.get(&self).copied()
    }

    pub fn all() -> impl Iterator<Item = (&'static str, ControlTypeId)> {
        CONTROL_TYPE_TABLE.iter().copied()
    }
}

impl Display for ControlTypeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "ControlType({})", self.0),
        }
    }
}
