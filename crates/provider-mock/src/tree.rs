use quick_xml::de::from_str;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;
use uia_locator_core::types::Rect;
use uia_locator_core::ui::{ControlTypeId, RuntimeId, attribute_names};

/// Runtime id of the implicit desktop root. Nodes without an explicit id get
/// `[DESKTOP_RUNTIME_ID, n]` with `n` counting up in pre-order.
pub const DESKTOP_RUNTIME_ID: i32 = 42;

const DESKTOP_BOUNDS: Rect = Rect::new(0, 0, 1920, 1080);

/// Handle of a node inside a [`MockTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MockNodeId(usize);

impl MockNodeId {
    pub(crate) const ROOT: MockNodeId = MockNodeId(0);

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct NodeSpec {
    control_type: String,
    name: String,
    automation_id: Option<String>,
    runtime_id: Option<RuntimeId>,
    bounds: Rect,
    properties: Vec<(String, String)>,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    /// Unknown control-type names fall back to `Custom`.
    pub fn new(control_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            control_type: control_type.into(),
            name: name.into(),
            automation_id: None,
            runtime_id: None,
            bounds: Rect::default(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_automation_id(mut self, automation_id: impl Into<String>) -> Self {
        self.automation_id = Some(automation_id.into());
        self
    }

    pub fn with_runtime_id(mut self, runtime_id: impl Into<RuntimeId>) -> Self {
        self.runtime_id = Some(runtime_id.into());
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = NodeSpec>,
    {
        self.children.extend(children);
        self
    }
}

#[derive(Clone, Debug)]
pub(crate) struct MockNodeData {
    pub(crate) control_type: ControlTypeId,
    pub(crate) runtime_id: RuntimeId,
    pub(crate) bounds: Rect,
    pub(crate) properties: BTreeMap<String, String>,
    pub(crate) parent: Option<MockNodeId>,
    pub(crate) children: Vec<MockNodeId>,
}

impl MockNodeData {
    pub(crate) fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }
}

/// Immutable arena of mock nodes rooted at a synthetic desktop pane.
#[derive(Clone, Debug)]
pub struct MockTree {
    nodes: Vec<MockNodeData>,
}

impl MockTree {
    /// Builds a tree whose desktop root has `top_level` as its children.
    pub fn new(top_level: Vec<NodeSpec>) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(attribute_names::NAME.to_owned(), "Desktop".to_owned());
        properties.insert(attribute_names::CLASS_NAME.to_owned(), "#32769".to_owned());
        let mut tree = Self {
            nodes: vec![MockNodeData {
                control_type: ControlTypeId::PANE,
                runtime_id: RuntimeId::new(vec![DESKTOP_RUNTIME_ID]),
                bounds: DESKTOP_BOUNDS,
                properties,
                parent: None,
                children: Vec::new(),
            }],
        };
        let mut counter = 0;
        for spec in top_level {
            tree.insert(spec, MockNodeId::ROOT, &mut counter);
        }
        tree
    }

    fn insert(&mut self, spec: NodeSpec, parent: MockNodeId, counter: &mut i32) -> MockNodeId {
        *counter += 1;
        let NodeSpec { control_type, name, automation_id, runtime_id, bounds, properties, children } =
            spec;

        let mut props: BTreeMap<String, String> = properties.into_iter().collect();
        props.insert(attribute_names::NAME.to_owned(), name);
        if let Some(automation_id) = automation_id {
            props.insert(attribute_names::AUTOMATION_ID.to_owned(), automation_id);
        }

        let id = MockNodeId(self.nodes.len());
        self.nodes.push(MockNodeData {
            control_type: ControlTypeId::from_name(&control_type).unwrap_or(ControlTypeId::CUSTOM),
            runtime_id: runtime_id
                .unwrap_or_else(|| RuntimeId::new(vec![DESKTOP_RUNTIME_ID, *counter])),
            bounds,
            properties: props,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.index()].children.push(id);

        for child in children {
            self.insert(child, id, counter);
        }
        id
    }

    pub fn root(&self) -> MockNodeId {
        MockNodeId::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn get(&self, id: MockNodeId) -> Option<&MockNodeData> {
        self.nodes.get(id.index())
    }

    pub fn parent(&self, id: MockNodeId) -> Option<MockNodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: MockNodeId) -> &[MockNodeId] {
        self.get(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Descendants of `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: MockNodeId) -> Vec<MockNodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<MockNodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn runtime_id(&self, id: MockNodeId) -> Option<&RuntimeId> {
        self.get(id).map(|node| &node.runtime_id)
    }

    pub fn control_type(&self, id: MockNodeId) -> Option<ControlTypeId> {
        self.get(id).map(|node| node.control_type)
    }

    pub fn name(&self, id: MockNodeId) -> Option<&str> {
        self.get(id).and_then(|node| node.property(attribute_names::NAME))
    }

    pub fn find_by_automation_id(&self, automation_id: &str) -> Option<MockNodeId> {
        self.nodes
            .iter()
            .position(|node| node.property(attribute_names::AUTOMATION_ID) == Some(automation_id))
            .map(MockNodeId)
    }

    pub fn find_by_runtime_id(&self, runtime_id: &RuntimeId) -> Option<MockNodeId> {
        self.nodes.iter().position(|node| &node.runtime_id == runtime_id).map(MockNodeId)
    }
}

impl MockTree {
    /// Small login dialog plus an editor window, embedded in the crate.
    pub fn sample() -> Result<Self, MockTreeLoadError> {
        const XML: &str = include_str!("../assets/sample_tree.xml");
        Self::from_xml(XML)
    }

    /// Loads a tree fixture. Within a `<node>`, `<property>` elements must
    /// precede child `<node>` elements.
    pub fn from_xml(xml: &str) -> Result<Self, MockTreeLoadError> {
        let parsed: XmlTree = from_str(xml)?;
        let specs = parsed.nodes.into_iter().map(build_spec).collect::<Result<Vec<_>, _>>()?;
        Ok(MockTree::new(specs))
    }
}

#[derive(Debug, Deserialize)]
struct XmlTree {
    #[serde(rename = "node", default)]
    nodes: Vec<XmlNode>,
}

#[derive(Debug, Deserialize)]
struct XmlNode {
    #[serde(rename = "@type")]
    control_type: String,
    #[serde(rename = "@name", default)]
    name: String,
    #[serde(rename = "@automation_id")]
    automation_id: Option<String>,
    #[serde(rename = "@runtime_id")]
    runtime_id: Option<String>,
    #[serde(rename = "@bounds")]
    bounds: Option<String>,
    #[serde(rename = "property", default)]
    properties: Vec<XmlProperty>,
    #[serde(rename = "node", default)]
    children: Vec<XmlNode>,
}

#[derive(Debug, Deserialize)]
struct XmlProperty {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@value")]
    value: String,
}

fn build_spec(node: XmlNode) -> Result<NodeSpec, MockTreeLoadError> {
    let mut spec = NodeSpec::new(node.control_type, node.name);
    if let Some(automation_id) = node.automation_id {
        spec = spec.with_automation_id(automation_id);
    }
    if let Some(runtime_id) = node.runtime_id.as_deref() {
        spec = spec.with_runtime_id(parse_runtime_id(runtime_id)?);
    }
    if let Some(bounds) = node.bounds.as_deref() {
        spec = spec.with_bounds(parse_rect(bounds)?);
    }
    for property in node.properties {
        spec = spec.with_property(property.name, property.value);
    }
    for child in node.children {
        spec = spec.with_child(build_spec(child)?);
    }
    Ok(spec)
}

fn parse_ints(value: &str) -> Option<Vec<i32>> {
    value.split(',').map(|chunk| chunk.trim().parse::<i32>().ok()).collect()
}

fn parse_rect(value: &str) -> Result<Rect, MockTreeLoadError> {
    match parse_ints(value).as_deref() {
        Some([left, top, right, bottom]) => Ok(Rect::new(*left, *top, *right, *bottom)),
        _ => Err(MockTreeLoadError::InvalidRect(value.to_owned())),
    }
}

fn parse_runtime_id(value: &str) -> Result<RuntimeId, MockTreeLoadError> {
    match parse_ints(value) {
        Some(parts) if !parts.is_empty() => Ok(RuntimeId::new(parts)),
        _ => Err(MockTreeLoadError::InvalidRuntimeId(value.to_owned())),
    }
}

#[derive(Debug, Error)]
pub enum MockTreeLoadError {
    #[error("failed to parse mock tree XML: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("invalid bounds '{0}' (expected left,top,right,bottom)")]
    InvalidRect(String),
    #[error("invalid runtime id '{0}' (expected comma separated integers)")]
    InvalidRuntimeId(String),
}
