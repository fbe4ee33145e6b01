use crate::attributes::{read_automation_id, read_bounding_rect};
use crate::options::ResolveOptions;
use serde::Serialize;
use uia_locator_core::provider::AccessibilityTreeProvider;
use uia_locator_core::types::{Point, Rect};
use uuid::Uuid;

/// Outcome of a successful resolution.
///
/// Coordinate locators produce an element without a node that only carries a
/// clickable point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct ResolvedElement<N> {
    id: String,
    #[serde(skip)]
    node: Option<N>,
    bounding_rectangle: Rect,
    clickable_point: Option<Point>,
}

impl<N> ResolvedElement<N> {
    pub(crate) fn at_point(point: Point) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            node: None,
            bounding_rectangle: Rect::default(),
            clickable_point: Some(point),
        }
    }

    /// The automation id when the node has one, otherwise a generated token.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn node(&self) -> Option<&N> {
        self.node.as_ref()
    }

    pub fn into_node(self) -> Option<N> {
        self.node
    }

    pub fn bounding_rectangle(&self) -> Rect {
        self.bounding_rectangle
    }

    pub fn clickable_point(&self) -> Option<Point> {
        self.clickable_point
    }

    pub fn is_coordinate(&self) -> bool {
        self.node.is_none()
    }
}

impl<N: Clone> ResolvedElement<N> {
    pub(crate) fn from_node<P>(provider: &P, node: N, options: &ResolveOptions) -> Self
    where
        P: AccessibilityTreeProvider<Node = N>,
    {
        let id = read_automation_id(provider, &node, options)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let bounding_rectangle = read_bounding_rect(provider, &node, options).unwrap_or_default();
        Self { id, node: Some(node), bounding_rectangle, clickable_point: None }
    }
}
