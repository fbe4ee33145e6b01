use super::ProviderError;
use crate::types::Rect;
use crate::ui::{
    ConditionFlags, ConditionValue, ControlTypeId, PropertyId, RuntimeId, SearchCondition,
    TreeScope,
};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Formatted attribute set of one node, keyed by the names in
/// [`attribute_names`](crate::ui::attribute_names).
pub type AttributeMap = BTreeMap<String, String>;

/// Session onto a live accessibility tree.
///
/// A value implementing this trait is owned by the caller and handed by
/// reference through a whole resolution. Implementations do not need to be
/// thread-safe; concurrent resolutions use separate sessions. Nodes are opaque
/// handles owned by the provider.
///
/// Property reads may fail transiently while the underlying UI mutates; such
/// failures are reported with a kind for which
/// [`ProviderError::is_transient`] holds.
pub trait AccessibilityTreeProvider {
    type Node: Clone + Debug;
    type Condition;

    /// Absolute root of the tree (usually the desktop).
    fn root(&self) -> Result<Self::Node, ProviderError>;

    /// Formatted attribute set of `node`.
    fn attributes(&self, node: &Self::Node) -> Result<AttributeMap, ProviderError>;

    fn control_type(&self, node: &Self::Node) -> Result<ControlTypeId, ProviderError>;

    fn bounding_rect(&self, node: &Self::Node) -> Result<Rect, ProviderError>;

    fn runtime_id(&self, node: &Self::Node) -> Result<RuntimeId, ProviderError>;

    /// First match in traversal order within `scope` of `node`.
    fn find_first(
        &self,
        node: &Self::Node,
        scope: TreeScope,
        condition: &Self::Condition,
    ) -> Result<Option<Self::Node>, ProviderError>;

    /// All matches within `scope` of `node`, in traversal order.
    fn find_all(
        &self,
        node: &Self::Node,
        scope: TreeScope,
        condition: &Self::Condition,
    ) -> Result<Vec<Self::Node>, ProviderError>;

    fn first_child(&self, node: &Self::Node) -> Result<Option<Self::Node>, ProviderError>;

    fn next_sibling(&self, node: &Self::Node) -> Result<Option<Self::Node>, ProviderError>;

    fn control_type_condition(&self, id: ControlTypeId, flags: ConditionFlags) -> Self::Condition;

    fn property_condition(
        &self,
        id: PropertyId,
        value: ConditionValue,
        flags: ConditionFlags,
    ) -> Self::Condition;

    fn and_condition(&self, conditions: Vec<Self::Condition>) -> Self::Condition;

    /// Builds a native condition from a provider-agnostic one.
    fn build_condition(&self, condition: &SearchCondition) -> Self::Condition {
        match condition {
            SearchCondition::ControlType { id, flags } => self.control_type_condition(*id, *flags),
            SearchCondition::Property { id, value, flags } => {
                self.property_condition(*id, value.clone(), *flags)
            }
            SearchCondition::And(parts) => {
                let parts = parts.iter().map(|part| self.build_condition(part)).collect();
                self.and_condition(parts)
            }
        }
    }
}
