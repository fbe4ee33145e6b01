use crate::condition::{MockCondition, attribute_text};
use crate::tree::{MockNodeData, MockNodeId, MockTree};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;
use uia_locator_core::provider::{
    AccessibilityTreeProvider, AttributeMap, ProviderError, ProviderErrorKind,
};
use uia_locator_core::types::Rect;
use uia_locator_core::ui::attributes::{FLAGS, NUMBERS, TEXT};
use uia_locator_core::ui::{
    ConditionFlags, ConditionValue, ControlTypeId, PropertyId, RuntimeId, TreeScope,
};

/// Session over a [`MockTree`].
///
/// Attribute, control-type and bounding-rectangle reads can be made to fail
/// with [`ProviderErrorKind::CommunicationFailure`] a fixed number of times, or
/// permanently, to simulate a UI that mutates while it is inspected.
#[derive(Debug)]
pub struct MockProvider {
    tree: Arc<MockTree>,
    remaining_failures: AtomicUsize,
    read_attempts: AtomicUsize,
}

impl MockProvider {
    pub fn new(tree: impl Into<Arc<MockTree>>) -> Self {
        Self {
            tree: tree.into(),
            remaining_failures: AtomicUsize::new(0),
            read_attempts: AtomicUsize::new(0),
        }
    }

    /// The next `count` property reads fail transiently.
    pub fn with_transient_failures(self, count: usize) -> Self {
        self.remaining_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Every property read fails transiently.
    pub fn failing_reads(self) -> Self {
        self.with_transient_failures(usize::MAX)
    }

    /// Number of property reads attempted so far, failed ones included.
    pub fn attempts(&self) -> usize {
        self.read_attempts.load(Ordering::SeqCst)
    }

    pub fn tree(&self) -> &MockTree {
        &self.tree
    }

    pub fn node_by_automation_id(&self, automation_id: &str) -> Option<MockNodeId> {
        self.tree.find_by_automation_id(automation_id)
    }

    fn node(&self, id: MockNodeId) -> Result<&MockNodeData, ProviderError> {
        self.tree.get(id).ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::ElementNotAvailable, format!("unknown node {id:?}"))
        })
    }

    fn read(&self, id: MockNodeId) -> Result<&MockNodeData, ProviderError> {
        self.read_attempts.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| match remaining {
                0 => None,
                usize::MAX => Some(usize::MAX),
                n => Some(n - 1),
            })
            .is_ok();
        if injected {
            trace!(node = ?id, "injecting transient read failure");
            return Err(ProviderError::new(
                ProviderErrorKind::CommunicationFailure,
                "element changed while it was read",
            ));
        }
        self.node(id)
    }

    fn scope_nodes(&self, node: MockNodeId, scope: TreeScope) -> Vec<MockNodeId> {
        match scope {
            TreeScope::Children => self.tree.children(node).to_vec(),
            TreeScope::Descendants => self.tree.descendants(node),
        }
    }

    fn matching(
        &self,
        node: MockNodeId,
        scope: TreeScope,
        condition: &MockCondition,
    ) -> Result<impl Iterator<Item = MockNodeId> + '_, ProviderError> {
        self.node(node)?;
        let candidates = self.scope_nodes(node, scope);
        let condition = condition.clone();
        Ok(candidates
            .into_iter()
            .filter(move |id| self.tree.get(*id).is_some_and(|data| condition.matches(data))))
    }
}

impl AccessibilityTreeProvider for MockProvider {
    type Node = MockNodeId;
    type Condition = MockCondition;

    fn root(&self) -> Result<MockNodeId, ProviderError> {
        Ok(self.tree.root())
    }

    fn attributes(&self, node: &MockNodeId) -> Result<AttributeMap, ProviderError> {
        let data = self.read(*node)?;
        Ok(TEXT
            .iter()
            .chain(FLAGS)
            .chain(NUMBERS)
            .map(|name| ((*name).to_owned(), attribute_text(data, name)))
            .collect())
    }

    fn control_type(&self, node: &MockNodeId) -> Result<ControlTypeId, ProviderError> {
        Ok(self.read(*node)?.control_type)
    }

    fn bounding_rect(&self, node: &MockNodeId) -> Result<Rect, ProviderError> {
        Ok(self.read(*node)?.bounds)
    }

    fn runtime_id(&self, node: &MockNodeId) -> Result<RuntimeId, ProviderError> {
        Ok(self.node(*node)?.runtime_id.clone())
    }

    fn find_first(
        &self,
        node: &MockNodeId,
        scope: TreeScope,
        condition: &MockCondition,
    ) -> Result<Option<MockNodeId>, ProviderError> {
        Ok(self.matching(*node, scope, condition)?.next())
    }

    fn find_all(
        &self,
        node: &MockNodeId,
        scope: TreeScope,
        condition: &MockCondition,
    ) -> Result<Vec<MockNodeId>, ProviderError> {
        Ok(self.matching(*node, scope, condition)?.collect())
    }

    fn first_child(&self, node: &MockNodeId) -> Result<Option<MockNodeId>, ProviderError> {
        Ok(self.node(*node)?.children.first().copied())
    }

    fn next_sibling(&self, node: &MockNodeId) -> Result<Option<MockNodeId>, ProviderError> {
        let Some(parent) = self.node(*node)?.parent else {
            return Ok(None);
        };
        let siblings = self.tree.children(parent);
        Ok(siblings
            .iter()
            .position(|sibling| sibling == node)
            .and_then(|index| siblings.get(index + 1))
            .copied())
    }

    fn control_type_condition(&self, id: ControlTypeId, flags: ConditionFlags) -> MockCondition {
        MockCondition::ControlType { id, flags }
    }

    fn property_condition(
        &self,
        id: PropertyId,
        value: ConditionValue,
        flags: ConditionFlags,
    ) -> MockCondition {
        MockCondition::Property { id, value, flags }
    }

    fn and_condition(&self, conditions: Vec<MockCondition>) -> MockCondition {
        MockCondition::And(conditions)
    }
}
