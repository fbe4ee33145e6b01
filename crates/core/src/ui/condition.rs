use super::{ControlTypeId, PropertyId, RuntimeId};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Matching modifiers for a single condition.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ConditionFlags: u8 {
        const IGNORE_CASE = 0b0000_0001;
        const MATCH_SUBSTRING = 0b0000_0010;
    }
}

impl ConditionFlags {
    /// Flags used for locator predicates: always case-insensitive, optionally
    /// substring matching.
    pub fn locator(substring: bool) -> Self {
        if substring {
            Self::IGNORE_CASE | Self::MATCH_SUBSTRING
        } else {
            Self::IGNORE_CASE
        }
    }

    pub fn is_substring(self) -> bool {
        self.contains(Self::MATCH_SUBSTRING)
    }

    pub fn ignores_case(self) -> bool {
        self.contains(Self::IGNORE_CASE)
    }

    /// Compares `actual` against `expected` honouring these flags.
    pub fn matches_text(self, actual: &str, expected: &str) -> bool {
        if self.ignores_case() {
            let actual = actual.to_lowercase();
            let expected = expected.to_lowercase();
            if self.is_substring() { actual.contains(&expected) } else { actual == expected }
        } else if self.is_substring() {
            actual.contains(expected)
        } else {
            actual == expected
        }
    }
}

/// Search scope relative to the node a search starts from. Neither scope
/// includes the start node itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeScope {
    Children,
    Descendants,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConditionValue {
    Text(String),
    RuntimeId(RuntimeId),
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        ConditionValue::Text(value.to_owned())
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        ConditionValue::Text(value)
    }
}

impl From<RuntimeId> for ConditionValue {
    fn from(value: RuntimeId) -> Self {
        ConditionValue::RuntimeId(value)
    }
}

/// Provider-agnostic predicate over a node.
///
/// Providers never see this type directly: the resolver lowers it through the
/// provider's condition constructors, so each resolution works on its own
/// freshly built native conditions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchCondition {
    ControlType { id: ControlTypeId, flags: ConditionFlags },
    Property { id: PropertyId, value: ConditionValue, flags: ConditionFlags },
    And(Vec<SearchCondition>),
}

impl SearchCondition {
    pub fn control_type(id: ControlTypeId, flags: ConditionFlags) -> Self {
        SearchCondition::ControlType { id, flags }
    }

    pub fn property(id: PropertyId, value: impl Into<ConditionValue>, flags: ConditionFlags) -> Self {
        SearchCondition::Property { id, value: value.into(), flags }
    }

    /// Identity-equality condition on the runtime id.
    pub fn runtime_id(id: RuntimeId) -> Self {
        SearchCondition::Property {
            id: PropertyId::RUNTIME_ID,
            value: ConditionValue::RuntimeId(id),
            flags: ConditionFlags::empty(),
        }
    }

    /// Conjunction that collapses single-element lists.
    pub fn all(mut conditions: Vec<SearchCondition>) -> Option<Self> {
        match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ => Some(SearchCondition::And(conditions)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ConditionFlags::locator(false), "OK", "ok", true)]
    #[case(ConditionFlags::locator(false), "OK button", "ok", false)]
    #[case(ConditionFlags::locator(true), "User name", "USER", true)]
    #[case(ConditionFlags::empty(), "OK", "ok", false)]
    #[case(ConditionFlags::MATCH_SUBSTRING, "Submit", "mit", true)]
    fn text_matching_honours_flags(
        #[case] flags: ConditionFlags,
        #[case] actual: &str,
        #[case] expected: &str,
        #[case] matches: bool,
    ) {
        assert_eq!(flags.matches_text(actual, expected), matches);
    }

    #[rstest]
    fn all_collapses_single_condition() {
        let name = SearchCondition::property(PropertyId::NAME, "OK", ConditionFlags::IGNORE_CASE);
        assert_eq!(SearchCondition::all(vec![]), None);
        assert_eq!(SearchCondition::all(vec![name.clone()]), Some(name.clone()));
        assert!(matches!(
            SearchCondition::all(vec![name.clone(), name]),
            Some(SearchCondition::And(parts)) if parts.len() == 2
        ));
    }
}
