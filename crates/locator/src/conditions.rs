use crate::parser::{PathSegment, Predicate, TagTest};
use tracing::debug;
use uia_locator_core::ui::{
    ConditionFlags, ControlTypeId, PropertyId, RuntimeId, SearchCondition, TreeScope,
};

/// A segment lowered to a provider-agnostic search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledSegment {
    pub condition: SearchCondition,
    pub scope: TreeScope,
    pub index: Option<i64>,
}

/// Compiles one segment, or `None` when neither its tag nor any of its
/// predicates name something the lookup tables know.
pub fn compile_segment(segment: &PathSegment) -> Option<CompiledSegment> {
    let tag = segment.tag.as_ref().and_then(tag_condition);
    let predicates = SearchCondition::all(segment.predicates.iter().filter_map(predicate_condition).collect());

    let condition = match (tag, predicates) {
        (Some(tag), Some(predicates)) => SearchCondition::And(vec![tag, predicates]),
        (Some(condition), None) | (None, Some(condition)) => condition,
        (None, None) => return None,
    };
    Some(CompiledSegment { condition, scope: segment.scope, index: segment.index })
}

fn tag_condition(tag: &TagTest) -> Option<SearchCondition> {
    let Some(id) = ControlTypeId::from_name(&tag.name) else {
        debug!(tag = %tag.name, "unknown control type; tag contributes no condition");
        return None;
    };
    Some(SearchCondition::control_type(id, ConditionFlags::locator(tag.substring)))
}

fn predicate_condition(predicate: &Predicate) -> Option<SearchCondition> {
    let Some(id) = PropertyId::from_name(&predicate.attribute) else {
        debug!(attribute = %predicate.attribute, "unknown attribute; predicate skipped");
        return None;
    };
    let flags = ConditionFlags::locator(predicate.substring);
    if id == PropertyId::RUNTIME_ID
        && !predicate.substring
        && let Ok(runtime_id) = RuntimeId::from_json(&predicate.value)
    {
        return Some(SearchCondition::property(id, runtime_id, flags));
    }
    Some(SearchCondition::property(id, predicate.value.as_str(), flags))
}
