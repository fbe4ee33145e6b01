use crate::error::LocatorError;
use crate::snapshot::document::SnapshotDocument;
use crate::snapshot::xpath::XPath;
use tracing::{debug, warn};
use uia_locator_core::provider::AccessibilityTreeProvider;
use uia_locator_core::ui::{RuntimeId, SearchCondition, TreeScope, attribute_names};

/// Maps the first element `xpath` selects in `document` back to a live node.
///
/// `root` must be the node `document` was projected from. Every failure on
/// the way (invalid XPath, no match, missing or malformed `id`, stale
/// identity) is reported as not found.
pub fn resolve_in_snapshot<P: AccessibilityTreeProvider>(
    provider: &P,
    root: &P::Node,
    document: &SnapshotDocument,
    xpath: &str,
) -> Result<P::Node, LocatorError> {
    let not_found = || LocatorError::not_found(xpath);

    if let Some(message) = document.error_message() {
        debug!(%message, "snapshot unusable");
        return Err(not_found());
    }
    let compiled = XPath::compile(xpath).map_err(|err| {
        debug!(error = %err, %xpath, "snapshot query rejected");
        not_found()
    })?;
    let selected = compiled
        .select_element(document)
        .map_err(|err| {
            debug!(error = %err, %xpath, "snapshot query failed");
            not_found()
        })?
        .ok_or_else(|| {
            debug!(%xpath, "snapshot query selected no element");
            not_found()
        })?;

    let token = document.attribute(selected, attribute_names::SNAPSHOT_ID).ok_or_else(|| {
        debug!(element = ?document.element_name(selected), "selected element carries no id");
        not_found()
    })?;
    let identity = RuntimeId::from_json(token).map_err(|err| {
        debug!(error = %err, %token, "selected element id is not an identity token");
        not_found()
    })?;
    debug!(%identity, "snapshot query selected element");

    if provider.runtime_id(root).is_ok_and(|own| own == identity) {
        return Ok(root.clone());
    }

    let condition = provider.build_condition(&SearchCondition::runtime_id(identity.clone()));
    match provider.find_first(root, TreeScope::Descendants, &condition) {
        Ok(Some(node)) => Ok(node),
        Ok(None) => {
            debug!(%identity, "identity no longer present in the live tree");
            Err(not_found())
        }
        Err(err) => {
            warn!(error = %err, %identity, "identity search failed");
            Err(not_found())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ResolveOptions;
    use crate::snapshot::project_snapshot;
    use rstest::{fixture, rstest};
    use uia_locator_provider_mock::{MockNodeId, MockProvider, MockTree};

    #[fixture]
    fn provider() -> MockProvider {
        MockProvider::new(MockTree::sample().expect("sample tree loads"))
    }

    fn automation_id(provider: &MockProvider, node: &MockNodeId) -> String {
        provider.attributes(node).unwrap().get("AutomationId").cloned().unwrap_or_default()
    }

    #[rstest]
    #[case("//Edit[@AutomationId='password']", "password")]
    #[case("//Group[@ClassName='row'][1]/Edit[1]", "userName")]
    #[case("//Button[contains(@Name, 'Cancel')]", "cancelButton")]
    fn maps_selection_back_to_the_live_node(
        provider: MockProvider,
        #[case] xpath: &str,
        #[case] expected: &str,
    ) {
        let root = provider.root().unwrap();
        let document = project_snapshot(&provider, &root, &ResolveOptions::default()).unwrap();
        let node = resolve_in_snapshot(&provider, &root, &document, xpath).unwrap();
        assert_eq!(automation_id(&provider, &node), expected);
    }

    #[rstest]
    fn projection_root_matches_itself(provider: MockProvider) {
        let login = provider.node_by_automation_id("loginWindow").unwrap();
        let document = project_snapshot(&provider, &login, &ResolveOptions::default()).unwrap();
        let node = resolve_in_snapshot(&provider, &login, &document, "/Root/Window").unwrap();
        assert_eq!(provider.runtime_id(&node).unwrap(), provider.runtime_id(&login).unwrap());
    }

    #[rstest]
    #[case("//Slider")]
    #[case("//Button[")]
    #[case("/Root")]
    #[case("//Button/@Name")]
    fn unusable_selections_are_not_found(provider: MockProvider, #[case] xpath: &str) {
        let root = provider.root().unwrap();
        let document = project_snapshot(&provider, &root, &ResolveOptions::default()).unwrap();
        let err = resolve_in_snapshot(&provider, &root, &document, xpath).unwrap_err();
        assert!(err.is_not_found());
    }

    #[rstest]
    fn malformed_identity_is_not_found(provider: MockProvider) {
        let root = provider.root().unwrap();
        let document =
            SnapshotDocument::parse(r#"<Root><Pane id="[42]"><Button Name="OK" id="oops"/></Pane></Root>"#).unwrap();
        let err = resolve_in_snapshot(&provider, &root, &document, "//Button").unwrap_err();
        assert!(err.is_not_found());
    }

    #[rstest]
    fn stale_identity_is_not_found(provider: MockProvider) {
        let root = provider.root().unwrap();
        let document =
            SnapshotDocument::parse(r#"<Root><Pane id="[42]"><Button Name="OK" id="[7,7,7]"/></Pane></Root>"#).unwrap();
        let err = resolve_in_snapshot(&provider, &root, &document, "//Button").unwrap_err();
        assert!(err.is_not_found());
    }

    #[rstest]
    fn error_documents_resolve_nothing(provider: MockProvider) {
        let root = provider.root().unwrap();
        let document = SnapshotDocument::error("truncated");
        let err = resolve_in_snapshot(&provider, &root, &document, "//*").unwrap_err();
        assert!(err.is_not_found());
    }
}
