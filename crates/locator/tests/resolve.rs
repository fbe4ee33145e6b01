use rstest::{fixture, rstest};
use std::time::Duration;
use uia_locator::{CancellationToken, LocatorError, ResolveOptions, resolve};
use uia_locator_core::provider::AccessibilityTreeProvider;
use uia_locator_core::types::{Point, Rect};
use uia_locator_provider_mock::{MockNodeId, MockProvider, MockTree, NodeSpec};

#[fixture]
fn sample() -> MockProvider {
    MockProvider::new(MockTree::sample().expect("sample tree loads"))
}

/// Three edit controls whose names contain "user", spread over two levels.
#[fixture]
fn user_edits() -> MockProvider {
    let tree = MockTree::new(vec![
        NodeSpec::new("Window", "Accounts").with_automation_id("accounts").with_children([
            NodeSpec::new("Edit", "User name").with_automation_id("first"),
            NodeSpec::new("Group", "Details").with_children([
                NodeSpec::new("Edit", "Backup user").with_automation_id("second"),
                NodeSpec::new("Edit", "Password").with_automation_id("password"),
            ]),
            NodeSpec::new("Edit", "user id")
                .with_automation_id("third")
                .with_bounds(Rect::new(10, 20, 110, 40)),
        ]),
    ]);
    MockProvider::new(tree)
}

fn automation_id(provider: &MockProvider, node: &MockNodeId) -> String {
    provider.attributes(node).unwrap().get("AutomationId").cloned().unwrap_or_default()
}

fn resolve_id(provider: &MockProvider, locator: &str, root: Option<&MockNodeId>) -> Result<String, LocatorError> {
    let element = resolve(provider, locator, root, &ResolveOptions::default())?;
    Ok(automation_id(provider, element.node().expect("tree locators resolve to nodes")))
}

#[rstest]
fn child_button_by_name(sample: MockProvider) {
    let actions = resolve(&sample, "//Group[@Name='Actions']", None, &ResolveOptions::default())
        .unwrap()
        .into_node()
        .unwrap();

    let element = resolve(&sample, "/Button[@Name='OK']", Some(&actions), &ResolveOptions::default()).unwrap();
    assert_eq!(element.id(), "okButton");
    assert_eq!(element.bounding_rectangle(), Rect::new(480, 500, 580, 540));
    assert_eq!(element.clickable_point(), None);
}

#[rstest]
fn partial_tag_and_attribute_with_index(user_edits: MockProvider) {
    assert_eq!(resolve_id(&user_edits, "//partialEdit[@partialName='user'][2]", None).unwrap(), "second");
}

#[rstest]
#[case("//Edit[@partialName='user'][0]", "first")]
#[case("//Edit[@partialName='user'][-3]", "first")]
#[case("//Edit[@partialName='user'][1]", "first")]
#[case("//Edit[@partialName='user'][3]", "third")]
#[case("//Edit[@partialName='user']", "first")]
fn index_selection_is_clamped_below(user_edits: MockProvider, #[case] locator: &str, #[case] expected: &str) {
    assert_eq!(resolve_id(&user_edits, locator, None).unwrap(), expected);
}

#[rstest]
fn index_past_the_matches_is_not_found(user_edits: MockProvider) {
    let err = resolve_id(&user_edits, "//Edit[@partialName='user'][4]", None).unwrap_err();
    assert!(err.is_not_found());
}

#[rstest]
fn identifier_falls_back_to_a_generated_token(sample: MockProvider) {
    let element = resolve(&sample, "//Hyperlink", None, &ResolveOptions::default()).unwrap();
    assert!(!element.id().is_empty());
    assert_ne!(element.id(), "Hyperlink");
    assert_eq!(element.bounding_rectangle(), Rect::new(130, 510, 400, 530));
}

#[rstest]
fn snapshot_query_maps_back_to_the_live_node(sample: MockProvider) {
    let element = resolve(&sample, "/DOM//Group[@ClassName='row'][1]", None, &ResolveOptions::default()).unwrap();
    let node = element.node().unwrap();
    assert_eq!(sample.attributes(node).unwrap().get("Name").map(String::as_str), Some("Credentials"));

    let direct = resolve(&sample, "//Group[@Name='Credentials']", None, &ResolveOptions::default()).unwrap();
    assert_eq!(sample.runtime_id(node).unwrap(), sample.runtime_id(direct.node().unwrap()).unwrap());
}

#[rstest]
#[case("/DOM//Edit[@IsPassword='true']", "password")]
#[case("/dom//Button[following-sibling::Button]", "okButton")]
#[case("//Window[@AutomationId='loginWindow']/DOM//Button[2]", "cancelButton")]
#[case("/DOM//*[@Name='Forgot your password? <reset>']/preceding-sibling::Button[1]", "cancelButton")]
#[case("/DOM//Edit[substring(@Name, 1, 4) = 'user']", "userName")]
#[case("/DOM//Group[sum(Edit/@Left) = 540]/Edit[2]", "password")]
#[case("/DOM//Button[round(@Left div 100) = 5]", "okButton")]
#[case("/DOM//Button[floor(@Left div 100) = 4]", "okButton")]
#[case("/DOM//Button[ceiling(@Left div 100) = 6]", "cancelButton")]
fn snapshot_locators(sample: MockProvider, #[case] locator: &str, #[case] expected: &str) {
    assert_eq!(resolve_id(&sample, locator, None).unwrap(), expected);
}

#[rstest]
fn snapshot_prefix_is_relative_to_the_application_root(sample: MockProvider) {
    let notepad = sample.node_by_automation_id("notepad").unwrap();
    // the login window is not below notepad
    let err = resolve_id(&sample, "/Group[@Name='Actions']/DOM//Button", Some(&notepad)).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(resolve_id(&sample, "/Document/DOM/Root/Document", Some(&notepad)).unwrap(), "15");
}

#[rstest]
#[case("/DOM//Slider")]
#[case("/DOM//Button[")]
#[case("/DOM/count(//Button)")]
fn unusable_snapshot_queries_are_not_found(sample: MockProvider, #[case] locator: &str) {
    let err = resolve(&sample, locator, None, &ResolveOptions::default()).unwrap_err();
    assert!(err.is_not_found(), "{locator}: {err}");
    assert_eq!(err.locator(), locator);
}

#[rstest]
#[case("///[]")]
#[case("|")]
#[case("")]
#[case("//Bogus[@Frobnicate='1']")]
fn malformed_locators(sample: MockProvider, #[case] locator: &str) {
    let err = resolve(&sample, locator, None, &ResolveOptions::default()).unwrap_err();
    assert!(err.is_malformed(), "{locator}: {err}");
}

#[rstest]
fn alternation_takes_the_first_branch_that_resolves(sample: MockProvider) {
    let locator = "//Button[@Name='Missing'] | //Bogus[@Frobnicate='x'] | //Button[@Name='Cancel']";
    assert_eq!(resolve_id(&sample, locator, None).unwrap(), "cancelButton");
    assert_eq!(
        resolve_id(&sample, locator, None).unwrap(),
        resolve_id(&sample, "//Button[@Name='Cancel']", None).unwrap()
    );
}

#[rstest]
fn alternation_with_every_branch_searched_is_not_found(sample: MockProvider) {
    let err = resolve(&sample, "//Button[@Name='A'] | //Bogus[@Frobnicate='x']", None, &ResolveOptions::default())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[rstest]
fn literals_may_contain_structural_characters(sample: MockProvider) {
    let element = resolve(
        &sample,
        "//Hyperlink[@Name='Forgot your password? <reset>'] | //Button",
        None,
        &ResolveOptions::default(),
    )
    .unwrap();
    assert_eq!(element.bounding_rectangle(), Rect::new(130, 510, 400, 530));

    let tree = MockTree::new(vec![NodeSpec::new("Button", "a/b | [c] and d").with_automation_id("odd")]);
    let provider = MockProvider::new(tree);
    assert_eq!(resolve_id(&provider, r#"/root/Button[@Name="a/b | [c] and d"]"#, None).unwrap(), "odd");
}

#[rstest]
#[case("//cords[120,340]", Point::new(120, 340))]
#[case("//CORDS[0,0]", Point::new(0, 0))]
fn coordinates_bypass_the_tree(#[case] locator: &str, #[case] point: Point) {
    // failing reads would make any tree search degrade
    let provider = MockProvider::new(MockTree::new(Vec::new())).failing_reads();
    let element = resolve(&provider, locator, None, &ResolveOptions::default()).unwrap();
    assert!(element.is_coordinate());
    assert_eq!(element.clickable_point(), Some(point));
    assert_eq!(element.node(), None);
}

#[rstest]
fn root_anchor_ignores_the_application_root(sample: MockProvider) {
    let notepad = sample.node_by_automation_id("notepad").unwrap();
    assert!(resolve_id(&sample, "//Button[@Name='OK']", Some(&notepad)).unwrap_err().is_not_found());
    assert_eq!(resolve_id(&sample, "/root//Button[@Name='OK']", Some(&notepad)).unwrap(), "okButton");
}

#[rstest]
fn transient_read_failures_are_retried(sample: MockProvider) {
    let provider = sample.with_transient_failures(3);
    let element = resolve(&provider, "//Button[@Name='OK']", None, &ResolveOptions::default()).unwrap();
    assert_eq!(element.id(), "okButton");
    assert!(provider.attempts() > 3);
}

#[rstest]
fn exhausted_read_budget_degrades_to_empty_data(sample: MockProvider) {
    let provider = sample.failing_reads();
    let options = ResolveOptions::new().with_attribute_timeout(Duration::from_millis(20));
    let element = resolve(&provider, "//Button[@Name='OK']", None, &options).unwrap();
    assert_eq!(element.bounding_rectangle(), Rect::default());
    // no automation id could be read, so a generated token stands in
    assert_ne!(element.id(), "okButton");
}

#[rstest]
#[case("//Button[@Name='OK']")]
#[case("/DOM//Button")]
fn cancelled_resolution(sample: MockProvider, #[case] locator: &str) {
    let token = CancellationToken::new();
    token.cancel();
    let options = ResolveOptions::new().with_cancellation(token);
    let err = resolve(&sample, locator, None, &options).unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(err.locator(), locator);
}
