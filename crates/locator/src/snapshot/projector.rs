use crate::attributes::{read_attributes, read_tag_name};
use crate::error::LocatorError;
use crate::options::ResolveOptions;
use crate::snapshot::document::{ROOT_ELEMENT, SnapshotDocument};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use std::error::Error as StdError;
use tracing::{debug, trace, warn};
use uia_locator_core::provider::AccessibilityTreeProvider;
use uia_locator_core::ui::attribute_names;

type WriteResult<T> = Result<T, Box<dyn StdError + Send + Sync>>;

/// Projects the subtree below `root` into a snapshot document.
///
/// Every node becomes an element named after its control type, carrying its
/// formatted attributes plus `id`, the JSON form of its runtime id. Empty
/// keys and values are left out. A projection that does not parse yields an
/// error document instead of a failure; only cancellation is reported.
pub fn project_snapshot<P: AccessibilityTreeProvider>(
    provider: &P,
    root: &P::Node,
    options: &ResolveOptions,
) -> Result<SnapshotDocument, LocatorError> {
    let mut projector = Projector { provider, options, writer: Writer::new(Vec::new()), nodes: 0 };
    let written = projector.write_document(root);
    let nodes = projector.nodes;

    let xml = match written {
        Ok(Some(bytes)) => String::from_utf8(bytes).map_err(|err| err.to_string()),
        Ok(None) => return Err(LocatorError::cancelled("snapshot projection")),
        Err(err) => Err(err.to_string()),
    };
    let document = xml.and_then(|xml| SnapshotDocument::parse(&xml).map_err(|err| err.to_string()));
    match document {
        Ok(document) => {
            debug!(nodes, "projected snapshot");
            Ok(document)
        }
        Err(message) => {
            warn!(nodes, error = %message, "snapshot projection is not well-formed");
            Ok(SnapshotDocument::error(message))
        }
    }
}

struct Projector<'a, P: AccessibilityTreeProvider> {
    provider: &'a P,
    options: &'a ResolveOptions,
    writer: Writer<Vec<u8>>,
    nodes: usize,
}

impl<P: AccessibilityTreeProvider> Projector<'_, P> {
    /// `None` when cancelled mid-way.
    fn write_document(&mut self, root: &P::Node) -> WriteResult<Option<Vec<u8>>> {
        self.writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))?;
        if !self.write_node(root)? {
            return Ok(None);
        }
        self.writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
        let writer = std::mem::replace(&mut self.writer, Writer::new(Vec::new()));
        Ok(Some(writer.into_inner()))
    }

    /// Writes `node` and its subtree in pre-order. Returns `false` once the
    /// caller cancelled.
    fn write_node(&mut self, node: &P::Node) -> WriteResult<bool> {
        if self.options.is_cancelled() {
            debug!(nodes = self.nodes, "snapshot projection cancelled");
            return Ok(false);
        }
        self.nodes += 1;

        let tag = read_tag_name(self.provider, node, self.options);
        let mut attributes = read_attributes(self.provider, node, self.options);
        match self.provider.runtime_id(node) {
            Ok(id) => {
                attributes.insert(attribute_names::SNAPSHOT_ID.to_owned(), id.to_json());
            }
            Err(err) => warn!(error = %err, %tag, "runtime id unavailable; node projected without id"),
        }

        let mut start = BytesStart::new(tag.as_str());
        for (key, value) in &attributes {
            if key.trim().is_empty() || value.is_empty() {
                continue;
            }
            start.push_attribute((key.as_str(), value.as_str()));
        }
        trace!(%tag, attributes = attributes.len(), "projecting node");
        self.writer.write_event(Event::Start(start))?;

        let mut child = self.first_child(node);
        while let Some(current) = child {
            if !self.write_node(&current)? {
                return Ok(false);
            }
            child = self.next_sibling(&current);
        }

        self.writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
        Ok(true)
    }

    fn first_child(&self, node: &P::Node) -> Option<P::Node> {
        self.provider.first_child(node).unwrap_or_else(|err| {
            warn!(error = %err, "first child unavailable; subtree truncated");
            None
        })
    }

    fn next_sibling(&self, node: &P::Node) -> Option<P::Node> {
        self.provider.next_sibling(node).unwrap_or_else(|err| {
            warn!(error = %err, "next sibling unavailable; siblings truncated");
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::CancellationToken;
    use rstest::{fixture, rstest};
    use std::time::Duration;
    use uia_locator_core::types::Rect;
    use uia_locator_provider_mock::{MockProvider, MockTree, NodeSpec};

    #[fixture]
    fn provider() -> MockProvider {
        MockProvider::new(MockTree::sample().expect("sample tree loads"))
    }

    #[rstest]
    fn projects_every_node_with_its_identity(provider: MockProvider) {
        let login = provider.node_by_automation_id("loginWindow").unwrap();
        let document = project_snapshot(&provider, &login, &ResolveOptions::default()).unwrap();

        let window = document.projection_root().unwrap();
        assert_eq!(document.element_name(window), Some("Window"));
        assert_eq!(document.attribute(window, "id"), Some("[42,1]"));
        assert_eq!(document.attribute(window, "ClassName"), Some("LoginForm"));
        assert_eq!(document.attribute(window, "Left"), Some("100"));
        // empty values are omitted
        assert_eq!(document.attribute(window, "HelpText"), None);

        let children: Vec<_> = document.elements(window).collect();
        let tags: Vec<_> = children.iter().filter_map(|id| document.element_name(*id)).collect();
        assert_eq!(tags, vec!["TitleBar", "Group", "Group"]);
        // document node, synthetic root, window and its 11 descendants
        assert_eq!(document.len(), 1 + 1 + 1 + 11);
    }

    #[rstest]
    fn reserved_characters_survive_the_round_trip() {
        let name = r#"Save "draft" <v2> & quit 'now'"#;
        let provider = MockProvider::new(MockTree::new(vec![
            NodeSpec::new("Window", "Main").with_child(NodeSpec::new("Button", name)),
        ]));
        let root = provider.root().unwrap();
        let document = project_snapshot(&provider, &root, &ResolveOptions::default()).unwrap();
        let xml = document.to_xml(false).unwrap();
        assert!(xml.contains("&quot;draft&quot; &lt;v2&gt; &amp; quit"));

        let button = (0..document.len()).find(|id| document.element_name(*id) == Some("Button")).unwrap();
        assert_eq!(document.attribute(button, "Name"), Some(name));
    }

    #[rstest]
    fn unreadable_tag_names_produce_an_error_document() {
        let provider = MockProvider::new(MockTree::new(vec![
            NodeSpec::new("Window", "Main").with_bounds(Rect::new(0, 0, 10, 10)),
        ]))
        .failing_reads();
        let options = ResolveOptions::new().with_attribute_timeout(Duration::ZERO);
        let root = provider.root().unwrap();
        let document = project_snapshot(&provider, &root, &options).unwrap();
        assert!(document.is_error());
        assert_eq!(document.projection_root(), None);
    }

    #[rstest]
    fn cancellation_stops_the_projection(provider: MockProvider) {
        let token = CancellationToken::new();
        token.cancel();
        let options = ResolveOptions::new().with_cancellation(token);
        let root = provider.root().unwrap();
        let err = project_snapshot(&provider, &root, &options).unwrap_err();
        assert!(err.is_cancelled());
    }
}
