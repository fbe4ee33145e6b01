//! Read-only XML document produced by the snapshot projector.
//!
//! Nodes live in an arena in document order: the index of a node is its
//! position in a pre-order walk, which the XPath evaluator relies on for
//! ordering node sets.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::error::Error as StdError;
use thiserror::Error;

/// Name of the synthetic element wrapping a projection.
pub const ROOT_ELEMENT: &str = "Root";
/// Element carrying the parse failure message of an unusable projection.
pub const ERROR_ELEMENT: &str = "Error";

pub(crate) const DOCUMENT: usize = 0;

#[derive(Debug, Error)]
pub enum SnapshotParseError {
    #[error("malformed snapshot XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed snapshot attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("malformed escape sequence: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    #[error("snapshot ends inside element `{0}`")]
    Truncated(String),
    #[error("closing tag `{0}` has no matching opening tag")]
    Unbalanced(String),
    #[error("snapshot must contain exactly one top-level element, found {0}")]
    RootCount(usize),
    #[error("`{0}` is not a valid element name")]
    InvalidName(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Document,
    Element { name: String, attributes: Vec<(String, String)> },
    Text(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct DocumentNode {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotDocument {
    nodes: Vec<DocumentNode>,
}

impl SnapshotDocument {
    /// Parses a complete document. Text consisting only of whitespace is
    /// dropped.
    pub fn parse(xml: &str) -> Result<Self, SnapshotParseError> {
        let mut reader = Reader::from_str(xml);
        let mut document = Self::empty();
        let mut open = vec![DOCUMENT];
        // quick-xml splits text around entity references
        let mut text = String::new();

        loop {
            let parent = open.last().copied().unwrap_or(DOCUMENT);
            let event = reader.read_event()?;
            if !matches!(event, Event::Text(_) | Event::GeneralRef(_)) {
                document.push_text(parent, &mut text);
            }
            match event {
                Event::Start(start) => {
                    let id = document.push_element(parent, &start)?;
                    open.push(id);
                }
                Event::Empty(start) => {
                    document.push_element(parent, &start)?;
                }
                Event::End(end) => {
                    if open.len() <= 1 {
                        let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                        return Err(SnapshotParseError::Unbalanced(name));
                    }
                    open.pop();
                }
                Event::Text(content) => {
                    text.push_str(&unescape(&String::from_utf8_lossy(&content))?);
                }
                Event::GeneralRef(reference) => {
                    let entity = format!("&{};", String::from_utf8_lossy(&reference));
                    text.push_str(&unescape(&entity)?);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(unclosed) = open.get(1) {
            let name = document.element_name(*unclosed).unwrap_or_default().to_owned();
            return Err(SnapshotParseError::Truncated(name));
        }
        let top_level = document.elements(DOCUMENT).count();
        if top_level != 1 {
            return Err(SnapshotParseError::RootCount(top_level));
        }
        Ok(document)
    }

    /// `<Root><Error>message</Error></Root>`, standing in for a projection
    /// that could not be parsed.
    pub fn error(message: impl Into<String>) -> Self {
        let mut document = Self::empty();
        let root = document.push(DOCUMENT, element(ROOT_ELEMENT));
        let error = document.push(root, element(ERROR_ELEMENT));
        document.push(error, NodeKind::Text(message.into()));
        document
    }

    fn empty() -> Self {
        Self {
            nodes: vec![DocumentNode { kind: NodeKind::Document, parent: None, children: Vec::new() }],
        }
    }

    fn push(&mut self, parent: usize, kind: NodeKind) -> usize {
        let id = self.nodes.len();
        self.nodes.push(DocumentNode { kind, parent: Some(parent), children: Vec::new() });
        self.nodes[parent].children.push(id);
        id
    }

    /// Flushes pending text under `parent`, dropping whitespace-only runs.
    fn push_text(&mut self, parent: usize, text: &mut String) {
        let value = std::mem::take(text);
        if !value.trim().is_empty() {
            self.push(parent, NodeKind::Text(value));
        }
    }

    fn push_element(&mut self, parent: usize, start: &BytesStart<'_>) -> Result<usize, SnapshotParseError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        if !is_element_name(&name) {
            return Err(SnapshotParseError::InvalidName(name));
        }
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attribute.value);
            attributes.push((key, unescape(&raw)?.into_owned()));
        }
        Ok(self.push(parent, NodeKind::Element { name, attributes }))
    }

    pub(crate) fn node(&self, id: usize) -> Option<&DocumentNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// The top-level element; [`ROOT_ELEMENT`] for projected documents.
    pub fn document_element(&self) -> Option<usize> {
        self.elements(DOCUMENT).next()
    }

    /// The projection root, i.e. the single element below the synthetic root.
    pub fn projection_root(&self) -> Option<usize> {
        let root = self.document_element()?;
        if self.element_name(root) != Some(ROOT_ELEMENT) {
            return None;
        }
        self.elements(root).find(|child| self.element_name(*child) != Some(ERROR_ELEMENT))
    }

    /// The failure message when this is an error document.
    pub fn error_message(&self) -> Option<String> {
        let root = self.document_element()?;
        let error = self.elements(root).find(|child| self.element_name(*child) == Some(ERROR_ELEMENT))?;
        Some(self.string_value(error))
    }

    pub fn is_error(&self) -> bool {
        self.error_message().is_some()
    }

    pub fn element_name(&self, id: usize) -> Option<&str> {
        match &self.node(id)?.kind {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self, id: usize) -> &[(String, String)] {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    pub fn attribute(&self, id: usize, name: &str) -> Option<&str> {
        self.attributes(id).iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn parent(&self, id: usize) -> Option<usize> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: usize) -> &[usize] {
        self.node(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Child elements of `id`, skipping text.
    pub fn elements(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.children(id).iter().copied().filter(|child| self.element_name(*child).is_some())
    }

    /// Concatenated text of `id` and its descendants.
    pub fn string_value(&self, id: usize) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: usize, out: &mut String) {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(_) => {
                for child in self.children(id) {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    /// Serialises the document back to XML.
    pub fn to_xml(&self, pretty: bool) -> Result<String, Box<dyn StdError + Send + Sync>> {
        let mut writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        for child in self.children(DOCUMENT) {
            self.write_node(&mut writer, *child)?;
        }
        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_node(
        &self,
        writer: &mut Writer<Vec<u8>>,
        id: usize,
    ) -> Result<(), Box<dyn StdError + Send + Sync>> {
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Element { name, attributes }) => {
                let mut start = BytesStart::new(name.as_str());
                for (key, value) in attributes {
                    start.push_attribute((key.as_str(), value.as_str()));
                }
                if self.children(id).is_empty() {
                    writer.write_event(Event::Empty(start))?;
                } else {
                    writer.write_event(Event::Start(start))?;
                    for child in self.children(id) {
                        self.write_node(writer, *child)?;
                    }
                    writer.write_event(Event::End(BytesEnd::new(name.as_str())))?;
                }
            }
            Some(NodeKind::Text(text)) => {
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }
            Some(NodeKind::Document) | None => {}
        }
        Ok(())
    }
}

fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':'))
}

fn element(name: &str) -> NodeKind {
    NodeKind::Element { name: name.to_owned(), attributes: Vec::new() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_nested_elements_in_document_order() {
        let document = SnapshotDocument::parse(
            r#"<Root><Window Name="Main" id="[1]"><Button Name="OK"/>
               <Edit Name="a &amp; b &lt;c&gt; &quot;d&quot;"/></Window></Root>"#,
        )
        .unwrap();
        let root = document.document_element().unwrap();
        assert_eq!(document.element_name(root), Some(ROOT_ELEMENT));
        let window = document.projection_root().unwrap();
        assert_eq!(document.attribute(window, "id"), Some("[1]"));
        let children: Vec<_> = document.elements(window).collect();
        assert_eq!(children.len(), 2);
        assert!(children[0] < children[1]);
        assert_eq!(document.attribute(children[1], "Name"), Some(r#"a & b <c> "d""#));
        assert!(!document.is_error());
    }

    #[rstest]
    #[case("<Root><Window></Root>")]
    #[case("<Root><Window>")]
    #[case("<Root/><Other/>")]
    #[case("</Root>")]
    #[case(r#"<Root><Button Name="a & b"/></Root>"#)]
    #[case("")]
    #[case(r#"<Root>< id="[1]"></></Root>"#)]
    fn malformed_documents_fail(#[case] xml: &str) {
        assert!(SnapshotDocument::parse(xml).is_err());
    }

    #[rstest]
    #[case("<Root><Error>a &amp; b</Error></Root>", "a & b")]
    #[case("<Root><Error>&lt;x&gt; &#65;&#x42;</Error></Root>", "<x> AB")]
    #[case("<Root><Error>&quot;quoted&apos;</Error></Root>", "\"quoted'")]
    fn text_keeps_entity_references(#[case] xml: &str, #[case] expected: &str) {
        let document = SnapshotDocument::parse(xml).unwrap();
        assert_eq!(document.error_message().as_deref(), Some(expected));
    }

    #[rstest]
    fn unknown_entities_are_rejected() {
        assert!(SnapshotDocument::parse("<Root><Error>&bogus;</Error></Root>").is_err());
    }

    #[rstest]
    fn error_document_carries_message() {
        let document = SnapshotDocument::error("unexpected end of input");
        assert!(document.is_error());
        assert_eq!(document.error_message().as_deref(), Some("unexpected end of input"));
        assert_eq!(document.projection_root(), None);
    }

    #[rstest]
    fn serialisation_escapes_reserved_characters() {
        let document =
            SnapshotDocument::parse(r#"<Root><Text Name="&lt;x&gt; &amp; &quot;y&quot;"/></Root>"#).unwrap();
        let xml = document.to_xml(false).unwrap();
        assert!(xml.contains("&lt;x&gt; &amp; &quot;y&quot;"));
        assert_eq!(SnapshotDocument::parse(&xml).unwrap(), document);
    }
}
