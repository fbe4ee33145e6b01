//! Snapshot indirection: project a live subtree into an XML document, query
//! it with standard XPath and map the match back by runtime identity.

mod document;
mod projector;
mod resolver;
pub mod xpath;

pub use document::{ERROR_ELEMENT, ROOT_ELEMENT, SnapshotDocument, SnapshotParseError};
pub use projector::project_snapshot;
pub use resolver::resolve_in_snapshot;
