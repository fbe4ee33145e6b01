mod attributes;
mod conditions;
mod coordinates;
mod element;
mod error;
mod options;
mod parser;
mod resolution;
mod resolver;
pub mod snapshot;

pub use attributes::{AttributeRow, element_attributes, read_attributes, read_bounding_rect, read_tag_name};
pub use conditions::{CompiledSegment, compile_segment};
pub use coordinates::parse_coordinates;
pub use element::ResolvedElement;
pub use error::LocatorError;
pub use options::{CancellationToken, DEFAULT_ATTRIBUTE_TIMEOUT, ResolveOptions};
pub use parser::{
    Branch, BranchKind, Locator, PathExpression, PathSegment, Predicate, SnapshotLocator, TagTest,
    parse_locator, split_snapshot,
};
pub use resolution::resolve;
pub use snapshot::{SnapshotDocument, project_snapshot};
