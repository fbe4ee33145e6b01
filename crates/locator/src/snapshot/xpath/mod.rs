//! XPath 1.0 over snapshot documents.
//!
//! Covers location paths on all axes, predicates, unions, comparisons and
//! the core string/number/boolean function library. Expressions are
//! evaluated with the document node as context.

mod ast;
mod eval;

use crate::snapshot::document::SnapshotDocument;
use thiserror::Error;

pub use eval::{NodeRef, Value};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XPathError {
    #[error("invalid XPath expression: {0}")]
    Syntax(String),
    #[error("unknown XPath function `{0}`")]
    UnknownFunction(String),
    #[error("function `{function}` expects {expected} argument(s)")]
    Arity { function: String, expected: String },
    #[error("XPath type error: {0}")]
    Type(String),
}

/// A compiled expression, reusable across documents.
#[derive(Clone, Debug)]
pub struct XPath {
    source: String,
    expr: ast::Expr,
}

impl XPath {
    pub fn compile(source: &str) -> Result<Self, XPathError> {
        let expr = ast::parse(source)?;
        Ok(Self { source: source.to_owned(), expr })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn evaluate(&self, document: &SnapshotDocument) -> Result<Value, XPathError> {
        eval::Evaluator::new(document).evaluate(&self.expr)
    }

    /// Selected nodes in document order. Fails for expressions that do not
    /// produce a node set.
    pub fn select(&self, document: &SnapshotDocument) -> Result<Vec<NodeRef>, XPathError> {
        match self.evaluate(document)? {
            Value::Nodes(nodes) => Ok(nodes),
            other => Err(XPathError::Type(format!("`{}` selects {other:?}, not nodes", self.source))),
        }
    }

    /// First selected element in document order, as `XPathSelectElement`
    /// style APIs return it. Attribute matches count as no element.
    pub fn select_element(&self, document: &SnapshotDocument) -> Result<Option<usize>, XPathError> {
        Ok(self.select(document)?.into_iter().find_map(|node| match node {
            NodeRef::Node(id) => document.element_name(id).map(|_| id),
            NodeRef::Attribute(..) => None,
        }))
    }
}
