use super::XPathError;
use super::ast::{ArithmeticOp, Axis, CompareOp, Expr, LocationPath, NodeTest, Step};
use crate::snapshot::document::{DOCUMENT, NodeKind, SnapshotDocument};
use uia_locator_core::ui::attribute_names::SNAPSHOT_ID;
use std::cmp::Ordering;
use std::collections::HashSet;

/// A node of a snapshot document as seen by XPath: a tree node, or the n-th
/// attribute of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Node(usize),
    Attribute(usize, usize),
}

impl NodeRef {
    /// Arena indices are pre-order, and an element's attributes sort between
    /// the element and its first child.
    fn order_key(self) -> (usize, usize) {
        match self {
            NodeRef::Node(id) => (id, 0),
            NodeRef::Attribute(owner, index) => (owner, index + 1),
        }
    }

    /// The element a match belongs to: the node itself, or an attribute's
    /// owner.
    pub fn element(self) -> usize {
        match self {
            NodeRef::Node(id) | NodeRef::Attribute(id, _) => id,
        }
    }
}

impl PartialOrd for NodeRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order_key().cmp(&other.order_key())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nodes(Vec<NodeRef>),
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Clone, Copy)]
struct Context {
    node: NodeRef,
    position: usize,
    size: usize,
}

pub(crate) struct Evaluator<'d> {
    document: &'d SnapshotDocument,
}

impl<'d> Evaluator<'d> {
    pub(crate) fn new(document: &'d SnapshotDocument) -> Self {
        Self { document }
    }

    /// Evaluates `expr` with the document node as context.
    pub(crate) fn evaluate(&self, expr: &Expr) -> Result<Value, XPathError> {
        self.eval(expr, Context { node: NodeRef::Node(DOCUMENT), position: 1, size: 1 })
    }

    fn eval(&self, expr: &Expr, ctx: Context) -> Result<Value, XPathError> {
        match expr {
            Expr::Or(left, right) => Ok(Value::Boolean(
                self.boolean(&self.eval(left, ctx)?) || self.boolean(&self.eval(right, ctx)?),
            )),
            Expr::And(left, right) => Ok(Value::Boolean(
                self.boolean(&self.eval(left, ctx)?) && self.boolean(&self.eval(right, ctx)?),
            )),
            Expr::Compare(left, op, right) => {
                let left = self.eval(left, ctx)?;
                let right = self.eval(right, ctx)?;
                Ok(Value::Boolean(self.compare(&left, *op, &right)))
            }
            Expr::Arithmetic(left, op, right) => {
                let left = self.number(&self.eval(left, ctx)?);
                let right = self.number(&self.eval(right, ctx)?);
                Ok(Value::Number(match op {
                    ArithmeticOp::Add => left + right,
                    ArithmeticOp::Sub => left - right,
                    ArithmeticOp::Mul => left * right,
                    ArithmeticOp::Div => left / right,
                    ArithmeticOp::Mod => left % right,
                }))
            }
            Expr::Negate(operand) => Ok(Value::Number(-self.number(&self.eval(operand, ctx)?))),
            Expr::Union(parts) => {
                let mut nodes = Vec::new();
                for part in parts {
                    match self.eval(part, ctx)? {
                        Value::Nodes(found) => nodes.extend(found),
                        _ => return Err(XPathError::Type("union of non-node values".into())),
                    }
                }
                Ok(Value::Nodes(document_order(nodes)))
            }
            Expr::Path(path) => Ok(Value::Nodes(self.location_path(path, ctx.node)?)),
            Expr::Filter { primary, predicates, steps } => {
                let Value::Nodes(mut nodes) = self.eval(primary, ctx)? else {
                    return Err(XPathError::Type("predicates applied to a non-node value".into()));
                };
                for predicate in predicates {
                    nodes = self.filter(nodes, predicate)?;
                }
                for step in steps {
                    nodes = self.step(&nodes, step)?;
                }
                Ok(Value::Nodes(nodes))
            }
            Expr::Literal(text) => Ok(Value::String(text.clone())),
            Expr::Number(number) => Ok(Value::Number(*number)),
            Expr::Call { name, args } => self.call(name, args, ctx),
        }
    }

    fn location_path(&self, path: &LocationPath, start: NodeRef) -> Result<Vec<NodeRef>, XPathError> {
        let mut nodes = vec![if path.absolute { NodeRef::Node(DOCUMENT) } else { start }];
        for step in &path.steps {
            nodes = self.step(&nodes, step)?;
        }
        Ok(nodes)
    }

    fn step(&self, nodes: &[NodeRef], step: &Step) -> Result<Vec<NodeRef>, XPathError> {
        let mut out = Vec::new();
        for node in nodes {
            // axis order, so positions in predicates count along the axis
            let mut selected: Vec<NodeRef> = self
                .axis(*node, step.axis)
                .into_iter()
                .filter(|candidate| self.test(*candidate, step.axis, &step.test))
                .collect();
            for predicate in &step.predicates {
                selected = self.filter(selected, predicate)?;
            }
            out.extend(selected);
        }
        Ok(document_order(out))
    }

    fn filter(&self, nodes: Vec<NodeRef>, predicate: &Expr) -> Result<Vec<NodeRef>, XPathError> {
        let size = nodes.len();
        let mut kept = Vec::with_capacity(size);
        for (index, node) in nodes.into_iter().enumerate() {
            let ctx = Context { node, position: index + 1, size };
            let keep = match self.eval(predicate, ctx)? {
                #[allow(clippy::cast_precision_loss)]
                Value::Number(number) => (number - ctx.position as f64).abs() < f64::EPSILON,
                other => self.boolean(&other),
            };
            if keep {
                kept.push(node);
            }
        }
        Ok(kept)
    }

    fn axis(&self, node: NodeRef, axis: Axis) -> Vec<NodeRef> {
        let document = self.document;
        let NodeRef::Node(id) = node else {
            let owner = NodeRef::Node(node.element());
            return match axis {
                Axis::SelfAxis => vec![node],
                Axis::Parent => vec![owner],
                Axis::Ancestor | Axis::AncestorOrSelf => {
                    let mut out = if axis == Axis::AncestorOrSelf { vec![node] } else { Vec::new() };
                    out.push(owner);
                    out.extend(self.axis(owner, Axis::Ancestor));
                    out
                }
                Axis::DescendantOrSelf => vec![node],
                Axis::Following => self.following(node.element(), true),
                Axis::Preceding => self.axis(owner, Axis::Preceding),
                _ => Vec::new(),
            };
        };

        match axis {
            Axis::Child => document.children(id).iter().map(|child| NodeRef::Node(*child)).collect(),
            Axis::Descendant => self.descendants(id),
            Axis::DescendantOrSelf => {
                let mut out = vec![node];
                out.extend(self.descendants(id));
                out
            }
            Axis::SelfAxis => vec![node],
            Axis::Parent => document.parent(id).map(NodeRef::Node).into_iter().collect(),
            Axis::Ancestor | Axis::AncestorOrSelf => {
                let mut out = if axis == Axis::AncestorOrSelf { vec![node] } else { Vec::new() };
                let mut cursor = document.parent(id);
                while let Some(parent) = cursor {
                    out.push(NodeRef::Node(parent));
                    cursor = document.parent(parent);
                }
                out
            }
            Axis::Attribute => {
                (0..document.attributes(id).len()).map(|index| NodeRef::Attribute(id, index)).collect()
            }
            Axis::FollowingSibling | Axis::PrecedingSibling => {
                let Some(parent) = document.parent(id) else { return Vec::new() };
                let siblings = document.children(parent);
                let Some(position) = siblings.iter().position(|sibling| *sibling == id) else {
                    return Vec::new();
                };
                if axis == Axis::FollowingSibling {
                    siblings[position + 1..].iter().map(|sibling| NodeRef::Node(*sibling)).collect()
                } else {
                    siblings[..position].iter().rev().map(|sibling| NodeRef::Node(*sibling)).collect()
                }
            }
            Axis::Following => self.following(id, false),
            Axis::Preceding => {
                let ancestors: HashSet<NodeRef> = self.axis(node, Axis::Ancestor).into_iter().collect();
                (0..id)
                    .rev()
                    .map(NodeRef::Node)
                    .filter(|candidate| !ancestors.contains(candidate))
                    .collect()
            }
        }
    }

    /// Nodes after `id` in document order that are not its descendants.
    /// `include_descendants` is set when starting from an attribute, whose
    /// owner's children all follow it.
    fn following(&self, id: usize, include_descendants: bool) -> Vec<NodeRef> {
        // descendants occupy the arena slots right after their ancestor
        let start = if include_descendants { id + 1 } else { id + 1 + self.descendants(id).len() };
        (start..self.document.len()).map(NodeRef::Node).collect()
    }

    fn descendants(&self, id: usize) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.document.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(NodeRef::Node(next));
            stack.extend(self.document.children(next).iter().rev().copied());
        }
        out
    }

    fn test(&self, node: NodeRef, axis: Axis, test: &NodeTest) -> bool {
        let principal_attribute = axis == Axis::Attribute;
        match (node, test) {
            (_, NodeTest::Node) => true,
            (NodeRef::Attribute(..), NodeTest::Text) => false,
            (NodeRef::Attribute(..), NodeTest::Wildcard) => principal_attribute,
            (NodeRef::Attribute(owner, index), NodeTest::Name(name)) => {
                principal_attribute
                    && self.document.attributes(owner).get(index).is_some_and(|(key, _)| key == name)
            }
            (NodeRef::Node(id), test) => {
                let Some(data) = self.document.node(id) else { return false };
                match (&data.kind, test) {
                    (NodeKind::Text(_), NodeTest::Text) => true,
                    (NodeKind::Element { .. }, NodeTest::Wildcard) => !principal_attribute,
                    (NodeKind::Element { name: actual, .. }, NodeTest::Name(name)) => {
                        !principal_attribute && actual == name
                    }
                    _ => false,
                }
            }
        }
    }

    fn string_value(&self, node: NodeRef) -> String {
        match node {
            NodeRef::Node(id) => self.document.string_value(id),
            NodeRef::Attribute(owner, index) => self
                .document
                .attributes(owner)
                .get(index)
                .map(|(_, value)| value.clone())
                .unwrap_or_default(),
        }
    }

    fn node_name(&self, node: NodeRef) -> String {
        match node {
            NodeRef::Node(id) => self.document.element_name(id).unwrap_or_default().to_owned(),
            NodeRef::Attribute(owner, index) => self
                .document
                .attributes(owner)
                .get(index)
                .map(|(key, _)| key.clone())
                .unwrap_or_default(),
        }
    }

    /// `xml:lang` of the nearest element at or above `node`.
    fn language(&self, node: NodeRef) -> Option<&str> {
        let mut cursor = Some(node.element());
        while let Some(id) = cursor {
            if let Some(language) = self.document.attribute(id, "xml:lang") {
                return Some(language);
            }
            cursor = self.document.parent(id);
        }
        None
    }

    fn boolean(&self, value: &Value) -> bool {
        match value {
            Value::Nodes(nodes) => !nodes.is_empty(),
            Value::Boolean(flag) => *flag,
            Value::Number(number) => *number != 0.0 && !number.is_nan(),
            Value::String(text) => !text.is_empty(),
        }
    }

    fn number(&self, value: &Value) -> f64 {
        match value {
            Value::Boolean(flag) => f64::from(u8::from(*flag)),
            Value::Number(number) => *number,
            other => parse_number(&self.string(other)),
        }
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::Nodes(nodes) => nodes.first().map(|node| self.string_value(*node)).unwrap_or_default(),
            Value::Boolean(flag) => flag.to_string(),
            Value::Number(number) => format_number(*number),
            Value::String(text) => text.clone(),
        }
    }

    fn compare(&self, left: &Value, op: CompareOp, right: &Value) -> bool {
        match (left, right) {
            (Value::Nodes(left), Value::Nodes(right)) => left.iter().any(|l| {
                let l = Value::String(self.string_value(*l));
                right.iter().any(|r| self.compare_atomic(&l, op, &Value::String(self.string_value(*r))))
            }),
            (Value::Nodes(_), Value::Boolean(_)) | (Value::Boolean(_), Value::Nodes(_)) => {
                self.compare_atomic(&Value::Boolean(self.boolean(left)), op, &Value::Boolean(self.boolean(right)))
            }
            (Value::Nodes(nodes), atomic) => nodes
                .iter()
                .any(|node| self.compare_atomic(&Value::String(self.string_value(*node)), op, atomic)),
            (atomic, Value::Nodes(nodes)) => nodes
                .iter()
                .any(|node| self.compare_atomic(atomic, op, &Value::String(self.string_value(*node)))),
            (left, right) => self.compare_atomic(left, op, right),
        }
    }

    fn compare_atomic(&self, left: &Value, op: CompareOp, right: &Value) -> bool {
        match op {
            CompareOp::Eq | CompareOp::Ne => {
                let equal = match (left, right) {
                    (Value::Boolean(_), _) | (_, Value::Boolean(_)) => {
                        self.boolean(left) == self.boolean(right)
                    }
                    (Value::Number(_), _) | (_, Value::Number(_)) => {
                        self.number(left) == self.number(right)
                    }
                    _ => self.string(left) == self.string(right),
                };
                equal == (op == CompareOp::Eq)
            }
            CompareOp::Lt => self.number(left) < self.number(right),
            CompareOp::Le => self.number(left) <= self.number(right),
            CompareOp::Gt => self.number(left) > self.number(right),
            CompareOp::Ge => self.number(left) >= self.number(right),
        }
    }

    fn call(&self, name: &str, args: &[Expr], ctx: Context) -> Result<Value, XPathError> {
        let arity = |expected: usize| {
            if args.len() == expected {
                Ok(())
            } else {
                Err(XPathError::Arity { function: name.to_owned(), expected: expected.to_string() })
            }
        };
        let arg = |index: usize| -> Result<Value, XPathError> {
            args.get(index).map_or_else(
                || Ok(Value::Nodes(vec![ctx.node])),
                |expr| self.eval(expr, ctx),
            )
        };
        let optional_arg = |index: usize| -> Result<Value, XPathError> {
            if args.len() > 1 {
                return Err(XPathError::Arity { function: name.to_owned(), expected: "0 or 1".into() });
            }
            arg(index)
        };

        #[allow(clippy::cast_precision_loss)]
        let value = match name {
            "last" => {
                arity(0)?;
                Value::Number(ctx.size as f64)
            }
            "position" => {
                arity(0)?;
                Value::Number(ctx.position as f64)
            }
            "count" => {
                arity(1)?;
                match arg(0)? {
                    Value::Nodes(nodes) => Value::Number(nodes.len() as f64),
                    _ => return Err(XPathError::Type("count() expects a node set".into())),
                }
            }
            "not" => {
                arity(1)?;
                Value::Boolean(!self.boolean(&arg(0)?))
            }
            "true" | "false" => {
                arity(0)?;
                Value::Boolean(name == "true")
            }
            "boolean" => {
                arity(1)?;
                Value::Boolean(self.boolean(&arg(0)?))
            }
            "number" => Value::Number(self.number(&optional_arg(0)?)),
            "string" => Value::String(self.string(&optional_arg(0)?)),
            "string-length" => Value::Number(self.string(&optional_arg(0)?).chars().count() as f64),
            "normalize-space" => Value::String(
                self.string(&optional_arg(0)?).split_whitespace().collect::<Vec<_>>().join(" "),
            ),
            "name" | "local-name" => match optional_arg(0)? {
                Value::Nodes(nodes) => {
                    Value::String(nodes.first().map(|node| self.node_name(*node)).unwrap_or_default())
                }
                _ => return Err(XPathError::Type(format!("{name}() expects a node set"))),
            },
            "concat" => {
                if args.len() < 2 {
                    return Err(XPathError::Arity { function: name.to_owned(), expected: "2 or more".into() });
                }
                let mut out = String::new();
                for index in 0..args.len() {
                    out.push_str(&self.string(&arg(index)?));
                }
                Value::String(out)
            }
            "contains" | "starts-with" | "ends-with" | "substring-before" | "substring-after" => {
                arity(2)?;
                let haystack = self.string(&arg(0)?);
                let needle = self.string(&arg(1)?);
                match name {
                    "contains" => Value::Boolean(haystack.contains(&needle)),
                    "starts-with" => Value::Boolean(haystack.starts_with(&needle)),
                    "ends-with" => Value::Boolean(haystack.ends_with(&needle)),
                    "substring-before" => Value::String(
                        haystack.find(&needle).map(|at| haystack[..at].to_owned()).unwrap_or_default(),
                    ),
                    _ => Value::String(
                        haystack
                            .find(&needle)
                            .map(|at| haystack[at + needle.len()..].to_owned())
                            .unwrap_or_default(),
                    ),
                }
            }
            "translate" => {
                arity(3)?;
                let text = self.string(&arg(0)?);
                let from: Vec<char> = self.string(&arg(1)?).chars().collect();
                let to: Vec<char> = self.string(&arg(2)?).chars().collect();
                Value::String(
                    text.chars()
                        .filter_map(|ch| match from.iter().position(|candidate| *candidate == ch) {
                            Some(index) => to.get(index).copied(),
                            None => Some(ch),
                        })
                        .collect(),
                )
            }
            "substring" => {
                if !(2..=3).contains(&args.len()) {
                    return Err(XPathError::Arity { function: name.to_owned(), expected: "2 or 3".into() });
                }
                let text = self.string(&arg(0)?);
                let start = self.number(&arg(1)?);
                let length = if args.len() == 3 { Some(self.number(&arg(2)?)) } else { None };
                Value::String(substring(&text, start, length))
            }
            "sum" => {
                arity(1)?;
                match arg(0)? {
                    Value::Nodes(nodes) => {
                        Value::Number(nodes.iter().map(|node| parse_number(&self.string_value(*node))).sum())
                    }
                    _ => return Err(XPathError::Type("sum() expects a node set".into())),
                }
            }
            "floor" | "ceiling" | "round" => {
                arity(1)?;
                let number = self.number(&arg(0)?);
                Value::Number(match name {
                    "floor" => number.floor(),
                    "ceiling" => number.ceil(),
                    _ => round_half_up(number),
                })
            }
            "lang" => {
                arity(1)?;
                let wanted = self.string(&arg(0)?).to_lowercase();
                Value::Boolean(self.language(ctx.node).is_some_and(|language| {
                    let language = language.to_lowercase();
                    language == wanted
                        || language.strip_prefix(wanted.as_str()).is_some_and(|rest| rest.starts_with('-'))
                }))
            }
            "id" => {
                arity(1)?;
                let tokens: HashSet<String> = match arg(0)? {
                    Value::Nodes(nodes) => nodes
                        .iter()
                        .flat_map(|node| {
                            self.string_value(*node).split_whitespace().map(str::to_owned).collect::<Vec<_>>()
                        })
                        .collect(),
                    other => self.string(&other).split_whitespace().map(str::to_owned).collect(),
                };
                let identified = |id: &usize| {
                    self.document.attribute(*id, SNAPSHOT_ID).is_some_and(|value| tokens.contains(value))
                };
                Value::Nodes((0..self.document.len()).filter(identified).map(NodeRef::Node).collect())
            }
            "lower-case" | "upper-case" => {
                arity(1)?;
                let text = self.string(&arg(0)?);
                Value::String(if name == "lower-case" { text.to_lowercase() } else { text.to_uppercase() })
            }
            _ => return Err(XPathError::UnknownFunction(name.to_owned())),
        };
        Ok(value)
    }
}

fn document_order(mut nodes: Vec<NodeRef>) -> Vec<NodeRef> {
    nodes.sort_unstable();
    nodes.dedup();
    nodes
}

/// XPath `round`: halves go toward positive infinity.
fn round_half_up(number: f64) -> f64 {
    if number.is_finite() { (number + 0.5).floor() } else { number }
}

/// Characters at 1-based positions `p` with `round(start) <= p <
/// round(start) + round(length)`. NaN bounds select nothing.
fn substring(text: &str, start: f64, length: Option<f64>) -> String {
    let first = round_half_up(start);
    let end = length.map_or(f64::INFINITY, |length| first + round_half_up(length));
    text.chars()
        .enumerate()
        .filter(|(index, _)| {
            #[allow(clippy::cast_precision_loss)]
            let position = (index + 1) as f64;
            position >= first && position < end
        })
        .map(|(_, ch)| ch)
        .collect()
}

fn parse_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn format_number(number: f64) -> String {
    if number.is_nan() {
        "NaN".to_owned()
    } else if number.is_infinite() {
        if number > 0.0 { "Infinity".to_owned() } else { "-Infinity".to_owned() }
    } else if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{number:.0}")
    } else {
        number.to_string()
    }
}
