use super::XPathError;
use pest::Parser;
use pest::iterators::Pair;

#[derive(pest_derive::Parser)]
#[grammar = "snapshot/xpath/xpath.pest"]
struct XPathParser;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Compare(Box<Expr>, CompareOp, Box<Expr>),
    Arithmetic(Box<Expr>, ArithmeticOp, Box<Expr>),
    Negate(Box<Expr>),
    Union(Vec<Expr>),
    Path(LocationPath),
    /// Primary expression filtered by predicates, optionally followed by
    /// further location steps.
    Filter { primary: Box<Expr>, predicates: Vec<Expr>, steps: Vec<Step> },
    Literal(String),
    Number(f64),
    Call { name: String, args: Vec<Expr> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct LocationPath {
    pub(crate) absolute: bool,
    pub(crate) steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Step {
    pub(crate) axis: Axis,
    pub(crate) test: NodeTest,
    pub(crate) predicates: Vec<Expr>,
}

impl Step {
    fn descendant_or_self() -> Self {
        Self { axis: Axis::DescendantOrSelf, test: NodeTest::Node, predicates: Vec::new() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfAxis,
    Parent,
    Ancestor,
    AncestorOrSelf,
    Attribute,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "self" => Axis::SelfAxis,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "attribute" => Axis::Attribute,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum NodeTest {
    Name(String),
    /// `*`: any node of the axis' principal kind.
    Wildcard,
    Node,
    Text,
}

pub(crate) fn parse(source: &str) -> Result<Expr, XPathError> {
    let mut pairs = XPathParser::parse(Rule::xpath, source)
        .map_err(|err| XPathError::Syntax(err.to_string()))?;
    let xpath = pairs.next().ok_or_else(|| unsupported("empty expression"))?;
    let expr = xpath.into_inner().next().ok_or_else(|| unsupported("empty expression"))?;
    build(expr)
}

fn unsupported(what: &str) -> XPathError {
    XPathError::Syntax(format!("unsupported expression: {what}"))
}

fn first_inner(pair: Pair<'_, Rule>) -> Result<Pair<'_, Rule>, XPathError> {
    let rule = pair.as_rule();
    pair.into_inner().next().ok_or_else(|| unsupported(&format!("{rule:?} without operand")))
}

fn build(pair: Pair<'_, Rule>) -> Result<Expr, XPathError> {
    match pair.as_rule() {
        Rule::expr | Rule::primary_expr => build(first_inner(pair)?),
        Rule::or_expr | Rule::and_expr => build_logical(pair),
        Rule::equality_expr | Rule::relational_expr => build_comparison(pair),
        Rule::additive_expr | Rule::multiplicative_expr => build_arithmetic(pair),
        Rule::unary_expr => {
            let mut negations = 0;
            let mut operand = None;
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::negate => negations += 1,
                    _ => operand = Some(build(inner)?),
                }
            }
            let mut expr = operand.ok_or_else(|| unsupported("negation without operand"))?;
            for _ in 0..negations {
                expr = Expr::Negate(Box::new(expr));
            }
            Ok(expr)
        }
        Rule::union_expr => {
            let mut parts = pair.into_inner().map(build).collect::<Result<Vec<_>, _>>()?;
            if parts.len() == 1 {
                parts.pop().ok_or_else(|| unsupported("empty union"))
            } else {
                Ok(Expr::Union(parts))
            }
        }
        Rule::path_expr => build(first_inner(pair)?),
        Rule::filter_path => build_filter(pair),
        Rule::location_path => {
            let inner = first_inner(pair)?;
            match inner.as_rule() {
                Rule::absolute_path => build_absolute(inner),
                _ => Ok(Expr::Path(LocationPath { absolute: false, steps: build_steps(inner)? })),
            }
        }
        Rule::literal => Ok(Expr::Literal(
            pair.into_inner().next().map(|inner| inner.as_str().to_owned()).unwrap_or_default(),
        )),
        Rule::number => pair
            .as_str()
            .parse::<f64>()
            .map(Expr::Number)
            .map_err(|err| XPathError::Syntax(format!("invalid number `{}`: {err}", pair.as_str()))),
        Rule::function_call => {
            let mut inner = pair.into_inner();
            let name = inner.next().ok_or_else(|| unsupported("call without name"))?.as_str().to_owned();
            let args = inner.map(build).collect::<Result<Vec<_>, _>>()?;
            Ok(Expr::Call { name, args })
        }
        rule => Err(unsupported(&format!("{rule:?}"))),
    }
}

fn build_logical(pair: Pair<'_, Rule>) -> Result<Expr, XPathError> {
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();
    let mut expr = build(inner.next().ok_or_else(|| unsupported("empty logical expression"))?)?;
    while let Some(op) = inner.next() {
        let right = build(inner.next().ok_or_else(|| unsupported(&format!("`{}` without operand", op.as_str())))?)?;
        expr = if rule == Rule::or_expr {
            Expr::Or(Box::new(expr), Box::new(right))
        } else {
            Expr::And(Box::new(expr), Box::new(right))
        };
    }
    Ok(expr)
}

fn build_comparison(pair: Pair<'_, Rule>) -> Result<Expr, XPathError> {
    let mut inner = pair.into_inner();
    let mut expr = build(inner.next().ok_or_else(|| unsupported("empty comparison"))?)?;
    while let Some(op) = inner.next() {
        let op = match op.as_str() {
            "=" => CompareOp::Eq,
            "!=" => CompareOp::Ne,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Le,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Ge,
            other => return Err(unsupported(other)),
        };
        let right = build(inner.next().ok_or_else(|| unsupported("comparison without operand"))?)?;
        expr = Expr::Compare(Box::new(expr), op, Box::new(right));
    }
    Ok(expr)
}

fn build_arithmetic(pair: Pair<'_, Rule>) -> Result<Expr, XPathError> {
    let mut inner = pair.into_inner();
    let mut expr = build(inner.next().ok_or_else(|| unsupported("empty arithmetic expression"))?)?;
    while let Some(op) = inner.next() {
        let op = match op.as_str() {
            "+" => ArithmeticOp::Add,
            "-" => ArithmeticOp::Sub,
            "*" => ArithmeticOp::Mul,
            "div" => ArithmeticOp::Div,
            "mod" => ArithmeticOp::Mod,
            other => return Err(unsupported(other)),
        };
        let right = build(inner.next().ok_or_else(|| unsupported("operator without operand"))?)?;
        expr = Expr::Arithmetic(Box::new(expr), op, Box::new(right));
    }
    Ok(expr)
}

fn build_filter(pair: Pair<'_, Rule>) -> Result<Expr, XPathError> {
    let mut inner = pair.into_inner();
    let filter = inner.next().ok_or_else(|| unsupported("empty filter expression"))?;
    let mut parts = filter.into_inner();
    let primary = build(parts.next().ok_or_else(|| unsupported("filter without primary"))?)?;
    let predicates = parts.map(build_predicate).collect::<Result<Vec<_>, _>>()?;

    let mut steps = Vec::new();
    if let Some(separator) = inner.next() {
        if is_descendant_separator(&separator) {
            steps.push(Step::descendant_or_self());
        }
        let relative = inner.next().ok_or_else(|| unsupported("separator without step"))?;
        steps.extend(build_steps(relative)?);
    }

    if predicates.is_empty() && steps.is_empty() {
        return Ok(primary);
    }
    Ok(Expr::Filter { primary: Box::new(primary), predicates, steps })
}

fn build_absolute(pair: Pair<'_, Rule>) -> Result<Expr, XPathError> {
    let mut inner = pair.into_inner();
    let mut steps = Vec::new();
    if let Some(anchor) = inner.next()
        && anchor.as_rule() == Rule::descendant_root
    {
        steps.push(Step::descendant_or_self());
    }
    if let Some(relative) = inner.next() {
        steps.extend(build_steps(relative)?);
    }
    Ok(Expr::Path(LocationPath { absolute: true, steps }))
}

fn is_descendant_separator(separator: &Pair<'_, Rule>) -> bool {
    separator.clone().into_inner().next().is_some_and(|kind| kind.as_rule() == Rule::descendant_sep)
}

fn build_steps(relative: Pair<'_, Rule>) -> Result<Vec<Step>, XPathError> {
    let mut steps = Vec::new();
    for part in relative.into_inner() {
        match part.as_rule() {
            Rule::path_sep => {
                if is_descendant_separator(&part) {
                    steps.push(Step::descendant_or_self());
                }
            }
            Rule::step => steps.push(build_step(part)?),
            rule => return Err(unsupported(&format!("{rule:?} in location path"))),
        }
    }
    Ok(steps)
}

fn build_step(pair: Pair<'_, Rule>) -> Result<Step, XPathError> {
    let inner = first_inner(pair)?;
    match inner.as_rule() {
        Rule::parent_step => {
            Ok(Step { axis: Axis::Parent, test: NodeTest::Node, predicates: Vec::new() })
        }
        Rule::self_step => {
            Ok(Step { axis: Axis::SelfAxis, test: NodeTest::Node, predicates: Vec::new() })
        }
        Rule::axis_step => {
            let mut axis = Axis::Child;
            let mut test = None;
            let mut predicates = Vec::new();
            for part in inner.into_inner() {
                match part.as_rule() {
                    Rule::axis => axis = build_axis(part)?,
                    Rule::node_test => test = Some(build_node_test(part)?),
                    Rule::predicate => predicates.push(build_predicate(part)?),
                    rule => return Err(unsupported(&format!("{rule:?} in step"))),
                }
            }
            let test = test.ok_or_else(|| unsupported("step without node test"))?;
            Ok(Step { axis, test, predicates })
        }
        rule => Err(unsupported(&format!("{rule:?} as step"))),
    }
}

fn build_axis(pair: Pair<'_, Rule>) -> Result<Axis, XPathError> {
    let inner = first_inner(pair)?;
    match inner.as_rule() {
        Rule::attribute_abbrev => Ok(Axis::Attribute),
        _ => Axis::from_name(inner.as_str()).ok_or_else(|| unsupported(inner.as_str())),
    }
}

fn build_node_test(pair: Pair<'_, Rule>) -> Result<NodeTest, XPathError> {
    let inner = first_inner(pair)?;
    match inner.as_rule() {
        Rule::wildcard => Ok(NodeTest::Wildcard),
        Rule::name_test => Ok(NodeTest::Name(inner.as_str().to_owned())),
        Rule::node_type_test => match first_inner(inner)?.as_str() {
            "node" => Ok(NodeTest::Node),
            _ => Ok(NodeTest::Text),
        },
        rule => Err(unsupported(&format!("{rule:?} as node test"))),
    }
}

fn build_predicate(pair: Pair<'_, Rule>) -> Result<Expr, XPathError> {
    build(first_inner(pair)?)
}
