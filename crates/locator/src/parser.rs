//! Tokenizer and hierarchy segmenter for the locator dialect.
//!
//! Quoted literals are swapped for placeholders before any structural split,
//! so `|`, `/`, `[`, `]` and ` and ` inside attribute values never break a
//! locator apart. Placeholders are restored into the parsed predicates.

use crate::coordinates::parse_coordinates;
use crate::error::LocatorError;
use fancy_regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::trace;
use uia_locator_core::types::Point;
use uia_locator_core::ui::TreeScope;

const PARTIAL: &str = "partial";

struct Patterns {
    literal: Regex,
    root_anchor: Regex,
    root_only: Regex,
    boundary: Regex,
    segment: Regex,
    group: Regex,
    conjunction: Regex,
    clause: Regex,
    snapshot_marker: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, fancy_regex::Error> {
        Ok(Self {
            literal: Regex::new(r#"'[^']*'|"[^"]*""#)?,
            root_anchor: Regex::new(r"(?i)^\(*/(?:root|dom)(?=/|$)")?,
            root_only: Regex::new(r"(?i)^\(*/(?:root|dom)/*$")?,
            // `/` followed by a tag character and not inside a bracket group
            boundary: Regex::new(r"/(?=[\w*])(?![^\[]*\])")?,
            segment: Regex::new(
                r"^(?P<descendant>/)?\s*(?P<tag>\*|\w+)?\s*(?P<groups>(?:\[[^\[\]]*\]\s*)*)$",
            )?,
            group: Regex::new(r"\[([^\[\]]*)\]")?,
            conjunction: Regex::new(r"(?i)\s+and\s+")?,
            clause: Regex::new(r"^@\s*(?P<attribute>\w+)\s*=\s*__LIT(?P<literal>\d+)__$")?,
            snapshot_marker: Regex::new(r"(?i)/dom(?=/)")?,
        })
    }
}

static PATTERNS: LazyLock<Result<Patterns, fancy_regex::Error>> = LazyLock::new(Patterns::compile);

fn patterns(locator: &str) -> Result<&'static Patterns, LocatorError> {
    PATTERNS
        .as_ref()
        .map_err(|err| LocatorError::malformed(locator, format!("locator grammar unavailable: {err}")))
}

fn regex_failure(locator: &str, err: &fancy_regex::Error) -> LocatorError {
    LocatorError::malformed(locator, format!("pattern evaluation failed: {err}"))
}

/// A parsed locator: one or more alternation branches in priority order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Locator {
    raw: String,
    branches: Vec<Branch>,
}

impl Locator {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Branch {
    raw: String,
    kind: BranchKind,
}

impl Branch {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &BranchKind {
        &self.kind
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BranchKind {
    Coordinates { point: Point },
    Path(PathExpression),
    /// The branch could not be segmented; other branches may still resolve.
    Malformed { reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathExpression {
    pub root_anchored: bool,
    pub segments: Vec<PathSegment>,
}

/// One hop of a path. `tag` is `None` for `*`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathSegment {
    pub scope: TreeScope,
    pub tag: Option<TagTest>,
    pub predicates: Vec<Predicate>,
    /// 1-based position among the matches, as written.
    pub index: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TagTest {
    pub name: String,
    pub substring: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Predicate {
    pub attribute: String,
    pub value: String,
    pub substring: bool,
}

/// Locator split at its `/DOM` snapshot marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SnapshotLocator {
    /// Tree locator selecting the projection root; `None` projects from the
    /// session root.
    pub prefix: Option<String>,
    /// Standard XPath evaluated against the projected document.
    pub xpath: String,
}

/// Quoted literals lifted out of a locator, indexed by placeholder number.
struct Literals {
    values: Vec<String>,
}

impl Literals {
    fn protect(p: &Patterns, locator: &str) -> Result<(String, Self), LocatorError> {
        let mut protected = String::with_capacity(locator.len());
        let mut values = Vec::new();
        let mut last = 0;
        for found in p.literal.find_iter(locator) {
            let found = found.map_err(|err| regex_failure(locator, &err))?;
            protected.push_str(&locator[last..found.start()]);
            protected.push_str(&format!("__LIT{}__", values.len()));
            values.push(found.as_str().to_owned());
            last = found.end();
        }
        protected.push_str(&locator[last..]);
        Ok((protected, Self { values }))
    }

    fn restore(&self, text: &str) -> String {
        let mut restored = text.to_owned();
        for (index, value) in self.values.iter().enumerate() {
            restored = restored.replace(&format!("__LIT{index}__"), value);
        }
        restored
    }

    /// Literal value without its surrounding quotes.
    fn value(&self, index: usize) -> Option<&str> {
        let quoted = self.values.get(index)?;
        quoted.get(1..quoted.len().saturating_sub(1))
    }
}

/// Parses a tree locator into alternation branches.
///
/// Fails only when no branch remains after splitting; individual branches
/// that cannot be segmented are kept as [`BranchKind::Malformed`].
pub fn parse_locator(locator: &str) -> Result<Locator, LocatorError> {
    let p = patterns(locator)?;
    let (protected, literals) = Literals::protect(p, locator)?;

    let mut branches = Vec::new();
    for text in protected.split('|').map(str::trim).filter(|text| !text.is_empty()) {
        let raw = literals.restore(text);
        let kind = match parse_coordinates(&raw) {
            Some(point) => BranchKind::Coordinates { point },
            None => match parse_path(p, text, &literals) {
                Ok(path) => BranchKind::Path(path),
                Err(reason) => BranchKind::Malformed { reason },
            },
        };
        trace!(branch = %raw, ?kind, "parsed locator branch");
        branches.push(Branch { raw, kind });
    }

    if branches.is_empty() {
        return Err(LocatorError::malformed(locator, "locator has no branches"));
    }
    Ok(Locator { raw: locator.to_owned(), branches })
}

/// Splits `locator` at its first `/DOM/` marker, ignoring markers inside
/// quoted literals. Returns `None` for plain tree locators.
pub fn split_snapshot(locator: &str) -> Result<Option<SnapshotLocator>, LocatorError> {
    let p = patterns(locator)?;
    let (protected, literals) = Literals::protect(p, locator)?;
    let Some(marker) =
        p.snapshot_marker.find(&protected).map_err(|err| regex_failure(locator, &err))?
    else {
        return Ok(None);
    };

    let prefix = literals.restore(protected[..marker.start()].trim());
    let anchored_only =
        p.root_only.is_match(&prefix).map_err(|err| regex_failure(locator, &err))?;
    let prefix = (!prefix.is_empty() && !anchored_only).then_some(prefix);
    let xpath = literals.restore(&protected[marker.end()..]);
    Ok(Some(SnapshotLocator { prefix, xpath }))
}

fn parse_path(p: &Patterns, branch: &str, literals: &Literals) -> Result<PathExpression, String> {
    let failed = |err: fancy_regex::Error| format!("pattern evaluation failed: {err}");

    let anchor = p.root_anchor.find(branch).map_err(failed)?;
    let root_anchored = anchor.is_some();
    let body = anchor.map_or(branch, |found| &branch[found.end()..]);

    let mut segments = Vec::new();
    let mut descend_next = false;
    for piece in split_on(&p.boundary, body).map_err(failed)? {
        let descendant = std::mem::take(&mut descend_next);
        descend_next = piece.ends_with('/');
        let trimmed = piece.trim_end_matches('/');
        if trimmed.is_empty() {
            descend_next |= descendant;
            continue;
        }
        let text = if descendant { format!("/{trimmed}") } else { trimmed.to_owned() };
        segments.push(parse_segment(p, &text, literals)?);
    }

    if segments.is_empty() {
        return Err("locator has no path segments".to_owned());
    }
    Ok(PathExpression { root_anchored, segments })
}

fn parse_segment(p: &Patterns, text: &str, literals: &Literals) -> Result<PathSegment, String> {
    let failed = |err: fancy_regex::Error| format!("pattern evaluation failed: {err}");
    let restored = || literals.restore(text);

    let Some(captures) = p.segment.captures(text).map_err(failed)? else {
        return Err(format!("unrecognised segment `{}`", restored()));
    };

    let scope = if captures.name("descendant").is_some() {
        TreeScope::Descendants
    } else {
        TreeScope::Children
    };
    let tag = captures.name("tag").map(|tag| tag.as_str()).filter(|tag| *tag != "*").map(|tag| {
        let (name, substring) = strip_partial(tag);
        TagTest { name: name.to_owned(), substring }
    });

    let mut predicates = Vec::new();
    let mut index = None;
    let groups = captures.name("groups").map_or("", |groups| groups.as_str());
    for group in p.group.captures_iter(groups) {
        let group = group.map_err(failed)?;
        let content = group.get(1).map_or("", |content| content.as_str()).trim();
        if content.is_empty() {
            continue;
        }
        if let Ok(position) = content.parse::<i64>() {
            index = Some(position);
            continue;
        }
        for clause in split_on(&p.conjunction, content).map_err(failed)? {
            match parse_clause(p, clause.trim(), literals).map_err(failed)? {
                Some(predicate) => predicates.push(predicate),
                None => trace!(clause = %literals.restore(clause), "skipping unrecognised clause"),
            }
        }
    }

    if tag.is_none() && predicates.is_empty() {
        return Err(format!("segment `{}` has neither tag nor predicates", restored()));
    }
    Ok(PathSegment { scope, tag, predicates, index })
}

fn parse_clause(
    p: &Patterns,
    clause: &str,
    literals: &Literals,
) -> Result<Option<Predicate>, fancy_regex::Error> {
    let Some(captures) = p.clause.captures(clause)? else {
        return Ok(None);
    };
    let attribute = captures.name("attribute").map_or("", |m| m.as_str());
    let value = captures
        .name("literal")
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .and_then(|index| literals.value(index));
    let Some(value) = value else {
        return Ok(None);
    };
    let (attribute, substring) = strip_partial(attribute);
    Ok(Some(Predicate { attribute: attribute.to_owned(), value: value.to_owned(), substring }))
}

/// Strips a case-insensitive `partial` prefix, unless nothing would remain.
fn strip_partial(name: &str) -> (&str, bool) {
    match name.get(..PARTIAL.len()) {
        Some(head) if head.eq_ignore_ascii_case(PARTIAL) && name.len() > PARTIAL.len() => {
            (&name[PARTIAL.len()..], true)
        }
        _ => (name, false),
    }
}

fn split_on<'t>(regex: &Regex, text: &'t str) -> Result<Vec<&'t str>, fancy_regex::Error> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for found in regex.find_iter(text) {
        let found = found?;
        pieces.push(&text[last..found.start()]);
        last = found.end();
    }
    pieces.push(&text[last..]);
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn only_path(locator: &str) -> PathExpression {
        let parsed = parse_locator(locator).expect("parses");
        assert_eq!(parsed.branches().len(), 1);
        match parsed.branches()[0].kind() {
            BranchKind::Path(path) => path.clone(),
            other => panic!("expected a path, got {other:?}"),
        }
    }

    fn tag(name: &str, substring: bool) -> Option<TagTest> {
        Some(TagTest { name: name.to_owned(), substring })
    }

    fn predicate(attribute: &str, value: &str, substring: bool) -> Predicate {
        Predicate { attribute: attribute.to_owned(), value: value.to_owned(), substring }
    }

    #[rstest]
    fn child_segment_with_predicate() {
        let path = only_path("/Button[@Name='OK']");
        assert!(!path.root_anchored);
        assert_eq!(path.segments, vec![PathSegment {
            scope: TreeScope::Children,
            tag: tag("Button", false),
            predicates: vec![predicate("Name", "OK", false)],
            index: None,
        }]);
    }

    #[rstest]
    fn descendant_partial_segment_with_index() {
        let path = only_path("//partialEdit[@partialName='user'][2]");
        assert_eq!(path.segments, vec![PathSegment {
            scope: TreeScope::Descendants,
            tag: tag("Edit", true),
            predicates: vec![predicate("Name", "user", true)],
            index: Some(2),
        }]);
    }

    #[rstest]
    fn mixed_scopes_across_segments() {
        let path = only_path("/Window[@AutomationId='main']//Group/*[@Name='x']");
        let scopes: Vec<_> = path.segments.iter().map(|segment| segment.scope).collect();
        assert_eq!(scopes, vec![
            TreeScope::Children,
            TreeScope::Descendants,
            TreeScope::Children
        ]);
        assert_eq!(path.segments[2].tag, None);
    }

    #[rstest]
    #[case("/root/Window", true)]
    #[case("/ROOT//Button", true)]
    #[case("(/root/Window", true)]
    #[case("/Window", false)]
    #[case("/rooted", false)]
    fn root_anchor_is_detected(#[case] locator: &str, #[case] anchored: bool) {
        assert_eq!(only_path(locator).root_anchored, anchored);
    }

    #[rstest]
    fn literals_protect_structural_characters() {
        let path = only_path(r#"//Text[@Name='a/b[1] | c and d' and @HelpText="x/y"]"#);
        assert_eq!(path.segments.len(), 1);
        assert_eq!(path.segments[0].predicates, vec![
            predicate("Name", "a/b[1] | c and d", false),
            predicate("HelpText", "x/y", false),
        ]);
    }

    #[rstest]
    fn alternation_keeps_branch_order_and_drops_empties() {
        let parsed = parse_locator(" /Button[@Name='A'] || //cords[1,2] | ").unwrap();
        let raws: Vec<_> = parsed.branches().iter().map(Branch::raw).collect();
        assert_eq!(raws, vec!["/Button[@Name='A']", "//cords[1,2]"]);
        assert_eq!(parsed.branches()[1].kind(), &BranchKind::Coordinates {
            point: Point::new(1, 2)
        });
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("||")]
    fn no_branches_is_malformed(#[case] locator: &str) {
        assert!(parse_locator(locator).unwrap_err().is_malformed());
    }

    #[rstest]
    #[case("///[]")]
    #[case("//*")]
    #[case("/Button[@Name='OK'")]
    #[case("/root")]
    fn unsegmentable_branches_are_marked_malformed(#[case] locator: &str) {
        let parsed = parse_locator(locator).unwrap();
        assert!(matches!(parsed.branches()[0].kind(), BranchKind::Malformed { .. }));
    }

    #[rstest]
    #[case("[0]", Some(0))]
    #[case("[-3]", Some(-3))]
    #[case("[ 4 ]", Some(4))]
    #[case("", None)]
    fn index_groups_are_read_verbatim(#[case] suffix: &str, #[case] index: Option<i64>) {
        let path = only_path(&format!("//Edit{suffix}"));
        assert_eq!(path.segments[0].index, index);
    }

    #[rstest]
    fn unrecognised_clauses_are_skipped() {
        let path = only_path("//Edit[@Name='a' and Name='b' and @ClassName='c']");
        assert_eq!(path.segments[0].predicates, vec![
            predicate("Name", "a", false),
            predicate("ClassName", "c", false),
        ]);
    }

    #[rstest]
    #[case("partial", "partial", false)]
    #[case("PartialButton", "Button", true)]
    #[case("Button", "Button", false)]
    fn partial_prefix_is_stripped(#[case] input: &str, #[case] name: &str, #[case] substring: bool) {
        assert_eq!(strip_partial(input), (name, substring));
    }

    #[rstest]
    #[case("/DOM//Group[@ClassName='row'][1]", None, "//Group[@ClassName='row'][1]")]
    #[case("/dom/Root/Window", None, "/Root/Window")]
    #[case("/root/DOM//Edit", None, "//Edit")]
    #[case(
        "/Window[@Name='Sign in']/DOM//Button[@Name='OK'] | //Edit",
        Some("/Window[@Name='Sign in']"),
        "//Button[@Name='OK'] | //Edit"
    )]
    fn snapshot_marker_splits_prefix_and_xpath(
        #[case] locator: &str,
        #[case] prefix: Option<&str>,
        #[case] xpath: &str,
    ) {
        let split = split_snapshot(locator).unwrap().expect("snapshot locator");
        assert_eq!(split.prefix.as_deref(), prefix);
        assert_eq!(split.xpath, xpath);
    }

    #[rstest]
    #[case("//Edit[@Name='a/dom/b']")]
    #[case("/Document/Button")]
    #[case("/dom")]
    fn plain_locators_have_no_snapshot_marker(#[case] locator: &str) {
        assert_eq!(split_snapshot(locator).unwrap(), None);
    }
}
