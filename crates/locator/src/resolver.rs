//! Segment-by-segment walk of the live tree.

use crate::conditions::{CompiledSegment, compile_segment};
use crate::error::LocatorError;
use crate::options::ResolveOptions;
use crate::parser::{BranchKind, Locator, PathExpression};
use tracing::{debug, trace, warn};
use uia_locator_core::provider::AccessibilityTreeProvider;
use uia_locator_core::types::Point;

/// What a tree locator selected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Target<N> {
    Node(N),
    Point(Point),
}

/// Why a single branch did not produce a node.
enum BranchFailure {
    Malformed(String),
    NotFound,
    Cancelled,
}

/// Tries every branch in order and returns the first that resolves.
///
/// The aggregate failure is `Malformed` only when no branch could be searched
/// at all.
pub(crate) fn find<P: AccessibilityTreeProvider>(
    provider: &P,
    locator: &Locator,
    application_root: Option<&P::Node>,
    options: &ResolveOptions,
) -> Result<Target<P::Node>, LocatorError> {
    let mut malformed = Vec::new();
    let mut searched = false;

    for branch in locator.branches() {
        if options.is_cancelled() {
            return Err(LocatorError::cancelled(locator.raw()));
        }
        let outcome = match branch.kind() {
            BranchKind::Coordinates { point } => {
                debug!(branch = %branch.raw(), %point, "coordinate locator");
                return Ok(Target::Point(*point));
            }
            BranchKind::Malformed { reason } => Err(BranchFailure::Malformed(reason.clone())),
            BranchKind::Path(path) => walk(provider, path, application_root, options),
        };
        match outcome {
            Ok(node) => {
                debug!(branch = %branch.raw(), "branch resolved");
                return Ok(Target::Node(node));
            }
            Err(BranchFailure::Cancelled) => return Err(LocatorError::cancelled(locator.raw())),
            Err(BranchFailure::Malformed(reason)) => {
                debug!(branch = %branch.raw(), %reason, "branch is malformed");
                malformed.push(reason);
            }
            Err(BranchFailure::NotFound) => {
                debug!(branch = %branch.raw(), "branch did not resolve");
                searched = true;
            }
        }
    }

    if searched || malformed.is_empty() {
        Err(LocatorError::not_found(locator.raw()))
    } else {
        Err(LocatorError::malformed(locator.raw(), malformed.join("; ")))
    }
}

fn walk<P: AccessibilityTreeProvider>(
    provider: &P,
    path: &PathExpression,
    application_root: Option<&P::Node>,
    options: &ResolveOptions,
) -> Result<P::Node, BranchFailure> {
    // every segment compiles before the first search
    let mut compiled = Vec::with_capacity(path.segments.len());
    for (position, segment) in path.segments.iter().enumerate() {
        match compile_segment(segment) {
            Some(segment) => compiled.push(segment),
            None => {
                return Err(BranchFailure::Malformed(format!(
                    "segment {} has no resolvable tag or attribute",
                    position + 1
                )));
            }
        }
    }

    let mut cursor = match application_root {
        Some(root) if !path.root_anchored => root.clone(),
        _ => provider.root().map_err(|err| {
            warn!(error = %err, "provider root unavailable");
            BranchFailure::NotFound
        })?,
    };

    for (position, segment) in compiled.iter().enumerate() {
        if options.is_cancelled() {
            return Err(BranchFailure::Cancelled);
        }
        let Some(next) = step(provider, &cursor, segment) else {
            trace!(segment = position + 1, "segment matched nothing");
            return Err(BranchFailure::NotFound);
        };
        cursor = next;
    }
    Ok(cursor)
}

fn step<P: AccessibilityTreeProvider>(
    provider: &P,
    cursor: &P::Node,
    segment: &CompiledSegment,
) -> Option<P::Node> {
    let condition = provider.build_condition(&segment.condition);
    let found = match segment.index {
        None => provider.find_first(cursor, segment.scope, &condition),
        Some(index) => provider.find_all(cursor, segment.scope, &condition).map(|matches| {
            let position = usize::try_from(index.max(1) - 1).unwrap_or(usize::MAX);
            trace!(index, matches = matches.len(), "selecting indexed match");
            matches.into_iter().nth(position)
        }),
    };
    found.unwrap_or_else(|err| {
        warn!(error = %err, scope = ?segment.scope, "provider search failed");
        None
    })
}
