use crate::coordinates::parse_coordinates;
use crate::element::ResolvedElement;
use crate::error::LocatorError;
use crate::options::ResolveOptions;
use crate::parser::{parse_locator, split_snapshot};
use crate::resolver::{Target, find};
use crate::snapshot::{project_snapshot, resolve_in_snapshot};
use tracing::{debug, warn};
use uia_locator_core::provider::AccessibilityTreeProvider;

/// Resolves `locator` against the tree exposed by `provider`.
///
/// Coordinate locators short-circuit every search. Locators carrying a
/// `/DOM` marker go through a snapshot of the subtree the prefix selects (or
/// of the session root). Everything else is walked branch by branch, relative
/// to `application_root` unless a branch is anchored at `/root` or `/dom`.
pub fn resolve<P: AccessibilityTreeProvider>(
    provider: &P,
    locator: &str,
    application_root: Option<&P::Node>,
    options: &ResolveOptions,
) -> Result<ResolvedElement<P::Node>, LocatorError> {
    if let Some(point) = parse_coordinates(locator) {
        debug!(%point, "coordinate locator");
        return Ok(ResolvedElement::at_point(point));
    }
    if options.is_cancelled() {
        return Err(LocatorError::cancelled(locator));
    }

    if let Some(snapshot) = split_snapshot(locator)? {
        let anchor = match snapshot.prefix.as_deref() {
            Some(prefix) => snapshot_anchor(provider, locator, prefix, application_root, options)?,
            None => provider.root().map_err(|err| {
                warn!(error = %err, "provider root unavailable");
                LocatorError::not_found(locator)
            })?,
        };
        let document = project_snapshot(provider, &anchor, options).map_err(|err| match err {
            LocatorError::Cancelled { .. } => LocatorError::cancelled(locator),
            other => other,
        })?;
        let node = resolve_in_snapshot(provider, &anchor, &document, &snapshot.xpath)
            .map_err(|_| LocatorError::not_found(locator))?;
        return Ok(ResolvedElement::from_node(provider, node, options));
    }

    let parsed = parse_locator(locator)?;
    match find(provider, &parsed, application_root, options)? {
        Target::Node(node) => Ok(ResolvedElement::from_node(provider, node, options)),
        Target::Point(point) => Ok(ResolvedElement::at_point(point)),
    }
}

/// Node a snapshot is projected from when the locator has a prefix.
fn snapshot_anchor<P: AccessibilityTreeProvider>(
    provider: &P,
    locator: &str,
    prefix: &str,
    application_root: Option<&P::Node>,
    options: &ResolveOptions,
) -> Result<P::Node, LocatorError> {
    let parsed = parse_locator(prefix)?;
    match find(provider, &parsed, application_root, options)? {
        Target::Node(node) => Ok(node),
        Target::Point(point) => {
            debug!(%point, "coordinate prefix cannot anchor a snapshot");
            Err(LocatorError::not_found(locator))
        }
    }
}
