use crate::GlobalArgs;
use anyhow::{Context, bail};
use owo_colors::{OwoColorize, Stream};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use uia_locator::{ResolveOptions, resolve};
use uia_locator_provider_mock::{MockNodeId, MockProvider, MockTree};

pub type CliResult<T> = anyhow::Result<T>;

pub fn load_provider(path: Option<&Path>) -> CliResult<MockProvider> {
    let tree = match path {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read tree fixture {}", path.display()))?;
            MockTree::from_xml(&xml)
                .with_context(|| format!("invalid tree fixture {}", path.display()))?
        }
        None => MockTree::sample().context("embedded sample tree is invalid")?,
    };
    debug!(nodes = tree.len(), "tree loaded");
    Ok(MockProvider::new(tree))
}

pub fn resolve_options(global: &GlobalArgs) -> ResolveOptions {
    ResolveOptions::new().with_attribute_timeout(Duration::from_millis(global.attribute_timeout_ms))
}

/// Resolves a locator that has to select a tree node, not a screen point.
pub fn resolve_node(
    provider: &MockProvider,
    locator: &str,
    application_root: Option<&MockNodeId>,
    options: &ResolveOptions,
) -> CliResult<MockNodeId> {
    let element = resolve(provider, locator, application_root, options)?;
    match element.into_node() {
        Some(node) => Ok(node),
        None => bail!("locator `{locator}` selects a screen point, not an element"),
    }
}

/// The application root named by `--app-root`, if any.
pub fn application_root(
    provider: &MockProvider,
    locator: Option<&str>,
    options: &ResolveOptions,
) -> CliResult<Option<MockNodeId>> {
    locator
        .map(|locator| {
            resolve_node(provider, locator, None, options)
                .with_context(|| format!("application root `{locator}` could not be resolved"))
        })
        .transpose()
}

pub fn node_label(control_type: &str, name: &str) -> String {
    if name.is_empty() { control_type.to_owned() } else { format!("{control_type} \"{name}\"") }
}

pub fn colorize_label(label: &str) -> String {
    label
        .if_supports_color(Stream::Stdout, |text| text.bold().fg_rgb::<79, 166, 255>().to_string())
        .to_string()
}

pub fn colorize_name(name: &str) -> String {
    name.if_supports_color(Stream::Stdout, |text| text.bold().fg_rgb::<241, 149, 255>().to_string())
        .to_string()
}

pub fn colorize_value(value: &str) -> String {
    value.if_supports_color(Stream::Stdout, |text| text.fg_rgb::<136, 192, 74>().to_string()).to_string()
}

/// Quotes a string value the way JSON would.
pub fn quoted(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.replace('"', "\\\"")))
}
