use crate::util::{CliResult, colorize_label, colorize_name, colorize_value, node_label, quoted, resolve_node};
use anyhow::{Context, anyhow};
use clap::Args;
use std::fmt::Write;
use std::fs;
use std::path::PathBuf;
use uia_locator::snapshot::xpath::{NodeRef, Value, XPath};
use uia_locator::{ResolveOptions, SnapshotDocument, project_snapshot};
use uia_locator_core::provider::AccessibilityTreeProvider;
use uia_locator_provider_mock::MockProvider;

#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    #[arg(
        long = "root",
        value_name = "LOCATOR",
        help = "Locator of the node to project. Default: the session root."
    )]
    pub root: Option<String>,

    #[arg(
        long = "query",
        value_name = "XPATH",
        help = "Evaluate an XPath expression against the snapshot and print its result."
    )]
    pub query: Option<String>,

    #[arg(long = "output", value_name = "FILE", conflicts_with = "query", help = "Write the XML to FILE.")]
    pub output: Option<PathBuf>,

    #[arg(long = "pretty", help = "Pretty print (indentation and newlines).")]
    pub pretty: bool,
}

pub fn run(provider: &MockProvider, options: &ResolveOptions, args: &SnapshotArgs) -> CliResult<String> {
    let root = match args.root.as_deref() {
        Some(locator) => resolve_node(provider, locator, None, options)?,
        None => provider.root()?,
    };
    let document = project_snapshot(provider, &root, options)?;
    if let Some(message) = document.error_message() {
        tracing::warn!(%message, "snapshot is an error document");
    }

    if let Some(query) = &args.query {
        let xpath = XPath::compile(query)?;
        let value = xpath.evaluate(&document)?;
        return Ok(render_value(&document, &value));
    }

    let xml = document.to_xml(args.pretty).map_err(|err| anyhow!("failed to serialise snapshot: {err}"))?;
    match &args.output {
        Some(path) => {
            fs::write(path, &xml).with_context(|| format!("failed to write {}", path.display()))?;
            Ok(format!("Saved snapshot to {} ({} element(s)).", path.display(), element_count(&document)))
        }
        None => Ok(xml),
    }
}

fn element_count(document: &SnapshotDocument) -> usize {
    // the synthetic root does not count
    (0..document.len()).filter(|id| document.element_name(*id).is_some()).count().saturating_sub(1)
}

pub(crate) fn render_value(document: &SnapshotDocument, value: &Value) -> String {
    let nodes = match value {
        Value::Nodes(nodes) => nodes,
        Value::Boolean(value) => return colorize_value(&value.to_string()),
        Value::Number(value) => return colorize_value(&value.to_string()),
        Value::String(value) => return colorize_value(&quoted(value)),
    };

    let mut output = String::new();
    for node in nodes {
        match *node {
            NodeRef::Node(id) => {
                let tag = document.element_name(id).unwrap_or("#text");
                let label = node_label(tag, document.attribute(id, "Name").unwrap_or_default());
                let identity = document.attribute(id, "id").unwrap_or("-");
                let _ = writeln!(&mut output, "{} {identity}", colorize_label(&label));
            }
            NodeRef::Attribute(owner, index) => {
                let Some((key, value)) = document.attributes(owner).get(index) else {
                    continue;
                };
                let owner_label = node_label(
                    document.element_name(owner).unwrap_or_default(),
                    document.attribute(owner, "Name").unwrap_or_default(),
                );
                let name = colorize_name(&format!("@{key}"));
                let _ = writeln!(&mut output, "{name} = {} ({owner_label})", colorize_value(&quoted(value)));
            }
        }
    }
    output.trim_end().to_owned()
}
