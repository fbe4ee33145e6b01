use crate::OutputFormat;
use crate::util::{CliResult, colorize_label, colorize_name, colorize_value, quoted};
use clap::Args;
use serde::Serialize;
use std::fmt::Write;
use uia_locator::{
    BranchKind, Locator, PathSegment, SnapshotLocator, compile_segment, parse_coordinates,
    parse_locator, split_snapshot,
};
use uia_locator_core::types::Point;
use uia_locator_core::ui::TreeScope;

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    #[arg(value_name = "LOCATOR")]
    pub locator: String,
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub(crate) enum ParseSummary {
    Coordinates { point: Point },
    Tree { locator: Locator },
    Snapshot { snapshot: SnapshotLocator, prefix: Option<Locator> },
}

pub fn run(args: &ParseArgs) -> CliResult<String> {
    let summary = summarize(&args.locator)?;
    match args.format {
        OutputFormat::Text => Ok(render_parse_text(&summary)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&summary)?),
    }
}

pub(crate) fn summarize(locator: &str) -> CliResult<ParseSummary> {
    if let Some(point) = parse_coordinates(locator) {
        return Ok(ParseSummary::Coordinates { point });
    }
    if let Some(snapshot) = split_snapshot(locator)? {
        let prefix = snapshot.prefix.as_deref().map(parse_locator).transpose()?;
        return Ok(ParseSummary::Snapshot { snapshot, prefix });
    }
    Ok(ParseSummary::Tree { locator: parse_locator(locator)? })
}

pub(crate) fn render_parse_text(summary: &ParseSummary) -> String {
    let mut output = String::new();
    match summary {
        ParseSummary::Coordinates { point } => {
            let _ = writeln!(&mut output, "{} {point}", colorize_label("coordinates"));
        }
        ParseSummary::Tree { locator } => render_branches(&mut output, locator, ""),
        ParseSummary::Snapshot { snapshot, prefix } => {
            let _ = writeln!(&mut output, "{}", colorize_label("snapshot"));
            match prefix {
                Some(prefix) => {
                    let _ = writeln!(&mut output, "  projected from:");
                    render_branches(&mut output, prefix, "    ");
                }
                None => {
                    let _ = writeln!(&mut output, "  projected from: session root");
                }
            }
            let _ = writeln!(&mut output, "  xpath: {}", colorize_value(&snapshot.xpath));
        }
    }
    output.trim_end().to_owned()
}

fn render_branches(output: &mut String, locator: &Locator, indent: &str) {
    for (index, branch) in locator.branches().iter().enumerate() {
        let header = format!("branch {}", index + 1);
        let _ = writeln!(output, "{indent}{}: {}", colorize_label(&header), branch.raw());
        match branch.kind() {
            BranchKind::Coordinates { point } => {
                let _ = writeln!(output, "{indent}  coordinates {point}");
            }
            BranchKind::Malformed { reason } => {
                let _ = writeln!(output, "{indent}  malformed: {reason}");
            }
            BranchKind::Path(path) => {
                if path.root_anchored {
                    let _ = writeln!(output, "{indent}  anchored at the session root");
                }
                for (position, segment) in path.segments.iter().enumerate() {
                    let _ = writeln!(output, "{indent}  {}. {}", position + 1, describe_segment(segment));
                }
            }
        }
    }
}

fn describe_segment(segment: &PathSegment) -> String {
    let scope = match segment.scope {
        TreeScope::Children => "child",
        TreeScope::Descendants => "descendant",
    };
    let mut text = match &segment.tag {
        Some(tag) if tag.substring => format!("{scope} partial {}", tag.name),
        Some(tag) => format!("{scope} {}", tag.name),
        None => format!("{scope} *"),
    };
    for predicate in &segment.predicates {
        let operator = if predicate.substring { "~=" } else { "=" };
        let name = colorize_name(&format!("@{}", predicate.attribute));
        let _ = write!(text, " [{name} {operator} {}]", colorize_value(&quoted(&predicate.value)));
    }
    if let Some(index) = segment.index {
        let _ = write!(text, " #{index}");
    }
    if compile_segment(segment).is_none() {
        text.push_str(" (no resolvable condition)");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::strip_ansi;
    use rstest::rstest;

    fn text(locator: &str) -> String {
        let args = ParseArgs { locator: locator.into(), format: OutputFormat::Text };
        strip_ansi(&run(&args).unwrap()).into_owned()
    }

    #[rstest]
    fn tree_locator_lists_branches_and_segments() {
        let output = text("/root/Window[@Name='Sign in']//partialEdit[@partialName='user'][2] | //Button");
        assert!(output.contains("branch 1: /root/Window[@Name='Sign in']//partialEdit[@partialName='user'][2]"));
        assert!(output.contains("anchored at the session root"));
        assert!(output.contains("1. child Window [@Name = \"Sign in\"]"));
        assert!(output.contains("2. descendant partial Edit [@Name ~= \"user\"] #2"));
        assert!(output.contains("branch 2: //Button"));
    }

    #[rstest]
    fn unresolvable_segments_are_flagged() {
        let output = text("//Bogus[@Frobnicate='1']");
        assert!(output.contains("(no resolvable condition)"));
    }

    #[rstest]
    fn snapshot_locator_shows_prefix_and_xpath() {
        let output = text("//Window[@AutomationId='loginWindow']/DOM//Button[2]");
        assert!(output.starts_with("snapshot"));
        assert!(output.contains("branch 1: //Window[@AutomationId='loginWindow']"));
        assert!(output.contains("xpath: //Button[2]"));

        let output = text("/DOM//Edit");
        assert!(output.contains("projected from: session root"));
    }

    #[rstest]
    fn json_is_tagged_by_mode() {
        let args = ParseArgs { locator: "//cords[3,4]".into(), format: OutputFormat::Json };
        let json: serde_json::Value = serde_json::from_str(&run(&args).unwrap()).expect("json");
        assert_eq!(json["mode"], "coordinates");
        assert_eq!(json["point"]["x"], 3);

        let args = ParseArgs { locator: "//Button[1]".into(), format: OutputFormat::Json };
        let json: serde_json::Value = serde_json::from_str(&run(&args).unwrap()).expect("json");
        assert_eq!(json["mode"], "tree");
        assert_eq!(json["locator"]["branches"][0]["kind"]["kind"], "path");
    }

    #[rstest]
    fn locator_without_branches_is_an_error() {
        let args = ParseArgs { locator: " | ".into(), format: OutputFormat::Text };
        assert!(run(&args).is_err());
    }
}
