use crate::OutputFormat;
use crate::util::{
    CliResult, application_root, colorize_label, colorize_name, colorize_value, node_label, quoted,
};
use clap::Args;
use serde::Serialize;
use std::fmt::Write;
use uia_locator::{AttributeRow, ResolveOptions, element_attributes, read_tag_name, resolve};
use uia_locator_core::provider::AccessibilityTreeProvider;
use uia_locator_core::types::{Point, Rect};
use uia_locator_provider_mock::MockProvider;

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    #[arg(value_name = "LOCATOR")]
    pub locator: String,
    #[arg(
        long = "app-root",
        value_name = "LOCATOR",
        help = "Locator of the application root that relative locators start from."
    )]
    pub app_root: Option<String>,
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub(crate) struct ResolveSummary {
    locator: String,
    id: String,
    control_type: Option<String>,
    runtime_id: Option<String>,
    bounding_rectangle: Rect,
    clickable_point: Option<Point>,
    attributes: Vec<AttributeRow>,
}

pub fn run(provider: &MockProvider, options: &ResolveOptions, args: &ResolveArgs) -> CliResult<String> {
    let root = application_root(provider, args.app_root.as_deref(), options)?;
    let element = resolve(provider, &args.locator, root.as_ref(), options)?;

    let (control_type, runtime_id, attributes) = match element.node() {
        Some(node) => (
            Some(read_tag_name(provider, node, options)),
            provider.runtime_id(node).ok().map(|id| id.to_json()),
            element_attributes(provider, node, options),
        ),
        None => (None, None, Vec::new()),
    };
    let summary = ResolveSummary {
        locator: args.locator.clone(),
        id: element.id().to_owned(),
        control_type,
        runtime_id,
        bounding_rectangle: element.bounding_rectangle(),
        clickable_point: element.clickable_point(),
        attributes,
    };

    match args.format {
        OutputFormat::Text => Ok(render_resolve_text(&summary)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&summary)?),
    }
}

pub(crate) fn render_resolve_text(summary: &ResolveSummary) -> String {
    let mut output = String::new();
    let name = summary
        .attributes
        .iter()
        .find(|row| row.property == "Name")
        .map_or("", |row| row.value.as_str());
    let label = match &summary.control_type {
        Some(control_type) => node_label(control_type, name),
        None => "Point".to_owned(),
    };
    let _ = writeln!(&mut output, "{}", colorize_label(&label));
    let _ = writeln!(&mut output, "    id = {}", summary.id);
    if let Some(runtime_id) = &summary.runtime_id {
        let _ = writeln!(&mut output, "    runtime id = {runtime_id}");
    }
    let _ = writeln!(&mut output, "    bounds = {}", summary.bounding_rectangle);
    if let Some(point) = summary.clickable_point {
        let _ = writeln!(&mut output, "    clickable point = {point}");
    }
    for row in summary.attributes.iter().filter(|row| !row.value.is_empty()) {
        let name = colorize_name(&format!("@{}", row.property));
        let value = colorize_value(&quoted(&row.value));
        let _ = writeln!(&mut output, "    {name} = {value}");
    }
    output.trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{options, sample_provider, strip_ansi};
    use rstest::rstest;

    fn args(locator: &str, format: OutputFormat) -> ResolveArgs {
        ResolveArgs { locator: locator.into(), app_root: None, format }
    }

    #[rstest]
    fn text_lists_identity_and_attributes() {
        let output = run(&sample_provider(), &options(), &args("//Button[@Name='OK']", OutputFormat::Text)).unwrap();
        let plain = strip_ansi(&output);
        assert!(plain.starts_with("Button \"OK\""));
        assert!(plain.contains("id = okButton"));
        assert!(plain.contains("bounds = [480, 500, 580, 540]"));
        assert!(plain.contains("@AutomationId = \"okButton\""));
        assert!(!plain.contains("@HelpText"));
    }

    #[rstest]
    fn json_payload_carries_runtime_id() {
        let output = run(&sample_provider(), &options(), &args("//Edit[@Name='password']", OutputFormat::Json)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).expect("json");
        assert_eq!(json["id"], "password");
        assert_eq!(json["control_type"], "Edit");
        assert!(json["runtime_id"].as_str().is_some_and(|id| id.starts_with("[42,")));
        assert!(json["clickable_point"].is_null());
        assert!(json["attributes"].as_array().is_some_and(|rows| !rows.is_empty()));
    }

    #[rstest]
    fn coordinates_print_the_point() {
        let output = run(&sample_provider(), &options(), &args("//cords[5,6]", OutputFormat::Text)).unwrap();
        let plain = strip_ansi(&output);
        assert!(plain.starts_with("Point"));
        assert!(plain.contains("clickable point = (5, 6)"));
    }

    #[rstest]
    fn application_root_scopes_relative_locators() {
        let mut scoped = args("/MenuBar/MenuItem[2]", OutputFormat::Json);
        scoped.app_root = Some("//Window[@AutomationId='notepad']".into());
        let output = run(&sample_provider(), &options(), &scoped).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).expect("json");
        let name = json["attributes"]
            .as_array()
            .and_then(|rows| rows.iter().find(|row| row["property"] == "Name"))
            .map(|row| row["value"].clone());
        assert_eq!(name, Some(serde_json::Value::from("Edit")));
    }

    #[rstest]
    #[case("//Button[@Name='Missing']", "no element matches")]
    #[case("///[]", "malformed locator")]
    fn failures_surface_as_errors(#[case] locator: &str, #[case] message: &str) {
        let err = run(&sample_provider(), &options(), &args(locator, OutputFormat::Text)).unwrap_err();
        assert!(err.to_string().contains(message), "{err}");
    }
}
