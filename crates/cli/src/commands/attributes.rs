use crate::OutputFormat;
use crate::util::{CliResult, application_root, colorize_name, colorize_value, quoted, resolve_node};
use clap::Args;
use std::fmt::Write;
use uia_locator::{AttributeRow, ResolveOptions, element_attributes};
use uia_locator_provider_mock::MockProvider;

#[derive(Args, Debug, Clone)]
pub struct AttributesArgs {
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

pub fn run(provider: &MockProvider, options: &ResolveOptions, args: &AttributesArgs) -> CliResult<String> {
    let root = application_root(provider, args.app_root.as_deref(), options)?;
    let node = resolve_node(provider, &args.locator, root.as_ref(), options)?;
    let rows = element_attributes(provider, &node, options);
    if rows.is_empty() {
        tracing::warn!(locator = %args.locator, "no attributes could be read");
    }
    match args.format {
        OutputFormat::Text => Ok(render_rows(&rows)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&rows)?),
    }
}

fn render_rows(rows: &[AttributeRow]) -> String {
    let width = rows.iter().map(|row| row.property.len()).max().unwrap_or(0);
    let mut output = String::new();
    for row in rows {
        let padded = format!("{:<width$}", row.property);
        let _ = writeln!(&mut output, "{} {}", colorize_name(&padded), colorize_value(&quoted(&row.value)));
    }
    output.trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{options, sample_provider, strip_ansi};
    use rstest::rstest;
    use std::time::Duration;

    fn args(locator: &str, format: OutputFormat) -> AttributesArgs {
        AttributesArgs { locator: locator.into(), app_root: None, format }
    }

    #[rstest]
    fn rows_are_ordered_by_property() {
        let output =
            run(&sample_provider(), &options(), &args("//Edit[@Name='password']", OutputFormat::Json)).unwrap();
        let rows: Vec<serde_json::Value> = serde_json::from_str(&output).expect("json");
        let properties: Vec<&str> = rows.iter().filter_map(|row| row["property"].as_str()).collect();
        let mut sorted = properties.clone();
        sorted.sort_unstable();
        assert_eq!(properties, sorted);
        assert!(rows.iter().any(|row| row["property"] == "IsPassword" && row["value"] == "true"));
        assert!(rows.iter().any(|row| row["property"] == "Left" && row["value"] == "270"));
    }

    #[rstest]
    fn text_aligns_names() {
        let output = run(&sample_provider(), &options(), &args("//Button[@Name='OK']", OutputFormat::Text)).unwrap();
        let plain = strip_ansi(&output);
        assert!(plain.lines().any(|line| line.starts_with("Name ") && line.ends_with("\"OK\"")));
        assert!(plain.lines().any(|line| line.starts_with("AutomationId ") && line.ends_with("\"okButton\"")));
    }

    #[rstest]
    fn coordinates_have_no_attributes() {
        let err = run(&sample_provider(), &options(), &args("//cords[1,1]", OutputFormat::Text)).unwrap_err();
        assert!(err.to_string().contains("screen point"));
    }

    #[rstest]
    fn unreadable_element_yields_no_rows() {
        let provider = sample_provider().failing_reads();
        let options = ResolveOptions::new().with_attribute_timeout(Duration::ZERO);
        let output = run(&provider, &options, &args("//Button[@Name='OK']", OutputFormat::Json)).unwrap();
        assert_eq!(output.trim(), "[]");
    }
}
