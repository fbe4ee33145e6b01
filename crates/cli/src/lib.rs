mod commands;
mod util;

#[cfg(test)]
mod test_support;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use util::CliResult;

pub use commands::attributes::AttributesArgs;
pub use commands::parse::ParseArgs;
pub use commands::resolve::ResolveArgs;
pub use commands::snapshot::SnapshotArgs;

#[derive(Parser, Debug)]
#[command(name = "uia-locator", version, about = "Resolve locators against accessibility tree fixtures.")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(
        long = "tree",
        value_name = "FILE",
        global = true,
        help = "Tree fixture (XML). Default: the embedded sample tree."
    )]
    pub tree: Option<PathBuf>,

    #[arg(
        long = "attribute-timeout-ms",
        value_name = "MS",
        global = true,
        default_value_t = 5000,
        help = "Budget for retrying transient attribute reads."
    )]
    pub attribute_timeout_ms: u64,

    #[arg(long = "no-color", global = true, help = "Disable ANSI colors in text output.")]
    pub no_color: bool,

    #[arg(
        long = "log-level",
        value_enum,
        global = true,
        default_value_t = LogLevel::Warn,
        help = "Log level written to stderr when RUST_LOG is not set."
    )]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve a locator and print the element it selects.
    Resolve(ResolveArgs),
    /// Print the XML snapshot of a subtree, or query it with XPath.
    Snapshot(SnapshotArgs),
    /// Show how a locator is split into branches and segments.
    Parse(ParseArgs),
    /// Print the formatted attributes of the element a locator selects.
    Attributes(AttributesArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

pub fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.log_level);
    let output = execute(&cli)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

/// Runs the parsed command and returns what it prints.
pub fn execute(cli: &Cli) -> CliResult<String> {
    if cli.global.no_color {
        owo_colors::set_override(false);
    }

    if let Command::Parse(args) = &cli.command {
        return commands::parse::run(args);
    }

    let provider = util::load_provider(cli.global.tree.as_deref())?;
    let options = util::resolve_options(&cli.global);
    match &cli.command {
        Command::Resolve(args) => commands::resolve::run(&provider, &options, args),
        Command::Snapshot(args) => commands::snapshot::run(&provider, &options, args),
        Command::Attributes(args) => commands::attributes::run(&provider, &options, args),
        Command::Parse(args) => commands::parse::run(args),
    }
}

fn init_tracing(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));
    // a subscriber installed by an embedding process wins
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
