fn main() {
    if let Err(error) = uia_locator_cli::run() {
        // run() installs the subscriber right after argument parsing
        tracing::error!(error = %format!("{error:#}"), "CLI execution failed");
        std::process::exit(1);
    }
}
