use std::path::PathBuf;

/// Arguments for the parse command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone, Default)]
pub struct ParseArgs {
    /// LogCompilation log to parse
    pub log_path: PathBuf,

    /// Output path for the JSON report (optional)
    pub output_json: Option<PathBuf>,

    /// Classpath entries that take precedence over ones found in the log
    pub classpath: Vec<PathBuf>,

    /// Print text summary to stdout
    pub print_summary: bool,
}
