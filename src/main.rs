//! JIT Trace Studio CLI
//!
//! Reconstructs JIT compilation lifecycles from HotSpot LogCompilation logs
//! and writes them out as a JSON report.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use jit_trace_studio::commands::{
    display_schema, display_version, execute_parse, validate_args, validate_report_file, ParseArgs,
};

/// JIT Trace Studio - HotSpot compilation log analysis
#[derive(Parser, Debug)]
#[command(name = "jit-trace")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a LogCompilation log
    Parse {
        /// Log file written with -XX:+LogCompilation
        #[arg(short, long, env = "JIT_TRACE_LOG")]
        log: PathBuf,

        /// Output path for JSON report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Extra classpath entry, searched before entries found in the log
        #[arg(short, long)]
        classpath: Vec<PathBuf>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Parse {
            log,
            output,
            classpath,
            summary,
        } => {
            let args = ParseArgs {
                log_path: log,
                output_json: output,
                classpath,
                print_summary: summary,
            };

            validate_args(&args)?;
            execute_parse(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
