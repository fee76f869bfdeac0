//! Parse command implementation.
//!
//! The parse command:
//! 1. Parses the log with a collecting listener
//! 2. Builds the report
//! 3. Writes the JSON report (if requested)
//! 4. Prints a text summary (if requested)

use super::models::ParseArgs;
use crate::output::{write_report, CollectingListener};
use crate::parser::{to_report, HotSpotLogParser, JitReport};
use crate::utils::config::ParserConfig;
use anyhow::{Context, Result};
use log::{info, warn};
use std::time::Instant;

/// Execute the parse command
///
/// **Public** - main entry point called from main.rs
///
/// # Errors
/// * Log file cannot be read
/// * Report file cannot be written
///
/// # Example
/// ```ignore
/// let args = ParseArgs {
///     log_path: PathBuf::from("hotspot_pid1234.log"),
///     output_json: Some(PathBuf::from("report.json")),
///     ..Default::default()
/// };
///
/// execute_parse(args)?;
/// ```
pub fn execute_parse(args: ParseArgs) -> Result<JitReport> {
    let start_time = Instant::now();

    info!("Starting parse of: {}", args.log_path.display());

    let config = ParserConfig::default().with_classpath(args.classpath.clone());
    let mut parser = HotSpotLogParser::new(config);
    let mut listener = CollectingListener::new();

    let outcome = parser
        .process_file(&args.log_path, &mut listener)
        .with_context(|| format!("Failed to parse log {}", args.log_path.display()))?;

    let report = to_report(&args.log_path.display().to_string(), &outcome, &listener);

    if let Some(fatal) = &report.fatal {
        warn!("{}", fatal.title);
    }

    if let Some(output) = &args.output_json {
        write_report(&report, output).context("Failed to write report JSON")?;
        info!("✓ Report written to: {}", output.display());
    }

    if args.print_summary {
        print_summary(&report);
    }

    info!(
        "Parse completed in {:.2}s",
        start_time.elapsed().as_secs_f64()
    );

    Ok(report)
}

/// Validate parse arguments
///
/// **Public** - can be called before execute_parse for early validation
pub fn validate_args(args: &ParseArgs) -> Result<()> {
    if args.log_path.as_os_str().is_empty() {
        anyhow::bail!("Log path cannot be empty");
    }

    if !args.log_path.is_file() {
        anyhow::bail!("Log file not found: {}", args.log_path.display());
    }

    for entry in &args.classpath {
        if !entry.exists() {
            anyhow::bail!("Classpath entry not found: {}", entry.display());
        }
    }

    if let Some(output) = &args.output_json {
        if output.is_dir() {
            anyhow::bail!("Output path is a directory: {}", output.display());
        }
    }

    Ok(())
}

fn print_summary(report: &JitReport) {
    let stats = &report.stats;

    println!("\n{}", "=".repeat(80));
    println!("COMPILATION SUMMARY");
    println!("{}", "=".repeat(80));
    println!("Log:            {}", report.source);
    if let Some(release) = &report.vm_release {
        println!("VM release:     {}", release);
    }
    println!("Members:        {}", report.members.len());
    println!("Events:         {}", report.events.len());
    println!("Compiler threads: {}", stats.compiler_threads);
    println!(
        "Nmethods:       {} (C1 {}, C2 {}, native {}, OSR {})",
        stats.total_nmethods(),
        stats.nmethods_tier1,
        stats.nmethods_tier2,
        stats.native_wrappers,
        stats.osr_compiles
    );
    println!("Tier-2 share:   {:.1}%", stats.tier2_percentage());
    println!("Native bytes:   {}", stats.native_bytes);
    if let Some(largest) = &stats.largest_nmethod {
        println!("Largest:        {} ({} bytes)", largest.signature, largest.size);
    }
    println!("Errors:         {}", report.errors.len());

    if !report.stage_counts.is_empty() {
        println!();
        for (stage, count) in &report.stage_counts {
            println!("  {:<22} {}", stage, count);
        }
    }

    if let Some(fatal) = &report.fatal {
        println!("\n!! {}\n{}", fatal.title, fatal.body);
    }
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_validate_args_missing_log() {
        let args = ParseArgs {
            log_path: PathBuf::from("/definitely/not/here.log"),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_empty_path() {
        assert!(validate_args(&ParseArgs::default()).is_err());
    }

    #[test]
    fn test_validate_args_ok() {
        let log = NamedTempFile::new().unwrap();
        let args = ParseArgs {
            log_path: log.path().to_path_buf(),
            ..Default::default()
        };
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_output_directory() {
        let log = NamedTempFile::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let args = ParseArgs {
            log_path: log.path().to_path_buf(),
            output_json: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_execute_parse_writes_report() {
        let log = NamedTempFile::new().unwrap();
        std::fs::write(
            log.path(),
            "[Loaded a.B from shared objects file]\n\
             <task_queued compile_id='1' method='a/B c ()V' stamp='0.5'/>\n",
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.json");

        let report = execute_parse(ParseArgs {
            log_path: log.path().to_path_buf(),
            output_json: Some(output.clone()),
            ..Default::default()
        })
        .unwrap();

        assert!(output.exists());
        assert_eq!(report.events.len(), 1);
        assert!(report.fatal.is_none());
    }
}
