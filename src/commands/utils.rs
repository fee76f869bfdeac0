use crate::output::read_report;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::Result;
use std::path::PathBuf;

/// Validate a report JSON file
pub fn validate_report_file(file_path: PathBuf) -> Result<()> {
    println!("Validating report: {}", file_path.display());

    let report = read_report(&file_path)?;

    if report.version != SCHEMA_VERSION {
        println!(
            "! Schema version {} differs from current {}",
            report.version, SCHEMA_VERSION
        );
    }

    println!("✓ Valid report JSON");
    println!("  Version: {}", report.version);
    println!("  Source: {}", report.source);
    println!("  Events: {}", report.events.len());
    println!("  Members: {}", report.members.len());
    println!("  Errors: {}", report.errors.len());
    if let Some(fatal) = &report.fatal {
        println!("  Fatal: {}", fatal.title);
    }

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("JIT Trace Studio Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  source: string             - Parsed log file");
        println!("  vm_release: string?        - VM release from the log header");
        println!("  vm_command: string?        - VM command line");
        println!("  experimental_vm: bool      - Log came from an experimental VM");
        println!("  cancelled: bool            - Parse was stopped early");
        println!("  stats: object              - Aggregate compiler statistics");
        println!("  stage_counts: object       - Members per lifecycle stage");
        println!("  compiled_per_class: object - Compiled methods per class");
        println!("  events: array              - QUEUE/NMETHOD_* timeline");
        println!("    stamp: number            - Seconds since VM start");
        println!("    event_type: string       - QUEUE, NMETHOD_TIER1, NMETHOD_TIER2, NMETHOD_TIER2_NATIVE");
        println!("    signature: string        - Member signature");
        println!("  members: array             - Final state of every member");
        println!("  code_cache: array          - Code cache samples");
        println!("  errors: array              - Recoverable faults (line, text)");
        println!("  fatal: object?             - Session-fatal problem (title, body)");
        println!("  generated_at: string       - ISO 8601 timestamp");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("JIT Trace Studio v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Compilation lifecycle reconstruction from HotSpot LogCompilation logs.");
}
