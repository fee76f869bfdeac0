//! Output sinks for parse results.
//!
//! This module handles:
//! - Listener callbacks invoked while a log is parsed
//! - JSON reports written to and read from disk

pub mod json;
pub mod listener;

// Re-export main functions
pub use json::{read_report, report_to_string, write_report};
pub use listener::{notify, CollectingListener, JitListener, LoggingListener};
