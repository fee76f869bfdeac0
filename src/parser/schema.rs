//! Output JSON schema definitions for parse reports.
//!
//! This module defines the structure of JSON files we write to disk.
//! Schema is versioned to allow future evolution.

use crate::aggregator::{CodeCacheSample, FatalReport, JitEvent, JitStats, LifecycleStage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level report structure written to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JitReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Log file that was parsed
    pub source: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_release: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_command: Option<String>,

    /// Log produced by an experimental VM variant
    pub experimental_vm: bool,

    /// Parse stopped before reaching the end of the log
    pub cancelled: bool,

    pub stats: JitStats,

    /// Number of members per lifecycle stage
    pub stage_counts: BTreeMap<String, u64>,

    /// Compiled-method count per class
    pub compiled_per_class: BTreeMap<String, u32>,

    /// Timeline in file-encounter order
    pub events: Vec<JitEvent>,

    pub members: Vec<MemberSummary>,

    pub code_cache: Vec<CodeCacheSample>,

    /// Recoverable faults, in the order they were reported
    pub errors: Vec<ErrorLine>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<FatalReport>,

    /// Timestamp when report was generated
    pub generated_at: String,
}

/// One member as it stood at the end of the parse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSummary {
    pub signature: String,
    pub stage: LifecycleStage,
    pub queued_count: u32,
    pub task_count: u32,
    pub nmethod_count: u32,
    pub attributes: BTreeMap<String, String>,
}

/// A line the parser could not make sense of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLine {
    pub line: u64,
    pub text: String,
}
