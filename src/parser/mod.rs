//! Log parsing and schema definitions.
//!
//! This module handles:
//! - Classifying raw log lines into buckets
//! - Rebuilding the embedded tag tree line by line
//! - Discovering the classpath from the classloader trace
//! - Running whole-log parses and defining the report schema

pub mod classifier;
pub mod classpath;
pub mod hotspot_log;
pub mod schema;
pub mod tag;

// Re-export main types
pub use classifier::{decode_entities, Bucket, Classification, LineClassifier, LogLine, SplitLog};
pub use classpath::{parse_classloader_line, ClassLoadLine, ClasspathDiscovery};
pub use hotspot_log::{to_report, AssemblyMerger, CancelToken, HotSpotLogParser, ParseOutcome};
pub use schema::{ErrorLine, JitReport, MemberSummary};
pub use tag::{Tag, TagBuilder};
