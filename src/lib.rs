//! JIT Trace Studio
//!
//! Reconstruction of JIT compilation lifecycles from HotSpot
//! `-XX:+LogCompilation` logs.
//!
//! This crate provides the core implementation for the
//! `jit-trace` CLI tool.
//!
//! ## Getting Started
//!
//! ```bash
//! java -XX:+UnlockDiagnosticVMOptions -XX:+LogCompilation -XX:+TraceClassLoading Main
//! jit-trace parse --log hotspot_pid1234.log --output report.json --summary
//! ```
//!
//! As a library, drive a [`parser::HotSpotLogParser`] with any
//! [`output::JitListener`]:
//!
//! ```ignore
//! let mut parser = HotSpotLogParser::new(ParserConfig::default());
//! let mut listener = CollectingListener::new();
//! let outcome = parser.process_file("hotspot.log", &mut listener)?;
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod resolver;
pub mod utils;
