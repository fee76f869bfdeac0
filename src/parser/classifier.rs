//! Line classification for raw HotSpot logs.
//!
//! A LogCompilation log interleaves four kinds of text on one timeline:
//! - the XML header (`<?xml ...` up to `<tty>`), which may carry free text
//! - compilation tags (`<task_queued .../>`, `<nmethod .../>`, ...)
//! - classloader trace lines (`[Loaded java.lang.Object from ...]`)
//! - raw disassembly from PrintAssembly
//!
//! `LineClassifier` routes every non-blank line into exactly one bucket
//! of a `SplitLog` (or discards it). The only state it carries between
//! lines is whether it is inside the header.

use crate::utils::config::{
    ENTITY_GT, ENTITY_LT, LOADED, MAX_SPLIT_DEPTH, NMETHOD_MARKER, TAG_TTY, TAG_XML,
};
use crate::utils::error::MarkupError;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// A single input line with its 1-based position in the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub number: u64,
    pub text: String,
}

impl LogLine {
    pub fn new(number: u64, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }
}

/// Destination of a classified line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Header,
    ClassLoader,
    Compilation,
    Assembly,
}

/// Result of classifying one physical line
///
/// A mangled line (disassembly followed by a tag on the same line) yields
/// more than one piece. An empty `pieces` means the line was discarded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub pieces: Vec<(Bucket, String)>,
    pub fault: Option<MarkupError>,
}

impl Classification {
    pub fn is_discarded(&self) -> bool {
        self.pieces.is_empty()
    }
}

/// Routes lines into buckets, carrying the header-mode flag
#[derive(Debug, Clone)]
pub struct LineClassifier {
    in_header: bool,
    max_split_depth: usize,
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new(MAX_SPLIT_DEPTH)
    }
}

impl LineClassifier {
    pub fn new(max_split_depth: usize) -> Self {
        Self {
            in_header: false,
            max_split_depth,
        }
    }

    /// Whether the classifier is currently inside the XML header
    pub fn in_header(&self) -> bool {
        self.in_header
    }

    /// Classify one raw line
    ///
    /// Blank lines are discarded. Entity escapes for `<` and `>` are decoded
    /// before any routing decision, and the stored text is the decoded form.
    pub fn classify(&mut self, raw: &str) -> Classification {
        let mut result = Classification::default();

        let decoded = decode_entities(raw);
        let trimmed = decoded.trim();

        if trimmed.is_empty() {
            return result;
        }

        // Tags, classloader and annotation lines are stored trimmed;
        // disassembly keeps its indentation
        let text = match trimmed.as_bytes()[0] {
            b'<' | b'[' | b'@' => trimmed,
            _ => decoded.as_str(),
        };

        self.route(text, 0, &mut result);
        result
    }

    fn route(&mut self, text: &str, depth: usize, out: &mut Classification) {
        if text == TAG_TTY {
            self.in_header = false;
            return;
        } else if text.starts_with(TAG_XML) {
            self.in_header = true;
        }

        if self.in_header {
            // Header XML can have text nodes so keep every line
            out.pieces.push((Bucket::Header, text.to_string()));
        } else if text.starts_with('<') {
            out.pieces.push((Bucket::Compilation, text.to_string()));
        } else if text.starts_with(LOADED) {
            out.pieces.push((Bucket::ClassLoader, text.to_string()));
        } else if text.starts_with('@') {
            // PrintCompilation-style annotations (e.g. from perf tooling)
        } else if let Some(index) = text.find(NMETHOD_MARKER) {
            debug!("detected nmethod tag mangled with assembly");
            out.pieces
                .push((Bucket::Assembly, text[..index].to_string()));
            self.split_embedded(&text[index..], depth + 1, out);
        } else {
            out.pieces.push((Bucket::Assembly, text.to_string()));
        }
    }

    /// Handle the tail of a mangled line, which starts with the nmethod marker
    fn split_embedded(&mut self, text: &str, depth: usize, out: &mut Classification) {
        if depth > self.max_split_depth {
            out.fault = Some(MarkupError::SplitDepthExceeded {
                depth: self.max_split_depth,
            });
            return;
        }

        // Another marker further along means a second tag was glued on
        let next = text
            .get(1..)
            .and_then(|rest| rest.find(NMETHOD_MARKER))
            .map(|i| i + 1);

        match next {
            Some(index) => {
                out.pieces
                    .push((Bucket::Compilation, text[..index].to_string()));
                self.split_embedded(&text[index..], depth + 1, out);
            }
            None => self.route(text, depth, out),
        }
    }
}

/// Replace `&lt;` and `&gt;` with literal angle brackets
pub fn decode_entities(line: &str) -> String {
    if !line.contains('&') {
        return line.to_string();
    }
    line.replace(ENTITY_LT, "<").replace(ENTITY_GT, ">")
}

/// Classified lines, kept in file order per bucket
#[derive(Debug, Clone, Default)]
pub struct SplitLog {
    header_lines: Vec<LogLine>,
    classloader_lines: Vec<LogLine>,
    compilation_lines: Vec<LogLine>,
    assembly_lines: Vec<LogLine>,
}

impl SplitLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bucket: Bucket, line: LogLine) {
        match bucket {
            Bucket::Header => self.header_lines.push(line),
            Bucket::ClassLoader => self.classloader_lines.push(line),
            Bucket::Compilation => self.compilation_lines.push(line),
            Bucket::Assembly => self.assembly_lines.push(line),
        }
    }

    pub fn header_lines(&self) -> &[LogLine] {
        &self.header_lines
    }

    pub fn classloader_lines(&self) -> &[LogLine] {
        &self.classloader_lines
    }

    pub fn compilation_lines(&self) -> &[LogLine] {
        &self.compilation_lines
    }

    pub fn assembly_lines(&self) -> &[LogLine] {
        &self.assembly_lines
    }

    pub fn lines(&self, bucket: Bucket) -> &[LogLine] {
        match bucket {
            Bucket::Header => &self.header_lines,
            Bucket::ClassLoader => &self.classloader_lines,
            Bucket::Compilation => &self.compilation_lines,
            Bucket::Assembly => &self.assembly_lines,
        }
    }

    pub fn total_lines(&self) -> usize {
        self.header_lines.len()
            + self.classloader_lines.len()
            + self.compilation_lines.len()
            + self.assembly_lines.len()
    }

    pub fn clear(&mut self) {
        self.header_lines.clear();
        self.classloader_lines.clear();
        self.compilation_lines.clear();
        self.assembly_lines.clear();
    }

    pub fn log_stats(&self) {
        info!("Header lines        : {}", self.header_lines.len());
        info!("ClassLoader lines   : {}", self.classloader_lines.len());
        info!("LogCompilation lines: {}", self.compilation_lines.len());
        info!("Assembly lines      : {}", self.assembly_lines.len());
    }
}
