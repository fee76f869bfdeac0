//! Classpath discovery from `-XX:+TraceClassLoading` output.
//!
//! Lines look like `[Loaded java.lang.Object from file:/opt/jdk/rt.jar]`;
//! classes from the bootstrap loader may omit the `from` clause or name a
//! non-file source such as `shared objects file`.

use crate::utils::config::LOADED;
use log::debug;
use std::path::PathBuf;

const FROM_SPACE: &str = "from ";
const FILE_COLON: &str = "file:";

/// The class and origin named by one classloader trace line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLoadLine {
    pub class_name: String,
    pub location: Option<String>,
}

/// Parse a classloader trace line
pub fn parse_classloader_line(line: &str) -> Option<ClassLoadLine> {
    let body = line.trim().strip_prefix(LOADED)?;
    let body = body.strip_suffix(']').unwrap_or(body);

    let class_name = body.split_whitespace().next()?.to_string();

    let location = body.find(FROM_SPACE).and_then(|pos| {
        body[pos + FROM_SPACE.len()..]
            .strip_prefix(FILE_COLON)
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
    });

    Some(ClassLoadLine {
        class_name,
        location,
    })
}

/// Ordered set of class locations found in the log
#[derive(Debug, Clone, Default)]
pub struct ClasspathDiscovery {
    locations: Vec<String>,
    classes: Vec<ClassLoadRecord>,
    saw_trace: bool,
}

/// A class named by the trace, with the line it appeared on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassLoadRecord {
    pub class_name: String,
    pub line: u64,

    /// `file:` origin, when the trace names one
    pub location: Option<String>,
}

impl ClasspathDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one classloader line
    pub fn handle_line(&mut self, line_number: u64, line: &str) {
        self.saw_trace = true;

        let Some(parsed) = parse_classloader_line(line) else {
            debug!("unparseable classloader line {}: {}", line_number, line);
            return;
        };

        if let Some(location) = &parsed.location {
            if !self.locations.contains(location) {
                self.locations.push(location.clone());
            }
        }

        self.classes.push(ClassLoadRecord {
            class_name: parsed.class_name,
            line: line_number,
            location: parsed.location,
        });
    }

    /// Whether any classloader trace line was seen
    pub fn saw_trace(&self) -> bool {
        self.saw_trace
    }

    pub fn parsed_locations(&self) -> &[String] {
        &self.locations
    }

    pub fn classes(&self) -> &[ClassLoadRecord] {
        &self.classes
    }

    /// Configured entries first, then parsed entries not already present
    pub fn classpath(&self, preferred: &[PathBuf]) -> Vec<PathBuf> {
        let mut result: Vec<PathBuf> = Vec::with_capacity(preferred.len() + self.locations.len());

        for entry in preferred {
            if !result.contains(entry) {
                result.push(entry.clone());
            }
        }

        for location in &self.locations {
            let path = PathBuf::from(location);
            if !result.contains(&path) {
                result.push(path);
            }
        }

        result
    }
}
