//! Configuration and constants for the log parser.

use std::path::PathBuf;

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

// Markup entity escapes HotSpot uses inside tty output
pub const ENTITY_LT: &str = "&lt;";
pub const ENTITY_GT: &str = "&gt;";

/// Line that ends the XML header section of the log
pub const TAG_TTY: &str = "<tty>";

/// Prefix of the XML declaration that starts the header section
pub const TAG_XML: &str = "<?xml";

/// Prefix of a -XX:+TraceClassLoading line
pub const LOADED: &str = "[Loaded ";

/// Marker found mid-line when an nmethod tag lands on a disassembly line
pub const NMETHOD_MARKER: &str = "<nmethod";

/// Recursion cap for splitting mangled assembly/tag lines
pub const MAX_SPLIT_DEPTH: usize = 16;

// Tag names
pub const TAG_VM_VERSION: &str = "vm_version";
pub const TAG_RELEASE: &str = "release";
pub const TAG_TWEAK_VM: &str = "tweak_vm";
pub const TAG_VM_ARGUMENTS: &str = "vm_arguments";
pub const TAG_COMMAND: &str = "command";
pub const TAG_START_COMPILE_THREAD: &str = "start_compile_thread";
pub const TAG_TASK_QUEUED: &str = "task_queued";
pub const TAG_NMETHOD: &str = "nmethod";
pub const TAG_TASK: &str = "task";
pub const TAG_TASK_DONE: &str = "task_done";
pub const TAG_CODE_CACHE: &str = "code_cache";

// Attribute names
pub const ATTR_NAME: &str = "name";
pub const ATTR_METHOD: &str = "method";
pub const ATTR_STAMP: &str = "stamp";
pub const ATTR_COMPILER: &str = "compiler";
pub const ATTR_TIER: &str = "tier";
pub const ATTR_COMPILE_ID: &str = "compile_id";
pub const ATTR_COMPILE_KIND: &str = "compile_kind";
pub const ATTR_NMSIZE: &str = "nmsize";
pub const ATTR_SIZE: &str = "size";

/// compile_kind value of a tier-2 generated native wrapper
pub const COMPILE_KIND_NATIVE: &str = "c2n";

/// compile_kind value of an on-stack-replacement compile
pub const COMPILE_KIND_OSR: &str = "osr";

// Compiler thread name prefixes (different VM builds use different names)
pub const TIER1_THREAD_PREFIXES: &[&str] = &["C1", "Tier1"];
pub const TIER2_THREAD_PREFIXES: &[&str] = &["C2", "Tier2"];

// Direct tier literals accepted on nmethod tags
pub const TIER1_LITERALS: &[&str] = &["C1", "c1", "1"];
pub const TIER2_LITERALS: &[&str] = &["C2", "c2", "2"];

/// Header lines that are never fed to the tag builder
pub const SKIP_HEADER_TAGS: &[&str] = &["<?xml", "<hotspot_log "];

/// Compilation lines that are never fed to the tag builder
pub const SKIP_BODY_TAGS: &[&str] = &[
    "<hotspot_log_done",
    "<tty_done",
    "<destroy_vm",
    "</hotspot_log",
    "<compilation_log",
    "</compilation_log",
    "<writer",
    "</tty",
];

/// Highest class-file major version the class model accepts (Java 21)
pub const MAX_CLASS_FILE_MAJOR: u16 = 65;

pub const FATAL_MISSING_CLASSLOADING_TITLE: &str = "Missing VM Switch -XX:+TraceClassLoading";
pub const FATAL_MISSING_CLASSLOADING_BODY: &str = "A class-loading trace is required to resolve compiled members.\nPlease recreate your log file with -XX:+TraceClassLoading enabled.";

/// Settings consumed by a parse session
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Classpath entries that take precedence over ones parsed from the log
    pub preferred_classpath: Vec<PathBuf>,

    /// Recursion cap for mangled-line splitting
    pub max_split_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            preferred_classpath: Vec::new(),
            max_split_depth: MAX_SPLIT_DEPTH,
        }
    }
}

impl ParserConfig {
    pub fn with_classpath(mut self, entries: Vec<PathBuf>) -> Self {
        self.preferred_classpath = entries;
        self
    }
}
