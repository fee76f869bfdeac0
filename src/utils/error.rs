//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.
//!
//! Apart from `ParseError` and `OutputError`, none of these abort a parse:
//! they are caught at the line or tag that raised them and reported.

use thiserror::Error;

/// Structural faults in the embedded tag markup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkupError {
    #[error("unterminated quoted value in <{tag}> at line {line}")]
    UnterminatedQuote { tag: String, line: u64 },

    #[error("closing </{found}> does not match open <{expected}> at line {line}")]
    MismatchedClose {
        expected: String,
        found: String,
        line: u64,
    },

    #[error("closing </{found}> with no open element at line {line}")]
    UnexpectedClose { found: String, line: u64 },

    #[error("malformed element at line {line}: {detail}")]
    Malformed { detail: String, line: u64 },

    #[error("mangled line still splitting after {depth} levels")]
    SplitDepthExceeded { depth: usize },
}

/// Faults raised while interpreting a single completed tag
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    #[error("<{tag}> at line {line} is missing attribute '{attribute}'")]
    MissingAttribute {
        tag: String,
        attribute: String,
        line: u64,
    },

    #[error("unexpected compiler '{name}' at line {line}")]
    UnknownCompiler { name: String, line: u64 },

    #[error("invalid number '{value}' for '{attribute}' at line {line}")]
    InvalidNumber {
        attribute: String,
        value: String,
        line: u64,
    },

    #[error("could not resolve line {line} : {signature}")]
    UnresolvedSignature { signature: String, line: u64 },
}

impl TagError {
    /// Line the faulting tag started on
    pub fn line(&self) -> u64 {
        match self {
            Self::MissingAttribute { line, .. }
            | Self::UnknownCompiler { line, .. }
            | Self::InvalidNumber { line, .. }
            | Self::UnresolvedSignature { line, .. } => *line,
        }
    }
}

/// Faults raised while introspecting a class named by the classloader trace
#[derive(Error, Debug)]
pub enum ClassLoadError {
    #[error("class file for '{0}' not found on classpath")]
    NotFound(String),

    #[error("'{class}' is not a class file (magic {magic:#010x})")]
    BadMagic { class: String, magic: u32 },

    #[error("class file for '{class}' has major version {major}, newer than supported {supported}")]
    UnsupportedVersion {
        class: String,
        major: u16,
        supported: u16,
    },

    #[error("IO error reading class '{class}': {source}")]
    Io {
        class: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClassLoadError {
    /// Whether this fault also raises the session fatal flag
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnsupportedVersion { .. })
    }
}

/// Failure reported by an external listener
#[derive(Error, Debug)]
#[error("listener failed: {0}")]
pub struct SinkError(pub String);

/// Errors that abort a whole parse
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error reading log: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
