//! Incremental reconstruction of the log's embedded tag tree.
//!
//! HotSpot writes its compilation markup one element per line, but a
//! single element (a `<task>` with its `<phase>`, `<parse>` and
//! `<task_done>` children) can span many lines. `TagBuilder` keeps a stack
//! of open frames between calls and hands back a `Tag` only once its root
//! has been closed.
//!
//! Only the small XML dialect HotSpot emits is understood: start, end and
//! self-closing elements with quoted attributes, plus text lines inside
//! the header.

use crate::aggregator::model::CompilerTier;
use crate::parser::classifier::LogLine;
use crate::utils::error::MarkupError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A completed element of the markup tree
///
/// Children are owned by their parent. `parent` only names the enclosing
/// element for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Tag>,

    /// Text between the tags, only kept for header elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Line the element was opened on
    pub line: u64,

    /// Sticky compiler tier in effect when the element completed
    pub compiler_tier: CompilerTier,
}

impl Tag {
    pub fn new(name: impl Into<String>, line: u64) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            content: None,
            parent: None,
            line,
            compiler_tier: CompilerTier::Unknown,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, mut child: Tag) -> Self {
        child.parent = Some(self.name.clone());
        self.children.push(child);
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn first_named_child(&self, name: &str) -> Option<&Tag> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn named_children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Tag> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn text_content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (key, value) in &self.attributes {
            write!(f, " {}='{}'", key, value)?;
        }
        if self.children.is_empty() && self.content.is_none() {
            write!(f, "/>")
        } else {
            write!(f, ">")?;
            if let Some(text) = &self.content {
                write!(f, "{}", text)?;
            }
            for child in &self.children {
                write!(f, "{}", child)?;
            }
            write!(f, "</{}>", self.name)
        }
    }
}

/// An element whose closing tag has not been seen yet
#[derive(Debug)]
struct Frame {
    name: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Tag>,
    content: Option<String>,
    line: u64,
}

impl Frame {
    fn into_tag(self, tier: CompilerTier) -> Tag {
        Tag {
            name: self.name,
            attributes: self.attributes,
            children: self.children,
            content: self.content,
            parent: None,
            line: self.line,
            compiler_tier: tier,
        }
    }
}

/// Builds `Tag` trees one classified line at a time
#[derive(Debug)]
pub struct TagBuilder {
    stack: Vec<Frame>,
    keep_text: bool,
    compiler_tier: CompilerTier,
}

impl TagBuilder {
    /// Builder for header lines, which keeps text content
    pub fn for_header() -> Self {
        Self {
            stack: Vec::new(),
            keep_text: true,
            compiler_tier: CompilerTier::Unknown,
        }
    }

    /// Builder for compilation lines, which drops stray text
    pub fn for_compilation() -> Self {
        Self {
            keep_text: false,
            ..Self::for_header()
        }
    }

    pub fn compiler_tier(&self) -> CompilerTier {
        self.compiler_tier
    }

    pub fn set_compiler_tier(&mut self, tier: CompilerTier) {
        self.compiler_tier = tier;
    }

    /// Number of elements currently open
    pub fn open_depth(&self) -> usize {
        self.stack.len()
    }

    /// Names of the open elements, outermost first
    pub fn open_elements(&self) -> Vec<&str> {
        self.stack.iter().map(|f| f.name.as_str()).collect()
    }

    /// Feed one line, pushing every root element it completes onto `out`
    ///
    /// On a markup fault the rest of the line is skipped; roots completed
    /// earlier on the same line are kept.
    pub fn process_line(&mut self, line: &LogLine, out: &mut Vec<Tag>) -> Result<(), MarkupError> {
        let text = line.text.as_str();
        let mut pos = 0;

        while pos < text.len() {
            let rest = &text[pos..];

            if rest.starts_with("<!--") {
                pos += rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
            } else if rest.starts_with("<?") {
                pos += rest.find("?>").map(|i| i + 2).unwrap_or(rest.len());
            } else if let Some(after) = rest.strip_prefix("</") {
                let end = after.find('>').ok_or_else(|| MarkupError::Malformed {
                    detail: format!("unclosed end tag '{}'", rest),
                    line: line.number,
                })?;
                let name = after[..end].trim();
                self.close_element(name, line.number, out)?;
                pos += 2 + end + 1;
            } else if rest.starts_with('<') {
                pos += self.open_element(rest, line.number, out)?;
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                self.add_text(&rest[..end]);
                pos += end;
            }
        }

        Ok(())
    }

    /// Parse a start or self-closing element at the beginning of `input`
    ///
    /// Returns the number of bytes consumed.
    fn open_element(
        &mut self,
        input: &str,
        line: u64,
        out: &mut Vec<Tag>,
    ) -> Result<usize, MarkupError> {
        let bytes = input.as_bytes();
        let mut pos = 1;

        while pos < bytes.len() && !is_name_terminator(bytes[pos]) {
            pos += 1;
        }
        let name = &input[1..pos];
        if name.is_empty() {
            return Err(MarkupError::Malformed {
                detail: "element without a name".to_string(),
                line,
            });
        }

        let mut attributes = BTreeMap::new();

        loop {
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }

            if pos >= bytes.len() {
                return Err(MarkupError::Malformed {
                    detail: format!("<{}> not closed on its line", name),
                    line,
                });
            }

            if input[pos..].starts_with("/>") {
                let tag = Frame {
                    name: name.to_string(),
                    attributes,
                    children: Vec::new(),
                    content: None,
                    line,
                }
                .into_tag(self.compiler_tier);
                self.complete(tag, out);
                return Ok(pos + 2);
            }

            if bytes[pos] == b'>' {
                self.stack.push(Frame {
                    name: name.to_string(),
                    attributes,
                    children: Vec::new(),
                    content: None,
                    line,
                });
                return Ok(pos + 1);
            }

            let key_start = pos;
            while pos < bytes.len()
                && bytes[pos] != b'='
                && !bytes[pos].is_ascii_whitespace()
                && bytes[pos] != b'>'
                && bytes[pos] != b'/'
            {
                pos += 1;
            }
            let key = &input[key_start..pos];

            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if key.is_empty() || pos >= bytes.len() || bytes[pos] != b'=' {
                return Err(MarkupError::Malformed {
                    detail: format!("attribute '{}' in <{}> has no value", key, name),
                    line,
                });
            }
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }

            let (value, consumed) =
                read_quoted(&input[pos..]).ok_or_else(|| MarkupError::UnterminatedQuote {
                    tag: name.to_string(),
                    line,
                })?;
            attributes.insert(key.to_string(), value);
            pos += consumed;
        }
    }

    fn close_element(
        &mut self,
        name: &str,
        line: u64,
        out: &mut Vec<Tag>,
    ) -> Result<(), MarkupError> {
        let frame = self.stack.pop().ok_or_else(|| MarkupError::UnexpectedClose {
            found: name.to_string(),
            line,
        })?;

        if frame.name != name {
            warn!(
                "discarding <{}> opened at line {}: closed by </{}> at line {}",
                frame.name, frame.line, name, line
            );
            return Err(MarkupError::MismatchedClose {
                expected: frame.name,
                found: name.to_string(),
                line,
            });
        }

        let tag = frame.into_tag(self.compiler_tier);
        self.complete(tag, out);
        Ok(())
    }

    /// Attach a finished element to its parent, or emit it as a root
    fn complete(&mut self, mut tag: Tag, out: &mut Vec<Tag>) {
        match self.stack.last_mut() {
            Some(parent) => {
                tag.parent = Some(parent.name.clone());
                parent.children.push(tag);
            }
            None => out.push(tag),
        }
    }

    fn add_text(&mut self, text: &str) {
        if !self.keep_text {
            return;
        }
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(frame) = self.stack.last_mut() {
            match &mut frame.content {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(text);
                }
                None => frame.content = Some(text.to_string()),
            }
        }
    }
}

fn is_name_terminator(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'>' || b == b'/'
}

/// Read a quoted attribute value at the start of `input`
///
/// Accepts single or double quotes; a backslash escapes the next
/// character. Returns the decoded value and the bytes consumed, or `None`
/// if the quote is never closed.
fn read_quoted(input: &str) -> Option<(String, usize)> {
    let mut chars = input.char_indices();
    let (_, quote) = chars.next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }

    let mut value = String::new();
    let mut escaped = false;

    for (i, c) in chars {
        if escaped {
            value.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Some((decode_attribute(&value), i + c.len_utf8()));
        } else {
            value.push(c);
        }
    }

    None
}

fn decode_attribute(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
