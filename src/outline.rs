//! Indentation-scoped key-value outlines.
//!
//! Annotation bodies carry structured data in a small outline notation:
//!
//! ```text
//! description: the created user
//! content:
//!   - application/json
//!   - application/xml
//! schema:
//!   type: object
//!   properties:
//!     name:
//!       type: string
//! ```
//!
//! A key ends with `:`; a value may follow on the same line, or the key opens
//! a nested outline on the following, deeper-indented lines. `- ` introduces
//! a list item. Nesting depth is unbounded. Which keys are allowed is decided
//! by the consumer, not here.

use std::fmt;

/// A parsed outline value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Scalar(String),
    /// Key/value pairs in source order
    Map(Vec<(String, Node)>),
    List(Vec<Node>),
}

impl Node {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Node::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Scalar(_) => "a value",
            Node::Map(_) => "a mapping",
            Node::List(_) => "a list",
        }
    }
}

/// A malformed outline. `line` is the 0-based index into the parsed lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineError {
    pub line: usize,
    pub message: String,
}

impl OutlineError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for OutlineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.message)
    }
}

struct Line<'a> {
    index: usize,
    indent: usize,
    text: &'a str,
}

/// Parses `lines` into a map. Blank lines are ignored.
///
/// An empty input yields an empty map.
pub fn parse(lines: &[String]) -> Result<Vec<(String, Node)>, OutlineError> {
    let mut items = Vec::new();
    for (index, raw) in lines.iter().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        if raw.trim_start_matches(' ').starts_with('\t') {
            return Err(OutlineError::new(index, "tabs are not allowed in outline indentation"));
        }
        let text = raw.trim_start_matches(' ');
        items.push(Line {
            index,
            indent: raw.len() - text.len(),
            text: text.trim_end(),
        });
    }

    if items.is_empty() {
        return Ok(Vec::new());
    }

    let mut parser = Parser { lines: &items, pos: 0 };
    let indent = items[0].indent;
    let node = parser.block(indent)?;
    if let Some(line) = parser.peek() {
        return Err(OutlineError::new(
            line.index,
            "indentation does not match any enclosing level",
        ));
    }

    match node {
        Node::Map(entries) => Ok(entries),
        other => Err(OutlineError::new(
            items[0].index,
            format!("expected key: value pairs, found {}", other.kind()),
        )),
    }
}

struct Parser<'l, 'a> {
    lines: &'l [Line<'a>],
    pos: usize,
}

impl<'l, 'a> Parser<'l, 'a> {
    fn peek(&self) -> Option<&'l Line<'a>> {
        self.lines.get(self.pos)
    }

    /// Parses the lines at exactly `indent`, stopping at the first shallower one
    fn block(&mut self, indent: usize) -> Result<Node, OutlineError> {
        let first = match self.peek() {
            Some(line) => line,
            None => return Ok(Node::Map(Vec::new())),
        };

        if is_list_item(first.text) {
            self.list(indent)
        } else {
            self.map(indent)
        }
    }

    fn map(&mut self, indent: usize) -> Result<Node, OutlineError> {
        let mut entries: Vec<(String, Node)> = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(OutlineError::new(line.index, "unexpected indentation"));
            }
            if is_list_item(line.text) {
                return Err(OutlineError::new(line.index, "list item mixed into a mapping"));
            }

            let (key, value) = split_key(line.text)
                .ok_or_else(|| OutlineError::new(line.index, format!("expected `key:`, found `{}`", line.text)))?;
            if entries.iter().any(|(k, _)| k == key) {
                return Err(OutlineError::new(line.index, format!("duplicate key `{}`", key)));
            }
            self.pos += 1;

            let node = self.value(line.index, line.indent, key, value)?;
            entries.push((key.to_string(), node));
        }

        Ok(Node::Map(entries))
    }

    fn list(&mut self, indent: usize) -> Result<Node, OutlineError> {
        let mut items = Vec::new();

        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(OutlineError::new(line.index, "unexpected indentation"));
            }
            let Some(item) = strip_list_item(line.text) else {
                return Err(OutlineError::new(line.index, "mapping entry mixed into a list"));
            };
            self.pos += 1;

            match split_key(item) {
                // `- key: value` opens a mapping whose further keys align with `key`
                Some((key, value)) => {
                    let item_indent = indent + (line.text.len() - item.len());
                    let first = self.value(line.index, item_indent, key, value)?;
                    let mut entries = vec![(key.to_string(), first)];
                    if let Some(next) = self.peek() {
                        if next.indent == item_indent && !is_list_item(next.text) {
                            if let Node::Map(rest) = self.map(item_indent)? {
                                for (k, v) in rest {
                                    if entries.iter().any(|(existing, _)| *existing == k) {
                                        return Err(OutlineError::new(
                                            line.index,
                                            format!("duplicate key `{}`", k),
                                        ));
                                    }
                                    entries.push((k, v));
                                }
                            }
                        }
                    }
                    items.push(Node::Map(entries));
                }
                None => items.push(Node::Scalar(item.to_string())),
            }
        }

        Ok(Node::List(items))
    }

    /// Value of `key`, written at `indent` on line `index`, whose inline part is `inline`
    fn value(&mut self, index: usize, indent: usize, key: &str, inline: &str) -> Result<Node, OutlineError> {
        if !inline.is_empty() {
            if let Some(next) = self.peek() {
                if next.indent > indent {
                    return Err(OutlineError::new(
                        next.index,
                        "a key with an inline value cannot have nested lines",
                    ));
                }
            }
            return Ok(Node::Scalar(unquote(inline).to_string()));
        }

        match self.peek() {
            Some(next) if next.indent > indent => self.block(next.indent),
            _ => Err(OutlineError::new(
                index,
                format!("key `{}` has no value and no nested lines", key),
            )),
        }
    }
}

fn is_list_item(text: &str) -> bool {
    text == "-" || text.starts_with("- ")
}

fn strip_list_item(text: &str) -> Option<&str> {
    if text == "-" {
        return Some("");
    }
    text.strip_prefix("- ").map(str::trim_start)
}

/// Splits `key: value`; the key must not contain whitespace
fn split_key(text: &str) -> Option<(&str, &str)> {
    let (key, value) = match text.find(": ") {
        Some(at) => (&text[..at], text[at + 2..].trim()),
        None => (text.strip_suffix(':')?, ""),
    };

    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return None;
    }
    Some((key, value))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
