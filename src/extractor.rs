//! Comment extraction from canonical source text.
//!
//! The [`CommentExtractor`] walks a source text once with a small lexical
//! state machine driven by a [`LanguageGrammar`] and returns every comment in
//! source order. String literals are tracked so that comment markers inside
//! them (`"http://..."`, `"/* not a comment */"`) never open a comment.

use crate::error::SyntaxError;
use crate::language::{GrammarRegistry, LanguageGrammar};
use log::debug;
use std::path::{Path, PathBuf};

/// A maximal run of comment text from one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    /// Source file the comment came from
    pub file: PathBuf,
    /// 1-based line of the first comment line
    pub line: usize,
    /// Comment text with the comment markers removed, one entry per physical line
    pub lines: Vec<String>,
}

/// Extracts comment blocks using the grammars of a [`GrammarRegistry`].
///
/// # Example
///
/// ```
/// use apidoc_from_source::extractor::CommentExtractor;
/// use apidoc_from_source::language::GrammarRegistry;
/// use std::path::Path;
///
/// let registry = GrammarRegistry::builtin();
/// let extractor = CommentExtractor::new(&registry);
/// let blocks = extractor
///     .extract(Path::new("main.go"), "go", "// hello\n// world\nfunc main() {}\n")
///     .unwrap();
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].lines, vec![" hello", " world"]);
/// ```
pub struct CommentExtractor<'r> {
    registry: &'r GrammarRegistry,
}

impl<'r> CommentExtractor<'r> {
    pub fn new(registry: &'r GrammarRegistry) -> Self {
        Self { registry }
    }

    /// The registry this extractor resolves languages against
    pub fn registry(&self) -> &'r GrammarRegistry {
        self.registry
    }

    /// Extracts every comment block of `text`, written in `language`.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] if the language is unknown or a block
    /// comment is still open at the end of the text. Either error discards
    /// the whole file.
    pub fn extract(
        &self,
        path: &Path,
        language: &str,
        text: &str,
    ) -> Result<Vec<CommentBlock>, SyntaxError> {
        let grammar = self.registry.get(language).ok_or_else(|| {
            SyntaxError::new(path, 0, format!("unsupported language `{}`", language))
        })?;

        let blocks = Lexer::new(path, grammar, text).run()?;
        debug!("Extracted {} comment blocks from {}", blocks.len(), path.display());
        Ok(blocks)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Code,
    LineComment { content_start: usize },
    BlockComment { start_line: usize, content_start: usize },
    StringLiteral { delimiter: usize },
}

/// Consecutive line comments waiting to be emitted as one block
struct LineRun {
    start_line: usize,
    last_line: usize,
    lines: Vec<String>,
}

struct Lexer<'a> {
    path: &'a Path,
    grammar: &'a LanguageGrammar,
    text: &'a str,
    pos: usize,
    line: usize,
    line_start: usize,
    state: LexState,
    run: Option<LineRun>,
    blocks: Vec<CommentBlock>,
}

impl<'a> Lexer<'a> {
    fn new(path: &'a Path, grammar: &'a LanguageGrammar, text: &'a str) -> Self {
        Self {
            path,
            grammar,
            text,
            pos: 0,
            line: 1,
            line_start: 0,
            state: LexState::Code,
            run: None,
            blocks: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<CommentBlock>, SyntaxError> {
        while self.pos < self.text.len() {
            match self.state {
                LexState::Code => self.code(),
                LexState::LineComment { content_start } => self.line_comment(content_start),
                LexState::BlockComment {
                    start_line,
                    content_start,
                } => self.block_comment(start_line, content_start)?,
                LexState::StringLiteral { delimiter } => self.string_literal(delimiter),
            }
        }

        // A line comment on the last line has no newline to end it.
        if let LexState::LineComment { content_start } = self.state {
            self.line_comment(content_start);
        }
        self.flush_run();

        Ok(self.blocks)
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn code(&mut self) {
        let grammar = self.grammar;
        let rest = self.rest();

        if let Some(block) = &grammar.block_comment {
            if rest.starts_with(block.start) && (!block.line_anchored || self.pos == self.line_start) {
                self.flush_run();
                self.state = LexState::BlockComment {
                    start_line: self.line,
                    content_start: self.pos + block.start.len(),
                };
                self.pos += block.start.len();
                return;
            }
        }

        if rest.starts_with(grammar.line_comment) {
            self.pos += grammar.line_comment.len();
            self.state = LexState::LineComment {
                content_start: self.pos,
            };
            return;
        }

        for (index, delimiter) in grammar.strings.iter().enumerate() {
            if rest.starts_with(delimiter.open) {
                self.flush_run();
                self.pos += delimiter.open.len();
                self.state = LexState::StringLiteral { delimiter: index };
                return;
            }
        }

        match rest.chars().next() {
            Some('\n') => self.newline(),
            Some(c) => {
                if !c.is_whitespace() {
                    self.flush_run();
                }
                self.pos += c.len_utf8();
            }
            None => {}
        }
    }

    fn line_comment(&mut self, content_start: usize) {
        let end = self.rest().find('\n').map_or(self.text.len(), |i| self.pos + i);
        let content = self.text[content_start..end].trim_end_matches('\r').to_string();
        let marker_start = content_start - self.grammar.line_comment.len();
        let leads_line = self.text[self.line_start..marker_start].trim().is_empty();

        let joins = leads_line
            && self
                .run
                .as_ref()
                .is_some_and(|run| run.last_line + 1 == self.line);

        if joins {
            if let Some(run) = self.run.as_mut() {
                run.last_line = self.line;
                run.lines.push(content);
            }
        } else {
            self.flush_run();
            self.run = Some(LineRun {
                start_line: self.line,
                last_line: self.line,
                lines: vec![content],
            });
        }

        self.pos = end;
        self.state = LexState::Code;
    }

    fn block_comment(&mut self, start_line: usize, content_start: usize) -> Result<(), SyntaxError> {
        let markers = match &self.grammar.block_comment {
            Some(markers) => markers,
            None => unreachable!("block comment state without block markers"),
        };

        let mut search = self.pos;
        let end = loop {
            let Some(offset) = self.text[search..].find(markers.end) else {
                return Err(SyntaxError::new(
                    self.path,
                    start_line,
                    format!("unterminated block comment, missing `{}`", markers.end),
                ));
            };
            let at = search + offset;
            if !markers.line_anchored || at == 0 || self.text[..at].ends_with('\n') {
                break at;
            }
            search = at + markers.end.len();
        };

        let mut content = &self.text[content_start..end];
        if markers.line_anchored {
            content = content.strip_suffix('\n').unwrap_or(content);
        }
        let lines = content
            .split('\n')
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();

        self.blocks.push(CommentBlock {
            file: self.path.to_path_buf(),
            line: start_line,
            lines,
        });

        let resume = end + markers.end.len();
        self.advance_lines(resume);
        self.state = LexState::Code;
        Ok(())
    }

    fn string_literal(&mut self, delimiter: usize) {
        let grammar = self.grammar;
        let delimiter = &grammar.strings[delimiter];
        let rest = self.rest();

        let Some(c) = rest.chars().next() else {
            return;
        };

        if delimiter.escape == Some(c) {
            self.pos += c.len_utf8();
            match self.rest().chars().next() {
                Some('\n') => self.newline(),
                Some(escaped) => self.pos += escaped.len_utf8(),
                None => {}
            }
        } else if rest.starts_with(delimiter.close) {
            self.pos += delimiter.close.len();
            self.state = LexState::Code;
        } else if c == '\n' {
            self.newline();
            if !delimiter.multiline {
                self.state = LexState::Code;
            }
        } else {
            self.pos += c.len_utf8();
        }
    }

    fn newline(&mut self) {
        self.pos += 1;
        self.line += 1;
        self.line_start = self.pos;
    }

    /// Moves to `target`, keeping the line counter in step
    fn advance_lines(&mut self, target: usize) {
        for (offset, byte) in self.text.as_bytes()[self.pos..target].iter().enumerate() {
            if *byte == b'\n' {
                self.line += 1;
                self.line_start = self.pos + offset + 1;
            }
        }
        self.pos = target;
    }

    fn flush_run(&mut self) {
        if let Some(run) = self.run.take() {
            self.blocks.push(CommentBlock {
                file: self.path.to_path_buf(),
                line: run.start_line,
                lines: run.lines,
            });
        }
    }
}
