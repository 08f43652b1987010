//! Comment grammars of the supported source languages.
//!
//! A [`GrammarRegistry`] is built once and handed to the
//! [`CommentExtractor`](crate::extractor::CommentExtractor); nothing in the
//! crate keeps a global table.

use std::collections::HashMap;

/// Delimiters of a string literal in which comment markers are inert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringDelimiter {
    pub open: &'static str,
    pub close: &'static str,
    /// Character that escapes the next character inside the literal
    pub escape: Option<char>,
    /// Whether the literal may contain raw newlines (Go raw strings, JS templates)
    pub multiline: bool,
}

/// Start/end markers of a block comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMarkers {
    pub start: &'static str,
    pub end: &'static str,
    /// Markers are only recognised at the very start of a line (Ruby `=begin`/`=end`)
    pub line_anchored: bool,
}

/// Comment syntax of one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageGrammar {
    pub id: &'static str,
    pub line_comment: &'static str,
    pub block_comment: Option<BlockMarkers>,
    pub strings: Vec<StringDelimiter>,
}

impl LanguageGrammar {
    /// Characters that decorate the start of a comment line.
    ///
    /// These are the characters of the line marker plus `*`, the usual
    /// gutter of C-family block comments.
    pub fn decoration_chars(&self) -> Vec<char> {
        let mut chars: Vec<char> = self.line_comment.chars().collect();
        chars.push('*');
        chars.dedup();
        chars
    }
}

const fn string(open: &'static str, escape: Option<char>, multiline: bool) -> StringDelimiter {
    StringDelimiter {
        open,
        close: open,
        escape,
        multiline,
    }
}

fn c_family(id: &'static str, strings: Vec<StringDelimiter>) -> LanguageGrammar {
    LanguageGrammar {
        id,
        line_comment: "//",
        block_comment: Some(BlockMarkers {
            start: "/*",
            end: "*/",
            line_anchored: false,
        }),
        strings,
    }
}

/// Lookup of language id -> grammar and file extension -> language id.
#[derive(Debug, Clone)]
pub struct GrammarRegistry {
    grammars: HashMap<&'static str, LanguageGrammar>,
    extensions: HashMap<&'static str, &'static str>,
}

impl GrammarRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            grammars: HashMap::new(),
            extensions: HashMap::new(),
        }
    }

    /// Creates the registry of every built-in language.
    ///
    /// `go`, `c`, `cpp`, `php` and `js` share the C-family comment markers and
    /// differ only in their string literals; `ruby` uses `#` and `=begin`/`=end`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        let c_strings = || vec![string("\"", Some('\\'), false), string("'", Some('\\'), false)];

        registry.register(
            c_family(
                "go",
                vec![string("\"", Some('\\'), false), string("'", Some('\\'), false), string("`", None, true)],
            ),
            &[".go"],
        );
        registry.register(c_family("c", c_strings()), &[".c"]);
        registry.register(c_family("cpp", c_strings()), &[".h", ".cpp", ".cxx"]);
        registry.register(c_family("php", c_strings()), &[".php"]);
        registry.register(
            c_family(
                "js",
                vec![
                    string("\"", Some('\\'), false),
                    string("'", Some('\\'), false),
                    string("`", Some('\\'), true),
                ],
            ),
            &[".js"],
        );
        registry.register(
            LanguageGrammar {
                id: "ruby",
                line_comment: "#",
                block_comment: Some(BlockMarkers {
                    start: "=begin",
                    end: "=end",
                    line_anchored: true,
                }),
                strings: vec![string("\"", Some('\\'), true), string("'", Some('\\'), true)],
            },
            &[".rb"],
        );

        registry
    }

    /// Adds (or replaces) a grammar and the extensions that map to it
    pub fn register(&mut self, grammar: LanguageGrammar, extensions: &[&'static str]) {
        for ext in extensions {
            self.extensions.insert(*ext, grammar.id);
        }
        self.grammars.insert(grammar.id, grammar);
    }

    /// Returns the grammar of `language`, matched case-insensitively
    pub fn get(&self, language: &str) -> Option<&LanguageGrammar> {
        self.grammars
            .get(language)
            .or_else(|| self.grammars.get(language.to_ascii_lowercase().as_str()))
    }

    /// Maps a file extension (with or without the leading dot) to its language id
    pub fn language_for_extension(&self, ext: &str) -> Option<&'static str> {
        let ext = ext.to_ascii_lowercase();
        let key = if ext.starts_with('.') { ext } else { format!(".{}", ext) };
        self.extensions.get(key.as_str()).copied()
    }

    /// All registered language ids, sorted
    pub fn languages(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.grammars.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for GrammarRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
