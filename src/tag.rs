//! Splitting comment blocks into tagged annotations.

use crate::extractor::CommentBlock;
use crate::language::LanguageGrammar;
use log::debug;
use std::fmt;
use std::path::PathBuf;

/// The closed vocabulary of annotation tags.
///
/// Tags are matched case-sensitively against the first word of a comment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Api,
    ApiDoc,
    ApiVersion,
    ApiLicense,
    ApiParam,
    ApiQuery,
    ApiHeader,
    ApiSuccess,
    ApiError,
    ApiRequest,
    ApiBaseUrl,
    ApiGroup,
    ApiIgnore,
    ApiContent,
    ApiExample,
}

impl Tag {
    pub const ALL: [Tag; 15] = [
        Tag::Api,
        Tag::ApiDoc,
        Tag::ApiVersion,
        Tag::ApiLicense,
        Tag::ApiParam,
        Tag::ApiQuery,
        Tag::ApiHeader,
        Tag::ApiSuccess,
        Tag::ApiError,
        Tag::ApiRequest,
        Tag::ApiBaseUrl,
        Tag::ApiGroup,
        Tag::ApiIgnore,
        Tag::ApiContent,
        Tag::ApiExample,
    ];

    /// The marker as written in source comments
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Api => "@api",
            Tag::ApiDoc => "@apiDoc",
            Tag::ApiVersion => "@apiVersion",
            Tag::ApiLicense => "@apiLicense",
            Tag::ApiParam => "@apiParam",
            Tag::ApiQuery => "@apiQuery",
            Tag::ApiHeader => "@apiHeader",
            Tag::ApiSuccess => "@apiSuccess",
            Tag::ApiError => "@apiError",
            Tag::ApiRequest => "@apiRequest",
            Tag::ApiBaseUrl => "@apiBaseURL",
            Tag::ApiGroup => "@apiGroup",
            Tag::ApiIgnore => "@apiIgnore",
            Tag::ApiContent => "@apiContent",
            Tag::ApiExample => "@apiExample",
        }
    }

    /// Looks up a marker; anything outside the vocabulary (including other
    /// capitalisations) is `None`.
    pub fn from_marker(marker: &str) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.as_str() == marker)
    }

    /// Whether this tag opens a documentation run
    pub fn is_anchor(self) -> bool {
        matches!(self, Tag::Api | Tag::ApiDoc)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tag and the comment text that belongs to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub tag: Tag,
    pub file: PathBuf,
    /// 1-based line of the tag itself
    pub line: usize,
    /// The remainder of the tag line, trimmed
    pub args: String,
    /// Lines following the tag line up to the next tag, indentation preserved
    pub body: Vec<String>,
}

impl Annotation {
    /// Line number of `body[index]`
    pub fn body_line(&self, index: usize) -> usize {
        self.line + 1 + index
    }
}

/// Splits one comment block into annotations.
///
/// A block whose first non-blank line is not a tag is ordinary prose and
/// yields nothing, even when a tag appears further down.
pub fn parse_block(block: &CommentBlock, grammar: &LanguageGrammar) -> Vec<Annotation> {
    let lines = dedent(strip_gutter(&block.lines, &grammar.decoration_chars()));

    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return Vec::new();
    };
    if tag_of(&lines[first]).is_none() {
        return Vec::new();
    }

    let mut annotations: Vec<Annotation> = Vec::new();
    for (index, line) in lines.iter().enumerate().skip(first) {
        if let Some((tag, args)) = tag_of(line) {
            annotations.push(Annotation {
                tag,
                file: block.file.clone(),
                line: block.line + index,
                args: args.to_string(),
                body: Vec::new(),
            });
            continue;
        }

        if let Some(current) = annotations.last_mut() {
            if let Some(marker) = line.split_whitespace().next().filter(|w| w.starts_with('@')) {
                debug!(
                    "{}:{}: unrecognized marker {} folded into {}",
                    block.file.display(),
                    block.line + index,
                    marker,
                    current.tag
                );
            }
            current.body.push(line.clone());
        }
    }

    for annotation in &mut annotations {
        while annotation.body.last().is_some_and(|l| l.trim().is_empty()) {
            annotation.body.pop();
        }
    }

    annotations
}

/// Returns the tag opening `line` and the rest of the line
fn tag_of(line: &str) -> Option<(Tag, &str)> {
    let trimmed = line.trim_start();
    let marker = trimmed.split_whitespace().next()?;
    let tag = Tag::from_marker(marker)?;
    Some((tag, trimmed[marker.len()..].trim()))
}

/// Splits a line into its gutter (a run of decoration characters after the
/// indentation) and the text behind it.
///
/// The run counts as a gutter only when a space, a tab or the end of the
/// line follows it, so `/users` or `*bold*` are left alone.
fn gutter<'a>(line: &'a str, decoration: &[char]) -> Option<(usize, &'a str, &'a str)> {
    let trimmed = line.trim_start();
    let column = line.len() - trimmed.len();
    let text = trimmed.trim_start_matches(|c: char| decoration.contains(&c));
    let run = &trimmed[..trimmed.len() - text.len()];
    if run.is_empty() {
        return None;
    }
    if text.is_empty() {
        return Some((column, run, text));
    }
    text.strip_prefix(|c: char| c == ' ' || c == '\t').map(|text| (column, run, text))
}

/// Removes the comment gutter (` * `, `/ `, `# `) from a block.
///
/// A gutter is stripped only when every non-blank line after the first
/// carries the same one at the same column. The first line may lack it
/// (`/* @api ...`) or sit at another column (`/**`). Otherwise the lines
/// are returned untouched and literal content keeps its leading `/` or `*`.
fn strip_gutter(lines: &[String], decoration: &[char]) -> Vec<String> {
    let mut gutters = lines
        .iter()
        .skip(1)
        .filter(|l| !l.trim().is_empty())
        .map(|l| gutter(l, decoration).map(|(column, run, _)| (column, run)));

    let block_gutter = match gutters.next() {
        Some(Some(first)) if gutters.all(|g| g == Some(first)) => first,
        _ => return lines.to_vec(),
    };

    lines
        .iter()
        .map(|line| match gutter(line, decoration) {
            Some((_, run, text)) if run == block_gutter.1 => text.to_string(),
            _ if line.trim().is_empty() => String::new(),
            // only the first line can get here
            _ => line.to_string(),
        })
        .collect()
}

/// Removes the indentation common to every non-blank line
fn dedent(lines: Vec<String>) -> Vec<String> {
    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    lines
        .into_iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                l.chars().skip(indent).collect::<String>().trim_end().to_string()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::GrammarRegistry;
    use pretty_assertions::assert_eq;

    fn block(lines: &[&str]) -> CommentBlock {
        CommentBlock {
            file: PathBuf::from("users.go"),
            line: 10,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn parse(lines: &[&str]) -> Vec<Annotation> {
        let registry = GrammarRegistry::builtin();
        parse_block(&block(lines), registry.get("go").unwrap())
    }

    #[test]
    fn test_tag_vocabulary_is_case_sensitive() {
        assert_eq!(Tag::from_marker("@apiParam"), Some(Tag::ApiParam));
        assert_eq!(Tag::from_marker("@apiBaseURL"), Some(Tag::ApiBaseUrl));
        assert_eq!(Tag::from_marker("@apiparam"), None);
        assert_eq!(Tag::from_marker("@API"), None);
        assert_eq!(Tag::from_marker("@apiTag"), None);

        for tag in Tag::ALL {
            assert_eq!(Tag::from_marker(tag.as_str()), Some(tag));
        }
    }

    #[test]
    fn test_split_into_annotations() {
        let annotations = parse(&[
            " @api GET /users list users",
            " @apiQuery page int page number",
            " @apiSuccess 200 OK",
            "   description: the users",
            "   schema:",
            "     type: array",
        ]);

        assert_eq!(annotations.len(), 3);
        assert_eq!(annotations[0].tag, Tag::Api);
        assert_eq!(annotations[0].args, "GET /users list users");
        assert_eq!(annotations[0].line, 10);
        assert_eq!(annotations[1].tag, Tag::ApiQuery);
        assert_eq!(annotations[1].line, 11);
        assert_eq!(annotations[2].args, "200 OK");
        assert_eq!(
            annotations[2].body,
            vec!["  description: the users", "  schema:", "    type: array"]
        );
        assert_eq!(annotations[2].body_line(1), 14);
    }

    #[test]
    fn test_prose_block_yields_nothing() {
        let annotations = parse(&[" just a comment", " @api GET /hidden looks like a tag"]);
        assert!(annotations.is_empty());
    }

    #[test]
    fn test_block_without_tags_yields_nothing() {
        assert!(parse(&[" TODO: refactor", " more prose"]).is_empty());
        assert!(parse(&[]).is_empty());
    }

    #[test]
    fn test_leading_blank_lines_are_skipped() {
        let annotations = parse(&["", "   ", " @apiDoc title"]);
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].line, 12);
    }

    #[test]
    fn test_unknown_marker_folds_into_previous_tag() {
        let annotations = parse(&[" @api GET /a title", " @apiTypo something", " @apiGroup g"]);

        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].body, vec!["@apiTypo something"]);
        assert_eq!(annotations[1].tag, Tag::ApiGroup);
    }

    #[test]
    fn test_star_gutter_is_stripped() {
        let annotations = parse(&[
            "*",
            " * @apiSuccess 200 ok",
            " *   schema:",
            " *     type: object",
            " ",
        ]);

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].body, vec!["  schema:", "    type: object"]);
    }

    #[test]
    fn test_literal_star_and_slash_survive_the_star_gutter() {
        let annotations = parse(&[
            "*",
            " * @apiExample link text/plain",
            " *   /users/1",
            " *   * starred",
            " ",
        ]);

        assert_eq!(annotations[0].body, vec!["  /users/1", "  * starred"]);
    }

    #[test]
    fn test_line_comment_body_keeps_leading_decoration() {
        let annotations = parse(&[" @apiExample link text/plain", " /users/1", " * starred"]);

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].body, vec!["/users/1", "* starred"]);
    }

    #[test]
    fn test_inconsistent_gutter_is_left_alone() {
        let annotations = parse(&[
            " @apiExample path text/plain",
            " / root",
            " /users",
        ]);

        assert_eq!(annotations[0].body, vec!["/ root", "/users"]);
    }

    #[test]
    fn test_marker_repetition_is_stripped() {
        let annotations = parse(&["/ @apiGroup payments", "/ @apiIgnore"]);

        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].args, "payments");
    }

    #[test]
    fn test_plain_block_comment_is_dedented() {
        let annotations = parse(&[
            "",
            "    @apiRequest application/json",
            "      description: body",
            "",
        ]);

        assert_eq!(annotations[0].args, "application/json");
        assert_eq!(annotations[0].body, vec!["  description: body"]);
    }

    #[test]
    fn test_ruby_hash_gutter() {
        let registry = GrammarRegistry::builtin();
        let annotations = parse_block(
            &block(&["# @api DELETE /x remove", "#   description: gone"]),
            registry.get("ruby").unwrap(),
        );

        assert_eq!(annotations[0].body, vec!["  description: gone"]);
    }
}
