//! Typed documentation entries produced by the interpreter.

use crate::openapi::{Contact, ExternalDocs, License, Schema, SecurityRequirement, SecurityScheme, Server, Tag};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Group that entries without `@apiGroup` are filed under
pub const DEFAULT_GROUP: &str = "index";

/// Where an entry was declared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub file: PathBuf,
    pub line: usize,
}

/// HTTP methods accepted by `@api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    /// Parses a method name, ignoring case
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            "OPTIONS" => Some(HttpMethod::Options),
            "HEAD" => Some(HttpMethod::Head),
            "TRACE" => Some(HttpMethod::Trace),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `name type description` line of `@apiParam`, `@apiQuery` or `@apiHeader`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub type_name: String,
    pub description: String,
}

/// A named example payload from `@apiExample`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub name: String,
    /// Media type the example is written in, if given
    pub format: Option<String>,
    pub value: String,
}

/// Request body declared by `@apiRequest`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Request {
    pub media_types: Vec<String>,
    pub description: Option<String>,
    pub schema: Option<Schema>,
    pub examples: Vec<Example>,
}

/// A response declared by `@apiSuccess` or `@apiError`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// Three-digit status code or `default`
    pub status: String,
    pub description: String,
    pub media_types: Vec<String>,
    /// `@apiParam` lines scoped to this response
    pub fields: Vec<Param>,
    pub schema: Option<Schema>,
    pub examples: Vec<Example>,
}

/// One documented operation, built from an `@api` run.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEntry {
    pub method: HttpMethod,
    pub path: String,
    pub summary: String,
    /// Empty when the run had no `@apiGroup`
    pub group: String,
    pub tags: Vec<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    pub operation_id: Option<String>,
    pub params: Vec<Param>,
    pub queries: Vec<Param>,
    pub headers: Vec<Param>,
    pub request: Option<Request>,
    pub responses: Vec<Response>,
    pub servers: Vec<Server>,
    /// Media type set by `@apiContent`
    pub content_type: Option<String>,
    pub location: SourceLocation,
}

/// Document-level metadata, built from an `@apiDoc` run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoEntry {
    pub group: String,
    pub title: String,
    pub version: Option<String>,
    pub description: Option<String>,
    pub terms_of_service: Option<String>,
    pub license: Option<License>,
    pub contact: Option<Contact>,
    pub servers: Vec<Server>,
    pub security: Vec<SecurityRequirement>,
    pub security_schemes: BTreeMap<String, SecurityScheme>,
    pub tags: Vec<Tag>,
    pub external_docs: Option<ExternalDocs>,
    /// Default media type of every operation in the group
    pub content_type: Option<String>,
    pub location: SourceLocation,
}

impl Response {
    pub fn new(status: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            description: description.into(),
            media_types: Vec::new(),
            fields: Vec::new(),
            schema: None,
            examples: Vec::new(),
        }
    }
}

impl ApiEntry {
    /// An operation with nothing declared beyond its method and path
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            summary: String::new(),
            group: String::new(),
            tags: Vec::new(),
            description: None,
            deprecated: false,
            operation_id: None,
            params: Vec::new(),
            queries: Vec::new(),
            headers: Vec::new(),
            request: None,
            responses: Vec::new(),
            servers: Vec::new(),
            content_type: None,
            location: SourceLocation::default(),
        }
    }
}

impl Default for SourceLocation {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            line: 0,
        }
    }
}

/// Output of one documentation run.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Api(ApiEntry),
    Info(InfoEntry),
}

impl Entry {
    /// The group as written in the source; may be empty
    pub fn group(&self) -> &str {
        match self {
            Entry::Api(api) => &api.group,
            Entry::Info(info) => &info.group,
        }
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            Entry::Api(api) => &api.location,
            Entry::Info(info) => &info.location,
        }
    }
}

/// Resolves an empty group name to [`DEFAULT_GROUP`]
pub fn resolve_group(group: &str) -> &str {
    let group = group.trim();
    if group.is_empty() {
        DEFAULT_GROUP
    } else {
        group
    }
}
