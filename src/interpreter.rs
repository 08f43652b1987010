//! Turning annotations into documentation entries.
//!
//! Annotations are grouped into runs: a run starts at `@api` or `@apiDoc`
//! (or at an `@apiVersion` that is not inside a run yet) and extends up to
//! the next run start. An `@api` run becomes an [`ApiEntry`], every other
//! run an [`InfoEntry`]. A run containing `@apiIgnore` produces nothing.
//!
//! Each run is interpreted on its own; the first error in a run drops that
//! run only.

use crate::entry::{
    ApiEntry, Entry, Example, HttpMethod, InfoEntry, Param, Request, Response, SourceLocation,
};
use crate::error::SyntaxError;
use crate::openapi::{
    Contact, ExternalDocs, License, Schema, SecurityRequirement, SecurityScheme, Server,
    ServerVariable, Tag as DocTag,
};
use crate::outline::{self, Node};
use crate::tag::{Annotation, Tag};
use log::debug;

/// Entries built from a sequence of annotations, plus every syntax error met.
#[derive(Debug, Default)]
pub struct Interpretation {
    pub entries: Vec<Entry>,
    pub errors: Vec<SyntaxError>,
}

/// Interprets the annotations of one comment block.
///
/// # Arguments
///
/// * `annotations` - annotations in source order, as returned by
///   [`parse_block`](crate::tag::parse_block)
///
/// # Returns
///
/// The entries of every well-formed run and an error for every malformed
/// run or annotation that belongs to no run.
pub fn interpret(annotations: Vec<Annotation>) -> Interpretation {
    let mut result = Interpretation::default();
    let mut runs: Vec<Vec<Annotation>> = Vec::new();

    for annotation in annotations {
        let opens_run = annotation.tag.is_anchor() || (annotation.tag == Tag::ApiVersion && runs.is_empty());
        if opens_run {
            runs.push(vec![annotation]);
            continue;
        }

        match runs.last_mut() {
            Some(run) => run.push(annotation),
            None => result.errors.push(error(
                &annotation,
                annotation.line,
                format!("{} must follow @api or @apiDoc", annotation.tag),
            )),
        }
    }

    for run in runs {
        if let Some(ignore) = run.iter().find(|a| a.tag == Tag::ApiIgnore) {
            debug!(
                "{}:{}: run ignored by @apiIgnore",
                ignore.file.display(),
                ignore.line
            );
            continue;
        }

        let entry = match run[0].tag {
            Tag::Api => interpret_api(&run).map(Entry::Api),
            _ => interpret_info(&run).map(Entry::Info),
        };
        match entry {
            Ok(entry) => result.entries.push(entry),
            Err(e) => result.errors.push(e),
        }
    }

    result
}

#[derive(Debug, Clone, Copy)]
enum Body {
    Request,
    Response(usize),
}

/// Interpretation state of an `@api` run
struct ApiRun {
    entry: ApiEntry,
    group: Option<String>,
    /// Response that a directly following `@apiParam` describes
    open_response: Option<usize>,
    /// Most recent request or response, target of `@apiExample`
    last_body: Option<Body>,
}

fn interpret_api(run: &[Annotation]) -> Result<ApiEntry, SyntaxError> {
    let head = &run[0];
    let fields = split_fields(&head.args, 3);

    let method_name = fields
        .first()
        .ok_or_else(|| error(head, head.line, "@api is missing the HTTP method"))?;
    let method = HttpMethod::parse(method_name)
        .ok_or_else(|| error(head, head.line, format!("unknown HTTP method `{}`", method_name)))?;
    let path = fields
        .get(1)
        .ok_or_else(|| error(head, head.line, "@api is missing the path"))?;

    let mut state = ApiRun {
        entry: ApiEntry {
            summary: fields.get(2).map(|s| s.to_string()).unwrap_or_default(),
            location: location(head),
            ..ApiEntry::new(method, *path)
        },
        group: None,
        open_response: None,
        last_body: None,
    };
    state.apply_api_body(head)?;

    for annotation in &run[1..] {
        state.apply(annotation)?;
    }

    let mut entry = state.entry;
    entry.group = state.group.unwrap_or_default();
    Ok(entry)
}

impl ApiRun {
    fn apply(&mut self, annotation: &Annotation) -> Result<(), SyntaxError> {
        let open_response = self.open_response.take();

        match annotation.tag {
            Tag::Api | Tag::ApiDoc | Tag::ApiVersion | Tag::ApiLicense => {
                return Err(misplaced(annotation, "@api"));
            }
            Tag::ApiParam => {
                let params = parse_params(annotation)?;
                match open_response {
                    Some(index) => {
                        let response = &mut self.entry.responses[index];
                        check_fields(annotation, response.schema.as_ref(), &params)?;
                        response.fields.extend(params);
                    }
                    None => self.entry.params.extend(params),
                }
                self.open_response = open_response;
            }
            Tag::ApiQuery => self.entry.queries.extend(parse_params(annotation)?),
            Tag::ApiHeader => self.entry.headers.extend(parse_params(annotation)?),
            Tag::ApiSuccess | Tag::ApiError => {
                self.entry.responses.push(parse_response(annotation)?);
                let index = self.entry.responses.len() - 1;
                self.open_response = Some(index);
                self.last_body = Some(Body::Response(index));
            }
            Tag::ApiRequest => {
                if self.entry.request.is_some() {
                    return Err(duplicate(annotation));
                }
                self.entry.request = Some(parse_request(annotation)?);
                self.last_body = Some(Body::Request);
            }
            Tag::ApiBaseUrl => self.entry.servers.push(parse_server(annotation)?),
            Tag::ApiGroup => set_group(&mut self.group, annotation)?,
            Tag::ApiIgnore => {}
            Tag::ApiContent => set_content(&mut self.entry.content_type, annotation)?,
            Tag::ApiExample => {
                let example = parse_example(annotation)?;
                match self.last_body {
                    Some(Body::Request) => {
                        if let Some(request) = self.entry.request.as_mut() {
                            request.examples.push(example);
                        }
                    }
                    Some(Body::Response(index)) => self.entry.responses[index].examples.push(example),
                    None => {
                        return Err(error(
                            annotation,
                            annotation.line,
                            "@apiExample must follow @apiRequest, @apiSuccess or @apiError",
                        ))
                    }
                }
            }
        }

        Ok(())
    }

    /// Outline keys under the `@api` line
    fn apply_api_body(&mut self, head: &Annotation) -> Result<(), SyntaxError> {
        for (key, node) in parse_outline(head)? {
            match key.as_str() {
                "description" => self.entry.description = Some(scalar(head, &key, &node)?),
                "tags" => self.entry.tags = names(head, &key, &node)?,
                "deprecated" => {
                    self.entry.deprecated = match scalar(head, &key, &node)?.as_str() {
                        "true" => true,
                        "false" => false,
                        other => {
                            return Err(error(
                                head,
                                key_line(head, &key),
                                format!("deprecated must be true or false, found `{}`", other),
                            ))
                        }
                    }
                }
                "operationId" => self.entry.operation_id = Some(scalar(head, &key, &node)?),
                _ => return Err(unknown_key(head, &key)),
            }
        }
        Ok(())
    }
}

fn interpret_info(run: &[Annotation]) -> Result<InfoEntry, SyntaxError> {
    let mut info = InfoEntry {
        location: location(&run[0]),
        ..InfoEntry::default()
    };
    let mut group = None;

    for annotation in run {
        match annotation.tag {
            Tag::ApiDoc => {
                if annotation.args.is_empty() {
                    return Err(error(annotation, annotation.line, "@apiDoc is missing the title"));
                }
                info.title = annotation.args.clone();
                apply_doc_body(&mut info, annotation)?;
            }
            Tag::ApiVersion => {
                if info.version.is_some() {
                    return Err(duplicate(annotation));
                }
                no_body(annotation)?;
                info.version = Some(single_word(annotation, "version")?);
            }
            Tag::ApiLicense => {
                if info.license.is_some() {
                    return Err(duplicate(annotation));
                }
                no_body(annotation)?;
                let fields = split_fields(&annotation.args, 2);
                let name = fields
                    .first()
                    .ok_or_else(|| error(annotation, annotation.line, "@apiLicense is missing the name"))?;
                info.license = Some(License {
                    name: name.to_string(),
                    url: fields.get(1).map(|s| s.to_string()),
                });
            }
            Tag::ApiBaseUrl => info.servers.push(parse_server(annotation)?),
            Tag::ApiGroup => set_group(&mut group, annotation)?,
            Tag::ApiIgnore => {}
            Tag::ApiContent => set_content(&mut info.content_type, annotation)?,
            Tag::Api
            | Tag::ApiParam
            | Tag::ApiQuery
            | Tag::ApiHeader
            | Tag::ApiSuccess
            | Tag::ApiError
            | Tag::ApiRequest
            | Tag::ApiExample => return Err(misplaced(annotation, "@apiDoc")),
        }
    }

    info.group = group.unwrap_or_default();
    Ok(info)
}

/// Outline keys under the `@apiDoc` line
fn apply_doc_body(info: &mut InfoEntry, annotation: &Annotation) -> Result<(), SyntaxError> {
    for (key, node) in parse_outline(annotation)? {
        match key.as_str() {
            "description" => info.description = Some(scalar(annotation, &key, &node)?),
            "termsOfService" => info.terms_of_service = Some(scalar(annotation, &key, &node)?),
            "contact" => {
                let mut contact = Contact::default();
                for (field, value) in mapping(annotation, &key, &node)? {
                    let value = Some(scalar(annotation, field, value)?);
                    match field.as_str() {
                        "name" => contact.name = value,
                        "url" => contact.url = value,
                        "email" => contact.email = value,
                        _ => return Err(unknown_key(annotation, field)),
                    }
                }
                info.contact = Some(contact);
            }
            "tags" => info.tags = doc_tags(annotation, &node)?,
            "externalDocs" => info.external_docs = Some(external_docs(annotation, &key, &node)?),
            "security" => {
                for name in names(annotation, &key, &node)? {
                    let mut words = name.split_whitespace();
                    let mut requirement = SecurityRequirement::new();
                    if let Some(scheme) = words.next() {
                        requirement.insert(scheme.to_string(), words.map(str::to_string).collect());
                    }
                    info.security.push(requirement);
                }
            }
            "securitySchemes" => {
                for (name, value) in mapping(annotation, &key, &node)? {
                    let scheme = security_scheme(annotation, name, value)?;
                    info.security_schemes.insert(name.clone(), scheme);
                }
            }
            _ => return Err(unknown_key(annotation, &key)),
        }
    }
    Ok(())
}

/// `tags` of `@apiDoc`: either a list of names or a mapping of name -> description
fn doc_tags(annotation: &Annotation, node: &Node) -> Result<Vec<DocTag>, SyntaxError> {
    let Node::Map(entries) = node else {
        return Ok(names(annotation, "tags", node)?
            .into_iter()
            .map(|name| DocTag {
                name,
                ..DocTag::default()
            })
            .collect());
    };

    let mut tags = Vec::new();
    for (name, value) in entries {
        let mut tag = DocTag {
            name: name.clone(),
            ..DocTag::default()
        };
        match value {
            Node::Scalar(description) => tag.description = Some(description.clone()),
            Node::Map(fields) => {
                for (field, value) in fields {
                    match field.as_str() {
                        "description" => tag.description = Some(scalar(annotation, field, value)?),
                        "externalDocs" => tag.external_docs = Some(external_docs(annotation, field, value)?),
                        _ => return Err(unknown_key(annotation, field)),
                    }
                }
            }
            Node::List(_) => return Err(wrong_shape(annotation, name, "a description or a mapping", value)),
        }
        tags.push(tag);
    }
    Ok(tags)
}

fn external_docs(annotation: &Annotation, key: &str, node: &Node) -> Result<ExternalDocs, SyntaxError> {
    let mut docs = ExternalDocs::default();
    for (field, value) in mapping(annotation, key, node)? {
        match field.as_str() {
            "url" => docs.url = scalar(annotation, field, value)?,
            "description" => docs.description = Some(scalar(annotation, field, value)?),
            _ => return Err(unknown_key(annotation, field)),
        }
    }
    Ok(docs)
}

fn security_scheme(annotation: &Annotation, key: &str, node: &Node) -> Result<SecurityScheme, SyntaxError> {
    let mut scheme = SecurityScheme::default();
    for (field, value) in mapping(annotation, key, node)? {
        let text = scalar(annotation, field, value)?;
        match field.as_str() {
            "type" => scheme.scheme_type = text,
            "description" => scheme.description = Some(text),
            "name" => scheme.name = Some(text),
            "in" => scheme.location = Some(text),
            "scheme" => scheme.scheme = Some(text),
            "bearerFormat" => scheme.bearer_format = Some(text),
            "openIdConnectUrl" => scheme.open_id_connect_url = Some(text),
            _ => return Err(unknown_key(annotation, field)),
        }
    }
    Ok(scheme)
}

/// Each non-blank line of the tag is `name type description...`
fn parse_params(annotation: &Annotation) -> Result<Vec<Param>, SyntaxError> {
    let lines = std::iter::once((annotation.line, annotation.args.as_str())).chain(
        annotation
            .body
            .iter()
            .enumerate()
            .map(|(index, line)| (annotation.body_line(index), line.as_str())),
    );

    let mut params = Vec::new();
    for (line, text) in lines {
        if text.trim().is_empty() {
            continue;
        }
        let fields = split_fields(text, 3);
        if fields.len() < 3 {
            return Err(error(
                annotation,
                line,
                format!("{} expects `name type description`, found `{}`", annotation.tag, text.trim()),
            ));
        }
        if !Schema::is_type_name(fields[1]) {
            return Err(error(
                annotation,
                line,
                format!("unknown type `{}` for `{}`", fields[1], fields[0]),
            ));
        }
        params.push(Param {
            name: fields[0].to_string(),
            type_name: fields[1].to_string(),
            description: fields[2].to_string(),
        });
    }

    if params.is_empty() {
        return Err(error(annotation, annotation.line, format!("{} declares nothing", annotation.tag)));
    }
    Ok(params)
}

/// Response fields are merged into the declared schema, so it has to be
/// an object (or an array of objects) that lacks them.
fn check_fields(annotation: &Annotation, schema: Option<&Schema>, params: &[Param]) -> Result<(), SyntaxError> {
    let target = match schema {
        Some(schema) if schema.schema_type.as_deref() == Some("array") => schema.items.as_deref(),
        other => other,
    };
    let Some(target) = target else {
        return Ok(());
    };

    if let Some(schema_type) = target.schema_type.as_deref().filter(|t| *t != "object") {
        return Err(error(
            annotation,
            annotation.line,
            format!("{} cannot add fields to a `{}` schema", annotation.tag, schema_type),
        ));
    }
    match params.iter().find(|p| target.properties.contains_key(&p.name)) {
        Some(param) => Err(error(
            annotation,
            annotation.line,
            format!("field `{}` is already declared by the schema", param.name),
        )),
        None => Ok(()),
    }
}

/// `@apiSuccess` / `@apiError`: `code [description]` plus a body outline
fn parse_response(annotation: &Annotation) -> Result<Response, SyntaxError> {
    let fields = split_fields(&annotation.args, 2);
    let status = fields
        .first()
        .ok_or_else(|| error(annotation, annotation.line, format!("{} is missing the status code", annotation.tag)))?;

    let valid = if *status == "default" {
        annotation.tag == Tag::ApiSuccess
    } else {
        status.len() == 3 && status.parse::<u16>().is_ok_and(|code| (100..=599).contains(&code))
    };
    if !valid {
        return Err(error(
            annotation,
            annotation.line,
            format!("invalid status code `{}`", status),
        ));
    }

    let body = parse_body(annotation)?;
    let inline = fields.get(1).map(|s| s.to_string());
    let description = match (inline, body.description) {
        (Some(_), Some(_)) => {
            return Err(error(
                annotation,
                key_line(annotation, "description"),
                "description is given both on the tag line and in the body",
            ))
        }
        (Some(d), None) | (None, Some(d)) => d,
        (None, None) => String::new(),
    };

    Ok(Response {
        status: status.to_string(),
        description,
        media_types: body.media_types,
        fields: Vec::new(),
        schema: body.schema,
        examples: Vec::new(),
    })
}

/// `@apiRequest [media-type]` plus a body outline
fn parse_request(annotation: &Annotation) -> Result<Request, SyntaxError> {
    let body = parse_body(annotation)?;
    let mut media_types = Vec::new();
    if !annotation.args.is_empty() {
        media_types.push(single_word(annotation, "media type")?);
    }
    for media in body.media_types {
        if !media_types.contains(&media) {
            media_types.push(media);
        }
    }

    Ok(Request {
        media_types,
        description: body.description,
        schema: body.schema,
        examples: Vec::new(),
    })
}

#[derive(Default)]
struct BodyFields {
    description: Option<String>,
    media_types: Vec<String>,
    schema: Option<Schema>,
}

fn parse_body(annotation: &Annotation) -> Result<BodyFields, SyntaxError> {
    let mut body = BodyFields::default();
    for (key, node) in parse_outline(annotation)? {
        match key.as_str() {
            "description" => body.description = Some(scalar(annotation, &key, &node)?),
            "content" => body.media_types = names(annotation, &key, &node)?,
            "schema" => body.schema = Some(schema(annotation, &node)?),
            _ => return Err(unknown_key(annotation, &key)),
        }
    }
    Ok(body)
}

/// A schema outline; a bare value is shorthand for `type: value`
fn schema(annotation: &Annotation, node: &Node) -> Result<Schema, SyntaxError> {
    let entries = match node {
        Node::Scalar(type_name) => return Ok(Schema::from_type_name(type_name)),
        Node::Map(entries) => entries,
        Node::List(_) => return Err(wrong_shape(annotation, "schema", "a mapping", node)),
    };

    let mut schema = Schema::default();
    for (key, value) in entries {
        match key.as_str() {
            "type" => {
                let named = Schema::from_type_name(&scalar(annotation, key, value)?);
                schema.schema_type = named.schema_type;
                schema.format = named.format;
                if schema.items.is_none() {
                    schema.items = named.items;
                }
            }
            "description" => schema.description = Some(scalar(annotation, key, value)?),
            "properties" => {
                for (name, property) in mapping(annotation, key, value)? {
                    schema.properties.insert(name.clone(), self::schema(annotation, property)?);
                }
            }
            "items" => schema.items = Some(Box::new(self::schema(annotation, value)?)),
            _ => return Err(unknown_key(annotation, key)),
        }
    }

    if schema.schema_type.is_none() && !schema.properties.is_empty() {
        schema.schema_type = Some("object".to_string());
    }
    Ok(schema)
}

/// `@apiBaseURL url [description]`, with optional `variables` in the body
fn parse_server(annotation: &Annotation) -> Result<Server, SyntaxError> {
    let fields = split_fields(&annotation.args, 2);
    let url = fields
        .first()
        .ok_or_else(|| error(annotation, annotation.line, "@apiBaseURL is missing the URL"))?;
    let mut server = Server {
        url: url.to_string(),
        description: fields.get(1).map(|s| s.to_string()),
        ..Server::default()
    };

    for (key, node) in parse_outline(annotation)? {
        if key != "variables" {
            return Err(unknown_key(annotation, &key));
        }
        for (name, value) in mapping(annotation, &key, &node)? {
            let mut variable = ServerVariable::default();
            for (field, value) in mapping(annotation, name, value)? {
                match field.as_str() {
                    "default" => variable.default = scalar(annotation, field, value)?,
                    "description" => variable.description = Some(scalar(annotation, field, value)?),
                    "enum" => variable.enum_values = names(annotation, field, value)?,
                    _ => return Err(unknown_key(annotation, field)),
                }
            }
            server.variables.insert(name.clone(), variable);
        }
    }

    Ok(server)
}

/// `@apiExample name [format]` followed by the literal example
fn parse_example(annotation: &Annotation) -> Result<Example, SyntaxError> {
    let fields = split_fields(&annotation.args, 2);
    let name = fields
        .first()
        .ok_or_else(|| error(annotation, annotation.line, "@apiExample is missing the name"))?;
    if annotation.body.iter().all(|l| l.trim().is_empty()) {
        return Err(error(annotation, annotation.line, "@apiExample has no content"));
    }

    let indent = annotation
        .body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    let value = annotation
        .body
        .iter()
        .map(|l| l.get(indent..).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Example {
        name: name.to_string(),
        format: fields.get(1).map(|s| s.to_string()),
        value,
    })
}

fn set_group(slot: &mut Option<String>, annotation: &Annotation) -> Result<(), SyntaxError> {
    if slot.is_some() {
        return Err(duplicate(annotation));
    }
    no_body(annotation)?;
    *slot = Some(single_word(annotation, "group name")?);
    Ok(())
}

fn set_content(slot: &mut Option<String>, annotation: &Annotation) -> Result<(), SyntaxError> {
    if slot.is_some() {
        return Err(duplicate(annotation));
    }
    no_body(annotation)?;
    *slot = Some(single_word(annotation, "media type")?);
    Ok(())
}

/// The tag line must hold exactly one word
fn single_word(annotation: &Annotation, what: &str) -> Result<String, SyntaxError> {
    let mut words = annotation.args.split_whitespace();
    match (words.next(), words.next()) {
        (Some(word), None) => Ok(word.to_string()),
        (None, _) => Err(error(
            annotation,
            annotation.line,
            format!("{} is missing the {}", annotation.tag, what),
        )),
        (Some(_), Some(_)) => Err(error(
            annotation,
            annotation.line,
            format!("{} takes a single {}, found `{}`", annotation.tag, what, annotation.args),
        )),
    }
}

fn no_body(annotation: &Annotation) -> Result<(), SyntaxError> {
    match annotation.body.iter().position(|l| !l.trim().is_empty()) {
        Some(index) => Err(error(
            annotation,
            annotation.body_line(index),
            format!("{} takes no content lines", annotation.tag),
        )),
        None => Ok(()),
    }
}

fn parse_outline(annotation: &Annotation) -> Result<Vec<(String, Node)>, SyntaxError> {
    outline::parse(&annotation.body).map_err(|e| {
        error(
            annotation,
            annotation.body_line(e.line),
            format!("{}: {}", annotation.tag, e.message),
        )
    })
}

fn scalar(annotation: &Annotation, key: &str, node: &Node) -> Result<String, SyntaxError> {
    node.as_scalar()
        .map(str::to_string)
        .ok_or_else(|| wrong_shape(annotation, key, "a value", node))
}

fn mapping<'n>(annotation: &Annotation, key: &str, node: &'n Node) -> Result<&'n [(String, Node)], SyntaxError> {
    match node {
        Node::Map(entries) => Ok(entries),
        _ => Err(wrong_shape(annotation, key, "a mapping", node)),
    }
}

/// A list of values, or a single comma-separated value
fn names(annotation: &Annotation, key: &str, node: &Node) -> Result<Vec<String>, SyntaxError> {
    match node {
        Node::Scalar(value) => Ok(value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()),
        Node::List(items) => items.iter().map(|item| scalar(annotation, key, item)).collect(),
        Node::Map(_) => Err(wrong_shape(annotation, key, "a value or a list", node)),
    }
}

/// Splits `text` into at most `n` whitespace-separated fields; the last field
/// keeps the rest of the text.
fn split_fields(text: &str, n: usize) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        if fields.len() + 1 == n {
            fields.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(at) => {
                fields.push(&rest[..at]);
                rest = rest[at..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }

    fields
}

/// Best-effort line of `key` within the annotation body
fn key_line(annotation: &Annotation, key: &str) -> usize {
    let pattern = format!("{}:", key);
    annotation
        .body
        .iter()
        .position(|l| l.trim_start().trim_start_matches("- ").starts_with(&pattern))
        .map(|index| annotation.body_line(index))
        .unwrap_or(annotation.line)
}

fn location(annotation: &Annotation) -> SourceLocation {
    SourceLocation {
        file: annotation.file.clone(),
        line: annotation.line,
    }
}

fn error(annotation: &Annotation, line: usize, message: impl Into<String>) -> SyntaxError {
    SyntaxError::new(&annotation.file, line, message)
}

fn misplaced(annotation: &Annotation, run: &str) -> SyntaxError {
    error(
        annotation,
        annotation.line,
        format!("{} is not allowed in an {} run", annotation.tag, run),
    )
}

fn duplicate(annotation: &Annotation) -> SyntaxError {
    error(
        annotation,
        annotation.line,
        format!("{} may appear only once per run", annotation.tag),
    )
}

fn unknown_key(annotation: &Annotation, key: &str) -> SyntaxError {
    error(
        annotation,
        key_line(annotation, key),
        format!("unknown key `{}` in {}", key, annotation.tag),
    )
}

fn wrong_shape(annotation: &Annotation, key: &str, expected: &str, found: &Node) -> SyntaxError {
    error(
        annotation,
        key_line(annotation, key),
        format!("`{}` must be {}, found {}", key, expected, found.kind()),
    )
}
