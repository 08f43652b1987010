//! The OpenAPI 3.0 document model and the builder that fills it from entries.
//!
//! Every map in the model is a `BTreeMap`, so serializing the same entries
//! always produces byte-identical output.

use crate::entry::{ApiEntry, Entry, Example as ExampleEntry, HttpMethod, InfoEntry, Param};
use crate::error::ValidationError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version written to the `openapi` field
pub const OPENAPI_VERSION: &str = "3.0.3";

/// Media type used when neither the body, the run nor the document names one
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Complete OpenAPI document of one group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// API paths
    pub paths: BTreeMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
    /// API version, a semantic version
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// OpenAPI Server object; `url` may contain `{name}` templates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, ServerVariable>,
}

/// Substitution for one `{name}` template of a server URL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerVariable {
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object - all operations of a single path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// The operation slot of `method`
    pub fn operation_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Trace => &mut self.trace,
        }
    }

    /// Declared operations keyed by their lower-case method name
    pub fn operations(&self) -> Vec<(&'static str, &Operation)> {
        [
            ("get", &self.get),
            ("put", &self.put),
            ("post", &self.post),
            ("delete", &self.delete),
            ("options", &self.options),
            ("head", &self.head),
            ("patch", &self.patch),
            ("trace", &self.trace),
        ]
        .into_iter()
        .filter_map(|(name, op)| op.as_ref().map(|op| (name, op)))
        .collect()
    }
}

/// OpenAPI Operation object - a single API operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Operation summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Operation description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Operation ID
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Parameters (path, query, header)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code or `default`
    pub responses: BTreeMap<String, Response>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query, header, cookie)
    #[serde(rename = "in")]
    pub location: String,
    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the parameter is required
    #[serde(default)]
    pub required: bool,
    /// Parameter schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(flatten)]
    pub style: Style,
}

/// Serialization style of a parameter, flattened into it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    #[serde(rename = "allowReserved", skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Request body description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Content types and their schemas
    pub content: BTreeMap<String, MediaType>,
    /// Whether the request body is required
    #[serde(default)]
    pub required: bool,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub examples: BTreeMap<String, Example>,
}

/// OpenAPI Example object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Example {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub value: serde_json::Value,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "int32", "int64", "float", "double")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties for object types
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Schema>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
}

impl Schema {
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    /// Maps a type name written in `@apiParam` and friends to a schema.
    ///
    /// # Arguments
    ///
    /// * `name` - a primitive alias (`int`, `bool`, `double`, ...), `object`,
    ///   or an array written `array.<item>` or `[]<item>`
    ///
    /// # Returns
    ///
    /// The schema for the name. Unrecognised names are kept verbatim as the
    /// schema type so validation can point at them.
    pub fn from_type_name(name: &str) -> Self {
        if let Some(item) = name.strip_prefix("array.").or_else(|| name.strip_prefix("[]")) {
            return Self {
                schema_type: Some("array".to_string()),
                items: Some(Box::new(Self::from_type_name(item))),
                ..Self::default()
            };
        }

        match primitive(name) {
            Some((schema_type, format)) => Self {
                schema_type: Some(schema_type.to_string()),
                format: format.map(str::to_string),
                ..Self::default()
            },
            None => Self {
                schema_type: Some(name.to_string()),
                ..Self::default()
            },
        }
    }

    /// Whether [`Schema::from_type_name`] knows `name`
    pub fn is_type_name(name: &str) -> bool {
        match name.strip_prefix("array.").or_else(|| name.strip_prefix("[]")) {
            Some(item) => Self::is_type_name(item),
            None => primitive(name).is_some(),
        }
    }

    /// Builds an object schema from response fields; `a.b` nests `b` under `a`.
    pub fn from_fields(fields: &[Param]) -> Self {
        let mut root = Self::of_type("object");
        root.add_fields(fields);
        root
    }

    /// Adds response fields as properties of this schema.
    ///
    /// Fields of an array schema describe its items. A schema without a type
    /// becomes an object.
    pub fn add_fields(&mut self, fields: &[Param]) {
        if self.schema_type.is_none() {
            self.schema_type = Some("object".to_string());
        }
        for field in fields {
            let segments: Vec<&str> = field.name.split('.').collect();
            insert_field(self, &segments, field);
        }
    }
}

fn primitive(name: &str) -> Option<(&'static str, Option<&'static str>)> {
    let mapped = match name.to_ascii_lowercase().as_str() {
        "int" | "integer" => ("integer", None),
        "int32" => ("integer", Some("int32")),
        "int64" => ("integer", Some("int64")),
        "number" => ("number", None),
        "float" => ("number", Some("float")),
        "double" => ("number", Some("double")),
        "str" | "string" => ("string", None),
        "bool" | "boolean" => ("boolean", None),
        "object" => ("object", None),
        "array" => ("array", None),
        "null" => ("null", None),
        _ => return None,
    };
    Some(mapped)
}

fn insert_field(parent: &mut Schema, segments: &[&str], field: &Param) {
    // children of an array describe its items
    let target = if parent.schema_type.as_deref() == Some("array") {
        parent
            .items
            .get_or_insert_with(|| Box::new(Schema::of_type("object")))
            .as_mut()
    } else {
        parent
    };

    match segments {
        [] => {}
        [name] => {
            let mut schema = Schema::from_type_name(&field.type_name);
            if !field.description.is_empty() {
                schema.description = Some(field.description.clone());
            }
            if let Some(existing) = target.properties.remove(*name) {
                schema.properties = existing.properties;
            }
            target.properties.insert(name.to_string(), schema);
        }
        [name, rest @ ..] => {
            let child = target
                .properties
                .entry(name.to_string())
                .or_insert_with(|| Schema::of_type("object"));
            insert_field(child, rest, field);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(rename = "securitySchemes", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

/// OpenAPI SecurityScheme object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// `apiKey`, `http`, `oauth2` or `openIdConnect`
    #[serde(rename = "type")]
    pub scheme_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Header, query or cookie name of an `apiKey` scheme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// HTTP authorization scheme of an `http` scheme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(rename = "openIdConnectUrl", skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,
}

/// Scheme name -> required scopes
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalDocs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
}

/// OpenAPI document builder for one group
pub struct OpenApiBuilder {
    info: Info,
    servers: Vec<Server>,
    /// Paths collection (URL path -> PathItem)
    paths: BTreeMap<String, PathItem>,
    security_schemes: BTreeMap<String, SecurityScheme>,
    security: Vec<SecurityRequirement>,
    tags: Vec<Tag>,
    external_docs: Option<ExternalDocs>,
    /// Document-wide `@apiContent`
    content_type: Option<String>,
}

impl OpenApiBuilder {
    /// Create an empty builder for `group`
    pub fn new(group: &str) -> Self {
        debug!("Initializing OpenApiBuilder for group {}", group);
        Self {
            info: Info::default(),
            servers: Vec::new(),
            paths: BTreeMap::new(),
            security_schemes: BTreeMap::new(),
            security: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
            content_type: None,
        }
    }

    /// Merges document metadata into the builder.
    ///
    /// Several info runs may contribute to one group (for instance an
    /// `@apiDoc` in one file and a version-led run in another), but each
    /// scalar field may only be set once.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the field that was set twice.
    pub fn add_info(&mut self, entry: &InfoEntry) -> Result<(), ValidationError> {
        debug!(
            "Adding info from {}:{}",
            entry.location.file.display(),
            entry.location.line
        );

        if !entry.title.is_empty() {
            if !self.info.title.is_empty() {
                return Err(ValidationError::new("info.title", "is declared more than once"));
            }
            self.info.title = entry.title.clone();
        }
        if let Some(version) = &entry.version {
            if !self.info.version.is_empty() {
                return Err(ValidationError::new("info.version", "is declared more than once"));
            }
            self.info.version = version.clone();
        }

        set_once(&mut self.info.description, &entry.description, "info.description")?;
        set_once(&mut self.info.terms_of_service, &entry.terms_of_service, "info.termsOfService")?;
        set_once(&mut self.info.contact, &entry.contact, "info.contact")?;
        set_once(&mut self.info.license, &entry.license, "info.license")?;
        set_once(&mut self.external_docs, &entry.external_docs, "externalDocs")?;
        set_once(&mut self.content_type, &entry.content_type, "@apiContent")?;

        self.servers.extend(entry.servers.iter().cloned());
        self.security.extend(entry.security.iter().cloned());
        for tag in &entry.tags {
            if self.tags.iter().any(|t| t.name == tag.name) {
                return Err(ValidationError::new(
                    format!("tags[{}]", tag.name),
                    "is declared more than once",
                ));
            }
            self.tags.push(tag.clone());
        }
        for (name, scheme) in &entry.security_schemes {
            if self.security_schemes.insert(name.clone(), scheme.clone()).is_some() {
                return Err(ValidationError::new(
                    format!("components.securitySchemes[{}]", name),
                    "is declared more than once",
                ));
            }
        }

        Ok(())
    }

    /// Add an operation to the document.
    ///
    /// Media types of bodies that name none fall back to the run's
    /// `@apiContent`, then the document's, then `application/json`. Add
    /// every info entry first so the document default is known.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` when the same method and path, or the
    /// same status within the operation, is declared twice. The first
    /// declaration is kept.
    pub fn add_api(&mut self, entry: &ApiEntry) -> Result<(), ValidationError> {
        debug!("Adding operation: {} {}", entry.method, entry.path);

        let path = Self::convert_path_format(&entry.path);
        let method = entry.method.as_str().to_ascii_lowercase();
        let field = format!("paths[{}].{}", path, method);

        if let Some(item) = self.paths.get(&path) {
            if item.operations().iter().any(|(name, _)| *name == method) {
                return Err(ValidationError::new(field, "is declared more than once"));
            }
        }

        let fallback = entry
            .content_type
            .clone()
            .or_else(|| self.content_type.clone())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let media_types = |declared: &[String]| -> Vec<String> {
            if declared.is_empty() {
                vec![fallback.clone()]
            } else {
                declared.to_vec()
            }
        };

        let mut parameters = Vec::new();
        parameters.extend(entry.params.iter().map(|p| parameter(p, "path")));
        parameters.extend(entry.queries.iter().map(|p| parameter(p, "query")));
        parameters.extend(entry.headers.iter().map(|p| parameter(p, "header")));

        let request_body = entry.request.as_ref().map(|request| {
            let content = media_content(&media_types(&request.media_types), request.schema.clone(), &request.examples);
            RequestBody {
                description: request.description.clone(),
                content,
                required: true,
            }
        });

        let mut responses = BTreeMap::new();
        for response in &entry.responses {
            let schema = match (&response.schema, response.fields.is_empty()) {
                (Some(schema), true) => Some(schema.clone()),
                (Some(schema), false) => {
                    let mut schema = schema.clone();
                    schema.add_fields(&response.fields);
                    Some(schema)
                }
                (None, false) => Some(Schema::from_fields(&response.fields)),
                (None, true) => None,
            };
            let content = if schema.is_some() || !response.examples.is_empty() || !response.media_types.is_empty() {
                media_content(&media_types(&response.media_types), schema, &response.examples)
            } else {
                BTreeMap::new()
            };

            let declared = Response {
                description: response.description.clone(),
                content,
            };
            if responses.insert(response.status.clone(), declared).is_some() {
                return Err(ValidationError::new(
                    format!("{}.responses[{}]", field, response.status),
                    "is declared more than once",
                ));
            }
        }

        let operation = Operation {
            tags: entry.tags.clone(),
            summary: non_empty(&entry.summary),
            description: entry.description.clone(),
            operation_id: entry.operation_id.clone(),
            parameters,
            request_body,
            responses,
            deprecated: entry.deprecated,
            servers: entry.servers.clone(),
        };

        *self.paths.entry(path).or_default().operation_mut(entry.method) = Some(operation);
        Ok(())
    }

    /// Convert path parameters from `:param` to OpenAPI `{param}` format
    fn convert_path_format(path: &str) -> String {
        path.split('/')
            .map(|part| match part.strip_prefix(':') {
                Some(name) => format!("{{{}}}", name),
                None => part.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Build the final OpenAPI document
    pub fn build(self) -> OpenApiDocument {
        let components = if self.security_schemes.is_empty() {
            None
        } else {
            Some(Components {
                security_schemes: self.security_schemes,
            })
        };

        OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            servers: self.servers,
            paths: self.paths,
            components,
            security: self.security,
            tags: self.tags,
            external_docs: self.external_docs,
        }
    }
}

/// Builds the document of one group from its entries.
///
/// Info entries are merged before any operation is added. Conflicts are
/// returned alongside the document rather than aborting it.
pub fn build_document(group: &str, entries: &[Entry]) -> (OpenApiDocument, Vec<ValidationError>) {
    let mut builder = OpenApiBuilder::new(group);
    let mut errors = Vec::new();

    for entry in entries {
        if let Entry::Info(info) = entry {
            if let Err(e) = builder.add_info(info) {
                errors.push(e);
            }
        }
    }
    for entry in entries {
        if let Entry::Api(api) = entry {
            if let Err(e) = builder.add_api(api) {
                errors.push(e);
            }
        }
    }

    (builder.build(), errors)
}

fn set_once<T: Clone>(slot: &mut Option<T>, value: &Option<T>, field: &str) -> Result<(), ValidationError> {
    if let Some(value) = value {
        if slot.is_some() {
            return Err(ValidationError::new(field, "is declared more than once"));
        }
        *slot = Some(value.clone());
    }
    Ok(())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parameter(param: &Param, location: &str) -> Parameter {
    let schema = Schema::from_type_name(&param.type_name);
    let style = if location == "query" && schema.schema_type.as_deref() == Some("array") {
        Style {
            style: Some("form".to_string()),
            explode: Some(true),
            allow_reserved: None,
        }
    } else {
        Style::default()
    };

    Parameter {
        name: param.name.clone(),
        location: location.to_string(),
        description: non_empty(&param.description),
        required: location == "path",
        schema: Some(schema),
        style,
    }
}

/// One media type object per name; each example goes to the media type it
/// is written in, or to all of them when its format matches none.
fn media_content(
    media_types: &[String],
    schema: Option<Schema>,
    examples: &[ExampleEntry],
) -> BTreeMap<String, MediaType> {
    let mut content: BTreeMap<String, MediaType> = media_types
        .iter()
        .map(|name| {
            let media = MediaType {
                schema: schema.clone(),
                examples: BTreeMap::new(),
            };
            (name.clone(), media)
        })
        .collect();

    for example in examples {
        let targets: Vec<String> = match &example.format {
            Some(format) if content.contains_key(format) => vec![format.clone()],
            _ => content.keys().cloned().collect(),
        };
        for target in targets {
            if let Some(media) = content.get_mut(&target) {
                media.examples.insert(
                    example.name.clone(),
                    Example {
                        summary: None,
                        value: example_value(&target, &example.value),
                    },
                );
            }
        }
    }

    content
}

/// JSON media types carry parsed examples; anything else stays a string
fn example_value(media_type: &str, raw: &str) -> serde_json::Value {
    if media_type.contains("json") {
        if let Ok(value) = serde_json::from_str(raw) {
            return value;
        }
    }
    serde_json::Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{Request, Response as ResponseEntry, SourceLocation};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn api(method: HttpMethod, path: &str) -> ApiEntry {
        ApiEntry {
            summary: "summary".to_string(),
            location: SourceLocation {
                file: PathBuf::from("api.go"),
                line: 1,
            },
            ..ApiEntry::new(method, path)
        }
    }

    fn param(name: &str, type_name: &str, description: &str) -> Param {
        Param {
            name: name.to_string(),
            type_name: type_name.to_string(),
            description: description.to_string(),
        }
    }

    fn response(status: &str) -> ResponseEntry {
        ResponseEntry::new(status, "ok")
    }

    #[test]
    fn test_schema_from_type_name() {
        assert_eq!(Schema::from_type_name("int"), Schema::of_type("integer"));
        assert_eq!(Schema::from_type_name("bool"), Schema::of_type("boolean"));
        assert_eq!(Schema::from_type_name("double").format.as_deref(), Some("double"));

        let array = Schema::from_type_name("array.string");
        assert_eq!(array.schema_type.as_deref(), Some("array"));
        assert_eq!(array.items.as_deref(), Some(&Schema::of_type("string")));
        assert_eq!(Schema::from_type_name("[]int").items.as_deref(), Some(&Schema::of_type("integer")));

        assert_eq!(Schema::from_type_name("uuid").schema_type.as_deref(), Some("uuid"));
    }

    #[test]
    fn test_known_type_names() {
        assert!(Schema::is_type_name("int64"));
        assert!(Schema::is_type_name("String"));
        assert!(Schema::is_type_name("[]array.bool"));
        assert!(!Schema::is_type_name("uuid"));
        assert!(!Schema::is_type_name("array.strnig"));
    }

    #[test]
    fn test_schema_from_dotted_fields() {
        let schema = Schema::from_fields(&[
            param("id", "int", "identifier"),
            param("owner", "object", "owner"),
            param("owner.name", "string", "owner name"),
            param("items", "array.object", "lines"),
            param("items.sku", "string", ""),
        ]);

        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert_eq!(schema.properties["id"].description.as_deref(), Some("identifier"));
        assert_eq!(
            schema.properties["owner"].properties["name"].schema_type.as_deref(),
            Some("string")
        );
        let items = schema.properties["items"].items.as_ref().unwrap();
        assert_eq!(items.properties["sku"], Schema::of_type("string"));
    }

    #[test]
    fn test_fields_extend_declared_schema() {
        let mut declared = Schema::of_type("object");
        declared.properties.insert("id".to_string(), Schema::of_type("integer"));

        let mut entry = api(HttpMethod::Get, "/users");
        let mut ok = response("200");
        ok.schema = Some(declared);
        ok.fields = vec![param("name", "string", "user name")];
        entry.responses.push(ok);

        let mut list = response("206");
        list.schema = Some(Schema::from_type_name("array.object"));
        list.fields = vec![param("id", "int", "")];
        entry.responses.push(list);

        let mut builder = OpenApiBuilder::new("index");
        builder.add_api(&entry).unwrap();
        let doc = builder.build();
        let responses = &doc.paths["/users"].get.as_ref().unwrap().responses;

        let schema = responses["200"].content[DEFAULT_CONTENT_TYPE].schema.as_ref().unwrap();
        assert_eq!(
            schema.properties.keys().cloned().collect::<Vec<_>>(),
            vec!["id".to_string(), "name".to_string()]
        );
        assert_eq!(schema.properties["name"].description.as_deref(), Some("user name"));

        let schema = responses["206"].content[DEFAULT_CONTENT_TYPE].schema.as_ref().unwrap();
        assert_eq!(schema.schema_type.as_deref(), Some("array"));
        assert_eq!(schema.items.as_ref().unwrap().properties["id"], Schema::of_type("integer"));
    }

    #[test]
    fn test_convert_path_format() {
        assert_eq!(OpenApiBuilder::convert_path_format("/users/:id/posts/:post_id"), "/users/{id}/posts/{post_id}");
        assert_eq!(OpenApiBuilder::convert_path_format("/users/{id}"), "/users/{id}");
        assert_eq!(OpenApiBuilder::convert_path_format("/users/list"), "/users/list");
    }

    #[test]
    fn test_add_api_parameters() {
        let mut entry = api(HttpMethod::Get, "/users/:id");
        entry.params.push(param("id", "int", "user id"));
        entry.queries.push(param("fields", "array.string", "fields"));
        entry.headers.push(param("X-Token", "string", ""));
        entry.responses.push(response("200"));

        let mut builder = OpenApiBuilder::new("index");
        builder.add_api(&entry).unwrap();
        let doc = builder.build();

        let op = doc.paths["/users/{id}"].get.as_ref().unwrap();
        assert_eq!(op.parameters.len(), 3);
        assert_eq!(op.parameters[0].location, "path");
        assert!(op.parameters[0].required);
        assert_eq!(op.parameters[1].style.style.as_deref(), Some("form"));
        assert!(!op.parameters[1].required);
        assert_eq!(op.parameters[2].location, "header");
        assert_eq!(op.parameters[2].description, None);
        assert!(op.responses["200"].content.is_empty());
    }

    #[test]
    fn test_media_type_fallback_chain() {
        let mut builder = OpenApiBuilder::new("index");
        builder
            .add_info(&InfoEntry {
                title: "t".to_string(),
                content_type: Some("application/xml".to_string()),
                ..InfoEntry::default()
            })
            .unwrap();

        let mut own = api(HttpMethod::Post, "/a");
        own.request = Some(Request {
            media_types: vec!["text/plain".to_string()],
            ..Request::default()
        });
        let mut run = api(HttpMethod::Post, "/b");
        run.content_type = Some("application/yaml".to_string());
        run.request = Some(Request::default());
        let mut doc_default = api(HttpMethod::Post, "/c");
        doc_default.request = Some(Request::default());

        builder.add_api(&own).unwrap();
        builder.add_api(&run).unwrap();
        builder.add_api(&doc_default).unwrap();
        let doc = builder.build();

        let media = |path: &str| -> Vec<String> {
            let op = doc.paths[path].post.as_ref().unwrap();
            op.request_body.as_ref().unwrap().content.keys().cloned().collect()
        };
        assert_eq!(media("/a"), vec!["text/plain"]);
        assert_eq!(media("/b"), vec!["application/yaml"]);
        assert_eq!(media("/c"), vec!["application/xml"]);

        let mut plain = OpenApiBuilder::new("index");
        plain.add_api(&doc_default).unwrap();
        let doc = plain.build();
        assert!(doc.paths["/c"].post.as_ref().unwrap().request_body.as_ref().unwrap().content.contains_key(DEFAULT_CONTENT_TYPE));
    }

    #[test]
    fn test_examples_follow_their_format() {
        let mut entry = api(HttpMethod::Get, "/x");
        let mut ok = response("200");
        ok.media_types = vec!["application/json".to_string(), "application/xml".to_string()];
        ok.examples = vec![
            ExampleEntry {
                name: "json".to_string(),
                format: Some("application/json".to_string()),
                value: "{\"id\": 1}".to_string(),
            },
            ExampleEntry {
                name: "any".to_string(),
                format: None,
                value: "plain".to_string(),
            },
        ];
        entry.responses.push(ok);

        let mut builder = OpenApiBuilder::new("index");
        builder.add_api(&entry).unwrap();
        let doc = builder.build();
        let content = &doc.paths["/x"].get.as_ref().unwrap().responses["200"].content;

        assert_eq!(content["application/json"].examples["json"].value, serde_json::json!({"id": 1}));
        assert!(!content["application/xml"].examples.contains_key("json"));
        assert_eq!(content["application/xml"].examples["any"].value, serde_json::json!("plain"));
    }

    #[test]
    fn test_duplicate_operation_is_rejected() {
        let mut builder = OpenApiBuilder::new("index");
        builder.add_api(&api(HttpMethod::Get, "/users/:id")).unwrap();
        builder.add_api(&api(HttpMethod::Post, "/users/:id")).unwrap();

        let err = builder.add_api(&api(HttpMethod::Get, "/users/{id}")).unwrap_err();
        assert_eq!(err.field, "paths[/users/{id}].get");
    }

    #[test]
    fn test_duplicate_status_is_rejected() {
        let mut entry = api(HttpMethod::Get, "/x");
        entry.responses.push(response("200"));
        entry.responses.push(response("200"));

        let err = OpenApiBuilder::new("index").add_api(&entry).unwrap_err();
        assert_eq!(err.field, "paths[/x].get.responses[200]");
    }

    #[test]
    fn test_info_merges_across_runs() {
        let mut builder = OpenApiBuilder::new("index");
        builder
            .add_info(&InfoEntry {
                title: "Users".to_string(),
                ..InfoEntry::default()
            })
            .unwrap();
        builder
            .add_info(&InfoEntry {
                version: Some("1.2.0".to_string()),
                ..InfoEntry::default()
            })
            .unwrap();

        let err = builder
            .add_info(&InfoEntry {
                title: "Other".to_string(),
                ..InfoEntry::default()
            })
            .unwrap_err();
        assert_eq!(err.field, "info.title");

        let doc = builder.build();
        assert_eq!(doc.info.title, "Users");
        assert_eq!(doc.info.version, "1.2.0");
        assert_eq!(doc.openapi, OPENAPI_VERSION);
        assert!(doc.components.is_none());
    }

    #[test]
    fn test_build_document_adds_info_first() {
        let mut entry = api(HttpMethod::Post, "/x");
        entry.request = Some(Request::default());
        let info = InfoEntry {
            title: "t".to_string(),
            content_type: Some("text/csv".to_string()),
            ..InfoEntry::default()
        };

        let (doc, errors) = build_document("index", &[Entry::Api(entry), Entry::Info(info)]);
        assert!(errors.is_empty());
        let body = doc.paths["/x"].post.as_ref().unwrap().request_body.as_ref().unwrap();
        assert!(body.content.contains_key("text/csv"));
    }

    #[test]
    fn test_serialized_field_names() {
        let mut entry = api(HttpMethod::Get, "/x");
        entry.operation_id = Some("getX".to_string());
        entry.deprecated = true;
        entry.responses.push(response("default"));
        let mut builder = OpenApiBuilder::new("index");
        builder.add_api(&entry).unwrap();

        let json = serde_json::to_value(builder.build()).unwrap();
        let op = &json["paths"]["/x"]["get"];
        assert_eq!(op["operationId"], "getX");
        assert_eq!(op["deprecated"], true);
        assert_eq!(op["responses"]["default"]["description"], "ok");
        assert!(json.get("components").is_none());
    }
}
