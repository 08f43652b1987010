//! Structural validation of built documents.
//!
//! Every record of the document model implements [`Validate`]. A record
//! checks its own fields and then its children, prefixing a child's error
//! with the child's field name, so an error surfacing from the document
//! carries a full path such as `paths[/users].get.responses[200].description`.
//! Validation stops at the first failure.

use crate::error::ValidationError;
use crate::openapi::{
    Contact, ExternalDocs, Info, License, MediaType, OpenApiDocument, Operation, Parameter,
    PathItem, RequestBody, Response, Schema, SecurityScheme, Server, ServerVariable, Style, Tag,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use url::Url;

/// Semantic Versioning 2.0.0
static SEMVER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    )
    .unwrap()
});

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").unwrap());

/// `{name}` templates of a server URL
static TEMPLATE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

const STYLES: [&str; 7] = [
    "matrix",
    "label",
    "form",
    "simple",
    "spaceDelimited",
    "pipeDelimited",
    "deepObject",
];

const LOCATIONS: [&str; 4] = ["path", "query", "header", "cookie"];

const SCHEMA_TYPES: [&str; 7] = ["object", "array", "string", "integer", "number", "boolean", "null"];

const SECURITY_TYPES: [&str; 4] = ["apiKey", "http", "oauth2", "openIdConnect"];

/// A record that can check its own structure.
pub trait Validate {
    /// # Errors
    ///
    /// Returns the first violation found, with `field` relative to `self`.
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Whether `value` is a semantic version
pub fn is_semver(value: &str) -> bool {
    SEMVER_REGEX.is_match(value)
}

pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// Whether `value` is an absolute URL once template braces are removed
pub fn is_url(value: &str) -> bool {
    let stripped: String = value.chars().filter(|c| *c != '{' && *c != '}').collect();
    Url::parse(&stripped).is_ok()
}

fn validate_all<'a, T, I>(items: I, prefix: &str) -> Result<(), ValidationError>
where
    T: Validate + 'a,
    I: IntoIterator<Item = (String, &'a T)>,
{
    for (key, item) in items {
        item.validate()
            .map_err(|e| e.prefixed(&format!("[{}]", key)).prefixed(prefix))?;
    }
    Ok(())
}

fn indexed<T>(items: &[T]) -> impl Iterator<Item = (String, &T)> {
    items.iter().enumerate().map(|(i, item)| (i.to_string(), item))
}

impl Validate for OpenApiDocument {
    fn validate(&self) -> Result<(), ValidationError> {
        if !is_semver(&self.openapi) {
            return Err(ValidationError::invalid_format("openapi"));
        }
        self.info.validate().map_err(|e| e.prefixed("info"))?;
        validate_all(indexed(&self.servers), "servers")?;

        if self.paths.is_empty() {
            return Err(ValidationError::required("paths"));
        }
        for (path, item) in &self.paths {
            let field = format!("paths[{}]", path);
            if !path.starts_with('/') {
                return Err(ValidationError::new(field, "must start with `/`"));
            }
            item.validate().map_err(|e| e.prefixed(&field))?;
            check_path_parameters(path, item).map_err(|e| e.prefixed(&field))?;
        }

        let schemes = self
            .components
            .as_ref()
            .map(|c| &c.security_schemes);
        if let Some(schemes) = schemes {
            validate_all(
                schemes.iter().map(|(k, v)| (k.clone(), v)),
                "components.securitySchemes",
            )?;
        }
        for (index, requirement) in self.security.iter().enumerate() {
            for name in requirement.keys() {
                if !schemes.is_some_and(|s| s.contains_key(name)) {
                    return Err(ValidationError::new(
                        format!("security[{}].{}", index, name),
                        "references an undeclared security scheme",
                    ));
                }
            }
        }

        validate_all(indexed(&self.tags), "tags")?;
        if let Some(docs) = &self.external_docs {
            docs.validate().map_err(|e| e.prefixed("externalDocs"))?;
        }
        Ok(())
    }
}

/// Every `{name}` of a path needs a path parameter of that name, and every
/// path parameter needs a `{name}` in the path
fn check_path_parameters(path: &str, item: &PathItem) -> Result<(), ValidationError> {
    let names: Vec<&str> = TEMPLATE_REGEX
        .captures_iter(path)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    for (method, operation) in item.operations() {
        for name in &names {
            let declared = operation
                .parameters
                .iter()
                .any(|p| p.location == "path" && p.name == *name);
            if !declared {
                return Err(ValidationError::new(
                    format!("{}.parameters", method),
                    format!("is missing path parameter `{}`", name),
                ));
            }
        }

        for (index, parameter) in operation.parameters.iter().enumerate() {
            if parameter.location == "path" && !names.contains(&parameter.name.as_str()) {
                return Err(ValidationError::new(
                    format!("{}.parameters[{}]", method, index),
                    format!("`{}` does not appear in the path", parameter.name),
                ));
            }
        }
    }
    Ok(())
}

impl Validate for Info {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::required("title"));
        }
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }
        if !is_semver(&self.version) {
            return Err(ValidationError::invalid_format("version"));
        }
        if let Some(terms) = &self.terms_of_service {
            if !is_url(terms) {
                return Err(ValidationError::invalid_format("termsOfService"));
            }
        }
        if let Some(contact) = &self.contact {
            contact.validate().map_err(|e| e.prefixed("contact"))?;
        }
        if let Some(license) = &self.license {
            license.validate().map_err(|e| e.prefixed("license"))?;
        }
        Ok(())
    }
}

impl Validate for Contact {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.url {
            if !is_url(url) {
                return Err(ValidationError::invalid_format("url"));
            }
        }
        if let Some(email) = &self.email {
            if !is_email(email) {
                return Err(ValidationError::invalid_format("email"));
            }
        }
        Ok(())
    }
}

impl Validate for License {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::required("name"));
        }
        if let Some(url) = &self.url {
            if !is_url(url) {
                return Err(ValidationError::invalid_format("url"));
            }
        }
        Ok(())
    }
}

impl Validate for Server {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::required("url"));
        }
        if !self.url.starts_with('/') && !is_url(&self.url) {
            return Err(ValidationError::invalid_format("url"));
        }

        let templates: BTreeSet<&str> = TEMPLATE_REGEX
            .captures_iter(&self.url)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        for name in &templates {
            if !self.variables.contains_key(*name) {
                return Err(ValidationError::required(format!("variables[{}]", name)));
            }
        }
        for name in self.variables.keys() {
            if !templates.contains(name.as_str()) {
                return Err(ValidationError::new(
                    format!("variables[{}]", name),
                    "is not used in the URL",
                ));
            }
        }

        validate_all(
            self.variables.iter().map(|(k, v)| (k.clone(), v)),
            "variables",
        )
    }
}

impl Validate for ServerVariable {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.default.is_empty() {
            return Err(ValidationError::required("default"));
        }
        if !self.enum_values.is_empty() && !self.enum_values.contains(&self.default) {
            return Err(ValidationError::new("default", "is not one of the enum values"));
        }
        Ok(())
    }
}

impl Validate for PathItem {
    fn validate(&self) -> Result<(), ValidationError> {
        let operations = self.operations();
        if operations.is_empty() {
            return Err(ValidationError::new("", "declares no operation"));
        }
        for (method, operation) in operations {
            operation.validate().map_err(|e| e.prefixed(method))?;
        }
        Ok(())
    }
}

impl Validate for Operation {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_all(indexed(&self.parameters), "parameters")?;
        if let Some(body) = &self.request_body {
            body.validate().map_err(|e| e.prefixed("requestBody"))?;
        }

        if self.responses.is_empty() {
            return Err(ValidationError::required("responses"));
        }
        for status in self.responses.keys() {
            let valid = status == "default"
                || (status.len() == 3 && status.parse::<u16>().is_ok_and(|c| (100..=599).contains(&c)));
            if !valid {
                return Err(ValidationError::invalid_value(format!("responses[{}]", status)));
            }
        }
        validate_all(
            self.responses.iter().map(|(k, v)| (k.clone(), v)),
            "responses",
        )?;
        validate_all(indexed(&self.servers), "servers")
    }
}

impl Validate for Parameter {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::required("name"));
        }
        if !LOCATIONS.contains(&self.location.as_str()) {
            return Err(ValidationError::invalid_value("in"));
        }
        if self.location == "path" && !self.required {
            return Err(ValidationError::new("required", "must be true for path parameters"));
        }
        if let Some(schema) = &self.schema {
            schema.validate().map_err(|e| e.prefixed("schema"))?;
        }
        self.style.validate()
    }
}

impl Validate for Style {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.style {
            Some(style) if !STYLES.contains(&style.as_str()) => Err(ValidationError::invalid_value("style")),
            _ => Ok(()),
        }
    }
}

impl Validate for RequestBody {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.content.is_empty() {
            return Err(ValidationError::required("content"));
        }
        validate_all(self.content.iter().map(|(k, v)| (k.clone(), v)), "content")
    }
}

impl Validate for MediaType {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.schema {
            Some(schema) => schema.validate().map_err(|e| e.prefixed("schema")),
            None => Ok(()),
        }
    }
}

impl Validate for Response {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.description.is_empty() {
            return Err(ValidationError::required("description"));
        }
        validate_all(self.content.iter().map(|(k, v)| (k.clone(), v)), "content")
    }
}

impl Validate for Schema {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(schema_type) = &self.schema_type {
            if !SCHEMA_TYPES.contains(&schema_type.as_str()) {
                return Err(ValidationError::new(
                    "type",
                    format!("has an invalid value `{}`", schema_type),
                ));
            }
            if schema_type == "array" && self.items.is_none() {
                return Err(ValidationError::required("items"));
            }
        }
        if let Some(items) = &self.items {
            items.validate().map_err(|e| e.prefixed("items"))?;
        }
        validate_all(
            self.properties.iter().map(|(k, v)| (k.clone(), v)),
            "properties",
        )
    }
}

impl Validate for SecurityScheme {
    fn validate(&self) -> Result<(), ValidationError> {
        let required = |value: &Option<String>, field: &str| match value {
            Some(v) if !v.is_empty() => Ok(()),
            _ => Err(ValidationError::required(field)),
        };

        match self.scheme_type.as_str() {
            "" => return Err(ValidationError::required("type")),
            "apiKey" => {
                required(&self.name, "name")?;
                required(&self.location, "in")?;
                if let Some(location) = &self.location {
                    if !["query", "header", "cookie"].contains(&location.as_str()) {
                        return Err(ValidationError::invalid_value("in"));
                    }
                }
            }
            "http" => required(&self.scheme, "scheme")?,
            "openIdConnect" => {
                required(&self.open_id_connect_url, "openIdConnectUrl")?;
                if let Some(url) = &self.open_id_connect_url {
                    if !is_url(url) {
                        return Err(ValidationError::invalid_format("openIdConnectUrl"));
                    }
                }
            }
            _ => {}
        }

        if !SECURITY_TYPES.contains(&self.scheme_type.as_str()) {
            return Err(ValidationError::invalid_value("type"));
        }
        Ok(())
    }
}

impl Validate for Tag {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::required("name"));
        }
        if let Some(docs) = &self.external_docs {
            docs.validate().map_err(|e| e.prefixed("externalDocs"))?;
        }
        Ok(())
    }
}

impl Validate for ExternalDocs {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::required("url"));
        }
        if !is_url(&self.url) {
            return Err(ValidationError::invalid_format("url"));
        }
        Ok(())
    }
}
