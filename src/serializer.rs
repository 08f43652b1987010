//! Serialization module for writing the generated documents as YAML or JSON.
//!
//! Documents are serialized as a single map from group name to the OpenAPI
//! document of that group, in group-name order.

use crate::openapi::OpenApiDocument;
use anyhow::{Context, Result};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Serializes the documents of every group to YAML format.
///
/// # Arguments
///
/// * `documents` - Group name -> validated OpenAPI document
///
/// # Returns
///
/// Returns the YAML string representation of the map.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use apidoc_from_source::openapi::OpenApiBuilder;
/// use apidoc_from_source::serializer::serialize_yaml;
/// use std::collections::BTreeMap;
///
/// let mut documents = BTreeMap::new();
/// documents.insert("index".to_string(), OpenApiBuilder::new("index").build());
/// let yaml = serialize_yaml(&documents).unwrap();
/// assert!(yaml.starts_with("index:"));
/// ```
pub fn serialize_yaml(documents: &BTreeMap<String, OpenApiDocument>) -> Result<String> {
    debug!("Serializing {} OpenAPI documents to YAML", documents.len());
    serde_yaml::to_string(documents).context("Failed to serialize OpenAPI documents to YAML")
}

/// Serializes the documents of every group to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json(documents: &BTreeMap<String, OpenApiDocument>) -> Result<String> {
    debug!("Serializing {} OpenAPI documents to JSON", documents.len());
    serde_json::to_string_pretty(documents).context("Failed to serialize OpenAPI documents to JSON")
}

/// Writes string content to a file.
///
/// Creates the file and any missing parent directories, or overwrites the
/// file if it already exists.
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content).with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
