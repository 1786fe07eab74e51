//! OpenAPI specification loading and operation extraction.
//!
//! This module loads an OpenAPI document (JSON or YAML, from a file or a URL)
//! and walks its paths into [`OperationSpec`]s: the operation descriptor plus
//! the parameters, request body and responses the naming stage needs.
//!
//! The document is not validated; malformed pieces are skipped with a warning.
//!
//! # Examples
//!
//! ```no_run
//! use fastmcp_gen_core::openapi::OpenApiContext;
//! use fastmcp_gen_core::error::Result;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let spec = OpenApiContext::from_file("openapi.json").await?;
//!
//! if let Some(title) = spec.title() {
//!     println!("API Title: {}", title);
//! }
//! for op in spec.operations()? {
//!     println!("{} {}", op.operation.method.as_upper(), op.operation.path);
//! }
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::operation::{HttpMethod, Operation};

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tokio::fs;
use url::Url;

const COMPONENT_SCHEMA_PREFIX: &str = "#/components/schemas/";

/// Represents an OpenAPI specification
#[derive(Debug, Clone, serde::Serialize)]
#[serde(transparent)]
pub struct OpenApiContext {
    /// The raw JSON value of the OpenAPI spec
    pub json: JsonValue,
}

/// Where a parameter is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

/// Information about a single parameter in an OpenAPI operation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OpenApiParameter {
    /// The name of the parameter. Parameter names are case sensitive.
    pub name: String,
    /// The location of the parameter.
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    /// A brief description of the parameter.
    #[serde(default)]
    pub description: Option<String>,
    /// Path parameters are always required; others default to optional.
    #[serde(default)]
    pub required: Option<bool>,
    /// The schema defining the type used for the parameter.
    #[serde(default)]
    pub schema: Option<JsonValue>,
}

impl OpenApiParameter {
    pub fn is_required(&self) -> bool {
        self.location == ParameterLocation::Path || self.required.unwrap_or(false)
    }

    /// The parameter schema, or an unconstrained schema when absent
    pub fn schema_or_any(&self) -> JsonValue {
        let mut schema = self.schema.clone().unwrap_or_else(|| JsonValue::Object(Map::new()));
        if let (Some(description), Some(obj)) = (&self.description, schema.as_object_mut()) {
            obj.entry("description")
                .or_insert_with(|| JsonValue::String(description.clone()));
        }
        schema
    }
}

/// The JSON request body of an operation
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiRequestBody {
    pub content_type: String,
    pub schema: JsonValue,
    pub required: bool,
}

/// One declared response
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiResponse {
    /// Status code or `default`
    pub status: String,
    pub description: Option<String>,
    /// JSON payload schema, if the response declares one
    pub schema: Option<JsonValue>,
}

impl OpenApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.starts_with('2')
    }
}

/// Everything the generator needs to know about one operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSpec {
    pub operation: Operation,
    /// Path-level and operation-level parameters merged, operation wins
    pub parameters: Vec<OpenApiParameter>,
    pub request_body: Option<OpenApiRequestBody>,
    /// Responses in document order
    pub responses: Vec<OpenApiResponse>,
}

impl OperationSpec {
    pub fn parameters_in(&self, location: ParameterLocation) -> Vec<&OpenApiParameter> {
        self.parameters
            .iter()
            .filter(|p| p.location == location)
            .collect()
    }
}

/// `application/json` and any `+json` media type
pub fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

impl OpenApiContext {
    /// Wrap an already-parsed document
    pub fn new(json: JsonValue) -> Self {
        Self { json }
    }

    /// Create a new OpenApiContext from a file or URL (supports both YAML and JSON)
    pub async fn from_file_or_url<P: AsRef<str>>(location: P) -> Result<Self> {
        let location = location.as_ref();

        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::from_url(url.as_str()).await,
            _ => Self::from_file(location).await,
        }
    }

    /// Create a new OpenApiContext from a file (supports both YAML and JSON)
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!(
                "Failed to parse OpenAPI spec at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Create a new OpenApiContext from a URL (supports both YAML and JSON)
    pub async fn from_url(url: &str) -> Result<Self> {
        let response = reqwest::get(url).await.map_err(|e| {
            Error::openapi(format!("Failed to fetch OpenAPI spec from {}: {}", url, e))
        })?;

        if !response.status().is_success() {
            return Err(Error::openapi(format!(
                "Failed to fetch OpenAPI spec from {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let content = response.text().await.map_err(|e| {
            Error::openapi(format!("Failed to read response from {}: {}", url, e))
        })?;

        Self::parse_content(&content).map_err(|e| {
            Error::openapi(format!("Failed to parse OpenAPI spec from {}: {}", url, e))
        })
    }

    /// Parse content as either JSON or YAML
    fn parse_content(content: &str) -> std::result::Result<Self, String> {
        if let Ok(json) = serde_json::from_str(content) {
            return Ok(Self { json });
        }

        if let Ok(json) = serde_yaml::from_str(content) {
            return Ok(Self { json });
        }

        Err("content is neither valid JSON nor YAML".to_string())
    }

    /// Get the title of the API
    pub fn title(&self) -> Option<&str> {
        self.json.get("info")?.get("title")?.as_str()
    }

    /// Get the version of the API
    pub fn version(&self) -> Option<&str> {
        self.json.get("info")?.get("version")?.as_str()
    }

    /// Get the base path of the API
    pub fn base_path(&self) -> Option<String> {
        // OpenAPI 3.x servers
        if let Some(url) = self
            .json
            .get("servers")
            .and_then(JsonValue::as_array)
            .and_then(|servers| servers.first())
            .and_then(|server| server.get("url"))
            .and_then(JsonValue::as_str)
        {
            return Some(url.to_string());
        }

        // Swagger 2.0 host + basePath
        let host = self.json.get("host").and_then(JsonValue::as_str)?;
        let base_path = self
            .json
            .get("basePath")
            .and_then(JsonValue::as_str)
            .unwrap_or("");
        let scheme = match self.json.get("schemes").and_then(JsonValue::as_array) {
            Some(schemes) if schemes.iter().any(|s| s.as_str() == Some("https")) => "https",
            Some(schemes) => schemes.first().and_then(|s| s.as_str()).unwrap_or("https"),
            None => "https",
        };
        Some(format!("{}://{}{}", scheme, host, base_path))
    }

    /// `components.schemas`, empty when absent
    pub fn component_schemas(&self) -> Map<String, JsonValue> {
        self.json
            .pointer("/components/schemas")
            .and_then(JsonValue::as_object)
            .cloned()
            .unwrap_or_default()
    }

    /// Walk every path and HTTP verb in document order
    pub fn operations(&self) -> Result<Vec<OperationSpec>> {
        let paths = self
            .json
            .get("paths")
            .and_then(JsonValue::as_object)
            .ok_or_else(|| Error::openapi("Missing 'paths' object"))?;

        let mut operations = Vec::new();
        for (path, item) in paths {
            let Some(item) = self.deref(item).and_then(JsonValue::as_object) else {
                log::warn!("Skipping path '{}': not an object", path);
                continue;
            };
            let shared = self.extract_parameters(item.get("parameters"));

            for (key, method_item) in item {
                let Ok(method) = HttpMethod::from_str(key) else {
                    continue;
                };
                let Some(method_item) = method_item.as_object() else {
                    continue;
                };
                operations.push(self.extract_operation(method, path, method_item, &shared));
            }
        }
        Ok(operations)
    }

    fn extract_operation(
        &self,
        method: HttpMethod,
        path: &str,
        item: &Map<String, JsonValue>,
        shared: &[OpenApiParameter],
    ) -> OperationSpec {
        let text = |key: &str| item.get(key).and_then(JsonValue::as_str).map(String::from);
        let tags = item
            .get("tags")
            .and_then(JsonValue::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(JsonValue::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let operation = Operation {
            method,
            path: path.to_string(),
            operation_id: text("operationId"),
            summary: text("summary"),
            description: text("description"),
            tags,
        };

        // Operation-level parameters override path-level ones on (name, in)
        let mut parameters: Vec<OpenApiParameter> = shared.to_vec();
        for param in self.extract_parameters(item.get("parameters")) {
            match parameters
                .iter_mut()
                .find(|p| p.name == param.name && p.location == param.location)
            {
                Some(existing) => *existing = param,
                None => parameters.push(param),
            }
        }

        let request_body = self.extract_request_body(&operation, item.get("requestBody"));
        let responses = self.extract_responses(item.get("responses"));

        OperationSpec {
            operation,
            parameters,
            request_body,
            responses,
        }
    }

    /// Follow a local `$ref` (one level at a time until a non-ref is reached)
    fn deref<'a>(&'a self, value: &'a JsonValue) -> Option<&'a JsonValue> {
        let mut current = value;
        for _ in 0..16 {
            match current.get("$ref").and_then(JsonValue::as_str) {
                Some(reference) => {
                    let pointer = reference.strip_prefix('#')?;
                    current = self.json.pointer(pointer)?;
                }
                None => return Some(current),
            }
        }
        None
    }

    pub fn extract_parameters(&self, value: Option<&JsonValue>) -> Vec<OpenApiParameter> {
        value
            .and_then(JsonValue::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|param| {
                        let resolved = self.deref(param)?;
                        match serde_json::from_value::<OpenApiParameter>(resolved.clone()) {
                            Ok(p) => Some(p),
                            Err(e) => {
                                log::warn!("Skipping unreadable parameter: {}", e);
                                None
                            }
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn extract_request_body(
        &self,
        operation: &Operation,
        value: Option<&JsonValue>,
    ) -> Option<OpenApiRequestBody> {
        let body = self.deref(value?)?;
        let content = body.get("content").and_then(JsonValue::as_object)?;
        let required = body
            .get("required")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);

        let json_media = content.iter().find(|(media, _)| is_json_media_type(media));
        match json_media {
            Some((media, media_item)) => Some(OpenApiRequestBody {
                content_type: media.clone(),
                schema: media_item
                    .get("schema")
                    .cloned()
                    .unwrap_or_else(|| JsonValue::Object(Map::new())),
                required,
            }),
            None => {
                log::warn!(
                    "{}: request body has no JSON media type ({}); body is not exposed",
                    operation.identifier(),
                    content.keys().cloned().collect::<Vec<_>>().join(", ")
                );
                None
            }
        }
    }

    /// Extract responses in document order
    pub fn extract_responses(&self, value: Option<&JsonValue>) -> Vec<OpenApiResponse> {
        value
            .and_then(JsonValue::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(status, response)| {
                        let response = self.deref(response)?;
                        let schema = response
                            .get("content")
                            .and_then(JsonValue::as_object)
                            .and_then(|content| {
                                content.iter().find(|(media, _)| is_json_media_type(media))
                            })
                            .and_then(|(_, media_item)| media_item.get("schema"))
                            .cloned();
                        Some(OpenApiResponse {
                            status: status.clone(),
                            description: response
                                .get("description")
                                .and_then(JsonValue::as_str)
                                .map(String::from),
                            schema,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Name of a `#/components/schemas/<name>` reference
pub fn component_schema_name(reference: &str) -> Option<&str> {
    reference.strip_prefix(COMPONENT_SCHEMA_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn petstore() -> OpenApiContext {
        OpenApiContext::new(json!({
            "openapi": "3.0.0",
            "info": { "title": "Petstore", "version": "1.0.6" },
            "paths": {
                "/pets/{petId}": {
                    "parameters": [
                        { "name": "petId", "in": "path", "required": true, "schema": { "type": "integer" } },
                        { "$ref": "#/components/parameters/Trace" }
                    ],
                    "get": {
                        "operationId": "getPetById",
                        "tags": ["pet"],
                        "responses": {
                            "200": { "description": "ok", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pet" } } } },
                            "404": { "description": "missing" }
                        }
                    },
                    "put": {
                        "operationId": "updatePet",
                        "parameters": [
                            { "name": "X-Trace", "in": "header", "required": true, "schema": { "type": "string", "format": "uuid" } }
                        ],
                        "requestBody": { "$ref": "#/components/requestBodies/PetBody" },
                        "responses": { "200": { "description": "ok" } }
                    },
                    "post": {
                        "operationId": "uploadImage",
                        "requestBody": { "content": { "application/octet-stream": { "schema": { "type": "string", "format": "binary" } } } },
                        "responses": {}
                    }
                }
            },
            "components": {
                "schemas": { "Pet": { "type": "object", "properties": { "name": { "type": "string" } } } },
                "parameters": { "Trace": { "name": "X-Trace", "in": "header", "schema": { "type": "string" } } },
                "requestBodies": {
                    "PetBody": { "required": true, "content": { "application/merge-patch+json": { "schema": { "$ref": "#/components/schemas/Pet" } } } }
                }
            }
        }))
    }

    #[tokio::test]
    async fn test_from_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("openapi.yaml");
        let yaml_content = r#"
openapi: 3.0.0
info:
  title: Test API Async
  version: 2.0.0
servers:
  - url: https://api.example.com/v2
paths: {}
"#;
        tokio::fs::write(&file_path, yaml_content).await?;

        let spec = OpenApiContext::from_file(&file_path).await?;
        assert_eq!(spec.title(), Some("Test API Async"));
        assert_eq!(spec.version(), Some("2.0.0"));
        assert_eq!(
            spec.base_path(),
            Some("https://api.example.com/v2".to_string())
        );
        assert!(spec.operations()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_swagger_base_path() {
        let spec = OpenApiContext::new(json!({
            "host": "petstore.swagger.io", "basePath": "/v2", "schemes": ["http", "https"]
        }));
        assert_eq!(spec.base_path().as_deref(), Some("https://petstore.swagger.io/v2"));
    }

    #[test]
    fn test_operations_in_document_order() {
        let ops = petstore().operations().unwrap();
        let ids: Vec<String> = ops.iter().map(|o| o.operation.identifier()).collect();
        assert_eq!(ids, vec!["getPetById", "updatePet", "uploadImage"]);
        assert_eq!(ops[0].operation.method, HttpMethod::Get);
        assert_eq!(ops[0].operation.tags, vec!["pet"]);
    }

    #[test]
    fn test_parameters_merge_and_resolve_refs() {
        let ops = petstore().operations().unwrap();

        let get = &ops[0];
        assert_eq!(get.parameters.len(), 2);
        assert_eq!(get.parameters_in(ParameterLocation::Path)[0].name, "petId");
        assert!(!get.parameters_in(ParameterLocation::Header)[0].is_required());

        // Operation-level X-Trace replaces the path-level one
        let put = &ops[1];
        let headers = put.parameters_in(ParameterLocation::Header);
        assert_eq!(headers.len(), 1);
        assert!(headers[0].is_required());
    }

    #[test]
    fn test_request_bodies() {
        let ops = petstore().operations().unwrap();
        let body = ops[1].request_body.as_ref().unwrap();
        assert_eq!(body.content_type, "application/merge-patch+json");
        assert!(body.required);
        assert_eq!(body.schema, json!({ "$ref": "#/components/schemas/Pet" }));
        // Non-JSON bodies are not exposed
        assert!(ops[2].request_body.is_none());
    }

    #[test]
    fn test_responses() {
        let ops = petstore().operations().unwrap();
        let responses = &ops[0].responses;
        assert_eq!(responses.len(), 2);
        assert!(responses[0].is_success());
        assert!(responses[0].schema.is_some());
        assert_eq!(responses[1].status, "404");
        assert!(responses[1].schema.is_none());
    }

    #[test]
    fn test_missing_paths_is_error() {
        let spec = OpenApiContext::new(json!({ "openapi": "3.0.0" }));
        assert!(spec.operations().is_err());
    }

    #[test]
    fn test_media_types() {
        assert!(is_json_media_type("application/json"));
        assert!(is_json_media_type("application/json; charset=utf-8"));
        assert!(is_json_media_type("application/vnd.api+json"));
        assert!(!is_json_media_type("application/xml"));
        assert_eq!(component_schema_name("#/components/schemas/Pet"), Some("Pet"));
        assert_eq!(component_schema_name("#/definitions/Pet"), None);
    }
}
