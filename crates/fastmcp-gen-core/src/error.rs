//! Error handling for the fastmcp-gen code generation library.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. It uses `thiserror` for easy
//! error handling and implements conversions from common error types.
//!
//! Errors fall into two groups. Environment errors (I/O, parsing, template
//! rendering) abort the whole run. Structural errors found while planning a
//! single operation (see [`Error::is_operation_fatal`]) only abort that
//! operation; the batch keeps going for the others.
//!
//! # Examples
//!
//! ```
//! use fastmcp_gen_core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     // Operations that might fail...
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Result type for fastmcp-gen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fastmcp-gen operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP error while fetching a remote document
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// OpenAPI error
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// Template error
    #[error("Template error: {0}")]
    Template(String),

    /// Template engine error
    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A schema reference was created without a name
    #[error("invalid schema reference: {0}")]
    InvalidSchemaRef(String),

    /// The type stage and the validator stage disagree on which slots exist
    #[error("operation '{operation}': {slot} is present in one schema stage but not the other")]
    SchemaStageMismatch { operation: String, slot: String },

    /// A `{placeholder}` in the path template has no declared path parameter
    #[error("operation '{operation}': path placeholder '{{{placeholder}}}' has no matching path parameter")]
    UnresolvedPathParameter {
        operation: String,
        placeholder: String,
    },

    /// Placeholders and declared path parameters differ in count or order
    #[error("operation '{operation}': path placeholders [{found}] do not match declared path parameters [{expected}]")]
    PathParameterMismatch {
        operation: String,
        expected: String,
        found: String,
    },

    /// A path parameter would shadow a reserved destructure name
    #[error("operation '{operation}': path parameter '{name}' collides with a reserved argument name or is not a valid identifier")]
    AmbiguousParameterName { operation: String, name: String },

    /// Two outputs of the run would share a file, handler name or tool name
    #[error("operation '{operation}': {target} is already produced by {owner}")]
    OutputCollision {
        operation: String,
        target: String,
        owner: String,
    },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new OpenAPI error
    pub fn openapi<S: Into<String>>(msg: S) -> Self {
        Self::OpenApi(msg.into())
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(msg: S) -> Self {
        Self::Template(msg.into())
    }

    /// Whether this error only invalidates the operation being generated.
    ///
    /// The batch driver records these as per-operation failures and carries on.
    pub fn is_operation_fatal(&self) -> bool {
        matches!(
            self,
            Self::SchemaStageMismatch { .. }
                | Self::UnresolvedPathParameter { .. }
                | Self::PathParameterMismatch { .. }
                | Self::AmbiguousParameterName { .. }
                | Self::OutputCollision { .. }
                | Self::InvalidSchemaRef(_)
        )
    }

    /// Short name of the violated rule, used in failure reports
    pub fn rule(&self) -> &'static str {
        match self {
            Self::SchemaStageMismatch { .. } => "SchemaStageMismatch",
            Self::UnresolvedPathParameter { .. } => "UnresolvedPathParameter",
            Self::PathParameterMismatch { .. } => "PathParameterMismatch",
            Self::AmbiguousParameterName { .. } => "AmbiguousParameterName",
            Self::OutputCollision { .. } => "OutputCollision",
            Self::InvalidSchemaRef(_) => "InvalidSchemaRef",
            Self::Io(_) => "Io",
            Self::Yaml(_) => "Yaml",
            Self::Json(_) => "Json",
            Self::Toml(_) => "Toml",
            Self::Http(_) => "Http",
            Self::OpenApi(_) => "OpenApi",
            Self::Template(_) | Self::Tera(_) => "Template",
            Self::Config(_) => "Config",
        }
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Self::Config(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Self::Config(s)
    }
}
