//! Operation descriptors handed to the planner.
//!
//! An [`Operation`] is one HTTP method + path template pair from an API
//! description. It is immutable for the duration of a generation pass.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// HTTP verbs an OpenAPI path item can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Lowercase form, as used for path item keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }

    /// Uppercase wire form
    pub fn as_upper(&self) -> String {
        self.as_str().to_ascii_uppercase()
    }

    /// Methods whose request type is named as a mutation
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Get | Self::Head | Self::Options | Self::Trace)
    }

    /// All methods, in path-item key order
    pub fn all() -> impl Iterator<Item = Self> {
        use HttpMethod::*;
        [Get, Put, Post, Delete, Options, Head, Patch, Trace]
            .iter()
            .copied()
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown HTTP method: {}", s))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One HTTP method + path combination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// HTTP method
    pub method: HttpMethod,
    /// Path template with `{name}` placeholders (e.g. "/users/{userId}")
    pub path: String,
    /// The operationId, when the document declares one
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    /// Short human summary
    pub summary: Option<String>,
    /// Longer human description
    pub description: Option<String>,
    /// Tags used for grouping
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Operation {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: None,
            summary: None,
            description: None,
            tags: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.operation_id = Some(id.into());
        self
    }

    /// Stable identifier: the operationId, or `<method>_<path segments>`
    pub fn identifier(&self) -> String {
        match &self.operation_id {
            Some(id) if !id.trim().is_empty() => id.clone(),
            _ => {
                let path = self
                    .path
                    .trim_start_matches('/')
                    .replace(['{', '}'], "")
                    .replace('/', "_");
                format!("{}_{}", self.method, path)
            }
        }
    }

    /// Name shown to the tool-calling host
    pub fn tool_name(&self) -> String {
        self.operation_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| self.summary.clone().filter(|s| !s.trim().is_empty()))
            .unwrap_or_else(|| format!("{} {}", self.method.as_upper(), self.path))
    }

    /// Description shown to the tool-calling host
    pub fn tool_description(&self) -> String {
        self.description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| {
                format!("Make a {} request to {}", self.method.as_upper(), self.path)
            })
    }
}
