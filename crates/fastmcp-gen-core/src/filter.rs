//! Operation selection and per-operation client overrides.
//!
//! Filters match one attribute of an operation (tag, operationId, method or
//! path) against a regular expression that must match the whole value:
//!
//! ```yaml
//! include:
//!   - { type: tag, pattern: pet }
//! exclude:
//!   - { type: path, pattern: "/internal/.*" }
//! override:
//!   - { type: operationId, pattern: downloadFile, client: { data_return_type: full } }
//! ```
//!
//! On the command line a filter is written `<type>:<pattern>`; a bare
//! pattern matches the operationId.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::config::{ClientConfig, DataReturnType};
use crate::error::{Error, Result};
use crate::operation::Operation;

/// Operation attribute a filter looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    /// Any of the operation's tags
    Tag,
    /// The operation identifier (operationId or its fallback)
    OperationId,
    /// HTTP method, case-insensitive
    Method,
    /// Path template, e.g. `/pet/{petId}`
    Path,
}

impl FilterKind {
    fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Tag => "tag",
            FilterKind::OperationId => "operationId",
            FilterKind::Method => "method",
            FilterKind::Path => "path",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tag" => Ok(FilterKind::Tag),
            "operationId" | "operation-id" | "operation" => Ok(FilterKind::OperationId),
            "method" => Ok(FilterKind::Method),
            "path" => Ok(FilterKind::Path),
            other => Err(Error::config(format!(
                "unknown filter type '{}' (expected tag, operationId, method or path)",
                other
            ))),
        }
    }
}

/// One include/exclude rule as written in the configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFilter {
    #[serde(rename = "type")]
    pub kind: FilterKind,
    pub pattern: String,
}

impl OperationFilter {
    pub fn new(kind: FilterKind, pattern: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
        }
    }

    fn compile(&self) -> Result<CompiledFilter> {
        let regex = RegexBuilder::new(&format!("^(?:{})$", self.pattern))
            .case_insensitive(self.kind == FilterKind::Method)
            .build()
            .map_err(|e| {
                Error::config(format!("invalid {} filter '{}': {}", self.kind, self.pattern, e))
            })?;
        Ok(CompiledFilter {
            kind: self.kind,
            regex,
        })
    }
}

impl FromStr for OperationFilter {
    type Err = Error;

    /// `tag:pet`, `path:/users/.*`, or a bare operationId pattern
    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((kind, pattern)) if !kind.is_empty() && !kind.contains(['/', '^', '(']) => {
                Ok(Self::new(kind.parse()?, pattern))
            }
            _ => Ok(Self::new(FilterKind::OperationId, s)),
        }
    }
}

/// Client settings replaced for matching operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientOverride {
    #[serde(default)]
    pub data_return_type: Option<DataReturnType>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Client override applied to every operation its filter matches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOverride {
    #[serde(flatten)]
    pub filter: OperationFilter,
    #[serde(default)]
    pub client: ClientOverride,
}

#[derive(Debug, Clone)]
struct CompiledFilter {
    kind: FilterKind,
    regex: Regex,
}

impl CompiledFilter {
    fn matches(&self, operation: &Operation) -> bool {
        match self.kind {
            FilterKind::Tag => operation.tags.iter().any(|tag| self.regex.is_match(tag)),
            FilterKind::OperationId => self.regex.is_match(&operation.identifier()),
            FilterKind::Method => self.regex.is_match(operation.method.as_str()),
            FilterKind::Path => self.regex.is_match(&operation.path),
        }
    }
}

/// Compiled include, exclude and override rules of one run
#[derive(Debug, Clone, Default)]
pub struct OperationSelector {
    include: Vec<CompiledFilter>,
    exclude: Vec<CompiledFilter>,
    overrides: Vec<(CompiledFilter, ClientOverride)>,
}

impl OperationSelector {
    pub fn new(
        include: &[OperationFilter],
        exclude: &[OperationFilter],
        overrides: &[OperationOverride],
    ) -> Result<Self> {
        Ok(Self {
            include: include.iter().map(OperationFilter::compile).collect::<Result<_>>()?,
            exclude: exclude.iter().map(OperationFilter::compile).collect::<Result<_>>()?,
            overrides: overrides
                .iter()
                .map(|o| Ok((o.filter.compile()?, o.client.clone())))
                .collect::<Result<_>>()?,
        })
    }

    /// Included by at least one include rule (or there are none) and by no exclude rule
    pub fn selects(&self, operation: &Operation) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|f| f.matches(operation));
        included && !self.exclude.iter().any(|f| f.matches(operation))
    }

    /// `base` with every matching override applied in order
    pub fn client_for(&self, base: &ClientConfig, operation: &Operation) -> ClientConfig {
        let mut client = base.clone();
        for (filter, update) in &self.overrides {
            if !filter.matches(operation) {
                continue;
            }
            if let Some(data_return_type) = update.data_return_type {
                client.data_return_type = data_return_type;
            }
            if let Some(base_url) = &update.base_url {
                client.base_url = Some(base_url.clone());
            }
        }
        client
    }
}
