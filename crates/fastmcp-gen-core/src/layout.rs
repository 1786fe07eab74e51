//! Where generated files go.
//!
//! ```text
//! <out>/
//!   types/<PascalId>.ts
//!   zod/<camelId>Schema.ts
//!   <handlers>/
//!     <group>/<camelId>.ts
//!     index.ts
//!     server.ts
//!     client.ts
//!     .fastmcp.json
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::naming::NamedOperation;
use crate::operation::Operation;
use crate::utils::to_lower_camel_case;

/// Banner placed at the top of every generated module
pub const BANNER: &str = "/**\n * Generated by fastmcp-gen.\n * Do not edit manually.\n */";

/// How handler modules are grouped into subdirectories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// `<firstTag>Handlers/`
    Tag,
    /// First static path segment
    Path,
}

/// File locations of one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    handlers_dir: PathBuf,
    group: Option<GroupBy>,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, handlers_dir: impl AsRef<Path>, group: Option<GroupBy>) -> Self {
        let root = root.into();
        let handlers_dir = root.join(handlers_dir);
        Self {
            root,
            handlers_dir,
            group,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn handlers_dir(&self) -> &Path {
        &self.handlers_dir
    }

    /// Group directory name for `operation`; `None` puts it at the handlers root
    pub fn group_name(&self, operation: &Operation) -> Option<String> {
        match self.group? {
            GroupBy::Tag => operation
                .tags
                .first()
                .map(|tag| format!("{}Handlers", to_lower_camel_case(tag))),
            GroupBy::Path => operation
                .path
                .split('/')
                .find(|segment| !segment.is_empty() && !segment.starts_with('{'))
                .map(to_lower_camel_case),
        }
    }

    pub fn handler_file(&self, operation: &Operation) -> PathBuf {
        let file_name = format!("{}.ts", to_lower_camel_case(&operation.identifier()));
        match self.group_name(operation) {
            Some(group) if !group.is_empty() => self.handlers_dir.join(group).join(file_name),
            _ => self.handlers_dir.join(file_name),
        }
    }

    pub fn type_file(&self, named: &NamedOperation) -> PathBuf {
        self.root.join(&named.type_file)
    }

    pub fn validator_file(&self, named: &NamedOperation) -> PathBuf {
        self.root.join(&named.validator_file)
    }

    /// A schema module path as recorded in a `SchemaRef`
    pub fn schema_file(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn server_file(&self) -> PathBuf {
        self.handlers_dir.join("server.ts")
    }

    pub fn client_file(&self) -> PathBuf {
        self.handlers_dir.join("client.ts")
    }

    pub fn barrel_file(&self) -> PathBuf {
        self.handlers_dir.join("index.ts")
    }

    pub fn launch_config_file(&self) -> PathBuf {
        self.handlers_dir.join(".fastmcp.json")
    }

    /// Every module path an operation contributes
    pub fn operation_files(&self, named: &NamedOperation) -> Vec<PathBuf> {
        vec![
            self.handler_file(named.operation()),
            self.type_file(named),
            self.validator_file(named),
        ]
    }
}
