//! Configuration for fastmcp-gen code generation.
//!
//! The configuration can be created programmatically or loaded from a YAML,
//! JSON or TOML file; the format is picked from the file extension. Command
//! line flags override individual fields after loading.
//!
//! # Examples
//!
//! ```no_run
//! use fastmcp_gen_core::config::{Config, Runtime};
//!
//! // Create a new config programmatically
//! let mut config = Config::new("petstore", "openapi.yaml", "generated");
//! config.runtime = Runtime::Node;
//!
//! // Or load from a config file
//! # async fn load() -> fastmcp_gen_core::Result<()> {
//! let config = Config::from_file("fastmcp-gen.yaml").await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Error, Result};
use crate::filter::{OperationFilter, OperationOverride, OperationSelector};
use crate::hooks::Hooks;
use crate::imports::ImportStyle;
use crate::layout::GroupBy;

/// What the handler returns from the transport response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataReturnType {
    /// Only the response payload
    #[default]
    Data,
    /// The whole response object (status, headers, payload)
    Full,
}

/// Runtime that launches the generated server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    #[default]
    Bun,
    Node,
}

impl Runtime {
    /// Launch command and leading arguments for `server`
    pub fn command(&self, server: &str) -> (&'static str, Vec<String>) {
        match self {
            Runtime::Bun => ("bun", vec![server.to_string()]),
            Runtime::Node => ("npx", vec!["tsx".to_string(), server.to_string()]),
        }
    }
}

/// Transport client used by the generated handlers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Module exporting the default `client` function; a `client.ts` is
    /// generated next to the server when unset
    #[serde(default)]
    pub import_path: Option<String>,

    #[serde(default)]
    pub data_return_type: DataReturnType,

    /// Base URL passed with every request
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Configuration for one generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Project name, used as the server name when the document has no title
    pub project_name: String,

    /// Path or URL of the OpenAPI document
    pub openapi_schema_path: String,

    /// Output directory for generated code
    pub output_dir: String,

    /// Directory under `output_dir` receiving handlers and the server module
    #[serde(default = "default_handlers_dir")]
    pub handlers_dir: String,

    #[serde(default)]
    pub import_style: ImportStyle,

    #[serde(default)]
    pub runtime: Runtime,

    #[serde(default)]
    pub client: ClientConfig,

    /// Handler grouping; flat when unset
    #[serde(default)]
    pub group: Option<GroupBy>,

    /// tsconfig.json used for import-style detection and path aliases
    #[serde(default)]
    pub tsconfig_path: Option<String>,

    /// Optional path to a template override directory
    #[serde(default)]
    pub template_dir: Option<String>,

    /// Operations to generate; all when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<OperationFilter>,

    /// Operations to skip
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<OperationFilter>,

    /// Client settings for matching operations
    #[serde(default, rename = "override", skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<OperationOverride>,

    #[serde(default)]
    pub hooks: Hooks,
}

impl Config {
    /// Create a new Config with default values
    pub fn new(
        project_name: impl Into<String>,
        openapi_schema_path: impl Into<String>,
        output_dir: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            openapi_schema_path: openapi_schema_path.into(),
            output_dir: output_dir.into(),
            handlers_dir: default_handlers_dir(),
            import_style: ImportStyle::default(),
            runtime: Runtime::default(),
            client: ClientConfig::default(),
            group: None,
            tsconfig_path: None,
            template_dir: None,
            include: Vec::new(),
            exclude: Vec::new(),
            overrides: Vec::new(),
            hooks: Hooks::default(),
        }
    }

    /// Load configuration from a YAML, JSON or TOML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let config = match ConfigFormat::of(path) {
            ConfigFormat::Yaml => serde_yaml::from_str(&content)?,
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };
        Ok(config)
    }

    /// Save configuration to a file, in the format its extension names
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match ConfigFormat::of(path) {
            ConfigFormat::Yaml => serde_yaml::to_string(self)?,
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize TOML: {}", e)))?,
        };
        fs::write(path, content).await?;
        Ok(())
    }

    /// Compile the include, exclude and override rules
    pub fn selector(&self) -> Result<OperationSelector> {
        OperationSelector::new(&self.include, &self.exclude, &self.overrides)
    }

    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_dir)
    }
}

enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

fn default_handlers_dir() -> String {
    "fastmcp".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterKind;
    use crate::operation::{HttpMethod, Operation};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_config_roundtrip_by_extension() -> Result<()> {
        let dir = tempdir()?;
        let mut config = Config::new("petstore", "openapi.json", "output");
        config.runtime = Runtime::Node;
        config.group = Some(GroupBy::Tag);
        config.client.base_url = Some("https://petstore.example".into());

        for name in ["config.yaml", "config.json", "config.toml"] {
            let file_path = dir.path().join(name);
            config.save(&file_path).await?;
            let loaded = Config::from_file(&file_path).await?;
            assert_eq!(loaded.project_name, "petstore");
            assert_eq!(loaded.handlers_dir, "fastmcp");
            assert_eq!(loaded.runtime, Runtime::Node);
            assert_eq!(loaded.group, Some(GroupBy::Tag));
            assert_eq!(loaded.import_style, ImportStyle::Auto);
            assert_eq!(loaded.client, config.client);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_minimal_yaml_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("fastmcp-gen.yml");
        std::fs::write(
            &file_path,
            "project_name: demo\nopenapi_schema_path: api.yaml\noutput_dir: out\n\
             import_style: needs-js-extension\nhooks:\n  post_generate: bun install\n",
        )?;

        let config = Config::from_file(&file_path).await?;
        assert_eq!(config.import_style, ImportStyle::NeedsJsExtension);
        assert_eq!(config.runtime, Runtime::Bun);
        assert_eq!(config.client.data_return_type, DataReturnType::Data);
        assert_eq!(config.hooks.post_generate, vec!["bun install"]);
        assert!(config.group.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_filters_load_from_yaml() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("fastmcp-gen.yaml");
        std::fs::write(
            &file_path,
            "project_name: demo\nopenapi_schema_path: api.yaml\noutput_dir: out\n\
             include:\n  - { type: tag, pattern: pet }\n\
             exclude:\n  - { type: method, pattern: delete }\n\
             override:\n  - { type: path, pattern: '/pet/.*', client: { base_url: 'https://pets.example' } }\n",
        )?;

        let config = Config::from_file(&file_path).await?;
        let selector = config.selector()?;
        let mut add_pet = Operation::new(HttpMethod::Post, "/pet").with_id("addPet");
        add_pet.tags = vec!["pet".into()];
        let mut delete_pet = Operation::new(HttpMethod::Delete, "/pet/{petId}").with_id("deletePet");
        delete_pet.tags = vec!["pet".into()];
        let inventory = Operation::new(HttpMethod::Get, "/store/inventory").with_id("getInventory");

        assert!(selector.selects(&add_pet));
        assert!(!selector.selects(&delete_pet));
        assert!(!selector.selects(&inventory));
        assert_eq!(
            selector.client_for(&config.client, &delete_pet).base_url.as_deref(),
            Some("https://pets.example")
        );
        assert_eq!(selector.client_for(&config.client, &add_pet).base_url, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_filters_survive_toml_roundtrip() -> Result<()> {
        let dir = tempdir()?;
        let mut config = Config::new("demo", "api.yaml", "out");
        config.include = vec![OperationFilter::new(FilterKind::Tag, "pet")];
        let file_path = dir.path().join("fastmcp-gen.toml");
        config.save(&file_path).await?;
        assert_eq!(Config::from_file(&file_path).await?.include, config.include);
        Ok(())
    }

    #[test]
    fn test_runtime_command() {
        assert_eq!(Runtime::Bun.command("./server.ts"), ("bun", vec!["./server.ts".to_string()]));
        let (cmd, args) = Runtime::Node.command("./server.ts");
        assert_eq!(cmd, "npx");
        assert_eq!(args, vec!["tsx", "./server.ts"]);
    }
}
