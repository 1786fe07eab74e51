//! Tera templates for the generated TypeScript modules.
//!
//! The built-in templates are compiled into the binary. A template directory
//! may override any of them by providing a file with the same name.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tera::{Context, Tera};

use crate::error::{Error, Result};

pub const HANDLER_TEMPLATE: &str = "handler.ts.tera";
pub const SERVER_TEMPLATE: &str = "server.ts.tera";
pub const CLIENT_TEMPLATE: &str = "client.ts.tera";

/// Environment variable naming a template override directory
pub const TEMPLATE_DIR_ENV: &str = "FASTMCP_GEN_TEMPLATE_DIR";

const EMBEDDED: &[(&str, &str)] = &[
    (HANDLER_TEMPLATE, include_str!("../templates/handler.ts.tera")),
    (SERVER_TEMPLATE, include_str!("../templates/server.ts.tera")),
    (CLIENT_TEMPLATE, include_str!("../templates/client.ts.tera")),
];

/// The loaded template set, cheap to clone and share across workers
#[derive(Debug, Clone)]
pub struct TemplateSet {
    tera: Arc<Tera>,
    /// Override directory the set was loaded with, if any
    source_dir: Option<PathBuf>,
}

impl TemplateSet {
    /// Built-in templates only
    pub fn embedded() -> Result<Self> {
        let sources = EMBEDDED
            .iter()
            .map(|(name, body)| (name.to_string(), body.to_string()))
            .collect();
        Self::from_sources(sources, None)
    }

    /// Built-in templates overlaid with same-named files from `dir`
    pub async fn load(dir: Option<&Path>) -> Result<Self> {
        let Some(dir) = dir else {
            return Self::embedded();
        };
        if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
            return Err(Error::template(format!(
                "Template directory not found: {}",
                dir.display()
            )));
        }

        let mut sources = Vec::with_capacity(EMBEDDED.len());
        for (name, body) in EMBEDDED {
            let candidate = dir.join(name);
            let text = if tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                log::debug!("Using template override: {}", candidate.display());
                tokio::fs::read_to_string(&candidate).await?
            } else {
                body.to_string()
            };
            sources.push((name.to_string(), text));
        }
        Self::from_sources(sources, Some(dir.to_path_buf()))
    }

    /// Locate an override directory: the configured one, then
    /// `$FASTMCP_GEN_TEMPLATE_DIR`, then `~/.fastmcp-gen/templates`.
    pub fn discover_dir(configured: Option<&Path>) -> Option<PathBuf> {
        if let Some(dir) = configured {
            return Some(dir.to_path_buf());
        }

        if let Ok(dir) = std::env::var(TEMPLATE_DIR_ENV) {
            let path = PathBuf::from(dir);
            if path.exists() {
                return Some(path);
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let templates_dir = home_dir.join(".fastmcp-gen").join("templates");
            if templates_dir.exists() {
                return Some(templates_dir);
            }
        }

        None
    }

    fn from_sources(sources: Vec<(String, String)>, source_dir: Option<PathBuf>) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(sources)?;
        Ok(Self {
            tera: Arc::new(tera),
            source_dir,
        })
    }

    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template(name).is_ok()
    }

    /// Render `name` with a serializable context
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        let context = Context::from_serialize(context).map_err(|e| {
            Error::template(format!("Failed to serialize context for '{}': {}", name, e))
        })?;

        self.tera.render(name, &context).map_err(|e| {
            log::error!("Template rendering failed for '{}': {}", name, e);
            log::error!(
                "Available context keys: {:?}",
                context
                    .clone()
                    .into_json()
                    .as_object()
                    .map(|obj| obj.keys().cloned().collect::<Vec<_>>())
                    .unwrap_or_default()
            );
            Error::template(format!("Failed to render template '{}': {}", name, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_embedded_templates_are_registered() {
        let set = TemplateSet::embedded().unwrap();
        assert!(set.has_template(HANDLER_TEMPLATE));
        assert!(set.has_template(SERVER_TEMPLATE));
        assert!(set.has_template(CLIENT_TEMPLATE));
        assert!(set.source_dir().is_none());
    }

    #[tokio::test]
    async fn test_override_directory() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join(CLIENT_TEMPLATE), "// custom {{ base_url }}\n")?;

        let set = TemplateSet::load(Some(dir.path())).await?;
        let out = set.render(CLIENT_TEMPLATE, &json!({ "base_url": "\"x\"" }))?;
        assert_eq!(out, "// custom \"x\"\n");
        // Other templates keep the built-in text
        assert!(set.has_template(HANDLER_TEMPLATE));
        assert_eq!(set.source_dir(), Some(dir.path()));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_override_directory_is_error() {
        let result = TemplateSet::load(Some(Path::new("/no/such/template/dir"))).await;
        assert!(matches!(result, Err(Error::Template(_))));
    }

    #[test]
    fn test_missing_context_is_template_error() {
        let set = TemplateSet::embedded().unwrap();
        let result = set.render(HANDLER_TEMPLATE, &json!({}));
        assert!(matches!(result, Err(Error::Template(_))));
    }

    #[test]
    fn test_discover_prefers_configured_dir() {
        let configured = Path::new("/configured/templates");
        assert_eq!(
            TemplateSet::discover_dir(Some(configured)),
            Some(configured.to_path_buf())
        );
    }
}
