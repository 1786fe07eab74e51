//! Build-wide import options, settled once before any operation is generated.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use super::alias::{AliasMatcher, PathsMatcher};
use super::project::ProjectConfig;
use super::style::{ImportStyle, ResolvedImportStyle};
use crate::error::Result;

/// Package specifiers that are never rewritten
pub const DEFAULT_PASSTHROUGH: &[&str] = &["fastmcp", "zod"];

/// Inputs to [`ResolvedImportOptions::initialize`]
#[derive(Debug, Clone, Default)]
pub struct ImportSettings {
    pub style: ImportStyle,
    /// Explicit tsconfig; otherwise `<build_root>/tsconfig.json` when present
    pub tsconfig_path: Option<PathBuf>,
    /// Base for every relative path the resolver compares
    pub build_root: PathBuf,
    /// Extra passthrough specifiers (e.g. the client package)
    pub passthrough: Vec<String>,
}

/// Immutable import options shared by every operation of a build
#[derive(Debug, Clone)]
pub struct ResolvedImportOptions {
    pub style: ResolvedImportStyle,
    pub alias_matcher: Option<Arc<dyn AliasMatcher>>,
    pub project: Option<ProjectConfig>,
    pub build_root: PathBuf,
    pub passthrough: BTreeSet<String>,
}

impl ResolvedImportOptions {
    /// Options with a fixed style and nothing else configured
    pub fn new(style: ResolvedImportStyle, build_root: impl Into<PathBuf>) -> Self {
        Self {
            style,
            alias_matcher: None,
            project: None,
            build_root: build_root.into(),
            passthrough: DEFAULT_PASSTHROUGH.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Load the project configuration, settle `auto`, build the alias matcher
    pub async fn initialize(settings: ImportSettings) -> Result<Self> {
        let tsconfig = match &settings.tsconfig_path {
            Some(path) => Some(path.clone()),
            None => {
                let candidate = settings.build_root.join("tsconfig.json");
                tokio::fs::try_exists(&candidate)
                    .await
                    .unwrap_or(false)
                    .then_some(candidate)
            }
        };

        let project = match tsconfig {
            Some(path) => Some(ProjectConfig::load(&path).await?),
            None => None,
        };

        let style = ResolvedImportStyle::from_configured(settings.style, project.as_ref());
        log::info!(
            "Import style: {} (configured {}{})",
            style,
            settings.style,
            project
                .as_ref()
                .map(|p| format!(", project {}", p.path.display()))
                .unwrap_or_default()
        );

        let mut options = Self::new(style, settings.build_root);
        if let Some(matcher) = project.as_ref().and_then(PathsMatcher::from_project) {
            options.alias_matcher = Some(Arc::new(matcher));
        }
        options.project = project;
        options.passthrough.extend(settings.passthrough);
        Ok(options)
    }

    pub fn with_alias_matcher(mut self, matcher: Arc<dyn AliasMatcher>) -> Self {
        self.alias_matcher = Some(matcher);
        self
    }

    pub fn with_project(mut self, project: ProjectConfig) -> Self {
        self.project = Some(project);
        self
    }

    pub fn with_passthrough(mut self, specifier: impl Into<String>) -> Self {
        self.passthrough.insert(specifier.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_detects_from_build_root() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join("tsconfig.json"),
            r#"{ "compilerOptions": { "module": "nodenext", "paths": { "@/*": ["./src/*"] } } }"#,
        )?;

        let options = ResolvedImportOptions::initialize(ImportSettings {
            build_root: dir.path().to_path_buf(),
            passthrough: vec!["@kubb/plugin-client/clients/axios".into()],
            ..Default::default()
        })
        .await?;

        assert_eq!(options.style, ResolvedImportStyle::NeedsJsExtension);
        assert!(options.project.is_some());
        assert!(options.alias_matcher.is_some());
        assert!(options.passthrough.contains("fastmcp"));
        assert!(options.passthrough.contains("@kubb/plugin-client/clients/axios"));
        Ok(())
    }

    #[tokio::test]
    async fn test_initialize_without_project() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let options = ResolvedImportOptions::initialize(ImportSettings {
            style: ImportStyle::Auto,
            build_root: dir.path().to_path_buf(),
            ..Default::default()
        })
        .await?;
        assert_eq!(options.style, ResolvedImportStyle::NoExtensionOk);
        assert!(options.project.is_none());
        assert!(options.alias_matcher.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_explicit_tsconfig_is_error() {
        let result = ResolvedImportOptions::initialize(ImportSettings {
            tsconfig_path: Some(PathBuf::from("/definitely/not/here/tsconfig.json")),
            ..Default::default()
        })
        .await;
        assert!(result.is_err());
    }
}
