//! Import styles and their detection from project configuration.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::project::ProjectConfig;

/// Extension policy for relative imports, as configured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ImportStyle {
    /// Detect once from the project's tsconfig
    #[default]
    Auto,
    /// Relative imports must carry `.js` (node16/nodenext resolution)
    NeedsJsExtension,
    /// Extensionless imports resolve; `.ts` is appended for generated modules
    NoExtensionOk,
    /// The project allows importing `.ts` directly
    TsExtensionsAllowed,
}

impl ImportStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::NeedsJsExtension => "needs-js-extension",
            Self::NoExtensionOk => "no-extension-ok",
            Self::TsExtensionsAllowed => "ts-extensions-allowed",
        }
    }
}

impl FromStr for ImportStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "needs-js-extension" => Ok(Self::NeedsJsExtension),
            "no-extension-ok" => Ok(Self::NoExtensionOk),
            "ts-extensions-allowed" => Ok(Self::TsExtensionsAllowed),
            other => Err(format!("Unknown import style: {}", other)),
        }
    }
}

impl fmt::Display for ImportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Import style after `auto` has been settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedImportStyle {
    NeedsJsExtension,
    NoExtensionOk,
    TsExtensionsAllowed,
}

impl ResolvedImportStyle {
    /// Settle `auto` from the project's compiler options
    pub fn detect(project: &ProjectConfig) -> Self {
        let options = &project.compiler_options;
        let node_like = |value: &Option<String>| {
            value
                .as_deref()
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "node16" | "nodenext"))
                .unwrap_or(false)
        };

        if options.allow_importing_ts_extensions {
            Self::TsExtensionsAllowed
        } else if node_like(&options.module) || node_like(&options.module_resolution) {
            Self::NeedsJsExtension
        } else {
            Self::NoExtensionOk
        }
    }

    /// Resolve a configured style; `auto` needs a project to detect from
    pub fn from_configured(style: ImportStyle, project: Option<&ProjectConfig>) -> Self {
        match style {
            ImportStyle::NeedsJsExtension => Self::NeedsJsExtension,
            ImportStyle::NoExtensionOk => Self::NoExtensionOk,
            ImportStyle::TsExtensionsAllowed => Self::TsExtensionsAllowed,
            ImportStyle::Auto => project.map(Self::detect).unwrap_or(Self::NoExtensionOk),
        }
    }
}

impl fmt::Display for ResolvedImportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NeedsJsExtension => ImportStyle::NeedsJsExtension,
            Self::NoExtensionOk => ImportStyle::NoExtensionOk,
            Self::TsExtensionsAllowed => ImportStyle::TsExtensionsAllowed,
        };
        fmt::Display::fmt(&name, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(json: &str) -> ProjectConfig {
        ProjectConfig::parse("tsconfig.json", json).unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(
            "needs-js-extension".parse::<ImportStyle>().unwrap(),
            ImportStyle::NeedsJsExtension
        );
        assert_eq!(ImportStyle::TsExtensionsAllowed.to_string(), "ts-extensions-allowed");
        assert!("esm".parse::<ImportStyle>().is_err());
        assert_eq!(ImportStyle::default(), ImportStyle::Auto);
    }

    #[test]
    fn test_detect_ts_extensions_wins() {
        let p = project(
            r#"{ "compilerOptions": { "allowImportingTsExtensions": true, "module": "NodeNext" } }"#,
        );
        assert_eq!(ResolvedImportStyle::detect(&p), ResolvedImportStyle::TsExtensionsAllowed);
    }

    #[test]
    fn test_detect_node_resolution() {
        let p = project(r#"{ "compilerOptions": { "moduleResolution": "node16" } }"#);
        assert_eq!(ResolvedImportStyle::detect(&p), ResolvedImportStyle::NeedsJsExtension);
        let p = project(r#"{ "compilerOptions": { "module": "NodeNext" } }"#);
        assert_eq!(ResolvedImportStyle::detect(&p), ResolvedImportStyle::NeedsJsExtension);
    }

    #[test]
    fn test_detect_default() {
        let p = project(r#"{ "compilerOptions": { "module": "ESNext", "moduleResolution": "bundler" } }"#);
        assert_eq!(ResolvedImportStyle::detect(&p), ResolvedImportStyle::NoExtensionOk);
        assert_eq!(
            ResolvedImportStyle::from_configured(ImportStyle::Auto, None),
            ResolvedImportStyle::NoExtensionOk
        );
        assert_eq!(
            ResolvedImportStyle::from_configured(ImportStyle::NeedsJsExtension, Some(&p)),
            ResolvedImportStyle::NeedsJsExtension
        );
    }
}
