//! Project configuration (`tsconfig.json`) as far as import resolution needs it.
//!
//! Relative `extends` entries are followed; compiler options of the extending
//! file win over those it inherits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{Error, Result};

use super::normalize_path;

const MAX_EXTENDS_DEPTH: usize = 16;

/// The compiler options that influence import paths
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub module_resolution: Option<String>,
    #[serde(default)]
    pub allow_importing_ts_extensions: bool,
    #[serde(default)]
    pub jsx: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub paths: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    module: Option<String>,
    module_resolution: Option<String>,
    allow_importing_ts_extensions: Option<bool>,
    jsx: Option<String>,
    base_url: Option<String>,
    paths: Option<BTreeMap<String, Vec<String>>>,
}

impl RawCompilerOptions {
    /// Make `baseUrl` and inherited `paths` independent of the declaring file's directory
    fn anchored(mut self, dir: &Path) -> Self {
        self.base_url = match self.base_url.take() {
            Some(base) => Some(normalize_path(&dir.join(base)).to_string_lossy().into_owned()),
            None if self.paths.is_some() => Some(dir.to_string_lossy().into_owned()),
            None => None,
        };
        self
    }

    /// `self` with every option `child` sets replaced
    fn overlay(self, child: RawCompilerOptions) -> Self {
        Self {
            module: child.module.or(self.module),
            module_resolution: child.module_resolution.or(self.module_resolution),
            allow_importing_ts_extensions: child
                .allow_importing_ts_extensions
                .or(self.allow_importing_ts_extensions),
            jsx: child.jsx.or(self.jsx),
            base_url: child.base_url.or(self.base_url),
            paths: child.paths.or(self.paths),
        }
    }
}

impl From<RawCompilerOptions> for CompilerOptions {
    fn from(raw: RawCompilerOptions) -> Self {
        Self {
            module: raw.module,
            module_resolution: raw.module_resolution,
            allow_importing_ts_extensions: raw.allow_importing_ts_extensions.unwrap_or(false),
            jsx: raw.jsx,
            base_url: raw.base_url,
            paths: raw.paths.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

impl Extends {
    fn into_vec(self) -> Vec<String> {
        match self {
            Extends::One(one) => vec![one],
            Extends::Many(many) => many,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawProjectConfig {
    #[serde(default)]
    extends: Option<Extends>,
    #[serde(default, rename = "compilerOptions")]
    compiler_options: RawCompilerOptions,
}

impl RawProjectConfig {
    fn parse(path: &Path, content: &str) -> Result<Self> {
        serde_json::from_str(&strip_jsonc(content)).map_err(|e| {
            Error::config(format!("Invalid project configuration {}: {}", path.display(), e))
        })
    }
}

/// A loaded `tsconfig.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Location of the tsconfig file
    pub path: PathBuf,
    pub compiler_options: CompilerOptions,
}

impl ProjectConfig {
    /// Read and parse a tsconfig file together with the files it extends
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut chain = Vec::new();
        let compiler_options = load_options(path.clone(), &mut chain).await?;
        Ok(Self {
            path,
            compiler_options: compiler_options.into(),
        })
    }

    /// Parse tsconfig text; comments and trailing commas are accepted.
    /// `extends` is ignored here since nothing is read from disk.
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let raw = RawProjectConfig::parse(&path, content)?;
        Ok(Self {
            path,
            compiler_options: raw.compiler_options.into(),
        })
    }

    /// Directory containing the tsconfig
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Directory that `paths` entries are resolved against
    pub fn paths_base(&self) -> PathBuf {
        match &self.compiler_options.base_url {
            Some(base) => self.dir().join(base),
            None => self.dir().to_path_buf(),
        }
    }

    pub fn uses_jsx(&self) -> bool {
        self.compiler_options
            .jsx
            .as_deref()
            .map(|jsx| !jsx.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Compiler options of `path` merged over everything it extends.
/// `chain` holds the files currently being loaded.
fn load_options(
    path: PathBuf,
    chain: &mut Vec<PathBuf>,
) -> BoxFuture<'_, Result<RawCompilerOptions>> {
    async move {
        let path = normalize_path(&path);
        if chain.contains(&path) {
            return Err(Error::config(format!(
                "Project configuration {} extends itself",
                path.display()
            )));
        }
        if chain.len() >= MAX_EXTENDS_DEPTH {
            return Err(Error::config(format!(
                "Project configuration {} nests `extends` too deeply",
                path.display()
            )));
        }

        let content = fs::read_to_string(&path).await?;
        let raw = RawProjectConfig::parse(&path, &content)?;
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        chain.push(path.clone());
        let mut merged = RawCompilerOptions::default();
        for parent in raw.extends.map(Extends::into_vec).unwrap_or_default() {
            let relative = parent.starts_with("./") || parent.starts_with("../");
            if !relative && !Path::new(&parent).is_absolute() {
                log::debug!("Skipping package tsconfig base '{}' in {}", parent, path.display());
                continue;
            }
            let mut parent_path = dir.join(&parent);
            if parent_path.extension().is_none() {
                parent_path.set_extension("json");
            }
            let inherited = load_options(parent_path, chain).await?;
            merged = merged.overlay(inherited);
        }
        chain.pop();

        Ok(merged.overlay(raw.compiler_options.anchored(&dir)))
    }
    .boxed()
}

/// Remove `//` and `/* */` comments and trailing commas, leaving string contents alone
pub fn strip_jsonc(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut in_string = false;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\\' && i + 1 < chars.len() {
                out.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            ',' => {
                // Trailing comma: only whitespace/comments before a closing bracket
                if !matches!(next_significant(&chars, i + 1), Some('}') | Some(']')) {
                    out.push(c);
                }
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn next_significant(chars: &[char], mut i: usize) -> Option<char> {
    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            c => return Some(c),
        }
    }
    None
}
