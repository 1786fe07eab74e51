//! Alias matching for logical module specifiers.

use std::fmt::Debug;
use std::path::PathBuf;

use super::project::ProjectConfig;

/// Maps a logical module specifier to candidate physical paths
pub trait AliasMatcher: Debug + Send + Sync {
    /// Candidates in priority order; empty when the specifier is not aliased
    fn candidates(&self, specifier: &str) -> Vec<PathBuf>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PathPattern {
    prefix: String,
    suffix: String,
    wildcard: bool,
    targets: Vec<String>,
}

impl PathPattern {
    fn parse(pattern: &str, targets: &[String]) -> Self {
        match pattern.split_once('*') {
            Some((prefix, suffix)) => Self {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
                wildcard: true,
                targets: targets.to_vec(),
            },
            None => Self {
                prefix: pattern.to_string(),
                suffix: String::new(),
                wildcard: false,
                targets: targets.to_vec(),
            },
        }
    }

    /// The text matched by `*`, if the specifier matches
    fn capture<'a>(&self, specifier: &'a str) -> Option<&'a str> {
        if !self.wildcard {
            return (specifier == self.prefix).then_some("");
        }
        if specifier.len() < self.prefix.len() + self.suffix.len() {
            return None;
        }
        specifier
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
    }
}

/// `compilerOptions.paths` matcher: exact patterns first, then the
/// wildcard pattern with the longest prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsMatcher {
    base: PathBuf,
    patterns: Vec<PathPattern>,
}

impl PathsMatcher {
    pub fn new<I, K>(base: impl Into<PathBuf>, paths: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: AsRef<str>,
    {
        let patterns = paths
            .into_iter()
            .map(|(pattern, targets)| PathPattern::parse(pattern.as_ref(), &targets))
            .collect();
        Self {
            base: base.into(),
            patterns,
        }
    }

    /// Build a matcher from a project's `paths`; `None` when it declares none
    pub fn from_project(project: &ProjectConfig) -> Option<Self> {
        let paths = &project.compiler_options.paths;
        if paths.is_empty() {
            return None;
        }
        Some(Self::new(
            project.paths_base(),
            paths.iter().map(|(k, v)| (k.as_str(), v.clone())),
        ))
    }
}

impl AliasMatcher for PathsMatcher {
    fn candidates(&self, specifier: &str) -> Vec<PathBuf> {
        let exact = self
            .patterns
            .iter()
            .find(|p| !p.wildcard && p.capture(specifier).is_some());
        let best = exact.or_else(|| {
            self.patterns
                .iter()
                .filter(|p| p.wildcard && p.capture(specifier).is_some())
                .max_by_key(|p| p.prefix.len())
        });

        let Some(pattern) = best else {
            return Vec::new();
        };
        let captured = pattern.capture(specifier).unwrap_or_default();
        pattern
            .targets
            .iter()
            .map(|target| self.base.join(target.replacen('*', captured, 1)))
            .collect()
    }
}
