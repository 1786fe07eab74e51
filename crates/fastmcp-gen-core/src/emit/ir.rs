//! Minimal source-module representation: imports plus one exported declaration.

/// Form of an import statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// `import name from '...'`
    Default,
    /// `import { a, b } from '...'`
    Named,
    /// `import type { A, B } from '...'`
    TypeOnly,
}

/// One import statement; `path` is the already-resolved literal path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub kind: ImportKind,
    pub names: Vec<String>,
    pub path: String,
}

impl Import {
    pub fn default_import(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: ImportKind::Default,
            names: vec![name.into()],
            path: path.into(),
        }
    }

    pub fn named<I, S>(names: I, path: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ImportKind::Named,
            names: names.into_iter().map(Into::into).collect(),
            path: path.into(),
        }
    }

    pub fn type_only<I, S>(names: I, path: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ImportKind::TypeOnly,
            names: names.into_iter().map(Into::into).collect(),
            path: path.into(),
        }
    }

    fn render(&self) -> String {
        let path = single_quoted(&self.path);
        match self.kind {
            ImportKind::Default => format!("import {} from {}", self.names.join(", "), path),
            ImportKind::Named => format!("import {{ {} }} from {}", self.names.join(", "), path),
            ImportKind::TypeOnly => {
                format!("import type {{ {} }} from {}", self.names.join(", "), path)
            }
        }
    }
}

/// The single exported declaration of a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Exported binding name
    pub name: String,
    /// Full declaration text
    pub body: String,
}

/// A generated source file before serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceModule {
    pub banner: Option<String>,
    pub imports: Vec<Import>,
    pub declaration: Declaration,
}

impl SourceModule {
    pub fn new(declaration: Declaration) -> Self {
        Self {
            banner: None,
            imports: Vec::new(),
            declaration,
        }
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = Some(banner.into());
        self
    }

    pub fn import(&mut self, import: Import) -> &mut Self {
        self.imports.push(import);
        self
    }

    /// Imports of the same kind and path merged, names deduplicated, first
    /// occurrence order kept; empty named imports dropped.
    pub fn merged_imports(&self) -> Vec<Import> {
        let mut merged: Vec<Import> = Vec::new();
        for import in &self.imports {
            if import.names.is_empty() {
                continue;
            }
            let existing = merged.iter_mut().find(|m| {
                m.kind == import.kind && m.path == import.path && m.kind != ImportKind::Default
            });
            match existing {
                Some(target) => {
                    for name in &import.names {
                        if !target.names.contains(name) {
                            target.names.push(name.clone());
                        }
                    }
                }
                None => {
                    let duplicate_default = import.kind == ImportKind::Default
                        && merged.iter().any(|m| m == import);
                    if !duplicate_default {
                        let mut fresh = import.clone();
                        fresh.names.dedup();
                        merged.push(fresh);
                    }
                }
            }
        }
        merged
    }

    /// Serialize to source text
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(banner) = &self.banner {
            out.push_str(banner.trim_end());
            out.push_str("\n\n");
        }
        let imports = self.merged_imports();
        for import in &imports {
            out.push_str(&import.render());
            out.push('\n');
        }
        if !imports.is_empty() {
            out.push('\n');
        }
        out.push_str(self.declaration.body.trim_end());
        out.push('\n');
        out
    }
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}
