//! Import path resolution.
//!
//! Computes the literal import path one generated module uses to reach
//! another module, emulating the project's module-resolution policy without
//! running it: passthrough packages, alias rewriting, bare-specifier check,
//! then the extension policy.
//!
//! Every settled import style names an extension, so resolution never looks
//! at the filesystem. Relative paths are anchored on the options' build root,
//! so the same inputs always produce the same path.

pub mod alias;
pub mod options;
pub mod project;
pub mod style;

use std::path::{Component, Path, PathBuf};

pub use alias::{AliasMatcher, PathsMatcher};
pub use options::{ImportSettings, ResolvedImportOptions, DEFAULT_PASSTHROUGH};
pub use project::ProjectConfig;
pub use style::{ImportStyle, ResolvedImportStyle};

/// Extensions that mark a specifier as already complete
pub const KNOWN_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs", ".json",
];

/// A module reference awaiting resolution, tied to the file that imports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModuleRef {
    pub specifier: String,
    pub emitting_file: PathBuf,
}

impl GeneratedModuleRef {
    pub fn new(specifier: impl Into<String>, emitting_file: impl Into<PathBuf>) -> Self {
        Self {
            specifier: specifier.into(),
            emitting_file: emitting_file.into(),
        }
    }

    /// Reference from `emitting_file` to another generated file, extension
    /// dropped; relative paths are taken from `root`
    pub fn to_file(target: &Path, emitting_file: &Path, root: &Path) -> Self {
        let base_dir = emitting_file.parent().unwrap_or_else(|| Path::new(""));
        let specifier = relative_specifier(
            &anchor(base_dir, root),
            &anchor(&target.with_extension(""), root),
        );
        Self::new(specifier, emitting_file)
    }
}

/// Resolve a pending reference into its literal import path
pub fn resolve_module_ref(module_ref: GeneratedModuleRef, options: &ResolvedImportOptions) -> String {
    resolve(&module_ref.specifier, options, &module_ref.emitting_file)
}

/// Compute the literal import path for `specifier` as imported from `emitting_file`
pub fn resolve(specifier: &str, options: &ResolvedImportOptions, emitting_file: &Path) -> String {
    if options.passthrough.contains(specifier) {
        return specifier.to_string();
    }

    let base_dir = emitting_file.parent().unwrap_or_else(|| Path::new(""));
    let mut resolved = specifier.to_string();

    if let Some(matcher) = &options.alias_matcher {
        let candidates = matcher.candidates(specifier);
        if candidates.len() > 1 {
            log::debug!(
                "alias {} has {} candidates, using {}",
                specifier,
                candidates.len(),
                candidates[0].display()
            );
        }
        if let Some(first) = candidates.first() {
            resolved = relative_specifier(
                &anchor(base_dir, &options.build_root),
                &anchor(first, &options.build_root),
            );
            log::debug!("alias {} -> {}", specifier, resolved);
        }
    }

    if !is_path_specifier(&resolved) || has_known_extension(&resolved) {
        return resolved;
    }

    let extension = match options.style {
        ResolvedImportStyle::NeedsJsExtension => ".js",
        ResolvedImportStyle::TsExtensionsAllowed => ".ts",
        ResolvedImportStyle::NoExtensionOk => {
            let jsx = options.project.as_ref().is_some_and(ProjectConfig::uses_jsx);
            if jsx && looks_like_component_module(&resolved) {
                ".tsx"
            } else {
                ".ts"
            }
        }
    };
    format!("{}{}", resolved, extension)
}

/// Relative (`./`, `../`) or absolute specifier, as opposed to a package name
pub fn is_path_specifier(specifier: &str) -> bool {
    specifier.starts_with('.') || specifier.starts_with('/')
}

pub fn has_known_extension(specifier: &str) -> bool {
    let last = specifier.rsplit('/').next().unwrap_or(specifier);
    KNOWN_EXTENSIONS.iter().any(|ext| last.len() > ext.len() && last.ends_with(ext))
}

/// Component-style module naming (`Button.x`-like stems ending in `x`)
pub fn looks_like_component_module(specifier: &str) -> bool {
    specifier.ends_with('x')
}

/// `path` joined onto `root` when relative, normalized
pub fn anchor(path: &Path, root: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&root.join(path))
    }
}

/// Lexically remove `.` and resolve `..` components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal = matches!(out.components().last(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `./`-prefixed forward-slash path from `from_dir` to `target`.
///
/// Purely lexical; both paths must share a base (see [`anchor`]).
pub fn relative_specifier(from_dir: &Path, target: &Path) -> String {
    let (from, to) = (normalize_path(from_dir), normalize_path(target));

    let from_parts: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();
    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = vec!["..".to_string(); from_parts.len() - common];
    segments.extend(
        to_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );

    let joined = segments.join("/");
    if joined.is_empty() {
        ".".to_string()
    } else if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn options(style: ResolvedImportStyle) -> ResolvedImportOptions {
        ResolvedImportOptions::new(style, "/repo")
    }

    const HANDLER: &str = "/repo/src/gen/fastmcp/pet/addPet.ts";

    #[test]
    fn test_passthrough_is_untouched() {
        let opts = options(ResolvedImportStyle::NeedsJsExtension)
            .with_passthrough("@kubb/plugin-client/clients/axios");
        let file = Path::new(HANDLER);
        assert_eq!(resolve("fastmcp", &opts, file), "fastmcp");
        assert_eq!(resolve("zod", &opts, file), "zod");
        assert_eq!(
            resolve("@kubb/plugin-client/clients/axios", &opts, file),
            "@kubb/plugin-client/clients/axios"
        );
    }

    #[test]
    fn test_bare_specifiers_are_unchanged() {
        let opts = options(ResolvedImportStyle::NeedsJsExtension);
        assert_eq!(resolve("axios", &opts, Path::new(HANDLER)), "axios");
        assert_eq!(resolve("@scope/pkg/sub", &opts, Path::new(HANDLER)), "@scope/pkg/sub");
    }

    #[test]
    fn test_extension_policies() {
        let file = Path::new(HANDLER);
        assert_eq!(
            resolve("../../types/AddPet", &options(ResolvedImportStyle::NeedsJsExtension), file),
            "../../types/AddPet.js"
        );
        assert_eq!(
            resolve("../../types/AddPet", &options(ResolvedImportStyle::TsExtensionsAllowed), file),
            "../../types/AddPet.ts"
        );
        let project = ProjectConfig::parse("/repo/tsconfig.json", "{}").unwrap();
        let opts = options(ResolvedImportStyle::NoExtensionOk).with_project(project);
        assert_eq!(resolve("../../types/AddPet", &opts, file), "../../types/AddPet.ts");
    }

    #[test]
    fn test_existing_extension_is_kept() {
        let opts = options(ResolvedImportStyle::NeedsJsExtension);
        let file = Path::new(HANDLER);
        assert_eq!(resolve("./client.ts", &opts, file), "./client.ts");
        assert_eq!(resolve("../data.json", &opts, file), "../data.json");
        // `.service` is not a module extension
        assert_eq!(resolve("./user.service", &opts, file), "./user.service.js");
    }

    #[test]
    fn test_jsx_component_modules_get_tsx() {
        let project = ProjectConfig::parse(
            "/repo/tsconfig.json",
            r#"{ "compilerOptions": { "jsx": "react-jsx" } }"#,
        )
        .unwrap();
        let opts = options(ResolvedImportStyle::NoExtensionOk).with_project(project);
        let file = Path::new(HANDLER);
        assert_eq!(resolve("./components/Box", &opts, file), "./components/Box.tsx");
        assert_eq!(resolve("./components/Card", &opts, file), "./components/Card.ts");
    }

    #[test]
    fn test_no_extension_ok_without_project_appends_ts() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        let emitting = dir.path().join("fastmcp").join("addPet.ts");
        std::fs::create_dir_all(dir.path().join("fastmcp"))?;
        std::fs::write(dir.path().join("client.js"), "")?;
        std::fs::write(dir.path().join("Widget.tsx"), "")?;

        // Sibling files on disk do not change the chosen extension
        let opts = ResolvedImportOptions::new(ResolvedImportStyle::NoExtensionOk, dir.path());
        assert_eq!(resolve("../missing", &opts, &emitting), "../missing.ts");
        assert_eq!(resolve("../client", &opts, &emitting), "../client.ts");
        // Without a project there is no JSX signal
        assert_eq!(resolve("../Widget", &opts, &emitting), "../Widget.ts");
        Ok(())
    }

    #[test]
    fn test_relative_paths_anchor_on_build_root() {
        let opts = options(ResolvedImportStyle::NeedsJsExtension).with_alias_matcher(Arc::new(
            PathsMatcher::new("lib", vec![("~/*", vec!["./*".to_string()])]),
        ));
        // Relative alias target against an absolute emitting file
        assert_eq!(
            resolve("~/client", &opts, Path::new("/repo/src/handler.ts")),
            "../lib/client.js"
        );

        let module_ref = GeneratedModuleRef::to_file(
            Path::new("/repo/out/types/AddPet.ts"),
            Path::new("out/fastmcp/addPet.ts"),
            Path::new("/repo"),
        );
        assert_eq!(module_ref.specifier, "../types/AddPet");
    }

    #[test]
    fn test_alias_first_candidate_relative_to_emitter() {
        let matcher = PathsMatcher::new(
            "/repo",
            vec![("@/*", vec!["./src/*".to_string(), "./lib/*".to_string()])],
        );
        let opts = options(ResolvedImportStyle::NeedsJsExtension)
            .with_alias_matcher(Arc::new(matcher));
        assert_eq!(
            resolve("@/client", &opts, Path::new(HANDLER)),
            "../../../client.js"
        );
        assert_eq!(
            resolve("@/gen/fastmcp/shared", &opts, Path::new(HANDLER)),
            "../shared.js"
        );
        assert_eq!(
            resolve("@/gen/fastmcp/pet/util", &opts, Path::new(HANDLER)),
            "./util.js"
        );
    }

    #[test]
    fn test_module_ref_between_generated_files() {
        let module_ref = GeneratedModuleRef::to_file(
            Path::new("/out/types/AddPet.ts"),
            Path::new("/out/fastmcp/pet/addPet.ts"),
            Path::new("/out"),
        );
        assert_eq!(module_ref.specifier, "../../types/AddPet");
        let opts = options(ResolvedImportStyle::NeedsJsExtension);
        assert_eq!(resolve_module_ref(module_ref, &opts), "../../types/AddPet.js");

        let sibling = GeneratedModuleRef::to_file(
            Path::new("out/fastmcp/client.ts"),
            Path::new("out/fastmcp/server.ts"),
            Path::new("."),
        );
        assert_eq!(sibling.specifier, "./client");
    }

    #[test]
    fn test_normalize_and_relative() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("../x/./y")), PathBuf::from("../x/y"));
        assert_eq!(relative_specifier(Path::new("/a/b"), Path::new("/a/b/c")), "./c");
        assert_eq!(relative_specifier(Path::new("/a/b"), Path::new("/a/d/e")), "../d/e");
        assert_eq!(relative_specifier(Path::new("/a/b"), Path::new("/a/b")), ".");
        assert_eq!(anchor(Path::new("./x/../y"), Path::new("/r")), PathBuf::from("/r/y"));
    }
}
