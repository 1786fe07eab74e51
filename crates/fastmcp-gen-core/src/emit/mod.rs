//! Rendering of handler, server, client and launch-configuration files.
//!
//! Decisions are made upstream (the parameter plan, the URL expression, the
//! tool schema, resolved import paths). This module only assembles them into
//! [`ir::SourceModule`]s whose declaration bodies come from the Tera templates.

pub mod handler;
pub mod ir;
pub mod server;

use std::path::Path;
use std::sync::Arc;

pub use handler::render_handler;
pub use server::{render_barrel, render_client, render_launch_config, render_server, ServerInfo};

use crate::config::ClientConfig;
use crate::filter::OperationSelector;
use crate::imports::{
    anchor, relative_specifier, resolve, resolve_module_ref, GeneratedModuleRef,
    ResolvedImportOptions,
};
use crate::layout::OutputLayout;
use crate::naming::NamedOperation;
use crate::operation::Operation;
use crate::plan::ParameterPlan;
use crate::templates::TemplateSet;

/// An operation ready for emission
#[derive(Debug, Clone)]
pub struct PlannedOperation {
    pub named: NamedOperation,
    pub plan: ParameterPlan,
}

/// Everything emission needs besides the operation itself; shared read-only
#[derive(Debug, Clone)]
pub struct EmitContext {
    pub layout: OutputLayout,
    pub imports: Arc<ResolvedImportOptions>,
    pub templates: TemplateSet,
    pub client: ClientConfig,
    /// Per-operation client overrides
    pub selector: OperationSelector,
}

impl EmitContext {
    /// Client settings for `operation`, overrides applied
    pub fn client_for(&self, operation: &Operation) -> ClientConfig {
        self.selector.client_for(&self.client, operation)
    }

    /// Import path from `emitting_file` to another generated file
    pub fn import_path(&self, target: &Path, emitting_file: &Path) -> String {
        let module_ref = GeneratedModuleRef::to_file(target, emitting_file, &self.imports.build_root);
        resolve_module_ref(module_ref, &self.imports)
    }

    /// Import path of a package or user-supplied specifier
    pub fn package_path(&self, specifier: &str, emitting_file: &Path) -> String {
        resolve(specifier, &self.imports, emitting_file)
    }

    /// Import path of the transport client as seen from `emitting_file`.
    ///
    /// A configured relative import path is taken relative to the output root.
    pub fn client_path(&self, emitting_file: &Path) -> String {
        match &self.client.import_path {
            Some(path) if path.starts_with('.') => {
                let root = &self.imports.build_root;
                let base_dir = emitting_file.parent().unwrap_or_else(|| Path::new(""));
                let specifier = relative_specifier(
                    &anchor(base_dir, root),
                    &anchor(&self.layout.root().join(path), root),
                );
                resolve_module_ref(GeneratedModuleRef::new(specifier, emitting_file), &self.imports)
            }
            Some(specifier) => self.package_path(specifier, emitting_file),
            None => self.import_path(&self.layout.client_file(), emitting_file),
        }
    }
}
