//! Code generation entry points.
//!
//! [`generate`] runs the whole pipeline: load the document, name and plan
//! every operation, render all modules, write them, run hooks.
//! [`generate_modules`] is the pure part and performs no writes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tokio::task;

use crate::config::Config;
use crate::emit::{
    render_barrel, render_client, render_handler, render_launch_config, render_server,
    EmitContext, PlannedOperation, ServerInfo,
};
use crate::error::{Error, Result};
use crate::imports::{is_path_specifier, ImportSettings, ResolvedImportOptions};
use crate::layout::{OutputLayout, BANNER};
use crate::naming::{NamedOperation, SchemaNamer};
use crate::openapi::OpenApiContext;
use crate::plan::synthesize;
use crate::schema_emit::SchemaEmitter;
use crate::templates::TemplateSet;

/// One file ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// An operation that was skipped, and why
#[derive(Debug)]
pub struct OperationFailure {
    /// Operation identifier
    pub operation: String,
    pub error: Error,
}

/// Outcome of a generation run
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Identifiers of the operations that were generated, in document order
    pub generated: Vec<String>,
    pub failures: Vec<OperationFailure>,
    pub files: Vec<GeneratedFile>,
}

impl GenerationReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Main entry point for code generation
pub async fn generate(config: &Config) -> Result<GenerationReport> {
    // 1. Load OpenAPI document
    let document = OpenApiContext::from_file_or_url(&config.openapi_schema_path).await?;

    // 2. Load templates, with overrides when a template directory is found
    let template_dir = TemplateSet::discover_dir(config.template_dir.as_deref().map(Path::new));
    let templates = TemplateSet::load(template_dir.as_deref()).await?;
    if let Some(dir) = templates.source_dir() {
        log::info!("Using template overrides from {}", dir.display());
    }

    // 3. Render everything in memory
    let report = generate_modules(&document, config, templates).await?;

    // 4. Write and run hooks
    write_files(&report.files).await?;
    if !config.hooks.is_empty() {
        config.hooks.run_post_generate(&config.output_path()).await?;
    }

    Ok(report)
}

/// Render every module for `document` without touching the output directory
pub async fn generate_modules(
    document: &OpenApiContext,
    config: &Config,
    templates: TemplateSet,
) -> Result<GenerationReport> {
    let mut report = GenerationReport::default();

    let selector = config.selector()?;
    let specs: Vec<_> = document
        .operations()?
        .into_iter()
        .filter(|spec| selector.selects(&spec.operation))
        .collect();
    log::info!("Generating {} operations", specs.len());

    let namer = SchemaNamer::new();
    let mut named_operations: Vec<NamedOperation> = Vec::with_capacity(specs.len());
    for spec in &specs {
        match namer.name(spec) {
            Ok(named) => named_operations.push(named),
            Err(error) => record_failure(&mut report, spec.operation.identifier(), error)?,
        }
    }

    let layout = OutputLayout::new(config.output_path(), &config.handlers_dir, config.group);
    let named_operations = reject_collisions(&layout, named_operations, config, &mut report)?;

    // Import options are settled once, before any operation is rendered
    let passthrough = config
        .client
        .import_path
        .iter()
        .filter(|path| !is_path_specifier(path))
        .cloned()
        .collect();
    let imports = ResolvedImportOptions::initialize(ImportSettings {
        style: config.import_style,
        tsconfig_path: config.tsconfig_path.as_ref().map(PathBuf::from),
        build_root: std::env::current_dir()?,
        passthrough,
    })
    .await?;

    let ctx = Arc::new(EmitContext {
        layout,
        imports: Arc::new(imports),
        templates,
        client: config.client.clone(),
        selector,
    });
    let emitter = Arc::new(SchemaEmitter::new(document.component_schemas()));

    let tasks = named_operations.into_iter().map(|named| {
        let ctx = Arc::clone(&ctx);
        let emitter = Arc::clone(&emitter);
        task::spawn_blocking(move || render_operation(named, &ctx, &emitter))
    });

    // join_all yields results in submission order, which is document order
    let mut planned = Vec::new();
    for joined in join_all(tasks).await {
        let (identifier, outcome) = joined.map_err(|e| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("operation worker failed: {}", e),
            ))
        })?;
        match outcome {
            Ok((operation, files)) => {
                report.generated.push(identifier);
                report.files.extend(files);
                planned.push(operation);
            }
            Err(error) => record_failure(&mut report, identifier, error)?,
        }
    }

    let title = document
        .title()
        .map(str::to_string)
        .unwrap_or_else(|| config.project_name.clone());
    let info = ServerInfo {
        name: title.clone(),
        version: document.version().unwrap_or("0.0.0").to_string(),
    };

    report.files.push(GeneratedFile {
        path: ctx.layout.server_file(),
        contents: render_server(&planned, &info, &ctx)?.render(),
    });
    report.files.push(GeneratedFile {
        path: ctx.layout.barrel_file(),
        contents: render_barrel(&planned, &ctx).render(),
    });
    if config.client.import_path.is_none() {
        let base_url = config.client.base_url.clone().or_else(|| document.base_path());
        report.files.push(GeneratedFile {
            path: ctx.layout.client_file(),
            contents: render_client(base_url.as_deref(), &ctx)?.render(),
        });
    }
    report.files.push(GeneratedFile {
        path: ctx.layout.launch_config_file(),
        contents: render_launch_config(&title, config.runtime, &ctx)?,
    });

    log::info!(
        "Rendered {} files ({} operations, {} failed)",
        report.files.len(),
        report.generated.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Write every file, creating parent directories as needed
pub async fn write_files(files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        if let Some(parent) = file.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        log::debug!("Writing {}", file.path.display());
        tokio::fs::write(&file.path, &file.contents).await?;
    }
    Ok(())
}

type RenderedOperation = (PlannedOperation, Vec<GeneratedFile>);

fn render_operation(
    named: NamedOperation,
    ctx: &EmitContext,
    emitter: &SchemaEmitter,
) -> (String, Result<RenderedOperation>) {
    let identifier = named.operation().identifier();
    let outcome = (|| -> Result<RenderedOperation> {
        let plan = synthesize(&named.schemas, named.operation())?;
        let mut files = vec![GeneratedFile {
            path: ctx.layout.handler_file(named.operation()),
            contents: render_handler(&named, &plan, ctx)?.render(),
        }];
        if let Some(module) = emitter.type_module(&named) {
            files.push(GeneratedFile {
                path: ctx.layout.type_file(&named),
                contents: module.with_banner(BANNER).render(),
            });
        }
        if let Some(module) = emitter.validator_module(&named) {
            files.push(GeneratedFile {
                path: ctx.layout.validator_file(&named),
                contents: module.with_banner(BANNER).render(),
            });
        }
        Ok((PlannedOperation { named, plan }, files))
    })();
    (identifier, outcome)
}

// Per-operation errors are collected; anything else aborts the run
fn record_failure(report: &mut GenerationReport, operation: String, error: Error) -> Result<()> {
    if !error.is_operation_fatal() {
        return Err(error);
    }
    log::warn!("Skipping {} ({}): {}", operation, error.rule(), error);
    report.failures.push(OperationFailure { operation, error });
    Ok(())
}

/// Drop operations whose files, handler name or tool name are already taken.
///
/// The shared modules claim their files first; then operations claim theirs
/// in document order, so the first of two clashing operations is kept.
fn reject_collisions(
    layout: &OutputLayout,
    named: Vec<NamedOperation>,
    config: &Config,
    report: &mut GenerationReport,
) -> Result<Vec<NamedOperation>> {
    let mut owners: HashMap<String, String> = HashMap::new();
    let mut shared = vec![
        (layout.server_file(), "the server module"),
        (layout.barrel_file(), "the handler index"),
        (layout.launch_config_file(), "the launch configuration"),
    ];
    if config.client.import_path.is_none() {
        shared.push((layout.client_file(), "the generated client"));
    }
    for (path, owner) in shared {
        owners.insert(file_claim(&path), owner.to_string());
    }

    let mut kept = Vec::with_capacity(named.len());
    for op in named {
        let identifier = op.operation().identifier();
        let claims: Vec<String> = layout
            .operation_files(&op)
            .iter()
            .map(|path| file_claim(path))
            .chain([
                format!("handler '{}'", op.handler_name),
                format!("tool '{}'", op.operation().tool_name()),
            ])
            .collect();

        let taken = claims
            .iter()
            .find_map(|claim| owners.get(claim).map(|owner| (claim.clone(), owner.clone())));
        match taken {
            Some((target, owner)) => {
                let error = Error::OutputCollision {
                    operation: identifier.clone(),
                    target,
                    owner,
                };
                record_failure(report, identifier, error)?;
            }
            None => {
                let owner = format!("operation '{}'", identifier);
                for claim in claims {
                    owners.insert(claim, owner.clone());
                }
                kept.push(op);
            }
        }
    }
    Ok(kept)
}

fn file_claim(path: &Path) -> String {
    format!("file {}", path.display())
}
