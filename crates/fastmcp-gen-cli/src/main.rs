//! fastmcp-gen CLI entrypoint
//! Parses command-line arguments and dispatches to the core generator.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use fastmcp_gen_core::config::{DataReturnType, Runtime};
use fastmcp_gen_core::filter::OperationFilter;
use fastmcp_gen_core::layout::GroupBy;
use fastmcp_gen_core::{Config, GenerationReport, ImportStyle, OpenApiContext, TemplateSet};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "fastmcp-gen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log decisions (fallbacks, import resolution) at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate FastMCP handlers and server from an OpenAPI document
    Generate(GenerateArgs),
    /// Write a starter configuration file
    Init {
        /// Destination; the format follows the extension (yaml, json, toml)
        #[arg(long, default_value = "fastmcp-gen.yaml")]
        path: PathBuf,
        /// Path or URL to the OpenAPI document
        #[arg(long, default_value = "openapi.yaml")]
        schema_path: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Configuration file (YAML, JSON or TOML); flags override its values
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Project name, used when the document has no title
    #[arg(long)]
    project_name: Option<String>,
    /// Path or URL to OpenAPI schema (YAML or JSON)
    ///
    /// Example: --schema-path path/to/schema.yaml
    /// Example: --schema-path https://example.com/openapi.json
    #[arg(long)]
    schema_path: Option<String>,
    /// Output directory for generated code
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Directory under the output directory for handlers and the server
    #[arg(long)]
    handlers_dir: Option<String>,
    /// Extension policy for relative imports
    #[arg(long, value_enum)]
    import_style: Option<ImportStyle>,
    /// tsconfig.json used to detect the import style and path aliases
    #[arg(long)]
    tsconfig: Option<PathBuf>,
    /// Runtime used in the launch configuration
    #[arg(long, value_enum)]
    runtime: Option<Runtime>,
    /// Group handler modules by tag or by first path segment
    #[arg(long, value_enum)]
    group: Option<GroupBy>,
    /// Module exporting the transport client instead of a generated client.ts
    #[arg(long)]
    client_import_path: Option<String>,
    /// Return the response payload only, or the full response
    #[arg(long, value_enum)]
    data_return_type: Option<DataReturnType>,
    /// Base URL sent with every request
    #[arg(long)]
    base_url: Option<Url>,
    /// Template override directory
    #[arg(long)]
    template_dir: Option<PathBuf>,
    /// Only generate matching operations: `tag:pet`, `method:get`, `path:/users/.*`
    /// or an operationId pattern (repeatable)
    #[arg(long = "include", value_name = "FILTER")]
    include: Vec<OperationFilter>,
    /// Skip matching operations; same syntax as --include (repeatable)
    #[arg(long = "exclude", value_name = "FILTER")]
    exclude: Vec<OperationFilter>,
    /// Render without writing; list the files that would be written
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Generate(args) => run_generate(args).await,
        Commands::Init {
            path,
            schema_path,
            force,
        } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            let config = Config::new("fastmcp-server", schema_path, "generated");
            config
                .save(&path)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let config = build_config(&args).await?;
    tracing::debug!(
        "Generating from {} into {}",
        config.openapi_schema_path,
        config.output_dir
    );

    let report = if args.dry_run {
        let document = OpenApiContext::from_file_or_url(&config.openapi_schema_path)
            .await
            .context("Failed to load OpenAPI schema")?;
        let template_dir =
            TemplateSet::discover_dir(config.template_dir.as_deref().map(std::path::Path::new));
        let templates = TemplateSet::load(template_dir.as_deref())
            .await
            .context("Failed to load templates")?;
        let report = fastmcp_gen_core::generate_modules(&document, &config, templates).await?;
        for file in &report.files {
            println!("{}", file.path.display());
        }
        report
    } else {
        fastmcp_gen_core::generate(&config)
            .await
            .context("Generation failed")?
    };

    print_summary(&report, &config, args.dry_run);
    if !report.is_success() {
        bail!("{} operation(s) could not be generated", report.failures.len());
    }
    Ok(())
}

async fn build_config(args: &GenerateArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let Some(schema_path) = &args.schema_path else {
                bail!("--schema-path is required when no --config is given");
            };
            Config::new("fastmcp-server", schema_path.clone(), "generated")
        }
    };

    if let Some(name) = &args.project_name {
        config.project_name = name.clone();
    }
    if let Some(schema_path) = &args.schema_path {
        config.openapi_schema_path = schema_path.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.to_string_lossy().to_string();
    }
    if let Some(handlers_dir) = &args.handlers_dir {
        config.handlers_dir = handlers_dir.clone();
    }
    if let Some(style) = args.import_style {
        config.import_style = style;
    }
    if let Some(tsconfig) = &args.tsconfig {
        config.tsconfig_path = Some(tsconfig.to_string_lossy().to_string());
    }
    if let Some(runtime) = args.runtime {
        config.runtime = runtime;
    }
    if let Some(group) = args.group {
        config.group = Some(group);
    }
    if let Some(import_path) = &args.client_import_path {
        config.client.import_path = Some(import_path.clone());
    }
    if let Some(data_return_type) = args.data_return_type {
        config.client.data_return_type = data_return_type;
    }
    if let Some(base_url) = &args.base_url {
        config.client.base_url = Some(base_url.as_str().trim_end_matches('/').to_string());
    }
    if let Some(template_dir) = &args.template_dir {
        config.template_dir = Some(template_dir.to_string_lossy().to_string());
    }
    if !args.include.is_empty() {
        config.include = args.include.clone();
    }
    if !args.exclude.is_empty() {
        config.exclude = args.exclude.clone();
    }

    Ok(config)
}

fn print_summary(report: &GenerationReport, config: &Config, dry_run: bool) {
    for failure in &report.failures {
        eprintln!(
            "error: {} [{}]: {}",
            failure.operation,
            failure.error.rule(),
            failure.error
        );
    }
    let verb = if dry_run { "Rendered" } else { "Generated" };
    println!(
        "{} {} operation(s) into {}",
        verb,
        report.generated.len(),
        config.output_dir
    );
}
