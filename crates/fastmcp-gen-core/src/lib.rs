//! fastmcp-gen Core Library
//!
//! Generates FastMCP tool servers from OpenAPI documents: one TypeScript
//! request handler per operation, the type and zod validator modules those
//! handlers use, and a server module registering every handler as a tool.

pub mod config;
pub mod emit;
pub mod error;
pub mod filter;
pub mod generate;
pub mod hooks;
pub mod imports;
pub mod layout;
pub mod naming;
pub mod openapi;
pub mod operation;
pub mod plan;
pub mod schema_emit;
pub mod schema_ref;
pub mod templates;
pub mod tool_schema;
pub mod url;
pub mod utils;

pub use crate::{
    config::Config,
    error::{Error, Result},
    generate::{generate, generate_modules, write_files, GenerationReport, OperationFailure},
    imports::{ImportStyle, ResolvedImportOptions},
    openapi::OpenApiContext,
    plan::{synthesize, ParameterPlan},
    templates::TemplateSet,
};
