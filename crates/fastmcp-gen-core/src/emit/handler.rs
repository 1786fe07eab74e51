//! Handler module emission.

use serde::Serialize;

use super::ir::{Declaration, Import, SourceModule};
use super::EmitContext;
use crate::config::DataReturnType;
use crate::error::Result;
use crate::layout::BANNER;
use crate::naming::NamedOperation;
use crate::plan::{ParameterPlan, CLIENT_BINDING, RESPONSE_LOCAL};
use crate::schema_ref::SchemaRef;
use crate::templates::HANDLER_TEMPLATE;

/// Stand-in for an absent response, error or request type
const UNKNOWN_TYPE: &str = "unknown";

#[derive(Debug, Serialize)]
struct HandlerTemplateContext {
    name: String,
    parameter_list: String,
    has_body: bool,
    response_type: String,
    error_type: String,
    request_type: String,
    request_config: String,
    return_expression: String,
}

/// Render the handler module of one operation
pub fn render_handler(
    named: &NamedOperation,
    plan: &ParameterPlan,
    ctx: &EmitContext,
) -> Result<SourceModule> {
    let operation = named.operation();
    let emitting = ctx.layout.handler_file(operation);
    let types = &named.schemas.types;
    let client = ctx.client_for(operation);

    let response_type = type_or_unknown(types.response.as_ref(), &plan.operation, "response");
    let error_type = type_or_unknown(
        types.errors.first().map(|e| &e.schema),
        &plan.operation,
        "error",
    );
    let request_type = types
        .request
        .as_ref()
        .map(|r| r.name().to_string())
        .unwrap_or_else(|| UNKNOWN_TYPE.to_string());

    let return_expression = match client.data_return_type {
        DataReturnType::Data => format!("JSON.stringify({}.data)", RESPONSE_LOCAL),
        DataReturnType::Full => format!("JSON.stringify({})", RESPONSE_LOCAL),
    };

    let context = HandlerTemplateContext {
        name: named.handler_name.clone(),
        parameter_list: plan.parameter_list(),
        has_body: plan.request.data.is_some(),
        response_type,
        error_type: format!("ResponseErrorConfig<{}>", error_type),
        request_type,
        request_config: plan.request.render(client.base_url.as_deref()),
        return_expression,
    };
    let body = ctx.templates.render(HANDLER_TEMPLATE, &context)?;

    let mut module = SourceModule::new(Declaration {
        name: named.handler_name.clone(),
        body,
    })
    .with_banner(BANNER);

    let client_path = ctx.client_path(&emitting);
    module
        .import(Import::type_only(
            ["ContentResult"],
            ctx.package_path("fastmcp", &emitting),
        ))
        .import(Import::default_import(CLIENT_BINDING, client_path.clone()))
        .import(Import::type_only(["ResponseErrorConfig"], client_path));

    // The handler names its response, request, parameter and first error types
    for (file, names) in types.names_by_file(1) {
        let path = ctx.import_path(&ctx.layout.schema_file(&file), &emitting);
        module.import(Import::type_only(names, path));
    }

    Ok(module)
}

fn type_or_unknown(schema: Option<&SchemaRef>, operation: &str, slot: &str) -> String {
    match schema {
        Some(schema) => schema.name().to_string(),
        None => {
            log::debug!("{}: no {} schema, typed as {}", operation, slot, UNKNOWN_TYPE);
            UNKNOWN_TYPE.to_string()
        }
    }
}
