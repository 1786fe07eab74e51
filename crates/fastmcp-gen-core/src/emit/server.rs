//! Server, client, barrel and launch-configuration emission.

use serde::Serialize;
use serde_json::{json, Map, Value as JsonValue};

use super::ir::{Declaration, Import, SourceModule};
use super::{EmitContext, PlannedOperation};
use crate::config::Runtime;
use crate::error::Result;
use crate::imports::relative_specifier;
use crate::layout::BANNER;
use crate::templates::{CLIENT_TEMPLATE, SERVER_TEMPLATE};
use crate::tool_schema::tool_invocation;
use crate::utils::js_string;

/// Port used by the HTTP stream transport when `--port` is absent
pub const DEFAULT_PORT: u16 = 8080;

/// Exported name of the server instance
const SERVER_BINDING: &str = "server";

/// Identity the server reports to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
struct ToolContext {
    name: String,
    description: String,
    parameters: Option<String>,
    invocation: String,
}

#[derive(Debug, Serialize)]
struct ServerTemplateContext {
    name: &'static str,
    server_name: String,
    server_version: String,
    tools: Vec<ToolContext>,
    default_port: u16,
}

/// Render the server module registering one tool per operation
pub fn render_server(
    operations: &[PlannedOperation],
    info: &ServerInfo,
    ctx: &EmitContext,
) -> Result<SourceModule> {
    let emitting = ctx.layout.server_file();

    let tools = operations
        .iter()
        .map(|op| {
            let operation = op.named.operation();
            ToolContext {
                name: js_string(&operation.tool_name()),
                description: js_string(&operation.tool_description()),
                parameters: op.plan.tool_schema.clone(),
                invocation: tool_invocation(&op.plan, &op.named.handler_name),
            }
        })
        .collect::<Vec<_>>();

    let context = ServerTemplateContext {
        name: SERVER_BINDING,
        server_name: js_string(&info.name),
        server_version: js_string(&info.version),
        tools,
        default_port: DEFAULT_PORT,
    };
    let body = ctx.templates.render(SERVER_TEMPLATE, &context)?;

    let mut module = SourceModule::new(Declaration {
        name: SERVER_BINDING.to_string(),
        body,
    })
    .with_banner(BANNER);

    module.import(Import::named(["FastMCP"], ctx.package_path("fastmcp", &emitting)));
    let uses_zod = operations
        .iter()
        .filter_map(|op| op.plan.tool_schema.as_deref())
        .any(|schema| schema.starts_with("z."));
    if uses_zod {
        module.import(Import::named(["z"], ctx.package_path("zod", &emitting)));
    }

    for op in operations {
        let handler_file = ctx.layout.handler_file(op.named.operation());
        module.import(Import::named(
            [op.named.handler_name.clone()],
            ctx.import_path(&handler_file, &emitting),
        ));

        let validators = &op.named.schemas.validators;
        let names = validators.parameter_names();
        if !names.is_empty() {
            let validator_file = ctx.layout.validator_file(&op.named);
            module.import(Import::named(names, ctx.import_path(&validator_file, &emitting)));
        }
    }

    Ok(module)
}

/// Render the default transport client module
pub fn render_client(base_url: Option<&str>, ctx: &EmitContext) -> Result<SourceModule> {
    let body = ctx.templates.render(
        CLIENT_TEMPLATE,
        &json!({ "base_url": js_string(base_url.unwrap_or_default()) }),
    )?;
    Ok(SourceModule::new(Declaration {
        name: "client".to_string(),
        body,
    })
    .with_banner(BANNER))
}

/// Render the handler barrel re-exporting every handler
pub fn render_barrel(operations: &[PlannedOperation], ctx: &EmitContext) -> SourceModule {
    let emitting = ctx.layout.barrel_file();
    let exports: Vec<String> = operations
        .iter()
        .map(|op| {
            let path = ctx.import_path(&ctx.layout.handler_file(op.named.operation()), &emitting);
            format!("export {{ {} }} from '{}'", op.named.handler_name, path)
        })
        .collect();

    let server = ctx.import_path(&ctx.layout.server_file(), &emitting);
    let mut body = exports.join("\n");
    body.push_str(&format!("\nexport {{ {} }} from '{}'", SERVER_BINDING, server));

    SourceModule::new(Declaration {
        name: "index".to_string(),
        body,
    })
    .with_banner(BANNER)
}

/// Render `.fastmcp.json`: one launch entry per transport mode
pub fn render_launch_config(title: &str, runtime: Runtime, ctx: &EmitContext) -> Result<String> {
    let config_file = ctx.layout.launch_config_file();
    let config_dir = config_file.parent().unwrap_or_else(|| ctx.layout.handlers_dir());
    let server = relative_specifier(config_dir, &ctx.layout.server_file());
    let (command, args) = runtime.command(&server);

    let with_args = |extra: &[&str]| -> Vec<String> {
        args.iter()
            .cloned()
            .chain(extra.iter().map(|s| s.to_string()))
            .collect()
    };

    let port = DEFAULT_PORT.to_string();
    let mut servers = Map::new();
    servers.insert(
        format!("{}-stdio", title),
        json!({
            "type": "stdio",
            "command": command,
            "args": with_args(&["--transport", "stdio"]),
        }),
    );
    servers.insert(
        format!("{}-http", title),
        json!({
            "type": "httpStream",
            "command": command,
            "args": with_args(&["--transport", "httpStream", "--port", port.as_str()]),
        }),
    );

    let document = json!({ "fastmcpServers": JsonValue::Object(servers) });
    let mut text = serde_json::to_string_pretty(&document)?;
    text.push('\n');
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::test_support::*;
    use crate::imports::ResolvedImportStyle;

    fn info() -> ServerInfo {
        ServerInfo {
            name: "Swagger Petstore".into(),
            version: "1.0.0".into(),
        }
    }

    #[test]
    fn test_server_registers_every_operation() {
        let ctx = context(ResolvedImportStyle::TsExtensionsAllowed);
        let ops = planned(&petstore());
        let text = render_server(&ops, &info(), &ctx).unwrap().render();

        assert!(text.contains("import { FastMCP } from 'fastmcp'\n"));
        assert!(text.contains("import { z } from 'zod'\n"));
        assert!(text.contains("import { updateUserHandler } from './updateUser.ts'\n"));
        assert!(text.contains(
            "import { updateUserMutationRequestSchema, updateUserPathParamsSchema } from '../zod/updateUserSchema.ts'\n"
        ));
        assert!(text.contains("export const server = new FastMCP({"));
        assert!(text.contains("name: \"Swagger Petstore\","));
        assert_eq!(text.matches(".addTool({").count(), 4);

        assert!(text.contains("parameters: getUserByIdPathParamsSchema,"));
        assert!(text.contains("return await getUserByIdHandler(args)"));
        assert!(text.contains(
            "parameters: z.object({ data: updateUserMutationRequestSchema, ...updateUserPathParamsSchema.shape }),"
        ));
        assert!(text.contains("parameters: listUsersQueryParamsSchema,"));
        assert!(text.contains("return await listUsersHandler({ queryParams: args })"));
        assert!(text.contains("return await healthCheckHandler({})"));

        assert!(text.contains("transportType: \"httpStream\""));
        assert!(text.contains("httpStream: { port }"));
        assert!(text.contains(": 8080"));
    }

    #[test]
    fn test_empty_tool_has_no_parameters() {
        let ctx = context(ResolvedImportStyle::TsExtensionsAllowed);
        let ops = planned(&petstore());
        let health = find(&ops, "healthCheck").clone();
        let text = render_server(&[health], &info(), &ctx).unwrap().render();

        assert!(!text.contains("parameters:"));
        assert!(text.contains("execute: async () => {"));
        assert!(!text.contains("from 'zod'"));
        assert!(!text.contains("../zod/"));
    }

    #[test]
    fn test_launch_config_per_runtime() {
        let ctx = context(ResolvedImportStyle::TsExtensionsAllowed);
        let text = render_launch_config("Swagger Petstore", Runtime::Node, &ctx).unwrap();
        let config: JsonValue = serde_json::from_str(&text).unwrap();

        let http = &config["fastmcpServers"]["Swagger Petstore-http"];
        assert_eq!(http["type"], "httpStream");
        assert_eq!(http["command"], "npx");
        assert_eq!(
            http["args"],
            json!(["tsx", "./server.ts", "--transport", "httpStream", "--port", "8080"])
        );

        let text = render_launch_config("Swagger Petstore", Runtime::Bun, &ctx).unwrap();
        let config: JsonValue = serde_json::from_str(&text).unwrap();
        let stdio = &config["fastmcpServers"]["Swagger Petstore-stdio"];
        assert_eq!(stdio["command"], "bun");
        assert_eq!(stdio["args"], json!(["./server.ts", "--transport", "stdio"]));
    }

    #[test]
    fn test_client_and_barrel() {
        let ctx = context(ResolvedImportStyle::NoExtensionOk);
        let client = render_client(Some("https://petstore.example/v1"), &ctx).unwrap().render();
        assert!(client.contains("const defaultBaseURL = \"https://petstore.example/v1\""));
        assert!(client.contains("export default async function client<"));
        assert!(client.contains("export type ResponseErrorConfig<TError = unknown> = {"));
        assert!(client.contains("    data: TError\n    status: number\n    statusText: string\n"));
        assert!(client.contains("const errorResponse: ResponseErrorConfig<TError> = {"));

        let ops = planned(&petstore());
        let barrel = render_barrel(&ops, &ctx).render();
        assert!(barrel.contains("export { getUserByIdHandler } from './getUserById.ts'"));
        assert!(barrel.contains("export { server } from './server.ts'"));
    }
}
