//! TypeScript type and zod validator modules from JSON Schema.
//!
//! Supports the subset of JSON Schema that OpenAPI documents commonly use:
//! objects with `required`, arrays, primitives, `enum`, `nullable`, `oneOf` /
//! `anyOf` unions, `allOf` intersections, and `$ref` into
//! `#/components/schemas`. References are inlined; a reference cycle is cut
//! with `unknown`. Anything unrecognised is `unknown` as well.

use serde_json::{json, Map, Value as JsonValue};

use crate::emit::ir::{Declaration, Import, SourceModule};
use crate::naming::NamedOperation;
use crate::openapi::{component_schema_name, OpenApiParameter};
use crate::schema_ref::SchemaRef;
use crate::utils::{js_property_key, js_string};

/// Renders JSON schemas as TypeScript types and zod expressions
#[derive(Debug, Clone, Default)]
pub struct SchemaEmitter {
    components: Map<String, JsonValue>,
}

impl SchemaEmitter {
    pub fn new(components: Map<String, JsonValue>) -> Self {
        Self { components }
    }

    /// TypeScript type expression for `schema`
    pub fn ts_type(&self, schema: &JsonValue) -> String {
        self.ts(schema, &mut Vec::new())
    }

    /// zod expression for `schema`
    pub fn zod(&self, schema: &JsonValue) -> String {
        self.zod_expr(schema, &mut Vec::new())
    }

    fn lookup<'a>(&'a self, schema: &'a JsonValue, stack: &[String]) -> Lookup<'a> {
        match schema.get("$ref").and_then(JsonValue::as_str) {
            None => Lookup::Inline(schema),
            Some(reference) => match component_schema_name(reference) {
                Some(name) if stack.iter().any(|s| s == name) => Lookup::Cycle,
                Some(name) => match self.components.get(name) {
                    Some(target) => Lookup::Ref(name.to_string(), target),
                    None => {
                        log::debug!("unresolved schema reference {}", reference);
                        Lookup::Missing
                    }
                },
                None => {
                    log::debug!("unsupported schema reference {}", reference);
                    Lookup::Missing
                }
            },
        }
    }

    fn ts(&self, schema: &JsonValue, stack: &mut Vec<String>) -> String {
        match self.lookup(schema, stack) {
            Lookup::Cycle | Lookup::Missing => "unknown".to_string(),
            Lookup::Ref(name, target) => {
                stack.push(name);
                let out = self.ts(target, stack);
                stack.pop();
                out
            }
            Lookup::Inline(schema) => {
                let base = self.ts_inline(schema, stack);
                if is_nullable(schema) {
                    format!("{} | null", parenthesize(&base))
                } else {
                    base
                }
            }
        }
    }

    fn ts_inline(&self, schema: &JsonValue, stack: &mut Vec<String>) -> String {
        if let Some(values) = schema.get("enum").and_then(JsonValue::as_array) {
            if values.is_empty() {
                return "never".to_string();
            }
            return values
                .iter()
                .map(JsonValue::to_string)
                .collect::<Vec<_>>()
                .join(" | ");
        }
        if let Some(variants) = union_variants(schema) {
            return join_members(variants.iter().map(|v| self.ts(v, stack)), " | ");
        }
        if let Some(parts) = schema.get("allOf").and_then(JsonValue::as_array) {
            return join_members(parts.iter().map(|v| self.ts(v, stack)), " & ");
        }

        match schema_type(schema).as_deref() {
            Some("string") => "string".to_string(),
            Some("integer") | Some("number") => "number".to_string(),
            Some("boolean") => "boolean".to_string(),
            Some("null") => "null".to_string(),
            Some("array") => {
                let items = schema.get("items").cloned().unwrap_or(JsonValue::Null);
                format!("Array<{}>", self.ts(&items, stack))
            }
            Some("object") => self.ts_object(schema, stack),
            _ => "unknown".to_string(),
        }
    }

    fn ts_object(&self, schema: &JsonValue, stack: &mut Vec<String>) -> String {
        let required = required_set(schema);
        match schema.get("properties").and_then(JsonValue::as_object) {
            Some(props) if !props.is_empty() => {
                let members: Vec<String> = props
                    .iter()
                    .map(|(key, prop)| {
                        let optional = if required.contains(&key.as_str()) { "" } else { "?" };
                        format!("{}{}: {}", js_property_key(key), optional, self.ts(prop, stack))
                    })
                    .collect();
                format!("{{ {} }}", members.join("; "))
            }
            _ => match schema.get("additionalProperties") {
                Some(JsonValue::Object(extra)) if !extra.is_empty() => {
                    let value = JsonValue::Object(extra.clone());
                    format!("Record<string, {}>", self.ts(&value, stack))
                }
                _ => "Record<string, unknown>".to_string(),
            },
        }
    }

    fn zod_expr(&self, schema: &JsonValue, stack: &mut Vec<String>) -> String {
        match self.lookup(schema, stack) {
            Lookup::Cycle | Lookup::Missing => "z.unknown()".to_string(),
            Lookup::Ref(name, target) => {
                stack.push(name);
                let out = self.zod_expr(target, stack);
                stack.pop();
                out
            }
            Lookup::Inline(schema) => {
                let base = self.zod_inline(schema, stack);
                let base = match schema.get("description").and_then(JsonValue::as_str) {
                    Some(description) => format!("{}.describe({})", base, js_string(description)),
                    None => base,
                };
                if is_nullable(schema) {
                    format!("{}.nullable()", base)
                } else {
                    base
                }
            }
        }
    }

    fn zod_inline(&self, schema: &JsonValue, stack: &mut Vec<String>) -> String {
        if let Some(values) = schema.get("enum").and_then(JsonValue::as_array) {
            if !values.is_empty() && values.iter().all(JsonValue::is_string) {
                let items: Vec<String> = values.iter().map(JsonValue::to_string).collect();
                return format!("z.enum([{}])", items.join(", "));
            }
            let literals: Vec<String> = values
                .iter()
                .map(|v| format!("z.literal({})", v))
                .collect();
            return match literals.len() {
                0 => "z.never()".to_string(),
                1 => literals[0].clone(),
                _ => format!("z.union([{}])", literals.join(", ")),
            };
        }
        if let Some(variants) = union_variants(schema) {
            let members: Vec<String> = variants.iter().map(|v| self.zod_expr(v, stack)).collect();
            return match members.len() {
                0 => "z.unknown()".to_string(),
                1 => members[0].clone(),
                _ => format!("z.union([{}])", members.join(", ")),
            };
        }
        if let Some(parts) = schema.get("allOf").and_then(JsonValue::as_array) {
            let mut members = parts.iter().map(|v| self.zod_expr(v, stack));
            let Some(first) = members.next() else {
                return "z.unknown()".to_string();
            };
            return members.fold(first, |acc, next| format!("z.intersection({}, {})", acc, next));
        }

        match schema_type(schema).as_deref() {
            Some("string") => "z.string()".to_string(),
            Some("integer") => "z.number().int()".to_string(),
            Some("number") => "z.number()".to_string(),
            Some("boolean") => "z.boolean()".to_string(),
            Some("null") => "z.null()".to_string(),
            Some("array") => {
                let items = schema.get("items").cloned().unwrap_or(JsonValue::Null);
                format!("z.array({})", self.zod_expr(&items, stack))
            }
            Some("object") => self.zod_object(schema, stack),
            _ => "z.unknown()".to_string(),
        }
    }

    fn zod_object(&self, schema: &JsonValue, stack: &mut Vec<String>) -> String {
        let required = required_set(schema);
        match schema.get("properties").and_then(JsonValue::as_object) {
            Some(props) if !props.is_empty() => {
                let members: Vec<String> = props
                    .iter()
                    .map(|(key, prop)| {
                        let expr = self.zod_expr(prop, stack);
                        if required.contains(&key.as_str()) {
                            format!("{}: {}", js_property_key(key), expr)
                        } else {
                            format!("{}: {}.optional()", js_property_key(key), expr)
                        }
                    })
                    .collect();
                format!("z.object({{ {} }})", members.join(", "))
            }
            _ => match schema.get("additionalProperties") {
                Some(JsonValue::Object(extra)) if !extra.is_empty() => {
                    let value = JsonValue::Object(extra.clone());
                    format!("z.record({})", self.zod_expr(&value, stack))
                }
                _ => "z.record(z.unknown())".to_string(),
            },
        }
    }

    /// Object schema grouping a list of parameters by name
    pub fn parameters_schema(params: &[OpenApiParameter]) -> JsonValue {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in params {
            properties.insert(param.name.clone(), param.schema_or_any());
            if param.is_required() {
                required.push(JsonValue::String(param.name.clone()));
            }
        }
        json!({ "type": "object", "properties": properties, "required": required })
    }

    /// Named source schemas of an operation, in slot order
    fn slot_schemas<'a>(
        named: &'a NamedOperation,
        stage: &'a crate::schema_ref::SchemaRefBundle,
    ) -> Vec<(&'a SchemaRef, JsonValue)> {
        let shapes = &named.shapes;
        let mut out = Vec::new();
        if let (Some(r), Some(s)) = (&stage.request, &shapes.request) {
            out.push((r, s.clone()));
        }
        if let Some(r) = &stage.path_params {
            out.push((&r.schema, Self::parameters_schema(&shapes.path)));
        }
        if let Some(r) = &stage.query_params {
            out.push((r, Self::parameters_schema(&shapes.query)));
        }
        if let Some(r) = &stage.header_params {
            out.push((r, Self::parameters_schema(&shapes.header)));
        }
        if let (Some(r), Some(s)) = (&stage.response, &shapes.response) {
            out.push((r, s.clone()));
        }
        for (error, (_, schema)) in stage.errors.iter().zip(&shapes.errors) {
            out.push((&error.schema, schema.clone()));
        }
        out
    }

    /// The `types/<Pascal>.ts` module; `None` when the operation names no types
    pub fn type_module(&self, named: &NamedOperation) -> Option<SourceModule> {
        let entries = Self::slot_schemas(named, &named.schemas.types);
        let (first, _) = entries.first()?;
        let body: Vec<String> = entries
            .iter()
            .map(|(r, schema)| format!("export type {} = {}", r.name(), self.ts_type(schema)))
            .collect();
        Some(SourceModule::new(Declaration {
            name: first.name().to_string(),
            body: body.join("\n\n"),
        }))
    }

    /// The `zod/<camel>Schema.ts` module; `None` when the operation names no validators
    pub fn validator_module(&self, named: &NamedOperation) -> Option<SourceModule> {
        let entries = Self::slot_schemas(named, &named.schemas.validators);
        let (first, _) = entries.first()?;
        let body: Vec<String> = entries
            .iter()
            .map(|(r, schema)| format!("export const {} = {}", r.name(), self.zod(schema)))
            .collect();
        let mut module = SourceModule::new(Declaration {
            name: first.name().to_string(),
            body: body.join("\n\n"),
        });
        module.import(Import::named(["z"], "zod"));
        Some(module)
    }
}

enum Lookup<'a> {
    Inline(&'a JsonValue),
    Ref(String, &'a JsonValue),
    Cycle,
    Missing,
}

fn is_nullable(schema: &JsonValue) -> bool {
    schema.get("nullable").and_then(JsonValue::as_bool).unwrap_or(false)
}

fn union_variants(schema: &JsonValue) -> Option<&Vec<JsonValue>> {
    schema
        .get("oneOf")
        .or_else(|| schema.get("anyOf"))
        .and_then(JsonValue::as_array)
}

/// The schema's type; 3.1 type arrays collapse to their non-null member
fn schema_type(schema: &JsonValue) -> Option<String> {
    match schema.get("type") {
        Some(JsonValue::String(t)) => Some(t.clone()),
        Some(JsonValue::Array(types)) => types
            .iter()
            .filter_map(JsonValue::as_str)
            .find(|t| *t != "null")
            .map(String::from),
        _ if schema.get("properties").is_some() => Some("object".to_string()),
        _ if schema.get("items").is_some() => Some("array".to_string()),
        _ => None,
    }
}

fn required_set(schema: &JsonValue) -> Vec<&str> {
    schema
        .get("required")
        .and_then(JsonValue::as_array)
        .map(|arr| arr.iter().filter_map(JsonValue::as_str).collect())
        .unwrap_or_default()
}

fn parenthesize(expr: &str) -> String {
    if has_top_level_operator(expr) {
        format!("({})", expr)
    } else {
        expr.to_string()
    }
}

/// Whether `expr` has a `|` or `&` outside brackets and string literals
fn has_top_level_operator(expr: &str) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for c in expr.chars() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '(' | '[' | '<' => depth += 1,
            '}' | ')' | ']' | '>' => depth = depth.saturating_sub(1),
            '|' | '&' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

fn join_members<I: Iterator<Item = String>>(members: I, separator: &str) -> String {
    let members: Vec<String> = members.map(|m| parenthesize(&m)).collect();
    if members.is_empty() {
        "unknown".to_string()
    } else {
        members.join(separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::SchemaNamer;
    use crate::openapi::OpenApiContext;

    fn emitter() -> SchemaEmitter {
        let components = json!({
            "Pet": {
                "type": "object",
                "required": ["name"],
                "properties": {
                    "id": { "type": "integer" },
                    "name": { "type": "string", "description": "Pet name" },
                    "status": { "type": "string", "enum": ["available", "sold"] },
                    "tags": { "type": "array", "items": { "$ref": "#/components/schemas/Tag" } }
                }
            },
            "Tag": { "type": "object", "properties": { "label": { "type": "string", "nullable": true } } },
            "Node": { "type": "object", "properties": { "next": { "$ref": "#/components/schemas/Node" } } }
        });
        SchemaEmitter::new(components.as_object().cloned().unwrap())
    }

    #[test]
    fn test_ts_object_with_refs() {
        let ts = emitter().ts_type(&json!({ "$ref": "#/components/schemas/Pet" }));
        assert_eq!(
            ts,
            r#"{ id?: number; name: string; status?: "available" | "sold"; tags?: Array<{ label?: string | null }> }"#
        );
    }

    #[test]
    fn test_zod_object_with_refs() {
        let zod = emitter().zod(&json!({ "$ref": "#/components/schemas/Pet" }));
        assert!(zod.starts_with("z.object({ id: z.number().int().optional(), "));
        assert!(zod.contains(r#"name: z.string().describe("Pet name")"#));
        assert!(zod.contains(r#"status: z.enum(["available", "sold"]).optional()"#));
        assert!(zod.contains("label: z.string().nullable().optional()"));
    }

    #[test]
    fn test_cycles_become_unknown() {
        let e = emitter();
        assert_eq!(
            e.ts_type(&json!({ "$ref": "#/components/schemas/Node" })),
            "{ next?: unknown }"
        );
        assert_eq!(
            e.zod(&json!({ "$ref": "#/components/schemas/Node" })),
            "z.object({ next: z.unknown().optional() })"
        );
        assert_eq!(e.ts_type(&json!({ "$ref": "#/components/schemas/Nope" })), "unknown");
    }

    #[test]
    fn test_unions_and_intersections() {
        let e = emitter();
        let schema = json!({ "oneOf": [{ "type": "string" }, { "type": "integer" }] });
        assert_eq!(e.ts_type(&schema), "string | number");
        assert_eq!(e.zod(&schema), "z.union([z.string(), z.number().int()])");

        let schema = json!({ "allOf": [
            { "$ref": "#/components/schemas/Tag" },
            { "type": "object", "properties": { "extra": { "type": "boolean" } } }
        ] });
        assert_eq!(
            e.ts_type(&schema),
            "{ label?: string | null } & { extra?: boolean }"
        );
        assert!(e.zod(&schema).starts_with("z.intersection(z.object("));

        let schema = json!({ "type": ["string", "null"] });
        assert_eq!(e.ts_type(&schema), "string");
    }

    #[test]
    fn test_only_top_level_unions_are_parenthesized() {
        assert_eq!(parenthesize("string | number"), "(string | number)");
        assert_eq!(parenthesize("{ a?: string | null }"), "{ a?: string | null }");
        assert_eq!(parenthesize("Array<string | number>"), "Array<string | number>");
        assert_eq!(parenthesize(r#""a|b""#), r#""a|b""#);
    }

    #[test]
    fn test_maps_and_unknowns() {
        let e = emitter();
        let map = json!({ "type": "object", "additionalProperties": { "type": "integer" } });
        assert_eq!(e.ts_type(&map), "Record<string, number>");
        assert_eq!(e.zod(&map), "z.record(z.number().int())");
        assert_eq!(e.ts_type(&json!({})), "unknown");
        assert_eq!(e.zod(&json!({ "enum": [1, 2] })), "z.union([z.literal(1), z.literal(2)])");
    }

    #[test]
    fn test_operation_modules() {
        let doc = OpenApiContext::new(json!({
            "paths": {
                "/users/{userId}": {
                    "put": {
                        "operationId": "updateUser",
                        "parameters": [
                            { "name": "userId", "in": "path", "required": true, "schema": { "type": "string" } },
                            { "name": "X-Request-Id", "in": "header", "schema": { "type": "string" } }
                        ],
                        "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Tag" } } } },
                        "responses": { "200": { "description": "ok" } }
                    }
                }
            },
            "components": { "schemas": { "Tag": { "type": "object", "properties": { "label": { "type": "string" } } } } }
        }));
        let named = SchemaNamer::new().name(&doc.operations().unwrap()[0]).unwrap();
        let e = SchemaEmitter::new(doc.component_schemas());

        let types = e.type_module(&named).unwrap().render();
        assert!(types.contains("export type UpdateUserMutationRequest = { label?: string }"));
        assert!(types.contains("export type UpdateUserPathParams = { userId: string }"));
        assert!(types.contains(r#"export type UpdateUserHeaderParams = { "X-Request-Id"?: string }"#));
        assert!(!types.contains("UpdateUserMutationResponse"));

        let zod = e.validator_module(&named).unwrap().render();
        assert!(zod.starts_with("import { z } from 'zod'\n"));
        assert!(zod.contains("export const updateUserPathParamsSchema = z.object({ userId: z.string() })"));
    }
}
