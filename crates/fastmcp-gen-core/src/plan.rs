//! Parameter plan synthesis.
//!
//! Given the schema references of one operation, decide how the generated
//! handler takes its arguments: which names it destructures, how each one is
//! typed, and how the outbound request is assembled from them. The plan also
//! carries the validation schema the tool runtime uses for the same arguments,
//! so that both sides always agree on the argument shape.
//!
//! Slot order is fixed: body, then path parameters in declared order, then
//! query, then header.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::schema_ref::{OperationSchemas, SchemaRef, SchemaRefBundle};
use crate::tool_schema::{compose_tool_schema, looks_like_array_input_schema};
use crate::url::{build_url, UrlExpression};
use crate::utils::is_valid_identifier;

/// Destructure name of the request body
pub const BODY_BINDING: &str = "data";
/// Destructure name of the grouped query parameters
pub const QUERY_BINDING: &str = "queryParams";
/// Destructure name of the grouped header parameters
pub const HEADER_BINDING: &str = "headerParams";
/// Local the handler copies the body into before the request
pub const REQUEST_DATA_LOCAL: &str = "requestData";
/// Local holding the transport response
pub const RESPONSE_LOCAL: &str = "res";
/// Imported transport function
pub const CLIENT_BINDING: &str = "client";

/// Where a slot ends up in the outbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    Body,
    Path,
    Query,
    Header,
}

/// One destructured argument of the handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterSlot {
    /// Binding name in the destructuring pattern
    pub destructure: String,
    /// Type expression of the binding
    pub type_expr: String,
    /// Validator schema backing the slot
    pub validator: String,
    pub role: WireRole,
    /// Body schema named like an array/list input; it must stay under `data`
    pub nested_under_data: bool,
}

/// Overall argument shape, derived from which slots are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanShape {
    /// No parameters at all
    Empty,
    /// Only a request body, wrapped as `{ data }`
    SoleBody,
    /// Only path parameters, spread by name
    SolePath,
    /// Only query parameters, grouped as `{ queryParams }`
    SoleQuery,
    /// Any other combination (including a lone header slot)
    Composite,
}

/// Members of the request config passed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub method: String,
    pub url: UrlExpression,
    /// `requestData` when a body slot exists
    pub data: Option<String>,
    /// `queryParams` when a query slot exists
    pub params: Option<String>,
}

impl RequestConfig {
    /// Object-literal members in wire order; `base_url` is inserted after the URL
    pub fn members(&self, base_url: Option<&str>) -> Vec<String> {
        let mut members = vec![
            format!("method: {}", crate::utils::js_string(&self.method)),
            format!("url: {}", self.url),
        ];
        if let Some(base) = base_url {
            members.push(format!("baseURL: {}", crate::utils::js_string(base)));
        }
        if let Some(data) = &self.data {
            members.push(format!("data: {}", data));
        }
        if let Some(params) = &self.params {
            members.push(format!("params: {}", params));
        }
        members
    }

    /// The whole config object literal
    pub fn render(&self, base_url: Option<&str>) -> String {
        format!("{{ {} }}", self.members(base_url).join(", "))
    }
}

/// The synthesized argument plan of one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterPlan {
    pub operation: String,
    pub slots: Vec<ParameterSlot>,
    pub shape: PlanShape,
    pub request: RequestConfig,
    /// Validation schema expression for the tool; `None` means no parameters
    pub tool_schema: Option<String>,
}

impl ParameterPlan {
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Destructuring pattern, e.g. `{ data, userId }`
    pub fn destructure_pattern(&self) -> String {
        let names: Vec<&str> = self.slots.iter().map(|s| s.destructure.as_str()).collect();
        format!("{{ {} }}", names.join(", "))
    }

    /// Argument object type, e.g. `{ data: Body; userId: PathParams['userId'] }`
    pub fn argument_type(&self) -> String {
        let members: Vec<String> = self
            .slots
            .iter()
            .map(|s| format!("{}: {}", s.destructure, s.type_expr))
            .collect();
        format!("{{ {} }}", members.join("; "))
    }

    /// Full parameter list of the handler function.
    ///
    /// An empty plan still accepts (and ignores) an empty object so that the
    /// tool call-site can pass `{}` uniformly; `Function.length` stays 0.
    pub fn parameter_list(&self) -> String {
        if self.is_empty() {
            "_args: Record<string, never> = {}".to_string()
        } else {
            format!("{}: {}", self.destructure_pattern(), self.argument_type())
        }
    }
}

/// Build the parameter plan of `operation` from its schema references
pub fn synthesize(schemas: &OperationSchemas, operation: &Operation) -> Result<ParameterPlan> {
    let op_id = operation.identifier();
    check_stages(&op_id, &schemas.types, &schemas.validators)?;

    let types = &schemas.types;
    let validators = &schemas.validators;
    let mut slots = Vec::new();

    if let (Some(body), Some(body_validator)) = (&types.request, &validators.request) {
        slots.push(ParameterSlot {
            destructure: BODY_BINDING.to_string(),
            type_expr: body.name().to_string(),
            validator: body_validator.name().to_string(),
            role: WireRole::Body,
            nested_under_data: looks_like_array_input_schema(body.name()),
        });
    }

    let path_names: Vec<String> = types
        .path_params
        .as_ref()
        .map(|p| p.properties.clone())
        .unwrap_or_default();
    if let (Some(path), Some(path_validator)) = (&types.path_params, &validators.path_params) {
        for property in &path.properties {
            slots.push(ParameterSlot {
                destructure: property.clone(),
                type_expr: format!("{}['{}']", path.schema.name(), property),
                validator: path_validator.schema.name().to_string(),
                role: WireRole::Path,
                nested_under_data: false,
            });
        }
    }

    if let (Some(query), Some(query_validator)) = (&types.query_params, &validators.query_params)
    {
        slots.push(grouped_slot(QUERY_BINDING, query, query_validator, WireRole::Query));
    }

    if let (Some(header), Some(header_validator)) =
        (&types.header_params, &validators.header_params)
    {
        slots.push(grouped_slot(HEADER_BINDING, header, header_validator, WireRole::Header));
    }

    check_bindings(&op_id, &slots)?;

    let url = build_url(&op_id, &operation.path, &path_names)?;
    let shape = classify(&slots);
    let request = RequestConfig {
        method: operation.method.as_upper(),
        url,
        data: types.request.as_ref().map(|_| REQUEST_DATA_LOCAL.to_string()),
        params: types.query_params.as_ref().map(|_| QUERY_BINDING.to_string()),
    };
    let tool_schema = compose_tool_schema(&slots);

    log::debug!(
        "planned {}: shape={:?}, slots=[{}]",
        op_id,
        shape,
        slots
            .iter()
            .map(|s| s.destructure.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(ParameterPlan {
        operation: op_id,
        slots,
        shape,
        request,
        tool_schema,
    })
}

fn grouped_slot(
    binding: &str,
    schema: &SchemaRef,
    validator: &SchemaRef,
    role: WireRole,
) -> ParameterSlot {
    ParameterSlot {
        destructure: binding.to_string(),
        type_expr: schema.name().to_string(),
        validator: validator.name().to_string(),
        role,
        nested_under_data: false,
    }
}

fn classify(slots: &[ParameterSlot]) -> PlanShape {
    let only = |role: WireRole| !slots.is_empty() && slots.iter().all(|s| s.role == role);
    if slots.is_empty() {
        PlanShape::Empty
    } else if only(WireRole::Body) {
        PlanShape::SoleBody
    } else if only(WireRole::Path) {
        PlanShape::SolePath
    } else if only(WireRole::Query) {
        PlanShape::SoleQuery
    } else {
        PlanShape::Composite
    }
}

// Both stages must agree on which parameter slots exist
fn check_stages(op_id: &str, types: &SchemaRefBundle, validators: &SchemaRefBundle) -> Result<()> {
    let pairs = [
        ("request body", types.request.is_some(), validators.request.is_some()),
        (
            "path parameters",
            types.path_params.is_some(),
            validators.path_params.is_some(),
        ),
        (
            "query parameters",
            types.query_params.is_some(),
            validators.query_params.is_some(),
        ),
        (
            "header parameters",
            types.header_params.is_some(),
            validators.header_params.is_some(),
        ),
    ];
    match pairs.iter().find(|(_, t, v)| t != v) {
        Some((slot, _, _)) => Err(Error::SchemaStageMismatch {
            operation: op_id.to_string(),
            slot: slot.to_string(),
        }),
        None => Ok(()),
    }
}

// Path parameter names become bindings next to the reserved ones
fn check_bindings(op_id: &str, slots: &[ParameterSlot]) -> Result<()> {
    let mut reserved = vec![RESPONSE_LOCAL, CLIENT_BINDING];
    for slot in slots {
        match slot.role {
            WireRole::Body => reserved.extend([BODY_BINDING, REQUEST_DATA_LOCAL]),
            WireRole::Query => reserved.push(QUERY_BINDING),
            WireRole::Header => reserved.push(HEADER_BINDING),
            WireRole::Path => {}
        }
    }

    let mut seen: Vec<&str> = Vec::new();
    for slot in slots.iter().filter(|s| s.role == WireRole::Path) {
        let name = slot.destructure.as_str();
        if reserved.contains(&name) || seen.contains(&name) || !is_valid_identifier(name) {
            return Err(Error::AmbiguousParameterName {
                operation: op_id.to_string(),
                name: name.to_string(),
            });
        }
        seen.push(name);
    }
    Ok(())
}
