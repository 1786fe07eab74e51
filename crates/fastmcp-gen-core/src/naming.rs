//! Schema naming for generated type and validator modules.
//!
//! Each operation gets one type module (`types/<PascalId>.ts`) and one
//! validator module (`zod/<camelId>Schema.ts`). Names follow the usual
//! OpenAPI client-generator convention:
//!
//! | slot     | type name                                  | validator name             |
//! |----------|--------------------------------------------|----------------------------|
//! | body     | `AddPetMutationRequest`                    | `addPetMutationRequestSchema` |
//! | response | `GetPetByIdQueryResponse`                  | `getPetByIdQueryResponseSchema` |
//! | path     | `GetPetByIdPathParams`                     | `getPetByIdPathParamsSchema` |
//! | query    | `FindPetsQueryParams`                      | `findPetsQueryParamsSchema` |
//! | header   | `FindPetsHeaderParams`                     | `findPetsHeaderParamsSchema` |
//! | error    | `GetPetById404`                            | `getPetById404Schema`      |

use std::path::PathBuf;

use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::openapi::{OpenApiParameter, OperationSpec, ParameterLocation};
use crate::operation::Operation;
use crate::schema_ref::{OperationSchemas, PathParamsRef, SchemaRef, SchemaRefBundle, StatusSchemaRef};
use crate::url::placeholders;
use crate::utils::{to_lower_camel_case, to_upper_camel_case};

/// Source schemas behind each named slot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaShapes {
    pub request: Option<JsonValue>,
    /// Path parameters in path-template order
    pub path: Vec<OpenApiParameter>,
    pub query: Vec<OpenApiParameter>,
    pub header: Vec<OpenApiParameter>,
    pub response: Option<JsonValue>,
    /// `(status, schema)` of every non-success response with a JSON payload
    pub errors: Vec<(String, JsonValue)>,
}

/// An operation with its generated names attached
#[derive(Debug, Clone, PartialEq)]
pub struct NamedOperation {
    pub spec: OperationSpec,
    pub schemas: OperationSchemas,
    pub shapes: SchemaShapes,
    /// Type module, relative to the output root
    pub type_file: PathBuf,
    /// Validator module, relative to the output root
    pub validator_file: PathBuf,
    /// Exported handler function name
    pub handler_name: String,
}

impl NamedOperation {
    pub fn operation(&self) -> &Operation {
        &self.spec.operation
    }
}

/// Exported handler function name, e.g. `addPetHandler`
pub fn handler_name(operation: &Operation) -> String {
    to_lower_camel_case(&format!("{}_handler", operation.identifier()))
}

/// Validator name for a type name: camel-cased with a `Schema` suffix
pub fn validator_name(type_name: &str) -> String {
    format!("{}Schema", to_lower_camel_case(type_name))
}

/// Assigns type and validator names to operations
#[derive(Debug, Clone, Default)]
pub struct SchemaNamer;

impl SchemaNamer {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self, spec: &OperationSpec) -> Result<NamedOperation> {
        let operation = &spec.operation;
        let id = operation.identifier();
        let pascal = to_upper_camel_case(&id);
        let kind = if operation.method.is_mutation() {
            "Mutation"
        } else {
            "Query"
        };

        let type_file = PathBuf::from("types").join(format!("{}.ts", pascal));
        let validator_file =
            PathBuf::from("zod").join(format!("{}Schema.ts", to_lower_camel_case(&id)));

        let shapes = select_shapes(spec);

        let type_name = |suffix: &str| format!("{}{}", pascal, suffix);
        let pair = |suffix: &str| -> Result<(SchemaRef, SchemaRef)> {
            let name = type_name(suffix);
            Ok((
                SchemaRef::new(validator_name(&name), &validator_file)?,
                SchemaRef::new(name, &type_file)?,
            ))
        };

        let mut types = SchemaRefBundle::default();
        let mut validators = SchemaRefBundle::default();

        if shapes.request.is_some() {
            let (v, t) = pair(&format!("{}Request", kind))?;
            validators.request = Some(v);
            types.request = Some(t);
        }
        if !shapes.path.is_empty() {
            let (v, t) = pair("PathParams")?;
            let properties: Vec<String> = shapes.path.iter().map(|p| p.name.clone()).collect();
            validators.path_params = Some(PathParamsRef {
                schema: v,
                properties: properties.clone(),
            });
            types.path_params = Some(PathParamsRef {
                schema: t,
                properties,
            });
        }
        if !shapes.query.is_empty() {
            let (v, t) = pair("QueryParams")?;
            validators.query_params = Some(v);
            types.query_params = Some(t);
        }
        if !shapes.header.is_empty() {
            let (v, t) = pair("HeaderParams")?;
            validators.header_params = Some(v);
            types.header_params = Some(t);
        }
        if shapes.response.is_some() {
            let (v, t) = pair(&format!("{}Response", kind))?;
            validators.response = Some(v);
            types.response = Some(t);
        } else {
            log::debug!("{}: no JSON success response, response type is unknown", id);
        }
        for (status, _) in &shapes.errors {
            let (v, t) = pair(&to_upper_camel_case(status))?;
            validators.errors.push(StatusSchemaRef {
                status: status.clone(),
                schema: v,
            });
            types.errors.push(StatusSchemaRef {
                status: status.clone(),
                schema: t,
            });
        }

        Ok(NamedOperation {
            spec: spec.clone(),
            schemas: OperationSchemas { types, validators },
            shapes,
            type_file,
            validator_file,
            handler_name: handler_name(operation),
        })
    }
}

fn select_shapes(spec: &OperationSpec) -> SchemaShapes {
    let order = placeholders(&spec.operation.path);
    let mut path: Vec<OpenApiParameter> = spec
        .parameters_in(ParameterLocation::Path)
        .into_iter()
        .cloned()
        .collect();
    // Template order; parameters missing from the template sort last
    path.sort_by_key(|p| {
        order
            .iter()
            .position(|name| name == &p.name)
            .unwrap_or(usize::MAX)
    });

    let owned = |location| {
        spec.parameters_in(location)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>()
    };

    let response = spec
        .responses
        .iter()
        .find(|r| r.is_success() && r.schema.is_some())
        .and_then(|r| r.schema.clone());
    let errors = spec
        .responses
        .iter()
        .filter(|r| !r.is_success())
        .filter_map(|r| r.schema.clone().map(|s| (r.status.clone(), s)))
        .collect();

    SchemaShapes {
        request: spec.request_body.as_ref().map(|b| b.schema.clone()),
        path,
        query: owned(ParameterLocation::Query),
        header: owned(ParameterLocation::Header),
        response,
        errors,
    }
}
