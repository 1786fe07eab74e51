//! Validation schema and call forwarding for tool registrations.
//!
//! The tool runtime validates incoming arguments against one object-shaped
//! zod schema before it calls the handler. The schema built here mirrors the
//! handler's destructuring pattern slot for slot.

use crate::plan::{ParameterPlan, ParameterSlot, PlanShape, WireRole};

/// Whether a generated body type name follows the array/list input convention.
///
/// This is a naming check only; a non-array schema whose name happens to
/// contain `ArrayInput` or `ListInput` is classified as array-like too.
pub fn looks_like_array_input_schema(name: &str) -> bool {
    name.contains("ArrayInput") || name.contains("ListInput")
}

/// Compose the tool's validation schema expression from the plan slots.
///
/// Returns `None` when the tool takes no parameters.
pub fn compose_tool_schema(slots: &[ParameterSlot]) -> Option<String> {
    let first = slots.first()?;

    // A lone path or query schema is already object-shaped
    let sole_role = slots
        .iter()
        .all(|s| s.role == first.role)
        .then_some(first.role);
    if matches!(sole_role, Some(WireRole::Path) | Some(WireRole::Query)) {
        return Some(first.validator.clone());
    }

    let mut members: Vec<String> = Vec::new();
    let mut path_spread = false;
    for slot in slots {
        match slot.role {
            WireRole::Body => {
                if slot.nested_under_data {
                    log::debug!("array-like body {} kept under data", slot.validator);
                }
                members.push(format!("data: {}", slot.validator));
            }
            WireRole::Path => {
                // Every path slot shares one validator; spread its shape once
                if !path_spread {
                    members.push(format!("...{}.shape", slot.validator));
                    path_spread = true;
                }
            }
            WireRole::Query => members.push(format!("queryParams: {}", slot.validator)),
            WireRole::Header => members.push(format!("headerParams: {}", slot.validator)),
        }
    }

    Some(format!("z.object({{ {} }})", members.join(", ")))
}

/// Render the call that forwards validated tool arguments into the handler
pub fn tool_invocation(plan: &ParameterPlan, handler: &str) -> String {
    match plan.shape {
        PlanShape::Empty => format!("{}({{}})", handler),
        PlanShape::SoleQuery => format!("{}({{ queryParams: args }})", handler),
        _ => format!("{}(args)", handler),
    }
}
