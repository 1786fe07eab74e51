//! Path template to request-URL expression.
//!
//! `/orders/{orderId}/items/{itemId}` becomes the template literal
//! `` `/orders/${orderId}/items/${itemId}` ``, interpolating the destructured
//! path parameter bindings. Substitution is total: every placeholder must map
//! to a declared path parameter, in declared order, with nothing left over.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("valid regex"));

/// Interpolable URL expression for the outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlExpression {
    expression: String,
    bindings: Vec<String>,
}

impl UrlExpression {
    /// The template literal, backticks included
    pub fn as_str(&self) -> &str {
        &self.expression
    }

    /// Path parameter names interpolated, in order of appearance
    pub fn bindings(&self) -> &[String] {
        &self.bindings
    }
}

impl fmt::Display for UrlExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Placeholder names of a path template, in order of appearance
pub fn placeholders(path_template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(path_template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Rewrite `path_template` into an interpolated URL expression.
///
/// `operation` is only used to label errors.
pub fn build_url(
    operation: &str,
    path_template: &str,
    path_param_names: &[String],
) -> Result<UrlExpression> {
    let found = placeholders(path_template);

    if let Some(unknown) = found.iter().find(|p| !path_param_names.contains(p)) {
        return Err(Error::UnresolvedPathParameter {
            operation: operation.to_string(),
            placeholder: unknown.clone(),
        });
    }
    if found != path_param_names {
        return Err(Error::PathParameterMismatch {
            operation: operation.to_string(),
            expected: path_param_names.join(", "),
            found: found.join(", "),
        });
    }

    let escaped = escape_template_text(path_template);
    let body = PLACEHOLDER.replace_all(&escaped, "$${$1}");
    Ok(UrlExpression {
        expression: format!("`{}`", body),
        bindings: found,
    })
}

// Backticks, backslashes and stray `${` would break out of the template literal
fn escape_template_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}
