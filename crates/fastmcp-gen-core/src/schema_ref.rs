//! Typed references to generated schemas.
//!
//! A [`SchemaRef`] names a generated data shape and the module that exports it.
//! A [`SchemaRefBundle`] groups the references of one operation for one schema
//! stage (TypeScript types, or runtime validators). [`OperationSchemas`] pairs
//! the two stages.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Named reference to a generated type or validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
    name: String,
    file: PathBuf,
}

impl SchemaRef {
    /// Create a reference; the name must not be empty
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>) -> Result<Self> {
        let name = name.into();
        let file = file.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidSchemaRef(format!(
                "empty schema name for module {}",
                file.display()
            )));
        }
        Ok(Self { name, file })
    }

    /// Exported name of the type or validator
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module that exports it
    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// Path-parameter schema plus its property names in declared order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathParamsRef {
    pub schema: SchemaRef,
    pub properties: Vec<String>,
}

/// Schema of one non-success response status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSchemaRef {
    pub status: String,
    pub schema: SchemaRef,
}

/// All schema references of one operation for one stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRefBundle {
    pub request: Option<SchemaRef>,
    pub path_params: Option<PathParamsRef>,
    pub query_params: Option<SchemaRef>,
    pub header_params: Option<SchemaRef>,
    pub response: Option<SchemaRef>,
    #[serde(default)]
    pub errors: Vec<StatusSchemaRef>,
}

impl SchemaRefBundle {
    /// Whether no parameter slot (body, path, query, header) is present
    pub fn has_no_parameters(&self) -> bool {
        self.request.is_none()
            && self.path_params.is_none()
            && self.query_params.is_none()
            && self.header_params.is_none()
    }

    /// Referenced names grouped by the module that exports it, keeping at
    /// most `max_errors` error schemas.
    ///
    /// Order follows slot order: request, path, query, header, response, errors.
    pub fn names_by_file(&self, max_errors: usize) -> Vec<(PathBuf, Vec<String>)> {
        let refs = self
            .request
            .iter()
            .chain(self.path_params.iter().map(|p| &p.schema))
            .chain(self.query_params.iter())
            .chain(self.header_params.iter())
            .chain(self.response.iter())
            .chain(self.errors.iter().take(max_errors).map(|e| &e.schema));

        let mut grouped: Vec<(PathBuf, Vec<String>)> = Vec::new();
        for schema in refs {
            match grouped.iter_mut().find(|(file, _)| file == schema.file()) {
                Some((_, names)) => {
                    if !names.iter().any(|n| n == schema.name()) {
                        names.push(schema.name().to_string());
                    }
                }
                None => grouped.push((schema.file().to_path_buf(), vec![schema.name().to_string()])),
            }
        }
        grouped
    }

    /// Names of the parameter validators, in slot order
    pub fn parameter_names(&self) -> Vec<&str> {
        self.request
            .iter()
            .chain(self.path_params.iter().map(|p| &p.schema))
            .chain(self.query_params.iter())
            .chain(self.header_params.iter())
            .map(SchemaRef::name)
            .collect()
    }
}

/// The type stage and the validator stage of one operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSchemas {
    pub types: SchemaRefBundle,
    pub validators: SchemaRefBundle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_ref_requires_name() {
        assert!(SchemaRef::new("", "types/AddPet.ts").is_err());
        assert!(SchemaRef::new("   ", "types/AddPet.ts").is_err());
        let schema = SchemaRef::new("AddPetMutationRequest", "types/AddPet.ts").unwrap();
        assert_eq!(schema.name(), "AddPetMutationRequest");
        assert_eq!(schema.file(), Path::new("types/AddPet.ts"));
    }

    #[test]
    fn test_names_by_file_groups_and_dedups() {
        let file = PathBuf::from("types/UpdateUser.ts");
        let bundle = SchemaRefBundle {
            request: Some(SchemaRef::new("UpdateUserMutationRequest", &file).unwrap()),
            path_params: Some(PathParamsRef {
                schema: SchemaRef::new("UpdateUserPathParams", &file).unwrap(),
                properties: vec!["userId".into()],
            }),
            response: Some(SchemaRef::new("UpdateUserMutationResponse", &file).unwrap()),
            errors: vec![StatusSchemaRef {
                status: "404".into(),
                schema: SchemaRef::new("UpdateUser404", "types/Shared.ts").unwrap(),
            }],
            ..Default::default()
        };

        let grouped = bundle.names_by_file(usize::MAX);
        assert_eq!(grouped.len(), 2);
        assert_eq!(
            grouped[0].1,
            vec![
                "UpdateUserMutationRequest",
                "UpdateUserPathParams",
                "UpdateUserMutationResponse"
            ]
        );
        assert_eq!(grouped[1].1, vec!["UpdateUser404"]);
        assert_eq!(bundle.names_by_file(0).len(), 1);
        assert_eq!(
            bundle.parameter_names(),
            vec!["UpdateUserMutationRequest", "UpdateUserPathParams"]
        );
        assert!(!bundle.has_no_parameters());
        assert!(SchemaRefBundle::default().has_no_parameters());
    }
}
