//! Test utilities for fastmcp-gen integration tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::Context;
use tempfile::TempDir;

/// Creates a temporary directory for test outputs
pub fn create_temp_dir() -> anyhow::Result<(TempDir, PathBuf)> {
    let temp_dir = tempfile::tempdir()?;
    let temp_path = temp_dir.path().to_path_buf();
    Ok((temp_dir, temp_path))
}

/// Creates a test OpenAPI spec file in the given directory
pub fn create_test_openapi_spec(dir: &Path) -> anyhow::Result<PathBuf> {
    let spec_path = dir.join("openapi.yaml");
    let spec_content = r#"
openapi: 3.0.0
info:
  title: Swagger Petstore
  version: 1.0.0
  description: Test API for fastmcp-gen integration tests

servers:
  - url: http://localhost:8080/api/v1

paths:
  /users/{userId}:
    get:
      operationId: getUserById
      tags: [user]
      parameters:
        - name: userId
          in: path
          required: true
          schema:
            type: string
      responses:
        '200':
          description: The user
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/User'
        '404':
          description: Not found
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Error'
    put:
      operationId: updateUser
      tags: [user]
      parameters:
        - name: userId
          in: path
          required: true
          schema:
            type: string
      requestBody:
        required: true
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/User'
      responses:
        '200':
          description: Updated
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/User'

  /orders/{orderId}/items/{itemId}:
    delete:
      operationId: deleteOrderItem
      tags: [store]
      parameters:
        - name: itemId
          in: path
          required: true
          schema:
            type: integer
        - name: orderId
          in: path
          required: true
          schema:
            type: integer
      responses:
        '204':
          description: Deleted

  /pets:
    get:
      operationId: findPets
      tags: [pet]
      parameters:
        - name: status
          in: query
          schema:
            type: string
            enum: [available, pending, sold]
        - name: limit
          in: query
          schema:
            type: integer
      responses:
        '200':
          description: Pets
          content:
            application/json:
              schema:
                type: array
                items:
                  $ref: '#/components/schemas/Pet'

  /user/createWithList:
    post:
      operationId: createUsersWithListInput
      tags: [user]
      requestBody:
        content:
          application/json:
            schema:
              type: array
              items:
                $ref: '#/components/schemas/User'
      responses:
        '200':
          description: Created

  /store/inventory:
    get:
      operationId: getInventory
      tags: [store]
      responses:
        '200':
          description: Inventory
          content:
            application/json:
              schema:
                type: object
                additionalProperties:
                  type: integer

components:
  schemas:
    User:
      type: object
      required: [id]
      properties:
        id:
          type: string
        email:
          type: string
    Pet:
      type: object
      required: [name]
      properties:
        id:
          type: integer
        name:
          type: string
        status:
          type: string
          enum: [available, pending, sold]
    Error:
      type: object
      properties:
        message:
          type: string
"#;

    fs::write(&spec_path, spec_content)
        .with_context(|| format!("Failed to write test OpenAPI spec to {}", spec_path.display()))?;

    Ok(spec_path)
}

/// Runs the built fastmcp-gen binary with `args`
pub fn run_cli<I, S>(args: I) -> anyhow::Result<Output>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    Command::new(env!("CARGO_BIN_EXE_fastmcp-gen"))
        .args(args)
        .output()
        .context("Failed to execute fastmcp-gen")
}

/// Reads a generated file, with the path in the error
pub fn read_generated(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Missing generated file {}", path.display()))
}
