//! Serialization of document nodes into plain JSON values, and encoding of those values
//! as JSON or YAML text.
//!
//! [`to_value`] is the single generic serializer for every [`OpenApiObject`]. It walks a
//! node's declared fields in order, drops unset ones, and recurses into nested nodes,
//! sequences and maps. Plain values pass through untouched.

use crate::document::{Field, OpenApiObject};
use anyhow::{Context, Result};
use log::debug;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Maps an internal field name to the key emitted on the wire.
fn wire_name(field: &str) -> &str {
    match field {
        "ref" => "$ref",
        "location_in" => "in",
        other => other,
    }
}

/// Serializes a node into a plain JSON value.
///
/// Fields that are not set are skipped entirely, so an operation without a request body
/// has no `requestBody` key at all. Set fields are emitted even when empty or false.
pub fn to_value(node: &dyn OpenApiObject) -> Value {
    let mut result = Map::new();
    for (name, field) in node.fields() {
        if let Some(value) = field_value(field) {
            result.insert(wire_name(name).to_string(), value);
        }
    }
    Value::Object(result)
}

fn field_value(field: Field<'_>) -> Option<Value> {
    match field {
        Field::Unset => None,
        Field::Value(value) => Some(value),
        Field::Node(node) => Some(to_value(node)),
        Field::List(items) => Some(Value::Array(
            items
                .into_iter()
                .map(|item| field_value(item).unwrap_or(Value::Null))
                .collect(),
        )),
        Field::Map(entries) => Some(Value::Object(
            entries
                .into_iter()
                .map(|(key, item)| (key.to_string(), field_value(item).unwrap_or(Value::Null)))
                .collect(),
        )),
    }
}

/// Serializes a node straight to compact JSON text.
pub fn to_json(node: &dyn OpenApiObject) -> String {
    to_value(node).to_string()
}

/// Encodes a serialized document as pretty-printed JSON.
pub fn serialize_json(value: &Value) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    serde_json::to_string_pretty(value).context("Failed to serialize OpenAPI document to JSON")
}

/// Encodes a serialized document as YAML.
pub fn serialize_yaml(value: &Value) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    serde_yaml::to_string(value).context("Failed to serialize OpenAPI document to YAML")
}

/// Writes string content to a file, creating parent directories as needed.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        Components, Document, Info, MediaType, Operation, Parameter, ParameterLocation, PathItem,
        Reference, RequestBody, Response, SecurityScheme,
    };
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_document() -> Document {
        Document {
            openapi: "3.0.3".to_string(),
            info: Info {
                title: "Test API".to_string(),
                description: None,
                terms_of_service: None,
                contact: None,
                license: None,
                version: "1.0".to_string(),
            },
            servers: vec![],
            paths: IndexMap::new(),
            components: None,
            security: vec![],
            tags: vec![],
            external_docs: None,
        }
    }

    #[test]
    fn test_reference_renamed_to_dollar_ref() {
        let value = to_value(&Reference::schema("Foo"));
        assert_eq!(value, json!({"$ref": "#/components/schemas/Foo"}));
    }

    #[test]
    fn test_location_in_renamed_to_in() {
        let value = to_value(&Parameter::new("q", ParameterLocation::Query, false));

        assert_eq!(value["in"], "query");
        assert!(value.get("location_in").is_none());
        assert_eq!(
            value,
            json!({
                "name": "q",
                "in": "query",
                "required": false,
                "deprecated": false,
                "allowEmptyValue": false
            })
        );
    }

    #[test]
    fn test_unset_request_body_has_no_key() {
        let value = to_value(&Operation::default());
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();

        assert_eq!(
            keys,
            vec!["tags", "parameters", "responses", "deprecated", "security", "servers"]
        );
        assert!(value.get("requestBody").is_none());
        assert_eq!(value["deprecated"], false);
    }

    #[test]
    fn test_document_keys_follow_fixed_order() {
        let value = to_value(&create_test_document());
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["openapi", "info", "servers", "paths", "security", "tags"]);
        assert_eq!(value["info"], json!({"title": "Test API", "version": "1.0"}));
    }

    #[test]
    fn test_nested_nodes_in_maps_and_lists() {
        let mut body = RequestBody::new(true);
        body.add_schema_content("application/json", "Pet", None);
        let mut response = Response::new("Success Response");
        response.add_schema_content("application/json", "Pet", None);

        let mut op = Operation::default();
        op.add_parameter(Parameter::new("id", ParameterLocation::Path, true));
        op.set_request_body(body);
        op.add_response(200, response);

        let mut item = PathItem::default();
        item.add_operation(crate::routes::HttpMethod::Put, op);
        let value = to_value(&item);

        assert_eq!(value["put"]["parameters"][0]["in"], "path");
        assert_eq!(
            value["put"]["requestBody"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/Pet"
        );
        assert_eq!(
            value["put"]["responses"]["200"],
            json!({
                "description": "Success Response",
                "content": {
                    "application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}
                },
                "links": {}
            })
        );
        assert!(value.get("ref").is_none());
        assert!(value.get("$ref").is_none());
    }

    #[test]
    fn test_scalar_values_pass_through() {
        let mut components = Components::default();
        components
            .schemas
            .insert("Pet".to_string(), json!({"type": "object", "x-anything": [1, null]}));
        let value = to_value(&components);

        assert_eq!(value["schemas"]["Pet"]["x-anything"], json!([1, null]));
        assert_eq!(value["securitySchemes"], json!({}));
    }

    #[test]
    fn test_security_scheme_api_key_location_renamed() {
        let value = to_value(&SecurityScheme::api_key("X-Token", ParameterLocation::Header));
        assert_eq!(value, json!({"type": "apiKey", "name": "X-Token", "in": "header"}));
    }

    #[test]
    fn test_media_type_examples_emitted_when_present() {
        let media = MediaType {
            schema: Reference::schema("Pet"),
            examples: Some(json!({"rex": {"value": {"name": "Rex"}}})),
        };
        let value = to_value(&media);
        assert_eq!(value["examples"]["rex"]["value"]["name"], "Rex");
    }

    #[test]
    fn test_serialize_json_pretty_format() {
        let value = to_value(&create_test_document());
        let json = serialize_json(&value).unwrap();

        assert!(json.contains('\n'));
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_serialize_yaml() {
        let value = to_value(&create_test_document());
        let yaml = serialize_yaml(&value).unwrap();

        assert!(yaml.contains("title: Test API"));
        let parsed: Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["openapi"], "3.0.3");
        assert_eq!(parsed["info"]["title"], "Test API");
    }

    #[test]
    fn test_to_json_is_compact() {
        let json = to_json(&Reference::schema("Foo"));
        assert_eq!(json, r##"{"$ref":"#/components/schemas/Foo"}"##);
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("subdir").join("nested").join("openapi.json");

        let result = write_to_file("{}", &file_path);

        assert!(result.is_ok());
        assert_eq!(fs::read_to_string(&file_path).unwrap(), "{}");
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("openapi.yaml");

        write_to_file("initial content", &file_path).unwrap();
        write_to_file("new content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }
}
