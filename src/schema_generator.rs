use crate::document::SCHEMA_REF_PREFIX;
use crate::error::{Error, Result};
use crate::routes::PayloadType;
use indexmap::IndexMap;
use log::debug;
use schemars::generate::SchemaSettings;
use schemars::transform::Transform;
use serde_json::Value;
use std::any::TypeId;

/// Names and JSON-Schema definitions for every payload type of one document build.
///
/// The name map is the single source of truth for `$ref` targets: every reference the
/// document emits for a model goes through [`SchemaDictionary::model_name`].
#[derive(Debug, Clone, Default)]
pub struct SchemaDictionary {
    /// Model type -> unique display name
    names: IndexMap<TypeId, String>,
    /// Parameter type -> inline schema
    parameters: IndexMap<TypeId, Value>,
    /// Display name -> schema body
    schemas: IndexMap<String, Value>,
}

impl SchemaDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_name(&mut self, ty: &PayloadType, name: String) {
        self.names.insert(ty.id(), name);
    }

    pub fn insert_parameter_schema(&mut self, ty: &PayloadType, schema: Value) {
        self.parameters.insert(ty.id(), schema);
    }

    pub fn insert_schema(&mut self, name: String, schema: Value) {
        self.schemas.insert(name, schema);
    }

    /// Name assigned to a model type.
    pub fn model_name(&self, ty: &PayloadType) -> Result<&str> {
        self.names
            .get(&ty.id())
            .map(String::as_str)
            .ok_or_else(|| Error::UnresolvedType {
                type_path: ty.type_path().to_string(),
                message: "type was not registered with the schema dictionary".to_string(),
            })
    }

    pub fn parameter_schema(&self, ty: &PayloadType) -> Option<&Value> {
        self.parameters.get(&ty.id())
    }

    pub fn schemas(&self) -> &IndexMap<String, Value> {
        &self.schemas
    }

    pub fn into_schemas(self) -> IndexMap<String, Value> {
        self.schemas
    }
}

/// Source of names and structural definitions for payload types.
///
/// A document build calls [`SchemaDelegate::build`] exactly once, with every model type
/// referenced as a `return`, `body` or form payload and every parameter type, each list
/// in discovery order. Implementations must give distinct types distinct names, even
/// when their short names collide, and must do so deterministically.
pub trait SchemaDelegate: Send + Sync {
    fn build(&self, models: &[PayloadType], parameters: &[PayloadType])
        -> Result<SchemaDictionary>;
}

/// [`SchemaDelegate`] backed by `schemars`.
///
/// All types of one build share a single generator configured for OpenAPI 3.0, so a
/// nested type referenced from several models is defined once. When two distinct types
/// share a schema name, `schemars` appends a numeric suffix to the later one.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemarsDelegate;

impl SchemaDelegate for SchemarsDelegate {
    fn build(
        &self,
        models: &[PayloadType],
        parameters: &[PayloadType],
    ) -> Result<SchemaDictionary> {
        debug!(
            "Generating schemas for {} models and {} parameter types",
            models.len(),
            parameters.len()
        );

        let mut generator = SchemaSettings::openapi3().into_generator();
        let mut dictionary = SchemaDictionary::new();

        for model in models {
            let schema = serde_json::to_value(model.subschema(&mut generator))?;
            let name = reference_name(&schema).ok_or_else(|| Error::UnresolvedType {
                type_path: model.type_path().to_string(),
                message: "type is always inlined and has no schema name".to_string(),
            })?;
            debug!("Schema name for {}: {}", model.type_path(), name);
            dictionary.insert_name(model, name);
        }

        // Inline parameter schemas are not returned by `take_definitions` and need the transforms applied directly
        for parameter in parameters {
            let mut schema = parameter.subschema(&mut generator);
            for transform in generator.transforms_mut() {
                transform.transform(&mut schema);
            }
            let mut schema = serde_json::to_value(schema)?;
            sanitize_refs(&mut schema);
            dictionary.insert_parameter_schema(parameter, schema);
        }

        // Transforms turn JSON-Schema constructs into their OpenAPI 3.0 forms (`nullable`)
        for (name, mut schema) in generator.take_definitions(true) {
            sanitize_refs(&mut schema);
            dictionary.insert_schema(name, schema);
        }

        Ok(dictionary)
    }
}

/// Name of the definition a `{"$ref": ...}` schema points at.
fn reference_name(schema: &Value) -> Option<String> {
    let reference = schema.get("$ref")?.as_str()?;
    reference.rsplit('/').next().map(str::to_string)
}

/// Rewrites JSON-Schema definition references to point under `components.schemas`.
pub fn sanitize_refs(value: &mut Value) {
    match value {
        Value::Object(obj) => {
            if let Some(Value::String(reference)) = obj.get_mut("$ref") {
                for prefix in ["#/$defs/", "#/definitions/"] {
                    if let Some(name) = reference.strip_prefix(prefix) {
                        *reference = format!("{}{}", SCHEMA_REF_PREFIX, name);
                        break;
                    }
                }
            }
            for (_, v) in obj.iter_mut() {
                sanitize_refs(v);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                sanitize_refs(v);
            }
        }
        _ => {}
    }
}
