use crate::config::OpenApiConfig;
use crate::document::{Components, Document, Info, SCHEMA_REF_PREFIX};
use crate::error::{Error, Result};
use crate::extractor::{extract_path_item, BuildState};
use crate::routes::{DeclaredType, HttpMethod, PayloadType, Route, RouteTable, BODY, FORM, RETURN};
use crate::schema_generator::{SchemaDelegate, SchemarsDelegate};
use crate::serializer::to_value;
use indexmap::{IndexMap, IndexSet};
use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;

/// OpenAPI document builder
///
/// Turns a snapshot of the route table into a complete document. Every call to
/// [`OpenApiBuilder::build`] starts from scratch: one schema delegate call, a fresh
/// [`BuildState`], one pass over the documented routes.
#[derive(Clone)]
pub struct OpenApiBuilder {
    config: OpenApiConfig,
    delegate: Arc<dyn SchemaDelegate>,
}

impl OpenApiBuilder {
    /// Create a builder using the `schemars` schema delegate
    pub fn new(config: OpenApiConfig) -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            config,
            delegate: Arc::new(SchemarsDelegate),
        }
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn SchemaDelegate>) -> Self {
        self.delegate = delegate;
        self
    }

    pub fn config(&self) -> &OpenApiConfig {
        &self.config
    }

    /// Build the document for the routes currently registered in `table`
    pub fn build(&self, table: &RouteTable) -> Result<Document> {
        let routes = documented_routes(table.routes());
        debug!("Building OpenAPI document for {} documented routes", routes.len());

        let (models, parameters) = collect_types(&routes);
        let dictionary = self.delegate.build(&models, &parameters)?;

        let mut state = BuildState::new();
        let mut paths = IndexMap::new();
        for route in &routes {
            let Some(endpoint) = route.endpoint() else {
                continue;
            };
            let item = extract_path_item(route, endpoint, &dictionary, &mut state)?;
            paths.insert(route.path.clone(), item);
        }

        let components = Components {
            schemas: dictionary.into_schemas(),
            security_schemes: state.into_security_schemes(),
            ..Components::default()
        };

        let config = &self.config;
        let document = Document {
            openapi: config.openapi_version.clone(),
            info: Info {
                title: config.title.clone(),
                description: config.description.clone(),
                terms_of_service: config.terms_of_service.clone(),
                contact: config.contact.clone(),
                license: config.license.clone(),
                version: config.version.clone(),
            },
            servers: config.servers.clone(),
            paths,
            components: Some(components),
            security: Vec::new(),
            tags: config.tags.clone(),
            external_docs: config.external_docs.clone(),
        };

        info!(
            "Built OpenAPI document: {} paths, {} schemas",
            document.paths.len(),
            document.components.as_ref().map_or(0, |c| c.schemas.len())
        );
        Ok(document)
    }

    /// Build the document and serialize it, checking that every schema reference resolves
    pub fn build_value(&self, table: &RouteTable) -> Result<Value> {
        let document = self.build(table)?;
        let value = to_value(&document);
        verify_references(&value)?;
        Ok(value)
    }
}

/// Routes that belong in the document: included in the schema and backed by an endpoint.
fn documented_routes(routes: Vec<Route>) -> Vec<Route> {
    routes
        .into_iter()
        .filter(|route| route.include_in_schema && route.endpoint.is_some())
        .collect()
}

/// Collect distinct model and parameter types, in discovery order.
///
/// Models are the types declared as `return` or `body`, plus the inner model of every
/// form. Everything else declared with a plain type is a parameter. Form wrappers under
/// other names are skipped here and rejected during extraction.
pub fn collect_types(routes: &[Route]) -> (Vec<PayloadType>, Vec<PayloadType>) {
    let mut models: IndexSet<PayloadType> = IndexSet::new();
    let mut parameters: IndexSet<PayloadType> = IndexSet::new();

    for route in routes {
        let Some(endpoint) = route.endpoint() else {
            continue;
        };
        for handler in HttpMethod::ALL.into_iter().filter_map(|m| endpoint.handler(m)) {
            for annotation in &handler.annotations {
                match (annotation.name.as_str(), &annotation.declared) {
                    (FORM, DeclaredType::Form { model, .. }) => {
                        models.insert(*model);
                    }
                    (RETURN | BODY, DeclaredType::Type(ty)) => {
                        models.insert(*ty);
                    }
                    (FORM, _) | (_, DeclaredType::Form { .. }) => {}
                    (_, DeclaredType::Type(ty)) => {
                        parameters.insert(*ty);
                    }
                }
            }
        }
    }

    debug!(
        "Discovered {} models and {} parameter types",
        models.len(),
        parameters.len()
    );
    (models.into_iter().collect(), parameters.into_iter().collect())
}

/// Check that every `$ref` in a serialized document names an entry of
/// `components.schemas`.
pub fn verify_references(document: &Value) -> Result<()> {
    let schemas = document
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object);

    let mut references = Vec::new();
    collect_references(document, &mut references);

    for reference in references {
        let resolved = reference
            .strip_prefix(SCHEMA_REF_PREFIX)
            .is_some_and(|name| schemas.is_some_and(|s| s.contains_key(name)));
        if !resolved {
            return Err(Error::DanglingReference(reference.to_string()));
        }
    }
    Ok(())
}

fn collect_references<'a>(value: &'a Value, references: &mut Vec<&'a str>) {
    match value {
        Value::Object(obj) => {
            if let Some(Value::String(reference)) = obj.get("$ref") {
                references.push(reference);
            }
            for v in obj.values() {
                collect_references(v, references);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_references(v, references);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SecurityScheme;
    use crate::routes::{AuthDescriptor, EndpointSpec, Form, Handler};
    use pretty_assertions::assert_eq;
    use schemars::JsonSchema;
    use serde_json::json;

    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct User {
        id: u32,
        name: String,
    }

    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct CreateUser {
        name: String,
    }

    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct Avatar {
        filename: String,
    }

    fn builder() -> OpenApiBuilder {
        OpenApiBuilder::new(OpenApiConfig::new("My API", "2.0.0"))
    }

    fn user_routes() -> RouteTable {
        let table = RouteTable::new();
        table
            .add_endpoint(
                "/users",
                EndpointSpec::new()
                    .tag("users")
                    .get(Handler::new().arg::<u32>("page").returns::<User>())
                    .post(Handler::new().body::<CreateUser>().returns::<User>()),
            )
            .unwrap();
        table
            .add_endpoint(
                "/users/{id}",
                EndpointSpec::new()
                    .tag("users")
                    .get(Handler::new().arg::<u32>("id").returns::<User>()),
            )
            .unwrap();
        table
    }

    #[test]
    fn test_empty_table() {
        let value = builder().build_value(&RouteTable::new()).unwrap();

        assert_eq!(value["openapi"], "3.0.3");
        assert_eq!(value["info"], json!({"title": "My API", "version": "2.0.0"}));
        assert_eq!(value["paths"], json!({}));
        assert_eq!(value["components"]["schemas"], json!({}));
        assert_eq!(value["security"], json!([]));
        assert_eq!(value["tags"], json!([]));
    }

    #[test]
    fn test_components_carry_all_maps() {
        let value = builder().build_value(&RouteTable::new()).unwrap();
        let keys: Vec<&str> = value["components"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        assert_eq!(
            keys,
            vec![
                "schemas",
                "responses",
                "parameters",
                "examples",
                "requestBodies",
                "headers",
                "securitySchemes",
                "links",
                "callbacks"
            ]
        );
    }

    #[test]
    fn test_routes_become_paths() {
        let value = builder().build_value(&user_routes()).unwrap();

        let paths: Vec<&str> = value["paths"].as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["/users", "/users/{id}"]);

        let list = &value["paths"]["/users"]["get"];
        assert_eq!(list["tags"], json!(["users"]));
        assert_eq!(list["parameters"][0]["in"], "query");
        assert_eq!(
            list["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/User"
        );

        let create = &value["paths"]["/users"]["post"];
        assert_eq!(
            create["requestBody"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/CreateUser"
        );

        assert_eq!(value["paths"]["/users/{id}"]["get"]["parameters"][0]["in"], "path");

        let schemas = value["components"]["schemas"].as_object().unwrap();
        assert!(schemas.contains_key("User"));
        assert!(schemas.contains_key("CreateUser"));
    }

    #[test]
    fn test_hidden_and_opaque_routes_are_skipped() {
        let table = user_routes();
        table.add_route(Route::opaque("/static").unwrap()).unwrap();
        table
            .add_route(
                Route::new("/internal", EndpointSpec::new().get(Handler::new()))
                    .unwrap()
                    .hidden(),
            )
            .unwrap();

        let document = builder().build(&table).unwrap();

        assert!(!document.paths.contains_key("/static"));
        assert!(!document.paths.contains_key("/internal"));
        assert_eq!(document.paths.len(), 2);
    }

    #[test]
    fn test_collect_types_discovery_order() {
        let table = user_routes();
        table
            .add_endpoint(
                "/users/{id}/avatar",
                EndpointSpec::new().put(
                    Handler::new()
                        .arg::<u32>("id")
                        .form::<Form<Avatar>>()
                        .returns::<User>(),
                ),
            )
            .unwrap();

        let (models, parameters) = collect_types(&table.routes());

        assert_eq!(
            models,
            vec![
                PayloadType::of::<User>(),
                PayloadType::of::<CreateUser>(),
                PayloadType::of::<Avatar>()
            ]
        );
        assert_eq!(parameters, vec![PayloadType::of::<u32>()]);
    }

    #[test]
    fn test_config_metadata_flows_into_document() {
        let config = OpenApiConfig::new("My API", "2.0.0")
            .with_description("Users and more")
            .with_openapi_version("3.0.0")
            .with_server(crate::document::Server {
                url: "https://api.example.com".to_string(),
                description: None,
            });

        let value = OpenApiBuilder::new(config).build_value(&RouteTable::new()).unwrap();

        assert_eq!(value["openapi"], "3.0.0");
        assert_eq!(value["info"]["description"], "Users and more");
        assert_eq!(value["servers"], json!([{"url": "https://api.example.com"}]));
        assert!(value.get("externalDocs").is_none());
    }

    #[test]
    fn test_security_schemes_with_token_url() {
        let oauth = SecurityScheme::oauth2_password(&[("admin", "Administer users")]);
        let table = user_routes();
        table
            .add_endpoint(
                "/users/{id}/ban",
                EndpointSpec::new().post(
                    Handler::new()
                        .arg::<u32>("id")
                        .auth(AuthDescriptor::require("oauth", oauth.clone()).with_scopes(&["admin"])),
                ),
            )
            .unwrap();
        table
            .add_endpoint(
                "/token",
                EndpointSpec::new().post(
                    Handler::new().auth(AuthDescriptor::token_endpoint("oauth", oauth)),
                ),
            )
            .unwrap();

        let value = builder().build_value(&table).unwrap();

        assert_eq!(
            value["paths"]["/users/{id}/ban"]["post"]["security"],
            json!([{"oauth": ["admin"]}])
        );
        let scheme = &value["components"]["securitySchemes"]["oauth"];
        assert_eq!(scheme["type"], "oauth2");
        assert_eq!(scheme["flows"]["password"]["tokenUrl"], "/token");
        assert_eq!(
            scheme["flows"]["password"]["scopes"],
            json!({"admin": "Administer users"})
        );
    }

    #[test]
    fn test_conflicting_token_urls_abort_the_build() {
        let scheme = SecurityScheme::oauth2_password(&[]);
        let table = RouteTable::new();
        for path in ["/token", "/login"] {
            table
                .add_endpoint(
                    path,
                    EndpointSpec::new().post(
                        Handler::new().auth(AuthDescriptor::token_endpoint("oauth", scheme.clone())),
                    ),
                )
                .unwrap();
        }

        let err = builder().build(&table).unwrap_err();
        assert!(matches!(err, Error::ConflictingTokenUrl { .. }));
    }

    #[test]
    fn test_build_is_deterministic() {
        let table = user_routes();
        let first = builder().build_value(&table).unwrap();
        let second = builder().build_value(&table).unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_verify_references_accepts_resolved() {
        let value = json!({
            "paths": {"/a": {"get": {"schema": {"$ref": "#/components/schemas/A"}}}},
            "components": {"schemas": {"A": {"type": "object"}}}
        });
        assert!(verify_references(&value).is_ok());
    }

    #[test]
    fn test_verify_references_rejects_dangling() {
        let value = json!({
            "paths": {"/a": {"get": {"schema": {"$ref": "#/components/schemas/B"}}}},
            "components": {"schemas": {"A": {"type": "object"}}}
        });
        let err = verify_references(&value).unwrap_err();
        assert!(matches!(err, Error::DanglingReference(ref r) if r == "#/components/schemas/B"));

        let foreign = json!({"schema": {"$ref": "#/$defs/A"}});
        assert!(verify_references(&foreign).is_err());
    }
}
