//! Route table and handler declarations.
//!
//! The host application describes its routes here at startup. Each documented route
//! carries an [`Endpoint`], which exposes one [`Handler`] per HTTP method. A handler is
//! an explicit, ordered list of annotations (`name` + declared type), built when the
//! route is registered, plus optional authentication metadata.
//!
//! Annotation names carry meaning:
//!
//! - `return` - the success response payload
//! - `body` - the JSON request payload
//! - `form` - a multipart form wrapping an inner model
//! - a name listed in the route's path parameters - a path parameter
//! - anything else - a query parameter

use crate::document::SecurityScheme;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use log::debug;
use parking_lot::RwLock;
use regex::Regex;
use schemars::{JsonSchema, Schema, SchemaGenerator};
use std::any::TypeId;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Annotation name for the success response payload
pub const RETURN: &str = "return";
/// Annotation name for the JSON request payload
pub const BODY: &str = "body";
/// Annotation name for the multipart form payload
pub const FORM: &str = "form";

/// HTTP methods that can be documented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// All methods, in the order operations are emitted for a path.
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
        HttpMethod::Trace,
    ];

    /// Lowercase method name, as used for path item keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
            HttpMethod::Trace => "trace",
        }
    }
}

fn subschema_of<T: JsonSchema + ?Sized>(generator: &mut SchemaGenerator) -> Schema {
    generator.subschema_for::<T>()
}

/// A declared Rust type that can describe itself as JSON Schema.
///
/// Two tags are equal when they were created for the same Rust type.
#[derive(Clone, Copy)]
pub struct PayloadType {
    id: TypeId,
    type_path: &'static str,
    subschema: fn(&mut SchemaGenerator) -> Schema,
}

impl PayloadType {
    pub fn of<T: JsonSchema + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_path: std::any::type_name::<T>(),
            subschema: subschema_of::<T>,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified Rust type path, e.g. `my_app::models::Pet`
    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// Last path segment of the type, without generic arguments
    pub fn short_name(&self) -> &'static str {
        let base = self.type_path.split('<').next().unwrap_or(self.type_path);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Requests this type's schema from `generator`. Referenceable types come back as a
    /// `$ref` and are added to the generator's definitions.
    pub fn subschema(&self, generator: &mut SchemaGenerator) -> Schema {
        (self.subschema)(generator)
    }
}

impl PartialEq for PayloadType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PayloadType {}

impl std::hash::Hash for PayloadType {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PayloadType").field(&self.type_path).finish()
    }
}

/// A multipart form payload wrapping an inner model.
///
/// Only the inner model is documented; the wrapper itself never gets a schema.
pub trait FormModel: 'static {
    type Model: JsonSchema + 'static;
}

/// Stock form wrapper around a model `T`.
#[derive(Debug, Clone, Default)]
pub struct Form<T>(pub T);

impl<T: JsonSchema + 'static> FormModel for Form<T> {
    type Model = T;
}

/// The declared type of one annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeclaredType {
    Type(PayloadType),
    Form {
        wrapper: &'static str,
        model: PayloadType,
    },
}

impl DeclaredType {
    pub fn of<T: JsonSchema + 'static>() -> Self {
        DeclaredType::Type(PayloadType::of::<T>())
    }

    pub fn form<F: FormModel>() -> Self {
        DeclaredType::Form {
            wrapper: std::any::type_name::<F>(),
            model: PayloadType::of::<F::Model>(),
        }
    }

    pub fn type_path(&self) -> &'static str {
        match self {
            DeclaredType::Type(ty) => ty.type_path(),
            DeclaredType::Form { wrapper, .. } => wrapper,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    pub declared: DeclaredType,
}

/// Authentication metadata attached to a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthDescriptor {
    /// Name the scheme is registered under in `components.securitySchemes`
    pub scheme_name: String,
    pub scheme: SecurityScheme,
    /// The operation requires this scheme
    pub auth_require: bool,
    /// The route issues OAuth2 password-flow tokens
    pub token_url: bool,
    pub scopes: Vec<String>,
}

impl AuthDescriptor {
    /// The handler requires callers to authenticate with `scheme`.
    pub fn require(scheme_name: &str, scheme: SecurityScheme) -> Self {
        Self {
            scheme_name: scheme_name.to_string(),
            scheme,
            auth_require: true,
            token_url: false,
            scopes: Vec::new(),
        }
    }

    /// The handler is the token endpoint of the password flow of `scheme`.
    pub fn token_endpoint(scheme_name: &str, scheme: SecurityScheme) -> Self {
        Self {
            scheme_name: scheme_name.to_string(),
            scheme,
            auth_require: false,
            token_url: true,
            scopes: Vec::new(),
        }
    }

    pub fn with_scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Declaration of one handler method.
#[derive(Debug, Clone, Default)]
pub struct Handler {
    pub annotations: Vec<Annotation>,
    pub auth: Option<AuthDescriptor>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub operation_id: Option<String>,
    pub deprecated: bool,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn annotate(mut self, name: &str, declared: DeclaredType) -> Self {
        self.annotations.push(Annotation {
            name: name.to_string(),
            declared,
        });
        self
    }

    /// A path or query argument; which one depends on the route's path parameters.
    pub fn arg<T: JsonSchema + 'static>(self, name: &str) -> Self {
        self.annotate(name, DeclaredType::of::<T>())
    }

    pub fn body<T: JsonSchema + 'static>(self) -> Self {
        self.annotate(BODY, DeclaredType::of::<T>())
    }

    pub fn form<F: FormModel>(self) -> Self {
        self.annotate(FORM, DeclaredType::form::<F>())
    }

    pub fn returns<T: JsonSchema + 'static>(self) -> Self {
        self.annotate(RETURN, DeclaredType::of::<T>())
    }

    pub fn auth(mut self, auth: AuthDescriptor) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn summary(mut self, summary: &str) -> Self {
        self.summary = Some(summary.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn operation_id(mut self, operation_id: &str) -> Self {
        self.operation_id = Some(operation_id.to_string());
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// Capability contract of a documented route handler.
///
/// Anything that can list its tags and hand out a [`Handler`] per HTTP method can be
/// documented; routes without an endpoint are left out of the document.
pub trait Endpoint: Send + Sync {
    fn tags(&self) -> &[String];

    fn handler(&self, method: HttpMethod) -> Option<&Handler>;
}

/// Stock [`Endpoint`] built from per-method handler declarations.
#[derive(Debug, Clone, Default)]
pub struct EndpointSpec {
    pub tags: Vec<String>,
    handlers: IndexMap<HttpMethod, Handler>,
}

impl EndpointSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn method(mut self, method: HttpMethod, handler: Handler) -> Self {
        self.handlers.insert(method, handler);
        self
    }

    pub fn get(self, handler: Handler) -> Self {
        self.method(HttpMethod::Get, handler)
    }

    pub fn put(self, handler: Handler) -> Self {
        self.method(HttpMethod::Put, handler)
    }

    pub fn post(self, handler: Handler) -> Self {
        self.method(HttpMethod::Post, handler)
    }

    pub fn delete(self, handler: Handler) -> Self {
        self.method(HttpMethod::Delete, handler)
    }

    pub fn patch(self, handler: Handler) -> Self {
        self.method(HttpMethod::Patch, handler)
    }
}

impl Endpoint for EndpointSpec {
    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn handler(&self, method: HttpMethod) -> Option<&Handler> {
        self.handlers.get(&method)
    }
}

fn path_param_regex() -> &'static Regex {
    static PATH_PARAM: OnceLock<Regex> = OnceLock::new();
    // `{name}` or `{name:convertor}`
    PATH_PARAM.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)(?::[A-Za-z_][A-Za-z0-9_]*)?\}")
            .expect("valid regex")
    })
}

/// Extracts the path parameter names declared in a route path.
pub fn parse_path_params(path: &str) -> Result<BTreeSet<String>> {
    let invalid = |message: &str| Error::InvalidPath {
        path: path.to_string(),
        message: message.to_string(),
    };

    if !path.starts_with('/') {
        return Err(invalid("path must start with '/'"));
    }

    let regex = path_param_regex();
    let mut params = BTreeSet::new();
    for captures in regex.captures_iter(path) {
        let name = captures[1].to_string();
        if !params.insert(name) {
            return Err(invalid("path parameter declared twice"));
        }
    }

    let remainder = regex.replace_all(path, "");
    if remainder.contains('{') || remainder.contains('}') {
        return Err(invalid("malformed path parameter"));
    }

    Ok(params)
}

/// One entry of the route table.
#[derive(Clone)]
pub struct Route {
    /// Literal route path, e.g. `/pets/{pet_id}`
    pub path: String,
    pub path_params: BTreeSet<String>,
    pub endpoint: Option<Arc<dyn Endpoint>>,
    pub include_in_schema: bool,
}

impl Route {
    /// A documented route.
    pub fn new(path: &str, endpoint: impl Endpoint + 'static) -> Result<Self> {
        Ok(Self {
            path: path.to_string(),
            path_params: parse_path_params(path)?,
            endpoint: Some(Arc::new(endpoint)),
            include_in_schema: true,
        })
    }

    /// A route whose handler does not expose declarations (plain functions, static files).
    pub fn opaque(path: &str) -> Result<Self> {
        Ok(Self {
            path: path.to_string(),
            path_params: parse_path_params(path)?,
            endpoint: None,
            include_in_schema: true,
        })
    }

    /// Keeps the route out of the generated document.
    pub fn hidden(mut self) -> Self {
        self.include_in_schema = false;
        self
    }

    pub fn endpoint(&self) -> Option<&dyn Endpoint> {
        self.endpoint.as_deref()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("path_params", &self.path_params)
            .field("documented", &self.endpoint.is_some())
            .field("include_in_schema", &self.include_in_schema)
            .finish()
    }
}

/// Registry of the application's routes, shared between the host and the document
/// endpoint.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: RwLock<Vec<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route. Fails if another route already uses the same literal path.
    pub fn add_route(&self, route: Route) -> Result<()> {
        let mut routes = self.routes.write();
        if routes.iter().any(|r| r.path == route.path) {
            return Err(Error::DuplicateRoute(route.path));
        }
        debug!("Registering route: {}", route.path);
        routes.push(route);
        Ok(())
    }

    pub fn add_endpoint(&self, path: &str, endpoint: impl Endpoint + 'static) -> Result<()> {
        self.add_route(Route::new(path, endpoint)?)
    }

    /// Snapshot of the registered routes, in registration order.
    pub fn routes(&self) -> Vec<Route> {
        self.routes.read().clone()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.routes.read().iter().any(|r| r.path == path)
    }

    pub fn len(&self) -> usize {
        self.routes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(JsonSchema)]
    #[allow(dead_code)]
    struct Pet {
        name: String,
    }

    #[test]
    fn test_method_order() {
        let names: Vec<&str> = HttpMethod::ALL.iter().map(HttpMethod::as_str).collect();
        assert_eq!(
            names,
            vec!["get", "put", "post", "delete", "options", "head", "patch", "trace"]
        );
    }

    #[test]
    fn test_parse_path_params() {
        let params = parse_path_params("/users/{user_id}/pets/{pet_id:int}").unwrap();
        let params: Vec<&str> = params.iter().map(String::as_str).collect();
        assert_eq!(params, vec!["pet_id", "user_id"]);

        assert!(parse_path_params("/health").unwrap().is_empty());
    }

    #[test]
    fn test_parse_path_params_rejects_bad_syntax() {
        assert!(matches!(
            parse_path_params("users"),
            Err(Error::InvalidPath { .. })
        ));
        assert!(matches!(
            parse_path_params("/users/{id"),
            Err(Error::InvalidPath { .. })
        ));
        assert!(matches!(
            parse_path_params("/users/{1id}"),
            Err(Error::InvalidPath { .. })
        ));
        assert!(matches!(
            parse_path_params("/a/{id}/b/{id}"),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_payload_type_identity() {
        let a = PayloadType::of::<Pet>();
        let b = PayloadType::of::<Pet>();
        let c = PayloadType::of::<String>();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.short_name(), "Pet");
        assert!(a.type_path().ends_with("::Pet"));
        assert_eq!(PayloadType::of::<Vec<Pet>>().short_name(), "Vec");
    }

    #[test]
    fn test_form_declared_type_wraps_inner_model() {
        match DeclaredType::form::<Form<Pet>>() {
            DeclaredType::Form { wrapper, model } => {
                assert!(wrapper.contains("Form<"));
                assert_eq!(model, PayloadType::of::<Pet>());
            }
            other => panic!("expected a form, got {:?}", other),
        }
    }

    #[test]
    fn test_handler_keeps_declaration_order() {
        let handler = Handler::new()
            .arg::<i64>("id")
            .arg::<String>("q")
            .body::<Pet>()
            .returns::<Pet>();
        let names: Vec<&str> = handler.annotations.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["id", "q", "body", "return"]);
    }

    #[test]
    fn test_endpoint_spec_exposes_declared_methods_only() {
        let endpoint = EndpointSpec::new()
            .tag("pets")
            .get(Handler::new())
            .delete(Handler::new());

        assert!(endpoint.handler(HttpMethod::Get).is_some());
        assert!(endpoint.handler(HttpMethod::Delete).is_some());
        assert!(endpoint.handler(HttpMethod::Post).is_none());
        assert_eq!(endpoint.tags(), ["pets".to_string()]);
    }

    #[test]
    fn test_route_table_rejects_duplicate_paths() {
        let table = RouteTable::new();
        table.add_endpoint("/pets", EndpointSpec::new()).unwrap();
        table.add_route(Route::opaque("/static").unwrap()).unwrap();

        let err = table.add_endpoint("/pets", EndpointSpec::new()).unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute(ref p) if p == "/pets"));
        assert_eq!(table.len(), 2);
        assert!(table.contains("/static"));
    }

    #[test]
    fn test_hidden_route_is_not_in_schema() {
        let route = Route::opaque("/openapi").unwrap().hidden();
        assert!(!route.include_in_schema);
        assert!(route.endpoint().is_none());
    }
}
