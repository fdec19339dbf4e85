//! OpenAPI document object model.
//!
//! Every node of the generated document is a plain struct implementing [`OpenApiObject`].
//! A node declares its fixed, ordered list of fields; each field is either unset (and
//! therefore omitted from the output) or carries a [`Field`] value. The generic
//! [`serializer::to_value`](crate::serializer::to_value) turns any node into a
//! `serde_json::Value`.
//!
//! Two internal field names differ from their wire names: `ref` is emitted as `$ref`
//! and `location_in` is emitted as `in`.

use crate::routes::HttpMethod;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Prefix of every schema reference emitted into the document.
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// One field value of a node, before serialization.
pub enum Field<'a> {
    /// The field is not set and is skipped entirely
    Unset,
    /// A scalar or opaque JSON value, passed through unchanged
    Value(Value),
    /// A nested node
    Node(&'a dyn OpenApiObject),
    /// A sequence of fields
    List(Vec<Field<'a>>),
    /// A string-keyed map of fields, in insertion order
    Map(Vec<(&'a str, Field<'a>)>),
}

/// A structured node with an ordered, fixed set of named fields.
pub trait OpenApiObject {
    /// Returns `(internal name, value)` pairs in declaration order.
    fn fields(&self) -> Vec<(&'static str, Field<'_>)>;
}

/// Conversion of a field's Rust value into a [`Field`].
pub trait IntoField {
    fn to_field(&self) -> Field<'_>;
}

impl<T: OpenApiObject> IntoField for T {
    fn to_field(&self) -> Field<'_> {
        Field::Node(self)
    }
}

impl IntoField for String {
    fn to_field(&self) -> Field<'_> {
        Field::Value(Value::String(self.clone()))
    }
}

impl IntoField for bool {
    fn to_field(&self) -> Field<'_> {
        Field::Value(Value::Bool(*self))
    }
}

impl IntoField for Value {
    fn to_field(&self) -> Field<'_> {
        Field::Value(self.clone())
    }
}

impl<T: IntoField> IntoField for Option<T> {
    fn to_field(&self) -> Field<'_> {
        match self {
            Some(value) => value.to_field(),
            None => Field::Unset,
        }
    }
}

impl<T: IntoField> IntoField for Vec<T> {
    fn to_field(&self) -> Field<'_> {
        Field::List(self.iter().map(IntoField::to_field).collect())
    }
}

impl<T: IntoField> IntoField for IndexMap<String, T> {
    fn to_field(&self) -> Field<'_> {
        Field::Map(self.iter().map(|(k, v)| (k.as_str(), v.to_field())).collect())
    }
}

/// A security requirement: scheme name -> required scopes.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Root of the generated document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub openapi: String,
    pub info: Info,
    pub servers: Vec<Server>,
    pub paths: IndexMap<String, PathItem>,
    pub components: Option<Components>,
    pub security: Vec<SecurityRequirement>,
    pub tags: Vec<Tag>,
    pub external_docs: Option<ExternalDocs>,
}

impl OpenApiObject for Document {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("openapi", self.openapi.to_field()),
            ("info", self.info.to_field()),
            ("servers", self.servers.to_field()),
            ("paths", self.paths.to_field()),
            ("components", self.components.to_field()),
            ("security", self.security.to_field()),
            ("tags", self.tags.to_field()),
            ("externalDocs", self.external_docs.to_field()),
        ]
    }
}

/// Human metadata about the API
#[derive(Debug, Clone, PartialEq)]
pub struct Info {
    pub title: String,
    pub description: Option<String>,
    pub terms_of_service: Option<String>,
    pub contact: Option<Contact>,
    pub license: Option<License>,
    pub version: String,
}

impl OpenApiObject for Info {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("title", self.title.to_field()),
            ("description", self.description.to_field()),
            ("termsOfService", self.terms_of_service.to_field()),
            ("contact", self.contact.to_field()),
            ("license", self.license.to_field()),
            ("version", self.version.to_field()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl OpenApiObject for Contact {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("name", self.name.to_field()),
            ("url", self.url.to_field()),
            ("email", self.email.to_field()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl OpenApiObject for License {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![("name", self.name.to_field()), ("url", self.url.to_field())]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl OpenApiObject for Server {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("url", self.url.to_field()),
            ("description", self.description.to_field()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExternalDocs {
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
}

impl OpenApiObject for ExternalDocs {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("description", self.description.to_field()),
            ("url", self.url.to_field()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "externalDocs")]
    pub external_docs: Option<ExternalDocs>,
}

impl OpenApiObject for Tag {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("name", self.name.to_field()),
            ("description", self.description.to_field()),
            ("externalDocs", self.external_docs.to_field()),
        ]
    }
}

/// All operations available on one literal URL path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
    pub trace: Option<Operation>,
    pub reference: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub servers: Vec<Server>,
    pub parameters: Vec<Parameter>,
}

impl PathItem {
    pub fn add_operation(&mut self, method: HttpMethod, operation: Operation) {
        let slot = match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Trace => &mut self.trace,
        };
        *slot = Some(operation);
    }

    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }
}

impl OpenApiObject for PathItem {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("get", self.get.to_field()),
            ("put", self.put.to_field()),
            ("post", self.post.to_field()),
            ("delete", self.delete.to_field()),
            ("options", self.options.to_field()),
            ("head", self.head.to_field()),
            ("patch", self.patch.to_field()),
            ("trace", self.trace.to_field()),
            ("ref", self.reference.to_field()),
            ("summary", self.summary.to_field()),
            ("description", self.description.to_field()),
            ("servers", self.servers.to_field()),
            ("parameters", self.parameters.to_field()),
        ]
    }
}

/// One HTTP method on one path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Operation {
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub external_docs: Option<ExternalDocs>,
    pub operation_id: Option<String>,
    pub parameters: Vec<Parameter>,
    pub request_body: Option<RequestBody>,
    /// Status code (as a decimal string) -> response
    pub responses: IndexMap<String, Response>,
    pub callbacks: Option<Value>,
    pub deprecated: bool,
    pub security: Vec<SecurityRequirement>,
    pub servers: Vec<Server>,
}

impl Operation {
    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    pub fn add_response(&mut self, status_code: u16, response: Response) {
        self.responses.insert(status_code.to_string(), response);
    }

    pub fn set_request_body(&mut self, request_body: RequestBody) {
        self.request_body = Some(request_body);
    }
}

impl OpenApiObject for Operation {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("tags", self.tags.to_field()),
            ("summary", self.summary.to_field()),
            ("description", self.description.to_field()),
            ("externalDocs", self.external_docs.to_field()),
            ("operationId", self.operation_id.to_field()),
            ("parameters", self.parameters.to_field()),
            ("requestBody", self.request_body.to_field()),
            ("responses", self.responses.to_field()),
            ("callbacks", self.callbacks.to_field()),
            ("deprecated", self.deprecated.to_field()),
            ("security", self.security.to_field()),
            ("servers", self.servers.to_field()),
        ]
    }
}

/// Where a parameter is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl IntoField for ParameterLocation {
    fn to_field(&self) -> Field<'_> {
        Field::Value(Value::String(self.as_str().to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub location_in: ParameterLocation,
    pub description: Option<String>,
    pub required: bool,
    pub deprecated: bool,
    pub allow_empty_value: bool,
    pub schema: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, location_in: ParameterLocation, required: bool) -> Self {
        Self {
            name: name.into(),
            location_in,
            description: None,
            required,
            deprecated: false,
            allow_empty_value: false,
            schema: None,
        }
    }
}

impl OpenApiObject for Parameter {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("name", self.name.to_field()),
            ("location_in", self.location_in.to_field()),
            ("description", self.description.to_field()),
            ("required", self.required.to_field()),
            ("deprecated", self.deprecated.to_field()),
            ("allowEmptyValue", self.allow_empty_value.to_field()),
            ("schema", self.schema.to_field()),
        ]
    }
}

/// A `$ref` pointer
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub reference: String,
}

impl Reference {
    /// Reference to a named entry under `components.schemas`.
    pub fn schema(name: &str) -> Self {
        Self {
            reference: format!("{}{}", SCHEMA_REF_PREFIX, name),
        }
    }
}

impl OpenApiObject for Reference {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![("ref", self.reference.to_field())]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    pub schema: Reference,
    pub examples: Option<Value>,
}

impl OpenApiObject for MediaType {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("schema", self.schema.to_field()),
            ("examples", self.examples.to_field()),
        ]
    }
}

fn schema_content(schema_name: &str, examples: Option<Value>) -> MediaType {
    MediaType {
        schema: Reference::schema(schema_name),
        // An empty examples object carries nothing worth emitting
        examples: examples.filter(|e| !matches!(e, Value::Null) && e != &Value::Object(Default::default())),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody {
    pub description: Option<String>,
    pub required: bool,
    /// Media type -> content
    pub content: IndexMap<String, MediaType>,
}

impl RequestBody {
    pub fn new(required: bool) -> Self {
        Self {
            description: None,
            required,
            content: IndexMap::new(),
        }
    }

    pub fn add_schema_content(&mut self, media_type: &str, schema_name: &str, examples: Option<Value>) {
        self.content
            .insert(media_type.to_string(), schema_content(schema_name, examples));
    }
}

impl OpenApiObject for RequestBody {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("description", self.description.to_field()),
            ("required", self.required.to_field()),
            ("content", self.content.to_field()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub description: String,
    pub headers: Option<IndexMap<String, Value>>,
    pub content: IndexMap<String, MediaType>,
    pub links: IndexMap<String, Value>,
}

impl Response {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            headers: None,
            content: IndexMap::new(),
            links: IndexMap::new(),
        }
    }

    pub fn add_schema_content(&mut self, media_type: &str, schema_name: &str, examples: Option<Value>) {
        self.content
            .insert(media_type.to_string(), schema_content(schema_name, examples));
    }
}

impl OpenApiObject for Response {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("description", self.description.to_field()),
            ("headers", self.headers.to_field()),
            ("content", self.content.to_field()),
            ("links", self.links.to_field()),
        ]
    }
}

/// Reusable definitions referenced from the rest of the document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Components {
    pub schemas: IndexMap<String, Value>,
    pub responses: IndexMap<String, Response>,
    pub parameters: IndexMap<String, Parameter>,
    pub examples: IndexMap<String, Value>,
    pub request_bodies: IndexMap<String, RequestBody>,
    pub headers: IndexMap<String, Value>,
    pub security_schemes: IndexMap<String, SecurityScheme>,
    pub links: IndexMap<String, Value>,
    pub callbacks: IndexMap<String, Value>,
}

impl OpenApiObject for Components {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("schemas", self.schemas.to_field()),
            ("responses", self.responses.to_field()),
            ("parameters", self.parameters.to_field()),
            ("examples", self.examples.to_field()),
            ("requestBodies", self.request_bodies.to_field()),
            ("headers", self.headers.to_field()),
            ("securitySchemes", self.security_schemes.to_field()),
            ("links", self.links.to_field()),
            ("callbacks", self.callbacks.to_field()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecuritySchemeType {
    ApiKey,
    Http,
    OAuth2,
    OpenIdConnect,
}

impl IntoField for SecuritySchemeType {
    fn to_field(&self) -> Field<'_> {
        let name = match self {
            SecuritySchemeType::ApiKey => "apiKey",
            SecuritySchemeType::Http => "http",
            SecuritySchemeType::OAuth2 => "oauth2",
            SecuritySchemeType::OpenIdConnect => "openIdConnect",
        };
        Field::Value(Value::String(name.to_string()))
    }
}

/// An authentication mechanism operations can require
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityScheme {
    pub scheme_type: SecuritySchemeType,
    pub description: Option<String>,
    pub name: Option<String>,
    pub location_in: Option<ParameterLocation>,
    pub scheme: Option<String>,
    pub bearer_format: Option<String>,
    pub flows: Option<OAuthFlows>,
    pub open_id_connect_url: Option<String>,
}

impl SecurityScheme {
    fn empty(scheme_type: SecuritySchemeType) -> Self {
        Self {
            scheme_type,
            description: None,
            name: None,
            location_in: None,
            scheme: None,
            bearer_format: None,
            flows: None,
            open_id_connect_url: None,
        }
    }

    /// `Authorization: Bearer <token>` authentication.
    pub fn http_bearer(bearer_format: Option<&str>) -> Self {
        Self {
            scheme: Some("bearer".to_string()),
            bearer_format: bearer_format.map(str::to_string),
            ..Self::empty(SecuritySchemeType::Http)
        }
    }

    /// An API key carried in a header, query string or cookie.
    pub fn api_key(name: &str, location_in: ParameterLocation) -> Self {
        Self {
            name: Some(name.to_string()),
            location_in: Some(location_in),
            ..Self::empty(SecuritySchemeType::ApiKey)
        }
    }

    /// OAuth2 resource-owner password flow. The token URL is filled in at build time
    /// from the route marked as the token endpoint, when there is one.
    pub fn oauth2_password(scopes: &[(&str, &str)]) -> Self {
        let flow = OAuthFlow {
            authorization_url: None,
            token_url: None,
            refresh_url: None,
            scopes: scopes
                .iter()
                .map(|(scope, description)| (scope.to_string(), description.to_string()))
                .collect(),
        };
        Self {
            flows: Some(OAuthFlows {
                password: Some(flow),
                ..OAuthFlows::default()
            }),
            ..Self::empty(SecuritySchemeType::OAuth2)
        }
    }

    pub fn open_id_connect(url: &str) -> Self {
        Self {
            open_id_connect_url: Some(url.to_string()),
            ..Self::empty(SecuritySchemeType::OpenIdConnect)
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

impl OpenApiObject for SecurityScheme {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("type", self.scheme_type.to_field()),
            ("description", self.description.to_field()),
            ("name", self.name.to_field()),
            ("location_in", self.location_in.to_field()),
            ("scheme", self.scheme.to_field()),
            ("bearerFormat", self.bearer_format.to_field()),
            ("flows", self.flows.to_field()),
            ("openIdConnectUrl", self.open_id_connect_url.to_field()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OAuthFlows {
    pub implicit: Option<OAuthFlow>,
    pub password: Option<OAuthFlow>,
    pub client_credentials: Option<OAuthFlow>,
    pub authorization_code: Option<OAuthFlow>,
}

impl OpenApiObject for OAuthFlows {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("implicit", self.implicit.to_field()),
            ("password", self.password.to_field()),
            ("clientCredentials", self.client_credentials.to_field()),
            ("authorizationCode", self.authorization_code.to_field()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OAuthFlow {
    pub authorization_url: Option<String>,
    pub token_url: Option<String>,
    pub refresh_url: Option<String>,
    pub scopes: IndexMap<String, String>,
}

impl OpenApiObject for OAuthFlow {
    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![
            ("authorizationUrl", self.authorization_url.to_field()),
            ("tokenUrl", self.token_url.to_field()),
            ("refreshUrl", self.refresh_url.to_field()),
            ("scopes", self.scopes.to_field()),
        ]
    }
}
