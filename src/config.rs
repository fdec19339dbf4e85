use crate::document::{Contact, ExternalDocs, License, Server, Tag};
use crate::error::Result;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_API_URL: &str = "/openapi";
pub const DEFAULT_OPENAPI_VERSION: &str = "3.0.3";
pub const DEFAULT_API_VERSION: &str = "1.0";

/// Configuration of the generated document and of the endpoint serving it.
///
/// Loadable from YAML or JSON, every field except `title` is optional:
///
/// ```yaml
/// title: Pet Store
/// version: "2.1"
/// api_url: /docs/openapi.json
/// servers:
///   - url: https://pets.example.com
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenApiConfig {
    pub title: String,
    #[serde(default = "default_api_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub terms_of_service: Option<String>,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub external_docs: Option<ExternalDocs>,
    /// Path the document is served at
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Value of the top-level `openapi` field
    #[serde(default = "default_openapi_version")]
    pub openapi_version: String,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_openapi_version() -> String {
    DEFAULT_OPENAPI_VERSION.to_string()
}

impl OpenApiConfig {
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            version: version.to_string(),
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
            servers: Vec::new(),
            tags: Vec::new(),
            external_docs: None,
            api_url: default_api_url(),
            openapi_version: default_openapi_version(),
        }
    }

    /// Loads configuration from a YAML or JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_terms_of_service(mut self, url: &str) -> Self {
        self.terms_of_service = Some(url.to_string());
        self
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_license(mut self, license: License) -> Self {
        self.license = Some(license);
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.push(server);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    pub fn with_external_docs(mut self, docs: ExternalDocs) -> Self {
        self.external_docs = Some(docs);
        self
    }

    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.to_string();
        self
    }

    pub fn with_openapi_version(mut self, version: &str) -> Self {
        self.openapi_version = version.to_string();
        self
    }
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self::new("API", DEFAULT_API_VERSION)
    }
}
