//! OpenAPI from routes - OpenAPI 3.0 documents generated from a live route table.
//!
//! The host application registers its routes in a [`routes::RouteTable`] at startup. Each
//! documented route carries an [`routes::Endpoint`] listing, per HTTP method, an explicit
//! handler declaration: named annotations with the Rust types of their payloads. From
//! that table the crate synthesizes an OpenAPI 3.0.3 document on demand and serves it
//! from a GET endpoint.
//!
//! # Architecture
//!
//! 1. [`routes`] - Route table, handler declarations and payload type tags
//! 2. [`schema_generator`] - Schema names and definitions for payload types (`schemars`)
//! 3. [`extractor`] - Turns handler declarations into operations
//! 4. [`openapi_builder`] - Assembles the complete document
//! 5. [`document`] - The document object model
//! 6. [`serializer`] - Generic node serializer, JSON/YAML encoding
//! 7. [`endpoint`] - Cached `axum` endpoint serving the document
//! 8. [`config`] - Document metadata and endpoint path
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_routes::{
//!     config::OpenApiConfig,
//!     endpoint::OpenApi,
//!     routes::{EndpointSpec, Handler, RouteTable},
//! };
//! use schemars::JsonSchema;
//! use std::sync::Arc;
//!
//! #[derive(JsonSchema)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let routes = Arc::new(RouteTable::new());
//! routes.add_endpoint(
//!     "/users/{id}",
//!     EndpointSpec::new()
//!         .tag("users")
//!         .get(Handler::new().arg::<u64>("id").returns::<User>()),
//! )?;
//!
//! let openapi = Arc::new(OpenApi::register(OpenApiConfig::new("Users", "1.0"), routes)?);
//! let app: axum::Router = openapi.router();
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module, which dumps or serves the document of
//! the bundled [`demo`] pet store.

pub mod cli;
pub mod config;
pub mod demo;
pub mod document;
pub mod endpoint;
pub mod error;
pub mod extractor;
pub mod openapi_builder;
pub mod routes;
pub mod schema_generator;
pub mod serializer;
