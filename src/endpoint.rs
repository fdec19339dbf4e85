//! HTTP endpoint serving the generated document.
//!
//! [`OpenApi::register`] reserves the document path in the route table (hidden from the
//! document itself) and [`OpenApi::router`] mounts a single GET handler at that path.
//! The document is built on the first request and cached until
//! [`OpenApi::invalidate`] is called.

use crate::config::OpenApiConfig;
use crate::error::Result;
use crate::openapi_builder::OpenApiBuilder;
use crate::routes::{Route, RouteTable};
use crate::schema_generator::SchemaDelegate;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::{debug, error, info};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::Arc;

pub struct OpenApi {
    builder: OpenApiBuilder,
    routes: Arc<RouteTable>,
    cache: RwLock<Option<Arc<Value>>>,
}

impl OpenApi {
    /// Registers the document route at `config.api_url`.
    ///
    /// Fails when the path is malformed or already taken by another route.
    pub fn register(config: OpenApiConfig, routes: Arc<RouteTable>) -> Result<Self> {
        routes.add_route(Route::opaque(&config.api_url)?.hidden())?;
        info!("Serving OpenAPI document at {}", config.api_url);

        Ok(Self {
            builder: OpenApiBuilder::new(config),
            routes,
            cache: RwLock::new(None),
        })
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn SchemaDelegate>) -> Self {
        self.builder = self.builder.with_delegate(delegate);
        self
    }

    pub fn api_url(&self) -> &str {
        &self.builder.config().api_url
    }

    /// The serialized document, built on first use.
    ///
    /// Concurrent first calls may each build; the last one to finish is cached. A failed
    /// build leaves the cache empty so the next call retries.
    pub fn document(&self) -> Result<Arc<Value>> {
        if let Some(document) = self.cache.read().as_ref() {
            return Ok(Arc::clone(document));
        }

        debug!("No cached OpenAPI document, building");
        let document = Arc::new(self.builder.build_value(&self.routes)?);
        *self.cache.write() = Some(Arc::clone(&document));
        Ok(document)
    }

    /// Drops the cached document; the next request rebuilds it.
    pub fn invalidate(&self) {
        debug!("Invalidating cached OpenAPI document");
        *self.cache.write() = None;
    }

    pub fn is_cached(&self) -> bool {
        self.cache.read().is_some()
    }

    /// Router serving the document with GET at [`OpenApi::api_url`].
    pub fn router<S>(self: Arc<Self>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let path = self.api_url().to_string();
        Router::new()
            .route(&path, get(serve_document))
            .with_state(self)
    }
}

async fn serve_document(State(openapi): State<Arc<OpenApi>>) -> Response {
    match openapi.document() {
        Ok(document) => Json(&*document).into_response(),
        Err(err) => {
            error!("Failed to build OpenAPI document: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}
