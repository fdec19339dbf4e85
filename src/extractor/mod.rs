//! Operation extraction from handler declarations.
//!
//! Each documented route yields one [`PathItem`]. For every HTTP method its
//! [`Endpoint`] defines, the handler's annotations are walked in declaration order and
//! turned into parameters, a request body and a success response.
//!
//! Security metadata is collected into a per-build [`BuildState`] rather than on the
//! route, see [`security`].

pub mod security;

pub use security::BuildState;

use crate::document::{
    Operation, Parameter, ParameterLocation, PathItem, RequestBody, Response, SecurityRequirement,
};
use crate::error::{Error, Result};
use crate::routes::{
    Annotation, DeclaredType, Endpoint, Handler, HttpMethod, PayloadType, Route, BODY, FORM,
    RETURN,
};
use crate::schema_generator::SchemaDictionary;
use log::debug;

const JSON_MEDIA_TYPE: &str = "application/json";
const FORM_MEDIA_TYPE: &str = "multipart/form-data";
const SUCCESS_DESCRIPTION: &str = "Success Response";

/// Builds the path item for one route, with operations in [`HttpMethod::ALL`] order.
pub fn extract_path_item(
    route: &Route,
    endpoint: &dyn Endpoint,
    dictionary: &SchemaDictionary,
    state: &mut BuildState,
) -> Result<PathItem> {
    let mut item = PathItem::default();

    for method in HttpMethod::ALL {
        let Some(handler) = endpoint.handler(method) else {
            continue;
        };
        debug!("Extracting operation: {} {}", method.as_str(), route.path);
        let operation = extract_operation(handler, route, endpoint.tags(), dictionary, state)?;
        item.add_operation(method, operation);
    }

    Ok(item)
}

/// Builds one operation from a handler declaration.
pub fn extract_operation(
    handler: &Handler,
    route: &Route,
    tags: &[String],
    dictionary: &SchemaDictionary,
    state: &mut BuildState,
) -> Result<Operation> {
    let mut operation = Operation {
        tags: tags.to_vec(),
        summary: handler.summary.clone(),
        description: handler.description.clone(),
        operation_id: handler.operation_id.clone(),
        deprecated: handler.deprecated,
        ..Operation::default()
    };

    for annotation in &handler.annotations {
        apply_annotation(&mut operation, annotation, route, dictionary)?;
    }

    if let Some(auth) = &handler.auth {
        if auth.auth_require {
            let mut requirement = SecurityRequirement::new();
            requirement.insert(auth.scheme_name.clone(), auth.scopes.clone());
            operation.security.push(requirement);
            state.register_scheme(&auth.scheme_name, &auth.scheme);
        } else if auth.token_url {
            state.record_token_url(&route.path)?;
        }
    }

    Ok(operation)
}

fn apply_annotation(
    operation: &mut Operation,
    annotation: &Annotation,
    route: &Route,
    dictionary: &SchemaDictionary,
) -> Result<()> {
    let name = annotation.name.as_str();

    match (name, &annotation.declared) {
        (FORM, DeclaredType::Form { model, .. }) => {
            let mut request_body = RequestBody::new(true);
            request_body.add_schema_content(FORM_MEDIA_TYPE, dictionary.model_name(model)?, None);
            operation.set_request_body(request_body);
        }
        (FORM, declared) => {
            return Err(invalid_annotation(
                name,
                format!("{} is not a form wrapper", declared.type_path()),
            ));
        }
        (_, DeclaredType::Form { wrapper, .. }) => {
            return Err(invalid_annotation(
                name,
                format!("form wrapper {} must be declared as '{}'", wrapper, FORM),
            ));
        }
        (RETURN, DeclaredType::Type(ty)) => {
            let mut response = Response::new(SUCCESS_DESCRIPTION);
            response.add_schema_content(JSON_MEDIA_TYPE, dictionary.model_name(ty)?, None);
            operation.add_response(200, response);
        }
        (BODY, DeclaredType::Type(ty)) => {
            let mut request_body = RequestBody::new(true);
            request_body.add_schema_content(JSON_MEDIA_TYPE, dictionary.model_name(ty)?, None);
            operation.set_request_body(request_body);
        }
        (_, DeclaredType::Type(ty)) => {
            operation.add_parameter(extract_parameter(name, ty, route, dictionary));
        }
    }

    Ok(())
}

/// Path parameter when `name` is one of the route's path parameters, query otherwise.
fn extract_parameter(
    name: &str,
    ty: &PayloadType,
    route: &Route,
    dictionary: &SchemaDictionary,
) -> Parameter {
    let mut parameter = if route.path_params.contains(name) {
        Parameter::new(name, ParameterLocation::Path, true)
    } else {
        Parameter::new(name, ParameterLocation::Query, false)
    };
    parameter.schema = dictionary.parameter_schema(ty).cloned();
    parameter
}

fn invalid_annotation(name: &str, message: String) -> Error {
    Error::InvalidAnnotation {
        name: name.to_string(),
        message,
    }
}
