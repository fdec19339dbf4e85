//! A small pet store route table used by the command-line front end.

use crate::document::SecurityScheme;
use crate::error::Result;
use crate::routes::{AuthDescriptor, EndpointSpec, Form, Handler, Route, RouteTable};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const OAUTH_SCHEME: &str = "oauth2";

/// A pet in the store
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewPet {
    pub name: String,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PetList {
    pub items: Vec<Pet>,
    pub total: u64,
}

/// Photo upload form
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PetPhoto {
    pub caption: Option<String>,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

fn oauth_scheme() -> SecurityScheme {
    SecurityScheme::oauth2_password(&[
        ("pets:read", "Read pets"),
        ("pets:write", "Modify pets"),
    ])
}

/// Route table of the demo pet store.
pub fn pet_store_routes() -> Result<RouteTable> {
    let table = RouteTable::new();

    table.add_endpoint(
        "/pets",
        EndpointSpec::new()
            .tag("pets")
            .get(
                Handler::new()
                    .arg::<u32>("limit")
                    .arg::<String>("tag")
                    .returns::<PetList>()
                    .summary("List pets")
                    .operation_id("listPets"),
            )
            .post(
                Handler::new()
                    .body::<NewPet>()
                    .returns::<Pet>()
                    .summary("Create a pet")
                    .operation_id("createPet"),
            ),
    )?;

    table.add_endpoint(
        "/pets/{pet_id:int}",
        EndpointSpec::new()
            .tag("pets")
            .get(
                Handler::new()
                    .arg::<i64>("pet_id")
                    .returns::<Pet>()
                    .operation_id("getPet"),
            )
            .delete(
                Handler::new()
                    .arg::<i64>("pet_id")
                    .auth(
                        AuthDescriptor::require(OAUTH_SCHEME, oauth_scheme())
                            .with_scopes(&["pets:write"]),
                    )
                    .operation_id("deletePet"),
            ),
    )?;

    table.add_endpoint(
        "/pets/{pet_id:int}/photo",
        EndpointSpec::new().tag("pets").put(
            Handler::new()
                .arg::<i64>("pet_id")
                .form::<Form<PetPhoto>>()
                .returns::<Pet>()
                .summary("Upload a pet photo"),
        ),
    )?;

    table.add_endpoint(
        "/token",
        EndpointSpec::new().tag("auth").post(
            Handler::new()
                .form::<Form<Credentials>>()
                .returns::<Token>()
                .auth(AuthDescriptor::token_endpoint(OAUTH_SCHEME, oauth_scheme()))
                .summary("Issue an access token"),
        ),
    )?;

    table.add_route(Route::opaque("/static/{path}")?)?;

    Ok(table)
}
