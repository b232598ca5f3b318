use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

use crate::responder::{ClientView, Link, ServiceView, UserView};
use crate::routes::oauth::{SignedIn, Welcome};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ClientInput { pub name: String, pub contact_manager: String, pub email: String }

#[derive(ToSchema)]
pub struct ClientPatchInput { pub name: Option<String>, pub contact_manager: Option<String>, pub email: Option<String> }

#[derive(ToSchema)]
pub struct ServiceInput {
    pub name: String,
    #[schema(rename = "type")]
    pub kind: String,
    pub price: f64,
}

#[derive(ToSchema)]
pub struct ServicePatchInput {
    pub name: Option<String>,
    #[schema(rename = "type")]
    pub kind: Option<String>,
    pub price: Option<f64>,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::oauth::index,
        crate::routes::oauth::authorize,
        crate::routes::oauth::callback,
        crate::routes::clients::create,
        crate::routes::clients::list,
        crate::routes::clients::get,
        crate::routes::clients::replace,
        crate::routes::clients::patch,
        crate::routes::clients::delete,
        crate::routes::clients::assign_service,
        crate::routes::clients::unlink_service,
        crate::routes::services::create,
        crate::routes::services::list,
        crate::routes::services::get,
        crate::routes::services::replace,
        crate::routes::services::patch,
        crate::routes::services::delete,
        crate::routes::users::list,
    ),
    components(
        schemas(
            HealthResponse,
            ClientInput,
            ClientPatchInput,
            ServiceInput,
            ServicePatchInput,
            Link,
            ClientView,
            ServiceView,
            UserView,
            Welcome,
            SignedIn,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "oauth"),
        (name = "clients"),
        (name = "services"),
        (name = "users")
    )
)]
pub struct ApiDoc;
