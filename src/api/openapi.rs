//! OpenAPI 3.0 specification definition

use utoipa::OpenApi;

use crate::api::handlers::{health::HealthResponse, objects::ObjectErrorResponse};
use crate::storage::ObjectSummary;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "S3API Reader",
        version = "1.0.0",
        description = "Read-only access to the objects of an S3-compatible bucket",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/", description = "Current server")
    ),
    tags(
        (name = "system", description = "System health and status endpoints"),
        (name = "objects", description = "Bucket listing and object retrieval")
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::objects::list_objects,
        crate::api::handlers::objects::list_keys,
        crate::api::handlers::objects::get_object,
        crate::api::handlers::objects::all_object_details,
    ),
    components(
        schemas(
            HealthResponse,
            ObjectSummary,
            ObjectErrorResponse,
        )
    )
)]
pub struct ApiDoc;
