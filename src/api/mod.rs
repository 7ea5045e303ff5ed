//! API module - HTTP routes and handlers

pub mod handlers;
pub mod openapi;

use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::openapi::ApiDoc;

/// Configure all API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/s3api")
            .route("/objects", web::get().to(handlers::objects::list_objects))
            // Keys may contain '/', so capture the whole tail
            .route("/objects/{key:.+}", web::get().to(handlers::objects::get_object))
            .route("/keys", web::get().to(handlers::objects::list_keys))
            .route("/allobjects", web::get().to(handlers::objects::all_object_details))
    )
    .route("/health", web::get().to(handlers::health::health_check))
    // Swagger UI and OpenAPI spec
    .service(
        SwaggerUi::new("/swagger-ui/{_:.*}")
            .url("/api-docs/openapi.json", ApiDoc::openapi())
    );
}
