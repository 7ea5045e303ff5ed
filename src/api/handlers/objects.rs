//! Bucket read endpoints
//!
//! Backend failures are reported in the body, never as an HTTP status:
//! listings become `["<message>"]` and object fetches `{"error": "<message>"}`.

use actix_web::{web, HttpResponse};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::AppState;

/// Shape of a failed object fetch
#[derive(Serialize, ToSchema)]
pub struct ObjectErrorResponse {
    /// `Object not found` or `A system error has occurred`
    pub error: String,
}

/// GET /s3api/objects - List every object summary in the bucket
#[utoipa::path(
    get,
    path = "/s3api/objects",
    tag = "objects",
    responses(
        (status = 200, description = "Object summaries, or a single error string on failure", body = Vec<crate::storage::ObjectSummary>)
    )
)]
pub async fn list_objects(state: web::Data<AppState>) -> HttpResponse {
    let objects = state.reader.list_all(false).await;
    info!(count = objects.entry_count(), failed = objects.is_failed(), "Listed objects");
    HttpResponse::Ok().json(objects)
}

/// GET /s3api/keys - List every key in the bucket
#[utoipa::path(
    get,
    path = "/s3api/keys",
    tag = "objects",
    responses(
        (status = 200, description = "Object keys, or a single error string on failure", body = Vec<String>)
    )
)]
pub async fn list_keys(state: web::Data<AppState>) -> HttpResponse {
    let keys = state.reader.list_all(true).await;
    info!(count = keys.entry_count(), failed = keys.is_failed(), "Listed keys");
    HttpResponse::Ok().json(keys)
}

/// GET /s3api/objects/{key} - Object metadata and body
#[utoipa::path(
    get,
    path = "/s3api/objects/{key}",
    tag = "objects",
    params(
        ("key" = String, Path, description = "Object key; may contain '/' (e.g. 'reports/2024/q1.csv')")
    ),
    responses(
        (status = 200, description = "Raw object metadata merged with a 'body' field, or an error mapping", body = ObjectErrorResponse)
    )
)]
pub async fn get_object(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let key = path.into_inner();
    let object = state.reader.get_one(&key).await;
    info!(key = %key, found = object.is_found(), "Fetched object");
    HttpResponse::Ok().json(object)
}

/// GET /s3api/allobjects - Metadata and body of every object, in key order
#[utoipa::path(
    get,
    path = "/s3api/allobjects",
    tag = "objects",
    responses(
        (status = 200, description = "One object or error mapping per key", body = Vec<ObjectErrorResponse>)
    )
)]
pub async fn all_object_details(state: web::Data<AppState>) -> HttpResponse {
    let objects = state.reader.get_all().await;
    let found = objects.iter().filter(|o| o.is_found()).count();
    info!(count = objects.len(), found, "Fetched all objects");
    HttpResponse::Ok().json(objects)
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

    use crate::api::configure_routes;
    use crate::storage::testing::{paged_keys, test_reader, Fetch, MockStore};
    use crate::storage::{ERROR_GENERIC, ERROR_NOT_FOUND};
    use crate::AppState;

    async fn get_json(store: MockStore, uri: &str) -> Value {
        let (reader, _) = test_reader(store);
        let state = web::Data::new(AppState { reader });
        let app = test::init_service(App::new().app_data(state).configure(configure_routes)).await;

        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success(), "status {} for {}", resp.status(), uri);
        test::read_body_json(resp).await
    }

    #[actix_web::test]
    async fn test_list_objects() {
        let body = get_json(MockStore::paged(2, 2), "/s3api/objects").await;

        let objects = body.as_array().unwrap();
        assert_eq!(objects.len(), 4);
        assert_eq!(objects[0]["key"], "p0-TestKey0");
        assert_eq!(objects[3]["key"], "p1-TestKey1");
        assert_eq!(objects[0]["bucketName"], "test-bucket");
    }

    #[actix_web::test]
    async fn test_list_keys() {
        let body = get_json(MockStore::paged(2, 2), "/s3api/keys").await;
        assert_eq!(body, json!(["p0-TestKey0", "p0-TestKey1", "p1-TestKey0", "p1-TestKey1"]));
        assert_eq!(body, json!(paged_keys(2, 2)));
    }

    #[actix_web::test]
    async fn test_list_failure_is_in_band() {
        let body = get_json(MockStore::unreachable(), "/s3api/objects").await;
        assert_eq!(body, json!([ERROR_GENERIC]));

        let body = get_json(MockStore::unreachable(), "/s3api/keys").await;
        assert_eq!(body, json!([ERROR_GENERIC]));
    }

    #[actix_web::test]
    async fn test_get_object_with_nested_key() {
        let store = MockStore::with_objects(vec![("docs/2024/readme.txt", Fetch::Body("Hello world"))]);
        let body = get_json(store, "/s3api/objects/docs/2024/readme.txt").await;
        assert_eq!(body, json!({ "body": "Hello world" }));
    }

    #[actix_web::test]
    async fn test_get_object_not_found() {
        let body = get_json(MockStore::default(), "/s3api/objects/missing.txt").await;
        assert_eq!(body, json!({ "error": ERROR_NOT_FOUND }));
    }

    #[actix_web::test]
    async fn test_all_objects() {
        let store = MockStore::with_objects(vec![
            ("k1", Fetch::Rejected),
            ("k2", Fetch::Body("second")),
        ]);
        let body = get_json(store, "/s3api/allobjects").await;
        assert_eq!(body, json!([{ "error": ERROR_GENERIC }, { "body": "second" }]));
    }
}
