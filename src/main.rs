//! S3API Reader
//!
//! Read-only HTTP API over an S3-compatible bucket using Rust + Actix-Web.
//! Lists objects and keys, and serves object metadata together with the
//! decoded object body.

use actix_web::{web, App, HttpServer, middleware};
use anyhow::Context;
use tracing::info;
use tracing_actix_web::TracingLogger;
use std::sync::Arc;

mod api;
mod config;
mod storage;

use crate::config::Settings;
use crate::storage::{BucketReader, S3ObjectStore};

/// Application state shared across all handlers
pub struct AppState {
    pub reader: BucketReader,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("s3api_reader=info".parse()?)
                .add_directive("actix_web=info".parse()?)
        )
        .json()
        .init();

    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;
    let bind_addr = settings.bind_addr();

    info!(
        "Starting S3API Reader v{} on {}",
        env!("CARGO_PKG_VERSION"),
        bind_addr
    );

    // Build the S3 client once; the bucket reference never changes afterwards
    let bucket = settings.storage.bucket_ref();
    let store = S3ObjectStore::new(&bucket, settings.storage.force_path_style).await;
    info!(
        bucket = %bucket.name(),
        endpoint = %bucket.endpoint(),
        region = %bucket.region(),
        "Object store configured"
    );

    let reader = BucketReader::new(bucket, Arc::new(store))
        .with_fetch_concurrency(settings.storage.fetch_concurrency);

    let app_state = web::Data::new(AppState { reader });
    let workers = settings.server.workers.unwrap_or_else(|| num_cpus::get() * 2);

    // Configure and start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(TracingLogger::default())
            .wrap(middleware::Compress::default())
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Service", "s3api-reader"))
                    .add(("X-Version", env!("CARGO_PKG_VERSION")))
            )
            .configure(api::configure_routes)
    })
    .workers(workers)
    .bind(&bind_addr)
    .with_context(|| format!("Failed to bind {}", bind_addr))?
    .run()
    .await
    .context("HTTP server terminated")
}
