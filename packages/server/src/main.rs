#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server exposing the hoodscope tool surface.
//!
//! Two routes: `POST /mcp` dispatches `{tool, args}` requests to the
//! aggregation engine, and `GET /health` answers a liveness probe. Tool
//! calls always answer HTTP 200; failures ride the response envelope.

mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use hoodscope_tools::config::AppConfig;
use hoodscope_tools::context::ToolContext;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = AppConfig::from_env();
    log::info!("Snapshot data dir: {}", config.data_dir.display());

    let context = ToolContext::new(config).expect("Failed to build HTTP client");
    let state = web::Data::new(context);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(7000);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .route("/mcp", web::post().to(handlers::mcp))
            .route("/health", web::get().to(handlers::health))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
