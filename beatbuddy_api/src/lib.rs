//! BeatBuddy HTTP API.
//!
//! Proxies chat requests to the `OpenAI` chat completions API, records song
//! preferences in MySQL and serves the static front-end from the public
//! directory.

use axum::{
    Router,
    body::Body,
    http::{
        Request,
        header::{ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    },
    routing::{get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

pub mod completion;
pub mod config;
pub mod error;
pub mod handlers;
pub mod scratch;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::AppContext;

/// Builds the router with every API route, the static file fallback and the
/// CORS, tracing and compression layers.
pub fn app(context: AppContext) -> Router {
    let public_dir = context.config.public_dir.clone();

    // Set up a trace layer
    let trace_layer = TraceLayer::new_for_http().on_request(
        |request: &Request<Body>, _: &tracing::Span| {
            tracing::info!(
                "received request: {method} {uri}",
                method = request.method(),
                uri = request.uri()
            );
        },
    );

    // Set up a CORS layer
    let cors_layer = CorsLayer::new()
        .allow_headers([
            ACCEPT,
            ACCEPT_ENCODING,
            AUTHORIZATION,
            CONTENT_TYPE,
            ORIGIN,
        ])
        .allow_methods(Any)
        .allow_origin(Any);

    let compression_layer = CompressionLayer::new().gzip(true).deflate(true);

    Router::new()
        .route("/generate", post(handlers::chat::generate))
        .route("/top-songs", get(handlers::songs::top_songs))
        .route("/add-song", post(handlers::songs::add_song))
        .route("/genres", post(handlers::songs::update_genre))
        .route("/songs", post(handlers::songs::update_song))
        .route("/health", get(handlers::health))
        .route_service("/", ServeFile::new(public_dir.join("index.html")))
        .fallback_service(ServeDir::new(public_dir))
        .layer(cors_layer)
        .layer(trace_layer)
        .layer(compression_layer)
        .with_state(context)
}
