/**
 * This is the main entrypoint for the `beatbuddy` server.
 *
 * It clears the scratch files in the public directory, connects to the
 * database and serves the API and the static front-end until it receives
 * a shutdown signal.
 */
use std::net::SocketAddr;

use beatbuddy_api::{AppContext, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the application context
    let context: AppContext =
        bb_app::create_app_context::<AppContext, Config>().await?;

    beatbuddy_api::scratch::reset_scratch_files(&context.config.public_dir)
        .await?;

    let addr = SocketAddr::from((context.config.host, context.config.port));

    bb_axum::run_app(beatbuddy_api::app(context), addr).await
}
