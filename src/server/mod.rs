pub mod handlers;
pub mod types;

use crate::{
    Error, Result,
    config::Config,
    detection::OnnxDetector,
    ingredients::IngredientExtractor,
    net,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub use handlers::AppState;

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/recipes", get(handlers::list_recipes))
        .route("/api/process-image", post(handlers::process_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Any origin, method and header, with credentials. A literal `*` is not
/// allowed together with credentials, so the request's own values are echoed.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub async fn run(config: Config) -> Result<()> {
    let model_config = config.model.clone();
    let detector = tokio::task::spawn_blocking(move || OnnxDetector::load(&model_config))
        .await
        .map_err(|e| Error::internal(format!("model loading task failed: {}", e)))??;

    let app_state = AppState {
        extractor: IngredientExtractor::new(Arc::new(detector)),
    };
    let app = router(app_state, config.server.max_upload_bytes);

    let host: IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(host, config.server.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    println!(
        "Server running at http://{}:{}",
        net::advertised_host(host),
        config.server.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
