#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use schemacraft::core::api::{AppState, api_router};
    use schemacraft::core::config::Config;
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;
    use tracing_subscriber::EnvFilter;

    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();
    tracing::info!(
        "Config loaded: site_addr={}, insights={:?}, default_sql_mode={}",
        config.site_addr,
        config.insights_backend,
        config.default_sql_mode
    );

    let app = api_router(AppState::from_config(&config))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.site_addr).await?;
    tracing::info!("listening on http://{}", config.site_addr);
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[cfg(not(feature = "ssr"))]
pub fn main() {
    // no server without the `ssr` feature; use the library directly
}
