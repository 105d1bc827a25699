mod config;
mod routes;
mod state;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = config::Config::from_env()?;
    match &config.widget.backend {
        Some(backend) => tracing::info!(url = %backend.url, table = %backend.table, "supabase backend configured"),
        None => tracing::warn!("SUPABASE_URL not set; widget falls back to in-memory messages"),
    }

    let state = state::AppState::new(config.widget);
    let app = routes::leptos_app(state)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "chatterbox listening");
    axum::serve(listener, app).await?;
    Ok(())
}
