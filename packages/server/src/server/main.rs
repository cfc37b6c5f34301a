// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use dispatch_core::domains::services::ServiceDirectory;
use dispatch_core::kernel::{NominatimGeocoder, ServerDeps, SmtpMailer};
use dispatch_core::{server::build_app, Config};
use knowledge::{Embedder, KnowledgeBase, OpenAIEmbedder};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,dispatch_core=debug,knowledge=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting 112 dispatch API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Open the service directory and seed it on first start
    let directory = ServiceDirectory::connect(&config.database_url)
        .await
        .context("Failed to open service directory")?;
    directory
        .seed(&config.directory_seed)
        .await
        .context("Failed to seed service directory")?;

    // Knowledge base degrades to the sentinel when the index or key is missing
    let embedder = config.knowledge.openai_api_key.as_ref().map(|key| {
        Arc::new(OpenAIEmbedder::new(key.clone()).with_model(&config.knowledge.embedding_model))
            as Arc<dyn Embedder>
    });
    let knowledge = KnowledgeBase::load(&config.knowledge.index_dir, embedder);

    let geocoder = NominatimGeocoder::new(&config.geocoder_url, &config.geocoder_user_agent)
        .context("Failed to create geocoder")?;
    let mailer = SmtpMailer::new(&config.smtp).context("Failed to create SMTP mailer")?;

    let deps = ServerDeps::new(directory, Arc::new(geocoder), Arc::new(mailer), knowledge);

    // Build application
    let (app, _worker) = build_app(deps, config.knowledge.top_k, config.conversation_idle);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
