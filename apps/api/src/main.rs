use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use classifier_api::classification::Classifier;
use classifier_api::config::Config;
use classifier_api::db::create_pool;
use classifier_api::llm_client::embeddings::EmbeddingClient;
use classifier_api::llm_client::LlmClient;
use classifier_api::notify::EmailClient;
use classifier_api::policy::pdf::CommandPdfRenderer;
use classifier_api::policy::queue::run_worker;
use classifier_api::policy::templates::Templates;
use classifier_api::routes::build_router;
use classifier_api::state::AppState;
use classifier_api::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;
    init_tracing(env!("CARGO_CRATE_NAME"), &config.rust_log);

    info!("Starting {} v{}", config.api_name, env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM clients
    let llm = LlmClient::from_config(&config);
    let embeddings = EmbeddingClient::from_config(&config);
    info!(
        "LLM client initialized (model: {}, embeddings: {})",
        llm.model(),
        embeddings.model()
    );

    let templates = Arc::new(Templates::new()?);
    let email = EmailClient::from_config(&config, templates.clone());
    let pdf_renderer = Arc::new(CommandPdfRenderer::new(
        config.pdf_renderer.clone(),
        config.static_dir.join("print.css"),
    ));
    let classifier = Arc::new(Classifier::new(
        llm.clone(),
        embeddings.clone(),
        config.nace_document_path.clone(),
    ));

    // Build app state
    let state = AppState {
        db,
        redis,
        s3,
        llm,
        embeddings,
        classifier,
        pdf_renderer,
        templates,
        email,
        config: config.clone(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(run_worker(state.clone(), shutdown_rx));

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, waiting for the policy worker");
    let _ = shutdown_tx.send(true);
    worker.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "classifier-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // Path-style URLs keep MinIO working without bucket DNS.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
