use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::classification::Classifier;
use crate::config::Config;
use crate::llm_client::embeddings::EmbeddingClient;
use crate::llm_client::LlmClient;
use crate::notify::EmailClient;
use crate::policy::pdf::PdfRenderer;
use crate::policy::templates::Templates;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Policy job queue and the dependencies cache.
    pub redis: RedisClient,
    pub s3: S3Client,
    pub llm: LlmClient,
    pub embeddings: EmbeddingClient,
    /// Vector index is built lazily, once per process.
    pub classifier: Arc<Classifier>,
    pub pdf_renderer: Arc<dyn PdfRenderer>,
    pub templates: Arc<Templates>,
    pub email: EmailClient,
    pub config: Config,
}
