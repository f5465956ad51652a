//! Chunk embeddings persisted in PostgreSQL and searched in memory.
//!
//! Vectors live in `nace_embeddings.embedding` (`REAL[]`). Search is a
//! brute-force cosine scan over the loaded collection, which is small
//! (a few hundred chunks for the NACE structure document).

use std::cmp::Ordering;

use serde::Serialize;
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::llm_client::embeddings::cosine_similarity;

pub const DEFAULT_COLLECTION: &str = "nace_documents";

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Got {chunks} chunks but {embeddings} embeddings")]
    LengthMismatch { chunks: usize, embeddings: usize },
}

#[derive(Debug, Clone, FromRow)]
pub struct IndexedChunk {
    pub chunk_index: i32,
    pub content: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk_index: i32,
    pub content: String,
    pub score: f64,
}

/// True when the collection holds at least one chunk.
pub async fn collection_exists(pool: &PgPool, collection: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM nace_embeddings WHERE collection = $1)",
    )
    .bind(collection)
    .fetch_one(pool)
    .await
}

/// Stores `chunks` with their `embeddings` in one transaction, indexed by position.
pub async fn add_chunks(
    pool: &PgPool,
    collection: &str,
    chunks: &[String],
    embeddings: &[Vec<f32>],
) -> Result<usize, VectorStoreError> {
    if chunks.len() != embeddings.len() {
        return Err(VectorStoreError::LengthMismatch {
            chunks: chunks.len(),
            embeddings: embeddings.len(),
        });
    }

    let mut tx = pool.begin().await?;
    for (index, (content, embedding)) in chunks.iter().zip(embeddings).enumerate() {
        sqlx::query(
            r#"
            INSERT INTO nace_embeddings (id, collection, chunk_index, content, embedding)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (collection, chunk_index) DO UPDATE SET
                content = EXCLUDED.content,
                embedding = EXCLUDED.embedding
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(collection)
        .bind(index as i32)
        .bind(content)
        .bind(embedding)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!("Stored {} chunks in collection '{collection}'", chunks.len());
    Ok(chunks.len())
}

pub async fn clear(pool: &PgPool, collection: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM nace_embeddings WHERE collection = $1")
        .bind(collection)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// In-memory copy of one collection.
#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    chunks: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub fn new(chunks: Vec<IndexedChunk>) -> Self {
        Self { chunks }
    }

    pub async fn load(pool: &PgPool, collection: &str) -> Result<Self, sqlx::Error> {
        let chunks = sqlx::query_as::<_, IndexedChunk>(
            "SELECT chunk_index, content, embedding FROM nace_embeddings \
             WHERE collection = $1 ORDER BY chunk_index",
        )
        .bind(collection)
        .fetch_all(pool)
        .await?;
        info!("Loaded {} chunks from collection '{collection}'", chunks.len());
        Ok(Self { chunks })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top `k` chunks by cosine similarity; ties go to the earlier chunk.
    /// Chunks whose dimension differs from the query are skipped.
    pub fn similarity_search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .filter(|c| c.embedding.len() == query.len())
            .map(|c| ScoredChunk {
                chunk_index: c.chunk_index,
                content: c.content.clone(),
                score: cosine_similarity(query, &c.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        scored.truncate(k);
        scored
    }
}
