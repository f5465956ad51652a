use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    Uploaded,
    Generated,
}

impl DocumentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSource::Uploaded => "uploaded",
            DocumentSource::Generated => "generated",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Completed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub mime_type: Option<String>,
    pub source: Option<String>,
    pub content: Option<String>,
    pub filename: Option<String>,
    pub status: Option<String>,
    pub error_message: Option<String>,
    pub company_id: Uuid,
    pub download_url: Option<String>,
    pub date_created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl DocumentRow {
    pub fn is_completed(&self) -> bool {
        self.status.as_deref() == Some(DocumentStatus::Completed.as_str())
    }
}

/// Fetches a document by id.
pub async fn find_document(pool: &sqlx::PgPool, id: Uuid) -> Result<Option<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Ids of documents still waiting for generation, oldest first.
pub async fn list_pending_document_ids(pool: &sqlx::PgPool) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM documents WHERE status = $1 ORDER BY date_created",
    )
    .bind(DocumentStatus::Pending.as_str())
    .fetch_all(pool)
    .await
}

pub async fn list_company_documents(
    pool: &sqlx::PgPool,
    company_id: Uuid,
) -> Result<Vec<DocumentRow>, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>(
        "SELECT * FROM documents WHERE company_id = $1 ORDER BY date_created DESC",
    )
    .bind(company_id)
    .fetch_all(pool)
    .await
}

pub async fn insert_document(pool: &sqlx::PgPool, document: &DocumentRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO documents
            (id, name, description, mime_type, source, content, filename,
             status, error_message, company_id, download_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(document.id)
    .bind(&document.name)
    .bind(&document.description)
    .bind(&document.mime_type)
    .bind(&document.source)
    .bind(&document.content)
    .bind(&document.filename)
    .bind(&document.status)
    .bind(&document.error_message)
    .bind(document.company_id)
    .bind(&document.download_url)
    .execute(pool)
    .await?;
    Ok(())
}

/// Stores the generated content and marks the document completed.
pub async fn mark_document_completed(
    pool: &sqlx::PgPool,
    id: Uuid,
    content: &str,
    download_url: &str,
) -> Result<DocumentRow, sqlx::Error> {
    sqlx::query_as::<_, DocumentRow>(
        r#"
        UPDATE documents
        SET content = $2, download_url = $3, status = $4,
            error_message = NULL, last_updated = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(content)
    .bind(download_url)
    .bind(DocumentStatus::Completed.as_str())
    .fetch_one(pool)
    .await
}

pub async fn mark_document_failed(pool: &sqlx::PgPool, id: Uuid, error: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE documents SET status = $2, error_message = $3, last_updated = now() WHERE id = $1",
    )
    .bind(id)
    .bind(DocumentStatus::Failed.as_str())
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings_match_serde() {
        for status in [
            DocumentStatus::Pending,
            DocumentStatus::Completed,
            DocumentStatus::Failed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(
            serde_json::to_string(&DocumentSource::Uploaded).unwrap(),
            "\"uploaded\""
        );
    }
}
